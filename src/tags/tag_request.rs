use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DashError, Result};
use crate::tags::form::{form_get, parse_form, url_encode};

/// Tag mutation endpoint.
pub const TAGS_PATH: &str = "/tags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

impl TagAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagAction::Add    => "add",
            TagAction::Remove => "remove",
        }
    }
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagAction {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add"    => Ok(TagAction::Add),
            "remove" => Ok(TagAction::Remove),
            other    => Err(DashError::Decode(format!("unknown tag action '{}'", other))),
        }
    }
}

/// Add or remove one tag; sent as a form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub tag:    String,
    pub action: TagAction,
}

impl TagRequest {
    pub fn new(tag: impl Into<String>, action: TagAction) -> Self {
        TagRequest { tag: tag.into(), action }
    }

    pub fn to_form(&self) -> String {
        format!("tag={}&action={}", url_encode(&self.tag), self.action)
    }

    pub fn from_form(body: &str) -> Result<TagRequest> {
        let pairs = parse_form(body);
        let tag = form_get(&pairs, "tag")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DashError::Decode("tag request without tag".into()))?;
        let action = form_get(&pairs, "action")
            .ok_or_else(|| DashError::Decode("tag request without action".into()))?
            .parse()?;
        Ok(TagRequest::new(tag, action))
    }
}

/// Successful reply: where the page should navigate next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResult {
    pub endpoint: String,
}

/// Tag-mutation collaborator.
pub trait TagEndpoint {
    fn submit(&self, request: &TagRequest) -> Result<TagResult>;
}

/// `POST /tags` over HTTP.
pub struct HttpTagEndpoint {
    client: Client,
    url:    String,
}

impl HttpTagEndpoint {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(HttpTagEndpoint {
            client: Client::builder().build()?,
            url:    format!("{}{}", base_url.trim_end_matches('/'), TAGS_PATH),
        })
    }
}

impl TagEndpoint for HttpTagEndpoint {
    fn submit(&self, request: &TagRequest) -> Result<TagResult> {
        debug!(tag = %request.tag, action = %request.action, "submitting tag change");
        let body = self.client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(request.to_form())
            .send()?
            .error_for_status()?
            .text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
