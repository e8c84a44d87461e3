use std::io::{Cursor, Read};

use tiny_http::{Request, Response};
use tracing::{info, warn};

use epochline::tags::{TagAction, TagRequest, TagResult};

use crate::state::SharedState;

/// `POST /tags`: adds or removes a tag on the replayed run and answers with
/// the page to navigate to.
pub fn handle(request: &mut Request, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        return crate::routes::bad_request("unreadable body");
    }

    let tag_req = match TagRequest::from_form(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "rejected tag request");
            return crate::routes::bad_request(&e.to_string());
        }
    };

    let mut st = state.lock().unwrap();
    match tag_req.action {
        TagAction::Add => {
            if !st.tags.contains(&tag_req.tag) {
                st.tags.push(tag_req.tag.clone());
            }
        }
        TagAction::Remove => st.tags.retain(|t| t != &tag_req.tag),
    }
    info!(tag = %tag_req.tag, action = %tag_req.action, tags = ?st.tags, "tags updated");

    let result = TagResult { endpoint: format!("/{}", st.model_id) };
    drop(st);

    crate::routes::json_response(&result)
}
