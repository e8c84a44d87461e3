use std::fmt;

use serde::Deserialize;

use crate::error::{DashError, Result};
use crate::series::EpochRecord;

/// Identifier of the training run a dashboard is bound to.
///
/// The wire format is textual, while the bound id may come from a numeric
/// source; both are held as text so `7` and `"7"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl fmt::Display) -> Self {
        ModelId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// String-coerced comparison against a wire target.
    pub fn matches(&self, target: &str) -> bool {
        self.0 == target
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId(s.to_owned())
    }
}

impl From<u64> for ModelId {
    fn from(n: u64) -> Self {
        ModelId::new(n)
    }
}

/// Decoded `epoch` event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub target_model_id: String,
    pub epoch_data: EpochRecord,
}

/// Wire schema. `modelId` is optional here so its absence surfaces as
/// `MissingTarget` rather than a generic decode failure.
#[derive(Deserialize)]
struct RawEpochEvent {
    #[serde(rename = "modelId", default)]
    model_id: Option<Target>,
    #[serde(rename = "epochData", default)]
    epoch_data: EpochRecord,
}

/// Targets are textual on the wire, but a numeric one is tolerated.
#[derive(Deserialize)]
#[serde(untagged)]
enum Target {
    Text(String),
    Number(serde_json::Number),
}

impl Target {
    /// Integral numbers render without a fraction, so `7.0` reads as `"7"`.
    fn into_string(self) -> String {
        match self {
            Target::Text(s) => s,
            Target::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", f),
                _ => n.to_string(),
            },
            Target::Number(n) => n.to_string(),
        }
    }
}

impl StreamEvent {
    /// Decodes an `epoch` payload.
    ///
    /// # Errors
    /// - `DashError::Decode` when the text is not JSON or `epochData` is not
    ///   an object of numbers
    /// - `DashError::MissingTarget` when `modelId` is absent or null
    pub fn decode(payload: &str) -> Result<StreamEvent> {
        let raw: RawEpochEvent = serde_json::from_str(payload)
            .map_err(|e| DashError::Decode(e.to_string()))?;
        let target = raw.model_id.ok_or(DashError::MissingTarget)?;
        Ok(StreamEvent {
            target_model_id: target.into_string(),
            epoch_data: raw.epoch_data,
        })
    }
}
