use serde::Deserialize;
use tracing::{error, info};

use crate::error::{DashError, Result};

/// Push-channel path for training start/finish notifications.
pub const TRAIN_PATH: &str = "/subscribe/train/";

/// Event name carried by training notifications.
pub const TRAIN_EVENT: &str = "train";

/// Start or finish of a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainNotice {
    pub started:  bool,
    pub model_id: String,
}

#[derive(Deserialize)]
struct RawTrainEvent {
    action: String,
    #[serde(rename = "modelId")]
    model_id: serde_json::Value,
}

impl TrainNotice {
    /// Decodes a `train` payload (`{"action": "start", "modelId": ...}`).
    /// Any action other than `start` counts as a finish.
    pub fn decode(payload: &str) -> Result<TrainNotice> {
        let raw: RawTrainEvent = serde_json::from_str(payload)
            .map_err(|e| DashError::Decode(e.to_string()))?;
        let model_id = match raw.model_id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => return Err(DashError::MissingTarget),
            other => other.to_string(),
        };
        Ok(TrainNotice { started: raw.action == "start", model_id })
    }

    /// Toast text, e.g. `Started training for model mnist_cnn`.
    pub fn message(&self) -> String {
        let verb = if self.started { "Started" } else { "Finished" };
        format!("{} training for model {}", verb, self.model_id)
    }
}

/// Notification collaborator for training start/finish.
pub trait Notifier {
    fn notify(&mut self, notice: &TrainNotice);
}

/// Notifier that writes each notice to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: &TrainNotice) {
        info!(model_id = %notice.model_id, "{}", notice.message());
    }
}

/// Decodes a `train` frame and hands it to `notifier`. Malformed frames are
/// logged and dropped; returns whether a notice was delivered.
pub fn handle_train_message<N: Notifier + ?Sized>(event_name: &str, data: &str, notifier: &mut N) -> bool {
    if event_name != TRAIN_EVENT {
        return false;
    }
    match TrainNotice::decode(data) {
        Ok(notice) => {
            notifier.notify(&notice);
            true
        }
        Err(e) => {
            error!(error = %e, "dropping train event");
            false
        }
    }
}
