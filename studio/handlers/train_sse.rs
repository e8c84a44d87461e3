use std::thread;

use serde_json::json;
use tiny_http::Request;

use epochline::stream::sse::{format_event, write_frame};

use crate::handlers::epoch_sse::{keep_alive, SSE_HEAD};
use crate::state::SharedState;

/// `GET /subscribe/train/`: training start/finish notices.
///
/// Sends `action: start` right away and `action: end` once the epoch
/// playback would have finished, then keeps the connection alive.
pub fn handle(request: Request, state: SharedState) {
    let (model_id, duration) = {
        let st = state.lock().unwrap();
        (st.model_id.clone(), st.playback_duration())
    };

    let mut writer = request.into_writer();
    if write_frame(&mut writer, SSE_HEAD).is_err() {
        return;
    }

    let start = json!({ "action": "start", "modelId": model_id });
    if write_frame(&mut writer, &format_event("train", &start.to_string())).is_err() {
        return;
    }

    thread::sleep(duration);

    let end = json!({ "action": "end", "modelId": model_id });
    if write_frame(&mut writer, &format_event("train", &end.to_string())).is_err() {
        return;
    }

    keep_alive(&mut writer);
}
