use std::io::Write;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tiny_http::Request;
use tracing::{debug, info};

use epochline::stream::sse::{format_event, write_frame, KEEPALIVE};

use crate::state::SharedState;

/// Interval between keep-alive comments once playback has finished.
pub const KEEPALIVE_EVERY: Duration = Duration::from_secs(15);

/// Raw response head for an event stream; tiny_http's `into_writer` path
/// leaves the status line and headers to us.
pub const SSE_HEAD: &str = "HTTP/1.1 200 OK\r\n\
                            Content-Type: text/event-stream\r\n\
                            Cache-Control: no-cache\r\n\
                            Connection: keep-alive\r\n\
                            X-Accel-Buffering: no\r\n\
                            \r\n";

/// `GET /subscribe/epoch/end/`: plays the live part of the recording.
///
/// Each connection gets its own playback:
/// 1. A `retry:` hint equal to the replay interval.
/// 2. One `event: epoch` frame per live record, `interval` apart, each with
///    `id: <n>` so a reconnecting client resumes after the last frame it saw
///    (`Last-Event-ID`).
/// 3. Keep-alive pings until the client disconnects. The stream is never
///    ended by the server, otherwise the client would reconnect.
pub fn handle(request: Request, state: SharedState) {
    let resume_after = last_event_id(&request);

    let (model_id, live, interval) = {
        let st = state.lock().unwrap();
        (st.model_id.clone(), st.live().to_vec(), st.interval)
    };

    let mut writer = request.into_writer();
    if write_frame(&mut writer, SSE_HEAD).is_err() {
        return;
    }
    let retry = format!("retry: {}\n\n", interval.as_millis());
    if write_frame(&mut writer, &retry).is_err() {
        return;
    }

    let start = resume_after.map_or(0, |id| id + 1);
    info!(model_id = %model_id, from = start, total = live.len(), "epoch stream opened");

    for (idx, record) in live.iter().enumerate().skip(start) {
        thread::sleep(interval);
        let payload = json!({ "modelId": model_id, "epochData": record });
        let frame = format!("id: {}\n{}", idx, format_event("epoch", &payload.to_string()));
        if write_frame(&mut writer, &frame).is_err() {
            debug!(sent = idx, "epoch stream client left");
            return;
        }
    }

    keep_alive(&mut writer);
}

/// Pings until the client goes away.
pub fn keep_alive<W: Write>(writer: &mut W) {
    loop {
        thread::sleep(KEEPALIVE_EVERY);
        if write_frame(writer, KEEPALIVE).is_err() {
            return;
        }
    }
}

fn last_event_id(request: &Request) -> Option<usize> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Last-Event-ID"))
        .and_then(|h| h.value.as_str().trim().parse().ok())
}
