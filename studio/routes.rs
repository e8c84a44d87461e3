use std::io::Cursor;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use epochline::stream::notice::TRAIN_PATH;
use epochline::stream::subscriber::EPOCH_END_PATH;
use epochline::tags::TAGS_PATH;

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn content_type(value: &str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).unwrap()
}

pub fn text_response(status: u16, body: &str) -> Response<Cursor<Vec<u8>>> {
    let bytes = body.as_bytes().to_vec();
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        vec![content_type("text/plain; charset=utf-8")],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn json_response<T: Serialize>(value: &T) -> Response<Cursor<Vec<u8>>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let len = bytes.len();
            Response::new(
                StatusCode(200),
                vec![content_type("application/json")],
                Cursor::new(bytes),
                Some(len),
                None,
            )
        }
        Err(e) => text_response(500, &e.to_string()),
    }
}

pub fn bad_request(reason: &str) -> Response<Cursor<Vec<u8>>> {
    text_response(400, reason)
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    text_response(404, "404 Not Found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Event-stream handlers take ownership of the request to drive the
/// long-lived stream; everything else is answered here.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();

    if method == Method::Get && path == EPOCH_END_PATH {
        handlers::epoch_sse::handle(request, state);
        return;
    }
    if method == Method::Get && path == TRAIN_PATH {
        handlers::train_sse::handle(request, state);
        return;
    }

    let response = match (method, path.as_str()) {
        (Method::Get, "/epochs") => {
            let st = state.lock().unwrap();
            json_response(&st.initial())
        }
        (Method::Post, p) if p == TAGS_PATH => handlers::tags::handle(&mut request, state),
        _ => not_found(),
    };

    let _ = request.respond(response);
}
