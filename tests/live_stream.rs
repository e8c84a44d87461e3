//! The follower against a real event stream served over HTTP.

mod common;

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};

use common::{scenario_a, RecordingSink};
use epochline::stream::sse::format_event;
use epochline::stream::transport::{ChannelEvent, EventSourceConfig};
use epochline::{ConnectionState, DashConfig, DashboardSession, SvgChart};

/// Serves `body` as one complete event-stream response to the first request,
/// and `status` with an empty body to any later one.
fn serve_once(body: String, later_status: u16) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    thread::spawn(move || {
        let mut first = true;
        for request in server.incoming_requests() {
            let (status, bytes) = if first {
                (200, body.clone().into_bytes())
            } else {
                (later_status, Vec::new())
            };
            first = false;
            let len = bytes.len();
            let resp = Response::new(
                StatusCode(status),
                vec![Header::from_bytes(&b"Content-Type"[..], &b"text/event-stream"[..]).unwrap()],
                Cursor::new(bytes),
                Some(len),
                None,
            );
            let _ = request.respond(resp);
        }
    });

    format!("http://{}", addr)
}

fn source(base: &str, max_retries: u32) -> EventSourceConfig {
    let mut cfg = EventSourceConfig::new(base, "/subscribe/epoch/end/");
    cfg.retry = Duration::from_millis(10);
    cfg.max_retries = Some(max_retries);
    cfg
}

#[test]
fn follows_stream_until_it_closes() {
    let body = [
        format_event("epoch", r#"{"modelId":"run_a","epochData":{"loss":0.3,"acc":0.8}}"#),
        ": ping\n\n".to_owned(),
        format_event("epoch", r#"{"modelId":"run_b","epochData":{"loss":9.9}}"#),
        format_event("epoch", "{not json"),
        format_event("epoch", r#"{"epochData":{"loss":9.9}}"#),
        format_event("train", r#"{"action":"end","modelId":"run_a"}"#),
        format_event("epoch", r#"{"modelId":"run_a","epochData":{"loss":0.2,"newMetric":1.0}}"#),
    ]
    .concat();
    let base = serve_once(body, 404);

    let mut session = DashboardSession::new("run_a", &scenario_a(), RecordingSink::default()).unwrap();
    let (tx, rx) = mpsc::channel();
    let es = session.subscribe(source(&base, 0), tx).unwrap();

    session.run(&rx);
    es.join();

    assert_eq!(session.merged(), 2);
    assert_eq!(
        session.store().series("loss").unwrap(),
        &[Some(0.9), Some(0.5), Some(0.3), Some(0.2)]
    );
    assert_eq!(session.store().series("acc").unwrap(), &[None, Some(0.7), Some(0.8)]);
    assert!(!session.store().contains("newMetric"));
    assert_eq!(session.sink().loads.len(), 2);
    assert_eq!(session.subscriber().state(), ConnectionState::Closed);
}

#[test]
fn follows_the_configured_epoch_path() {
    let body = format_event("epoch", r#"{"modelId":"run_a","epochData":{"loss":0.3}}"#);
    let base = serve_once(body, 404);
    let cfg: DashConfig = serde_json::from_str(&format!(
        r#"{{"app":{{"server-url":"{}"}},"stream":{{"epoch-path":"/runs/live/","retry-ms":10,"max-retries":0}}}}"#,
        base
    ))
    .unwrap();

    let mut session = DashboardSession::new("run_a", &scenario_a(), RecordingSink::default()).unwrap();
    let (tx, rx) = mpsc::channel();
    let es = session.subscribe(cfg.epoch_source(), tx).unwrap();
    assert_eq!(es.url(), format!("{}/runs/live/", base));
    assert_eq!(session.subscriber().endpoint(), "/runs/live/");
    assert_eq!(session.subscriber().state(), ConnectionState::Connecting);

    session.run(&rx);
    es.join();

    assert_eq!(session.merged(), 1);
    assert_eq!(session.subscriber().state(), ConnectionState::Closed);
}

#[test]
fn retries_after_stream_end_then_gives_up_on_error_status() {
    let body = format_event("epoch", r#"{"modelId":"run_a","epochData":{"loss":0.3}}"#);
    let base = serve_once(body, 503);

    let (tx, rx) = mpsc::channel();
    let es = epochline::stream::EventSource::open(source(&base, 5), tx).unwrap();
    es.join();

    let events: Vec<ChannelEvent> = rx.try_iter().map(|m| m.event).collect();
    let opens = events.iter().filter(|e| matches!(e, ChannelEvent::Open)).count();
    let frames = events.iter().filter(|e| matches!(e, ChannelEvent::Event(_))).count();
    assert_eq!(opens, 1);
    assert_eq!(frames, 1);

    // First error is the stream ending (retried), the last one the 503 (not retried).
    let errors: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            ChannelEvent::Error { will_retry, .. } => Some(*will_retry),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![true, false]);
    assert_eq!(events.last(), Some(&ChannelEvent::Closed));
}

#[test]
fn chart_file_tracks_merges() {
    let body = format_event("epoch", r#"{"modelId":"7","epochData":{"loss":0.3,"acc":0.8}}"#);
    let base = serve_once(body, 404);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.svg");
    let chart = SvgChart::default().with_output(&out);

    let mut session = DashboardSession::new(7u64, &scenario_a(), chart).unwrap();
    let first = std::fs::read_to_string(&out).unwrap();
    assert_eq!(first.matches("class=\"series\"").count(), 2);

    let (tx, rx) = mpsc::channel();
    let es = session.subscribe(source(&base, 0), tx).unwrap();
    session.run(&rx);
    es.join();

    let last = std::fs::read_to_string(&out).unwrap();
    assert_ne!(first, last);
    assert_eq!(session.store().epoch_count(), 3);
}
