use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, trace};

use crate::error::Result;
use crate::stream::sse::{SseDecoder, SseEvent};

/// Reconnection delay used until the server sends a `retry:` field.
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Something the transport observed on one push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection attempt is starting.
    Connecting,
    /// The server accepted the stream.
    Open,
    /// A dispatched frame.
    Event(SseEvent),
    /// The connection failed or ended. `will_retry` tells whether another
    /// attempt follows.
    Error { reason: String, will_retry: bool },
    /// The transport gave up; no further messages follow.
    Closed,
}

/// A `ChannelEvent` tagged with the path it came from, so several streams
/// can share one consumer queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub path:  String,
    pub event: ChannelEvent,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EventSourceConfig {
    /// Server root, e.g. `http://127.0.0.1:5000`.
    pub base_url:    String,
    /// Stream path, e.g. `/subscribe/epoch/end/`.
    pub path:        String,
    pub retry:       Duration,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl EventSourceConfig {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        EventSourceConfig {
            base_url:    base_url.into(),
            path:        path.into(),
            retry:       DEFAULT_RETRY,
            max_retries: None,
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// Blocking server-sent-events client.
///
/// A dedicated reader thread owns the HTTP connection, parses frames and
/// forwards them to a single consumer through an `mpsc` channel in arrival
/// order. Reconnection is handled here; consumers only observe `Error`
/// followed by `Connecting`.
///
/// The reader stops once the receiving side is dropped (noticed on the next
/// frame or keep-alive) or when retries are exhausted.
pub struct EventSource {
    url:    String,
    handle: JoinHandle<()>,
}

enum StreamEnd {
    Eof,
    ReceiverGone,
}

impl EventSource {
    pub fn open(config: EventSourceConfig, tx: mpsc::Sender<ChannelMessage>) -> Result<EventSource> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        let url = config.url();
        let thread_url = url.clone();
        let handle = thread::Builder::new()
            .name(format!("sse {}", config.path))
            .spawn(move || run(client, config, thread_url, tx))?;
        Ok(EventSource { url, handle })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the reader thread to stop.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn run(client: Client, config: EventSourceConfig, url: String, tx: mpsc::Sender<ChannelMessage>) {
    let emit = |event: ChannelEvent| {
        tx.send(ChannelMessage { path: config.path.clone(), event }).is_ok()
    };

    let mut decoder  = SseDecoder::new();
    let mut failures = 0u32;

    loop {
        if !emit(ChannelEvent::Connecting) {
            return;
        }

        let mut req = client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = decoder.last_event_id() {
            req = req.header("Last-Event-ID", id);
        }

        let (reason, fatal) = match req.send() {
            Ok(resp) if resp.status().is_success() => {
                failures = 0;
                if !emit(ChannelEvent::Open) {
                    return;
                }
                match read_stream(resp, &mut decoder, &emit) {
                    Ok(StreamEnd::ReceiverGone) => return,
                    Ok(StreamEnd::Eof)          => ("stream ended".to_owned(), false),
                    Err(e)                      => (e.to_string(), false),
                }
            }
            // Non-2xx answers are final.
            Ok(resp) => (format!("unexpected status {}", resp.status()), true),
            Err(e)   => (e.to_string(), false),
        };

        decoder.reset_frame();
        failures += 1;
        let will_retry = !fatal && config.max_retries.map_or(true, |max| failures <= max);
        debug!(url = %url, %reason, will_retry, "push channel interrupted");

        if !emit(ChannelEvent::Error { reason, will_retry }) {
            return;
        }
        if !will_retry {
            let _ = emit(ChannelEvent::Closed);
            return;
        }
        thread::sleep(decoder.retry().unwrap_or(config.retry));
    }
}

fn read_stream<R, F>(body: R, decoder: &mut SseDecoder, emit: &F) -> std::io::Result<StreamEnd>
where
    R: Read,
    F: Fn(ChannelEvent) -> bool,
{
    let mut reader = BufReader::new(body);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(StreamEnd::Eof);
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        if let Some(ev) = decoder.push_line(trimmed) {
            trace!(event = %ev.event, bytes = ev.data.len(), "frame");
            if !emit(ChannelEvent::Event(ev)) {
                return Ok(StreamEnd::ReceiverGone);
            }
        }
    }
}
