use std::sync::mpsc;

use tracing::{debug, error, info, warn};

use crate::chart::{ChartHandle, RenderSink};
use crate::error::{DashError, Result};
use crate::series::SeriesStore;
use crate::stream::event::{ModelId, StreamEvent};
use crate::stream::transport::{ChannelMessage, EventSource, EventSourceConfig};

/// Default push-channel path for epoch-end notifications.
pub const EPOCH_END_PATH: &str = "/subscribe/epoch/end/";

/// Event name carried by epoch-end frames.
pub const EPOCH_EVENT: &str = "epoch";

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Push-channel lifecycle as observed by the subscriber.
///
/// `Disconnected → Connecting → Connected → (Error → Connecting | Closed)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
    Closed,
}

/// What happened to one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Merged into the store and the chart was refreshed.
    Merged { accepted: usize },
    /// Addressed to another training run.
    Filtered,
    /// Malformed payload; logged and dropped.
    Dropped,
    /// Not an epoch event.
    Ignored,
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// Accept/reject logic for the epoch-end push channel.
///
/// The subscriber does not own the transport; it records the lifecycle the
/// transport reports and decides, per message, whether the payload belongs
/// to the bound training run. Accepted records are merged into the store and
/// the chart is reloaded with the full column set.
#[derive(Debug)]
pub struct LiveUpdateSubscriber {
    model_id: ModelId,
    state:    ConnectionState,
    chart:    Option<ChartHandle>,
    endpoint: String,
}

impl LiveUpdateSubscriber {
    pub fn new(model_id: impl Into<ModelId>) -> Self {
        Self::with_endpoint(model_id, EPOCH_END_PATH)
    }

    pub fn with_endpoint(model_id: impl Into<ModelId>, endpoint: impl Into<String>) -> Self {
        LiveUpdateSubscriber {
            model_id: model_id.into(),
            state:    ConnectionState::Disconnected,
            chart:    None,
            endpoint: endpoint.into(),
        }
    }

    /// Opens the epoch-end stream at `source.path` for a chart that has
    /// already been rendered.
    ///
    /// The returned subscriber is bound to `handle` and in `Connecting`;
    /// the transport reports the rest of the lifecycle through `tx`.
    pub fn connect(
        model_id: impl Into<ModelId>,
        handle: ChartHandle,
        source: EventSourceConfig,
        tx: mpsc::Sender<ChannelMessage>,
    ) -> Result<(Self, EventSource)> {
        let mut subscriber = Self::with_endpoint(model_id, source.path.clone());
        subscriber.bind_chart(handle);
        subscriber.on_connecting();
        let source = EventSource::open(source, tx)?;
        Ok((subscriber, source))
    }

    pub fn model_id(&self) -> &ModelId {
        &self.model_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Binds the chart produced by the first render. Must precede any
    /// message handling.
    pub fn bind_chart(&mut self, handle: ChartHandle) {
        self.chart = Some(handle);
    }

    pub fn chart(&self) -> Option<ChartHandle> {
        self.chart
    }

    /// Marks the connection as being opened.
    pub fn on_connecting(&mut self) {
        debug!(endpoint = %self.endpoint, "connecting");
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        info!("Connected to {}", self.endpoint);
        self.state = ConnectionState::Connected;
    }

    /// Transport-level failure. Retrying is the transport's decision; the
    /// subscriber only records and logs it. A retrying transport reports
    /// `on_connecting` again before its next attempt.
    pub fn on_error(&mut self, reason: &str, will_retry: bool) {
        warn!(reason, will_retry, "Couldn't subscribe to {}", self.endpoint);
        self.state = if will_retry {
            ConnectionState::Error
        } else {
            ConnectionState::Closed
        };
    }

    pub fn on_close(&mut self) {
        debug!(endpoint = %self.endpoint, "push channel closed");
        self.state = ConnectionState::Closed;
    }

    /// Handles one push message.
    ///
    /// Runs whatever the locally observed connection state is; a message
    /// can arrive before the open acknowledgment has been processed.
    ///
    /// # Errors
    /// - `DashError::MissingTarget` when the payload has no `modelId`
    /// - `DashError::Invariant` when no chart has been bound yet
    /// - errors from the render sink
    ///
    /// Malformed payloads are logged and reported as `Outcome::Dropped`.
    pub fn handle_message<S: RenderSink + ?Sized>(
        &mut self,
        event_name: &str,
        data: &str,
        store: &mut SeriesStore,
        sink: &mut S,
    ) -> Result<Outcome> {
        if event_name != EPOCH_EVENT {
            return Ok(Outcome::Ignored);
        }

        let event = match StreamEvent::decode(data) {
            Ok(ev) => ev,
            Err(e) if e.is_contained() => {
                error!(error = %e, "dropping epoch event");
                return Ok(Outcome::Dropped);
            }
            Err(e) => return Err(e),
        };

        let handle = self.chart.ok_or_else(|| {
            DashError::Invariant("expected existing chart before handling epoch events".into())
        })?;

        if !self.model_id.matches(&event.target_model_id) {
            debug!(event_target = %event.target_model_id, bound = %self.model_id, "event for another run");
            return Ok(Outcome::Filtered);
        }

        let accepted = store.merge(&event.epoch_data);
        sink.load(handle, &store.columns())?;
        debug!(accepted, epochs = store.epoch_count(), "chart refreshed");
        Ok(Outcome::Merged { accepted })
    }
}
