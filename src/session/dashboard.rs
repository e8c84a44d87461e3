use std::sync::mpsc;

use tracing::{debug, error, info, warn};

use crate::chart::RenderSink;
use crate::error::{DashError, Result};
use crate::series::{EpochRecord, SeriesStore};
use crate::stream::notice::{handle_train_message, LogNotifier, Notifier, TRAIN_EVENT};
use crate::stream::subscriber::{ConnectionState, LiveUpdateSubscriber, Outcome};
use crate::stream::transport::{ChannelEvent, ChannelMessage, EventSource, EventSourceConfig};
use crate::stream::event::ModelId;

/// One dashboard view of one training run.
///
/// Construction performs the bootstrap in the required order: the store is
/// built from the initial records, the chart is generated once, and only
/// then is a subscriber bound to it. Channel messages are applied one at a
/// time on the thread that owns the session.
pub struct DashboardSession<S: RenderSink> {
    store:      SeriesStore,
    subscriber: LiveUpdateSubscriber,
    sink:       S,
    notifier:   Box<dyn Notifier + Send>,
    merged:     usize,
}

impl<S: RenderSink> DashboardSession<S> {
    pub fn new(model_id: impl Into<ModelId>, records: &[EpochRecord], mut sink: S) -> Result<Self> {
        let mut store = SeriesStore::new();
        store.initialize(records)?;

        let handle = sink.generate(&store.columns())?;
        let mut subscriber = LiveUpdateSubscriber::new(model_id);
        subscriber.bind_chart(handle);

        info!(
            model_id = %subscriber.model_id(),
            epochs = records.len(),
            metrics = store.len(),
            "chart rendered"
        );

        Ok(DashboardSession {
            store,
            subscriber,
            sink,
            notifier: Box::new(LogNotifier),
            merged: 0,
        })
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + Send + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn subscriber(&self) -> &LiveUpdateSubscriber {
        &self.subscriber
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of epoch events merged so far.
    pub fn merged(&self) -> usize {
        self.merged
    }

    /// Opens the epoch-end stream at `source.path`. Messages tagged with
    /// that path are routed to the subscriber from then on.
    pub fn subscribe(&mut self, source: EventSourceConfig, tx: mpsc::Sender<ChannelMessage>) -> Result<EventSource> {
        let handle = self
            .subscriber
            .chart()
            .ok_or_else(|| DashError::Invariant("subscribe before the first render".into()))?;
        let model_id = self.subscriber.model_id().clone();
        let (subscriber, source) = LiveUpdateSubscriber::connect(model_id, handle, source, tx)?;
        self.subscriber = subscriber;
        Ok(source)
    }

    /// Applies one channel message.
    ///
    /// Lifecycle messages from the epoch stream drive the subscriber state;
    /// those from any other stream are only logged. `train` frames go to the
    /// notifier. Other frames reach the subscriber only when they come from
    /// the epoch stream.
    ///
    /// An `Err` ends the handling of this message only.
    pub fn dispatch(&mut self, msg: ChannelMessage) -> Result<Option<Outcome>> {
        let is_epoch_stream = msg.path == self.subscriber.endpoint();

        match msg.event {
            ChannelEvent::Connecting if is_epoch_stream => self.subscriber.on_connecting(),
            ChannelEvent::Open if is_epoch_stream => self.subscriber.on_open(),
            ChannelEvent::Error { reason, will_retry } if is_epoch_stream => {
                self.subscriber.on_error(&reason, will_retry)
            }
            ChannelEvent::Closed if is_epoch_stream => self.subscriber.on_close(),

            ChannelEvent::Open => info!("Connected to {}", msg.path),
            ChannelEvent::Error { reason, .. } => warn!(%reason, "Couldn't subscribe to {}", msg.path),
            ChannelEvent::Connecting | ChannelEvent::Closed => {}

            ChannelEvent::Event(ev) if ev.event == TRAIN_EVENT => {
                handle_train_message(&ev.event, &ev.data, self.notifier.as_mut());
            }
            ChannelEvent::Event(ev) if is_epoch_stream => {
                let outcome = self.subscriber.handle_message(&ev.event, &ev.data, &mut self.store, &mut self.sink)?;
                if matches!(outcome, Outcome::Merged { .. }) {
                    self.merged += 1;
                }
                return Ok(Some(outcome));
            }
            ChannelEvent::Event(ev) => {
                debug!(event = %ev.event, path = %msg.path, "frame outside the epoch stream ignored");
            }
        }
        Ok(None)
    }

    /// Drains `rx` in arrival order until the epoch stream closes or every
    /// sender is gone. Per-message failures are logged and skipped.
    pub fn run(&mut self, rx: &mpsc::Receiver<ChannelMessage>) {
        while let Ok(msg) = rx.recv() {
            if let Err(e) = self.dispatch(msg) {
                error!(error = %e, "push message failed");
            }
            if self.subscriber.state() == ConnectionState::Closed {
                break;
            }
        }
        info!(merged = self.merged, epochs = self.store.epoch_count(), "live updates stopped");
    }
}
