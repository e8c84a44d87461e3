use std::sync::{Arc, Mutex};
use std::time::Duration;

use epochline::EpochRecord;

// ---------------------------------------------------------------------------
// Replay state
// ---------------------------------------------------------------------------

/// A recorded training run being played back to followers.
///
/// The first `snapshot` records are what a dashboard would load at page
/// time (`GET /epochs`); the rest are streamed one per `interval`.
pub struct ReplayState {
    pub model_id: String,
    pub records:  Vec<EpochRecord>,
    pub snapshot: usize,
    pub interval: Duration,
    /// Tags attached to the run via `POST /tags`.
    pub tags:     Vec<String>,
}

impl ReplayState {
    pub fn new(model_id: String, records: Vec<EpochRecord>, snapshot: usize, interval: Duration) -> Self {
        let snapshot = snapshot.min(records.len());
        ReplayState { model_id, records, snapshot, interval, tags: Vec::new() }
    }

    /// Records served at page load.
    pub fn initial(&self) -> &[EpochRecord] {
        &self.records[..self.snapshot]
    }

    /// Records streamed after page load, in order.
    pub fn live(&self) -> &[EpochRecord] {
        &self.records[self.snapshot..]
    }

    /// How long a full playback of the live records takes.
    pub fn playback_duration(&self) -> Duration {
        self.interval * self.live().len() as u32
    }
}

/// Shared state type: an `Arc<Mutex<ReplayState>>` passed to every handler.
pub type SharedState = Arc<Mutex<ReplayState>>;
