use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DashError, Result};
use crate::series::column::Column;
use crate::series::epoch_record::EpochRecord;

/// Canonical metric → series mapping for one dashboard session.
///
/// Series are index-aligned by epoch. An entry of `None` marks an epoch
/// before the metric's first appearance. The set of metrics is fixed by
/// `initialize`: `merge` only extends series that already exist.
///
/// Metrics are kept in a `BTreeMap`, so `columns()` yields them in name
/// order on every call.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    by_tag: BTreeMap<String, Vec<Option<f64>>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        SeriesStore::default()
    }

    /// Row → column transform of the initial snapshot.
    ///
    /// The record at position `i` sets index `i` of every metric it carries.
    /// A metric first seen at `i` gets `None` at `0..i`; a record that omits
    /// a known metric leaves a hole rather than shifting later epochs.
    ///
    /// # Errors
    /// `DashError::InvalidState` if the store already holds series.
    pub fn initialize(&mut self, records: &[EpochRecord]) -> Result<()> {
        if !self.by_tag.is_empty() {
            return Err(DashError::InvalidState(format!(
                "store already initialized with {} series",
                self.by_tag.len()
            )));
        }

        for (idx, record) in records.iter().enumerate() {
            for (metric, value) in record.iter() {
                let series = self.by_tag.entry(metric.to_owned()).or_default();
                if series.len() <= idx {
                    series.resize(idx + 1, None);
                }
                series[idx] = Some(value);
            }
        }

        debug!(
            epochs = records.len(),
            metrics = self.by_tag.len(),
            "series store initialized"
        );
        Ok(())
    }

    /// Appends one streamed epoch.
    ///
    /// Values for known metrics are pushed onto the end of their series.
    /// Unknown metrics are dropped; the series set never grows after
    /// `initialize`. Merging the same record twice appends it twice.
    ///
    /// Returns the number of values accepted.
    pub fn merge(&mut self, record: &EpochRecord) -> usize {
        let mut accepted = 0;
        for (metric, value) in record.iter() {
            match self.by_tag.get_mut(metric) {
                Some(series) => {
                    series.push(Some(value));
                    accepted += 1;
                }
                None => debug!(metric, "dropping unknown metric"),
            }
        }
        accepted
    }

    /// Snapshot of every known series as a chart column, in name order.
    pub fn columns(&self) -> Vec<Column> {
        self.by_tag
            .iter()
            .map(|(name, values)| Column::new(name.clone(), values.clone()))
            .collect()
    }

    pub fn series(&self, metric: &str) -> Option<&[Option<f64>]> {
        self.by_tag.get(metric).map(Vec::as_slice)
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.by_tag.contains_key(metric)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// Number of known metrics.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Length of the longest series.
    pub fn epoch_count(&self) -> usize {
        self.by_tag.values().map(Vec::len).max().unwrap_or(0)
    }
}
