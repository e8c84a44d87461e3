use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One completed training epoch: metric name → value.
///
/// Produced by the training process and never mutated after it is received.
/// Metrics iterate in name order. A record carries no epoch number of its
/// own; its position in arrival order is its epoch index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochRecord {
    metrics: BTreeMap<String, f64>,
}

impl EpochRecord {
    pub fn new() -> Self {
        EpochRecord::default()
    }

    /// Builder-style insert, handy for tests and fixtures.
    pub fn with(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for EpochRecord {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        EpochRecord {
            metrics: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
