//! History Ledger
//!
//! Append-only record of portfolio totals for one session. Samples are kept
//! in append order, which is also time order since cycles run one at a time.
//! Nothing is ever removed; the ledger lives and dies with its session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
}

#[derive(Debug, Default)]
pub struct Ledger {
    samples: Vec<HistorySample>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample at the end. No dedup.
    pub fn append(&mut self, total_value: f64, at: DateTime<Utc>) {
        self.samples.push(HistorySample {
            timestamp: at,
            total_value,
        });
    }

    /// All samples, oldest first
    pub fn snapshot(&self) -> Vec<HistorySample> {
        self.samples.clone()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
