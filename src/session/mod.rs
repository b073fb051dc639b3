//! Valuation session
//!
//! A session owns one history ledger and runs valuation cycles against it:
//! fetch prices → value holdings → append total → snapshot. Cycles on one
//! session never overlap; the ledger lock is held for the whole cycle so a
//! second trigger waits for the first to finish.
//!
//! Fetch failures end the cycle with a warning instead of an error. Whether
//! the degraded zero total is recorded is decided by [`FailurePolicy`].

use crate::history::{HistorySample, Ledger};
use crate::holdings::Registry;
use crate::quotes::{PriceQuotes, PriceSource};
use crate::valuation::{compute_valuation, Valuation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// What to record when a cycle cannot fetch prices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record nothing for the failed cycle
    #[default]
    Skip,
    /// Record the zero total of the empty valuation
    AppendZero,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::AppendZero => "append_zero",
        }
    }
}

/// Result of one valuation cycle, ready for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleOutcome {
    pub at: DateTime<Utc>,
    pub valuation: Valuation,
    /// Ledger contents after this cycle, oldest first
    pub snapshot: Vec<HistorySample>,
    /// Whether this cycle added a sample to the ledger
    pub appended: bool,
    /// User-facing notice when prices could not be fetched
    pub warning: Option<String>,
}

pub struct Session {
    id: Uuid,
    registry: Registry,
    source: Arc<dyn PriceSource>,
    policy: FailurePolicy,
    ledger: Mutex<Ledger>,
}

impl Session {
    pub fn new(registry: Registry, source: Arc<dyn PriceSource>, policy: FailurePolicy) -> Self {
        let id = Uuid::new_v4();
        log::debug!(
            "New session {} ({} assets, {} via {}, policy {})",
            id,
            registry.len(),
            source.currency(),
            source.name(),
            policy.as_str()
        );
        Self {
            id,
            registry,
            source,
            policy,
            ledger: Mutex::new(Ledger::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn currency(&self) -> &str {
        self.source.currency()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run one cycle. Never fails: fetch errors become `warning`.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let mut ledger = self.ledger.lock().await;

        let feed_ids = self.registry.feed_ids();
        let (quotes, warning) = match self.source.fetch_prices(&feed_ids).await {
            Ok(quotes) => (quotes, None),
            Err(e) => {
                log::warn!("Session {}: {} price fetch failed: {}", self.id, self.source.name(), e);
                (PriceQuotes::new(), Some(format!("Failed to fetch prices: {}", e)))
            }
        };

        let valuation = compute_valuation(self.registry.entries(), &quotes);
        let at = Utc::now();

        let appended = warning.is_none() || self.policy == FailurePolicy::AppendZero;
        if appended {
            ledger.append(valuation.total, at);
        }

        let missing = valuation.unquoted().count();
        if warning.is_none() && missing > 0 {
            log::info!(
                "{} of {} assets had no {} quote",
                missing,
                valuation.rows.len(),
                self.currency()
            );
        }
        log::info!(
            "Session {}: portfolio value {:.2} {} (sample {})",
            self.id,
            valuation.total,
            self.currency().to_uppercase(),
            if appended { "recorded" } else { "skipped" }
        );

        CycleOutcome {
            at,
            valuation,
            snapshot: ledger.snapshot(),
            appended,
            warning,
        }
    }

    /// Current ledger contents, oldest first
    pub async fn history(&self) -> Vec<HistorySample> {
        self.ledger.lock().await.snapshot()
    }

    /// Most recently recorded sample
    pub async fn latest(&self) -> Option<HistorySample> {
        self.ledger.lock().await.latest().copied()
    }
}
