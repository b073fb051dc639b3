//! Portfolio Commands - trigger and display interface
//!
//! Commands:
//! - run_valuation_cycle: Fetch prices, value holdings, record the total
//! - get_holdings: Registered assets in display order
//! - get_portfolio_history: Recorded totals, oldest first
//! - export_history_pdf: History line chart as PDF

use crate::display::pdf::{self, PdfExportResult};
use crate::history::HistorySample;
use crate::holdings::AssetEntry;
use crate::session::Session;
use crate::valuation::ValuationRow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Everything the presentation layer needs after one cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub session_id: String,
    pub currency: String,
    pub at: DateTime<Utc>,
    pub rows: Vec<ValuationRow>,
    pub total: f64,
    pub history: Vec<HistorySample>,
    pub appended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Run one valuation cycle for the session
pub async fn run_valuation_cycle(session: &Session) -> CycleReport {
    let outcome = session.run_cycle().await;

    CycleReport {
        session_id: session.id().to_string(),
        currency: session.currency().to_string(),
        at: outcome.at,
        rows: outcome.valuation.rows,
        total: outcome.valuation.total,
        history: outcome.snapshot,
        appended: outcome.appended,
        warning: outcome.warning,
    }
}

pub fn get_holdings(session: &Session) -> Vec<AssetEntry> {
    session.registry().entries().to_vec()
}

pub async fn get_portfolio_history(session: &Session) -> Vec<HistorySample> {
    session.history().await
}

pub async fn export_history_pdf(
    session: &Session,
    path: String,
) -> Result<PdfExportResult, String> {
    let history = session.history().await;
    pdf::export_history_chart(&history, session.currency(), Path::new(&path))
        .map_err(|e| e.to_string())
}
