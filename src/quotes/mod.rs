//! Quote Provider Framework
//!
//! A price source answers one batched request per valuation cycle:
//! feed ids in, spot prices in the reference currency out. Ids the feed has
//! no data for are simply absent from the result.
//!
//! - CoinGecko (`simple/price`, batched)

pub mod coingecko;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Spot prices keyed by feed id. Lives for one cycle only.
pub type PriceQuotes = HashMap<String, f64>;

/// Failure of a whole price request. Per-id absence is not an error.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Price feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed price response: {0}")]
    MalformedResponse(String),
}

/// Source of live spot prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider name for logs and reports
    fn name(&self) -> &str;

    /// Reference currency all quotes are expressed in (lowercase, e.g. "usd")
    fn currency(&self) -> &str;

    /// Fetch current prices for all `feed_ids` in a single request.
    async fn fetch_prices(&self, feed_ids: &[String]) -> Result<PriceQuotes, FetchError>;
}
