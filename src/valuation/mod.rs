//! Valuation Engine
//!
//! Joins one cycle's price quotes with the holdings registry. Pure: no I/O,
//! no shared state. A coin without a quote is valued at zero instead of
//! failing the whole valuation.

use crate::holdings::AssetEntry;
use crate::quotes::PriceQuotes;
use serde::{Deserialize, Serialize};

/// Value of one holding in this cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRow {
    pub asset: AssetEntry,
    /// Spot price, 0 if the feed had no quote
    pub price: f64,
    /// held_quantity * price, unrounded
    pub value: f64,
    /// Whether `price` came from the feed
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub rows: Vec<ValuationRow>,
    pub total: f64,
}

impl Valuation {
    /// Rows whose feed id had no quote
    pub fn unquoted(&self) -> impl Iterator<Item = &ValuationRow> {
        self.rows.iter().filter(|r| !r.quoted)
    }
}

/// Value every entry in registry order and sum the result.
pub fn compute_valuation(registry: &[AssetEntry], quotes: &PriceQuotes) -> Valuation {
    let rows: Vec<ValuationRow> = registry
        .iter()
        .map(|asset| {
            let quote = quotes.get(&asset.feed_id).copied();
            let price = quote.unwrap_or(0.0);
            ValuationRow {
                asset: asset.clone(),
                price,
                value: asset.held_quantity * price,
                quoted: quote.is_some(),
            }
        })
        .collect();

    let total = rows.iter().fold(0.0, |acc, row| acc + row.value);

    Valuation { rows, total }
}
