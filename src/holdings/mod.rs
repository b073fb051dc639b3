//! Holdings Registry
//!
//! Static, immutable table of the assets held by the book. Each entry maps a
//! display name to the held quantity and to the CoinGecko coin ID used to
//! quote it. Registry order is display order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A single held asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    pub display_name: String,
    pub held_quantity: f64,
    /// CoinGecko coin ID (e.g., "ethereum", "polkadot")
    pub feed_id: String,
}

impl AssetEntry {
    pub fn new(display_name: &str, held_quantity: f64, feed_id: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            held_quantity,
            feed_id: feed_id.to_string(),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate feed id: {0}")]
    DuplicateFeedId(String),

    #[error("Empty feed id for asset {0}")]
    EmptyFeedId(String),

    #[error("Invalid quantity {quantity} for asset {asset}")]
    InvalidQuantity { asset: String, quantity: f64 },
}

/// KR1 book: (display name, holding, CoinGecko ID)
const KR1_HOLDINGS: &[(&str, f64, &str)] = &[
    ("Ethereum (ETH)", 5_427.0, "ethereum"),
    ("Polkadot (DOT)", 5_137_231.0, "polkadot"),
    ("Internet Computer (ICP)", 152_352.0, "internet-computer"),
    ("Cosmos (ATOM)", 1_914_838.0, "cosmos"),
    ("Lido (LDO)", 12_000_000.0, "lido-dao"),
    ("Celestia (TIA)", 7_500_000.0, "celestia"),
    ("Astar (ASTR)", 68_388_411.0, "astar"),
    ("RocketPool (RPL)", 199_779.0, "rocket-pool"),
    ("Kusama (KSM)", 60_922.0, "kusama"),
    ("Moonbeam (GLMR)", 15_991_169.0, "moonbeam"),
    ("Moonriver (MOVR)", 60_717.0, "moonriver"),
    ("Bluzelle (BLZ)", 3_659_928.0, "bluzelle"),
    ("Nym (NYM)", 4_285_719.0, "nym"),
    ("Acala (ACA)", 11_980_568.0, "acala"),
    ("Clover (CLV)", 625_000.0, "clover-finance"),
    ("Enzyme Finance (MLN)", 28_570.0, "melon"),
    ("Automata Network (ATA)", 13_348_983.0, "automata"),
    ("Swarm (BZZ)", 844_328.0, "swarm"),
    ("Vega Protocol (VEGA)", 842_494.0, "vega-protocol"),
    ("Shiden (SDN)", 577_511.0, "shiden"),
    ("Karura (KAR)", 1_171_859.0, "karura"),
    ("Etherisc (DIP)", 1_344_071.0, "etherisc"),
    ("USD Coin (USDC)", 2_731_098.0, "usd-coin"),
];

/// Ordered, validated set of asset entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    entries: Vec<AssetEntry>,
}

impl Registry {
    /// Build a registry, rejecting duplicate or empty feed ids and
    /// negative or non-finite quantities.
    pub fn new(entries: Vec<AssetEntry>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();

        for entry in &entries {
            if entry.feed_id.trim().is_empty() {
                return Err(RegistryError::EmptyFeedId(entry.display_name.clone()));
            }
            if !entry.held_quantity.is_finite() || entry.held_quantity < 0.0 {
                return Err(RegistryError::InvalidQuantity {
                    asset: entry.display_name.clone(),
                    quantity: entry.held_quantity,
                });
            }
            if !seen.insert(entry.feed_id.as_str()) {
                return Err(RegistryError::DuplicateFeedId(entry.feed_id.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// The built-in KR1 holdings book
    pub fn kr1() -> Result<Self, RegistryError> {
        Self::new(
            KR1_HOLDINGS
                .iter()
                .map(|(name, held, id)| AssetEntry::new(name, *held, id))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    /// Feed ids in registry order, one per entry
    pub fn feed_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.feed_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
