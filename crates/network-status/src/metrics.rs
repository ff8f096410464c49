//! Derived network metrics.
//!
//! Pure functions that turn representative weights and polled counters into
//! the figures shown on the status screen. Nothing here performs I/O or keeps
//! state between calls; every value is recomputed from its inputs.
//!
//! Every percentage on the screen is `part / whole * 100` over the same
//! handful of sums:
//!
//! | metric                       | part                      | whole                |
//! |------------------------------|---------------------------|----------------------|
//! | `percent_represented`        | online weight             | max supply           |
//! | `official_percent`           | official weight           | max supply           |
//! | `official_online_percent`    | official weight           | online weight        |
//! | `rebroadcast_percent`        | online rebroadcast weight | circulating supply   |
//! | `online_rebroadcast_percent` | online rebroadcast weight | online weight        |
//!
//! Malformed upstream numbers never abort a computation: unparseable block
//! counts count as zero and a zero denominator yields [`PERCENT_UNDEFINED`].

use crate::config::{REBROADCAST_RATIO, StatusConfig};
use crate::currency::{Currency, RawAmount};
use crate::types::{
    BlockCount, BlockCountMap, NetworkData, NetworkSnapshot, PeerMap, RepresentativeWeightMap,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value returned by [`MetricMath::percent_of`] when the whole is zero.
pub const PERCENT_UNDEFINED: f64 = 0.0;

/// Label used for peers that do not report a protocol version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Peers sharing a protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerVersionCount {
    /// Protocol version label
    pub version: String,
    /// Number of peers reporting it
    pub count: usize,
}

/// Block count for one block type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTypeCount {
    /// Block type label
    pub block_type: String,
    /// Parsed count (zero when the API sent something unparseable)
    pub count: u64,
}

/// One online representative with its weight in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeEntry {
    /// Representative address
    pub address: String,
    /// Voting weight in display units
    pub weight: f64,
}

/// Every headline figure of the status screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Number of online representatives
    pub online_rep_count: usize,
    /// Sum of online representative weight
    pub online_weight: f64,
    /// Online weight as a share of max supply
    pub percent_represented: f64,
    /// Sum of official representative weight
    pub official_weight: f64,
    /// Official weight as a share of max supply
    pub official_percent: f64,
    /// Official weight as a share of online weight
    pub official_online_percent: f64,
    /// Minimum weight for a representative's votes to be rebroadcast
    pub rebroadcast_threshold: f64,
    /// Number of online representatives at or above the threshold
    pub rebroadcasting_rep_count: usize,
    /// Weight of online representatives at or above the threshold
    pub online_rebroadcast_weight: f64,
    /// Rebroadcast weight as a share of circulating supply
    pub rebroadcast_percent: f64,
    /// Rebroadcast weight as a share of online weight
    pub online_rebroadcast_percent: f64,
    /// Sum of all block counts
    pub total_blocks: u64,
    /// Number of known peers
    pub peer_count: usize,
}

/// Metric calculator bound to one network's static parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricMath {
    max_supply: f64,
    rebroadcast_ratio: f64,
    currency: Currency,
}

impl MetricMath {
    /// Build a calculator from the monitor configuration.
    #[must_use]
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            max_supply: config.currency.max_supply as f64,
            rebroadcast_ratio: config.rebroadcast_ratio(),
            currency: config.currency(),
        }
    }

    /// Build a calculator from explicit parameters.
    #[must_use]
    pub fn with_params(max_supply: u64, unit_decimals: u32) -> Self {
        Self {
            max_supply: max_supply as f64,
            rebroadcast_ratio: REBROADCAST_RATIO,
            currency: Currency::new(unit_decimals),
        }
    }

    /// Convert a raw amount with this network's currency.
    pub fn to_display(&self, amount: RawAmount) -> f64 {
        self.currency.from_raw(amount)
    }

    /// Supply outside the genesis account: `max_supply - genesis_balance`.
    pub fn circulating_supply(&self, genesis_balance: RawAmount) -> f64 {
        self.max_supply - self.to_display(genesis_balance)
    }

    /// Minimum weight for a representative's votes to be rebroadcast.
    pub fn rebroadcast_threshold(&self, genesis_balance: RawAmount) -> f64 {
        self.circulating_supply(genesis_balance) * self.rebroadcast_ratio
    }

    /// Entries whose weight is at or above `threshold`.
    pub fn rebroadcast_eligible(
        &self,
        map: &RepresentativeWeightMap,
        threshold: f64,
    ) -> RepresentativeWeightMap {
        map.iter()
            .filter(|(_, weight)| self.to_display(**weight) >= threshold)
            .map(|(address, weight)| (address.clone(), *weight))
            .collect()
    }

    /// Sum of all weights in display units; zero for an empty map.
    pub fn total_weight(&self, map: &RepresentativeWeightMap) -> f64 {
        map.values().map(|weight| self.to_display(*weight)).sum()
    }

    /// Sum of the weights that meet `threshold`.
    pub fn rebroadcast_weight(&self, map: &RepresentativeWeightMap, threshold: f64) -> f64 {
        self.total_weight(&self.rebroadcast_eligible(map, threshold))
    }

    /// `part / whole * 100`, or [`PERCENT_UNDEFINED`] when `whole` is not a
    /// positive finite number.
    pub fn percent_of(part: f64, whole: f64) -> f64 {
        if !whole.is_finite() || whole <= 0.0 {
            return PERCENT_UNDEFINED;
        }
        let percent = part / whole * 100.0;
        if percent.is_finite() {
            percent
        } else {
            PERCENT_UNDEFINED
        }
    }

    /// Parse a block count, treating anything that is not a base-10
    /// unsigned integer as zero.
    pub fn parse_count(count: &BlockCount) -> u64 {
        count.as_str().trim().parse::<u64>().unwrap_or(0)
    }

    /// Sum of all block counts.
    pub fn sum_parsed_counts(map: &BlockCountMap) -> u64 {
        map.values()
            .map(Self::parse_count)
            .fold(0u64, u64::saturating_add)
    }

    /// Per-type block counts, sorted by type label.
    pub fn blocks_by_type(map: &BlockCountMap) -> Vec<BlockTypeCount> {
        map.iter()
            .map(|(block_type, count)| BlockTypeCount {
                block_type: block_type.clone(),
                count: Self::parse_count(count),
            })
            .collect()
    }

    /// Peers grouped by protocol version, most common first.
    pub fn peer_versions(peers: &PeerMap) -> Vec<PeerVersionCount> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for metadata in peers.values() {
            *counts.entry(peer_version(metadata)).or_insert(0) += 1;
        }

        let mut versions: Vec<PeerVersionCount> = counts
            .into_iter()
            .map(|(version, count)| PeerVersionCount { version, count })
            .collect();
        versions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.version.cmp(&b.version)));
        versions
    }

    /// Representatives sorted by weight, heaviest first.
    pub fn representatives_by_weight(
        &self,
        map: &RepresentativeWeightMap,
    ) -> Vec<RepresentativeEntry> {
        let mut entries: Vec<RepresentativeEntry> = map
            .iter()
            .map(|(address, weight)| RepresentativeEntry {
                address: address.clone(),
                weight: self.to_display(*weight),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.address.cmp(&b.address))
        });
        entries
    }

    /// Compute every headline figure from the live feed and a snapshot.
    pub fn derive(&self, data: &NetworkData, snapshot: &NetworkSnapshot) -> DerivedMetrics {
        let online = &data.representatives_online;
        let threshold = self.rebroadcast_threshold(data.genesis_balance);
        let eligible = self.rebroadcast_eligible(online, threshold);

        let online_weight = self.total_weight(online);
        let online_rebroadcast_weight = self.total_weight(&eligible);
        let official_weight = self.total_weight(&snapshot.official_representatives);
        let circulating = self.circulating_supply(data.genesis_balance);

        DerivedMetrics {
            online_rep_count: online.len(),
            online_weight,
            percent_represented: Self::percent_of(online_weight, self.max_supply),
            official_weight,
            official_percent: Self::percent_of(official_weight, self.max_supply),
            official_online_percent: Self::percent_of(official_weight, online_weight),
            rebroadcast_threshold: threshold,
            rebroadcasting_rep_count: eligible.len(),
            online_rebroadcast_weight,
            rebroadcast_percent: Self::percent_of(online_rebroadcast_weight, circulating),
            online_rebroadcast_percent: Self::percent_of(online_rebroadcast_weight, online_weight),
            total_blocks: Self::sum_parsed_counts(&snapshot.blocks_by_type),
            peer_count: snapshot.peers.len(),
        }
    }
}

/// Version label reported by one peer's metadata.
fn peer_version(metadata: &serde_json::Value) -> String {
    use serde_json::Value;

    match metadata {
        Value::String(version) if !version.is_empty() => version.clone(),
        Value::Number(version) => version.to_string(),
        Value::Object(fields) => match fields.get("protocol_version") {
            Some(Value::String(version)) if !version.is_empty() => version.clone(),
            Some(Value::Number(version)) => version.to_string(),
            _ => UNKNOWN_VERSION.to_string(),
        },
        _ => UNKNOWN_VERSION.to_string(),
    }
}
