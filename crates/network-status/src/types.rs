//! Data model shared by the poller, the metric layer and the renderers.

use crate::currency::RawAmount;
use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Representative address → voting weight in raw units.
pub type RepresentativeWeightMap = BTreeMap<String, RawAmount>;

/// Curated subset of representatives, same shape as [`RepresentativeWeightMap`].
pub type OfficialRepresentativeMap = BTreeMap<String, RawAmount>;

/// Block type label → count, as the API sends it.
pub type BlockCountMap = BTreeMap<String, BlockCount>;

/// Peer identifier → opaque peer metadata.
pub type PeerMap = BTreeMap<String, serde_json::Value>;

/// Network counters captured by one poll cycle.
///
/// A snapshot is never mutated after publication; each successful cycle
/// publishes a fresh one, so the three maps always come from the same cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Block counts by type
    pub blocks_by_type: BlockCountMap,
    /// Known peers
    pub peers: PeerMap,
    /// Official representatives and their weights
    pub official_representatives: OfficialRepresentativeMap,
    /// Successful cycle that produced this snapshot (0 = startup placeholder)
    pub cycle: u64,
    /// When the cycle completed (`None` for the startup placeholder)
    pub fetched_at: Option<DateTime<Utc>>,
}

impl NetworkSnapshot {
    /// Whether this is the empty placeholder published before the first cycle.
    pub fn is_placeholder(&self) -> bool {
        self.cycle == 0
    }
}

/// Latest value of the live representative feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    /// Representatives currently online and their weights
    pub representatives_online: RepresentativeWeightMap,
    /// Balance still held by the genesis account, in raw units
    pub genesis_balance: RawAmount,
}

/// One block count as received, kept unparsed.
///
/// The API normally sends decimal strings but also JSON numbers. Numbers are
/// stored in decimal form; `null`, booleans and nested values are stored as
/// an empty string, which counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlockCount(String);

impl BlockCount {
    /// The count text as received.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockCount {
    fn from(s: &str) -> Self {
        BlockCount(s.to_string())
    }
}

impl From<String> for BlockCount {
    fn from(s: String) -> Self {
        BlockCount(s)
    }
}

impl From<u64> for BlockCount {
    fn from(v: u64) -> Self {
        BlockCount(v.to_string())
    }
}

impl fmt::Display for BlockCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct BlockCountVisitor;

impl<'de> Visitor<'de> for BlockCountVisitor {
    type Value = BlockCount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a block count as a decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BlockCount, E> {
        Ok(BlockCount::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<BlockCount, E> {
        Ok(BlockCount::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BlockCount, E> {
        Ok(BlockCount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BlockCount, E> {
        Ok(BlockCount(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BlockCount, E> {
        // Leading integer digits only, like the decimal strings
        if v.is_finite() && v >= 0.0 {
            Ok(BlockCount(format!("{}", v.trunc())))
        } else {
            Ok(BlockCount::default())
        }
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<BlockCount, E> {
        Ok(BlockCount::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<BlockCount, E> {
        Ok(BlockCount::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<BlockCount, E> {
        Ok(BlockCount::default())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<BlockCount, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(BlockCount::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BlockCount, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(BlockCount::default())
    }
}

impl<'de> Deserialize<'de> for BlockCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BlockCountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_counts_accept_strings_and_numbers() {
        let counts: BlockCountMap =
            serde_json::from_str(r#"{"send": 10, "receive": "5", "state": 7.0}"#).unwrap();
        assert_eq!(counts["send"].as_str(), "10");
        assert_eq!(counts["receive"].as_str(), "5");
        assert_eq!(counts["state"].as_str(), "7");
    }

    #[test]
    fn test_block_counts_malformed_values_are_empty() {
        let counts: BlockCountMap = serde_json::from_str(
            r#"{"change": null, "open": true, "epoch": [1, 2], "other": {"n": 1}}"#,
        )
        .unwrap();
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|count| count.as_str().is_empty()));
    }

    #[test]
    fn test_block_count_serializes_as_string() {
        let json = serde_json::to_string(&BlockCount::from(42u64)).unwrap();
        assert_eq!(json, "\"42\"");
    }
}
