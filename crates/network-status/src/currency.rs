//! Raw-unit amounts and conversion into display units.
//!
//! Ledger balances and voting weights travel as raw integers far larger than
//! `u64` (one display unit is `10^30` raw on the main network), usually as
//! decimal strings. The explorer API is not always consistent about that, so
//! [`RawAmount`] accepts strings and JSON numbers alike.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// A non-negative amount in raw base units.
///
/// Deserialization is lenient: a malformed or negative value becomes zero
/// instead of failing the whole response, so a single bad entry from the
/// upstream feed cannot blank the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawAmount(pub u128);

impl RawAmount {
    /// Zero raw.
    pub const ZERO: RawAmount = RawAmount(0);

    /// Parse a decimal string, substituting zero when it is not a valid
    /// non-negative integer.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().parse::<u128>() {
            Ok(v) => RawAmount(v),
            Err(_) => {
                debug!("Malformed raw amount {:?}, treating as zero", s);
                RawAmount::ZERO
            }
        }
    }

    /// Inner raw value.
    pub fn raw(self) -> u128 {
        self.0
    }
}

impl From<u128> for RawAmount {
    fn from(v: u128) -> Self {
        RawAmount(v)
    }
}

impl From<u64> for RawAmount {
    fn from(v: u64) -> Self {
        RawAmount(u128::from(v))
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct RawAmountVisitor;

impl Visitor<'_> for RawAmountVisitor {
    type Value = RawAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a raw amount as a decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawAmount, E> {
        Ok(RawAmount::parse_lenient(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawAmount, E> {
        Ok(RawAmount::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<RawAmount, E> {
        Ok(RawAmount(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawAmount, E> {
        Ok(u64::try_from(v).map(RawAmount::from).unwrap_or_default())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawAmount, E> {
        if v.is_finite() && v >= 0.0 {
            Ok(RawAmount(v as u128))
        } else {
            Ok(RawAmount::ZERO)
        }
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<RawAmount, E> {
        Ok(RawAmount::ZERO)
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawAmount, E> {
        Ok(RawAmount::ZERO)
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawAmountVisitor)
    }
}

/// Converts raw amounts into display units (`raw / 10^unit_decimals`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    unit_decimals: u32,
}

impl Currency {
    /// Create a converter for the given number of raw decimals per unit.
    pub fn new(unit_decimals: u32) -> Self {
        Self { unit_decimals }
    }

    /// Convert a raw amount into display units.
    ///
    /// Integer and fractional parts are converted separately so that large
    /// balances keep their whole-unit precision.
    pub fn from_raw(&self, amount: RawAmount) -> f64 {
        let factor = 10u128.saturating_pow(self.unit_decimals);
        let whole = amount.0 / factor;
        let frac = amount.0 % factor;
        whole as f64 + frac as f64 / factor as f64
    }
}
