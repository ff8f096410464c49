//! Static configuration for the monitor.
//!
//! Loaded once at process start (from an optional YAML file, then CLI
//! overrides) and shared immutably as `Arc<StatusConfig>` afterwards.
//!
//! ```yaml
//! api_url: https://api.nanocrawler.cc
//! poll_interval: 10s
//! feed_interval: 10s
//! request_timeout: 10s
//! currency:
//!   short_name: NANO
//!   max_supply: 133248297
//!   unit_decimals: 30
//! ```

use crate::currency::Currency;
use crate::error::{Result, StatusError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fraction of circulating supply a representative must hold for its votes
/// to be rebroadcast by the network.
pub const REBROADCAST_RATIO: f64 = 0.001;

/// Default explorer API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.nanocrawler.cc";

/// Currency parameters of the monitored network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Ticker shown next to amounts
    pub short_name: String,
    /// Theoretical maximum supply, in display units
    pub max_supply: u64,
    /// Raw decimals per display unit
    pub unit_decimals: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            short_name: "NANO".to_string(),
            max_supply: 133_248_297,
            unit_decimals: 30,
        }
    }
}

/// Top-level monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Base URL of the explorer API
    pub api_url: String,
    /// Delay between the end of one poll cycle and the start of the next
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Refresh interval of the online representative feed
    #[serde(with = "humantime_serde")]
    pub feed_interval: Duration,
    /// Per-request HTTP timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Currency parameters
    pub currency: CurrencyConfig,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            feed_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            currency: CurrencyConfig::default(),
        }
    }
}

impl StatusConfig {
    /// Load configuration from a YAML file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text and validate it.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: StatusConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(StatusError::InvalidConfig("api_url is empty".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(StatusError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(StatusError::InvalidConfig(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.feed_interval.is_zero() {
            return Err(StatusError::InvalidConfig(
                "feed_interval must be greater than zero".to_string(),
            ));
        }
        // 10^39 overflows u128
        if self.currency.unit_decimals > 38 {
            return Err(StatusError::InvalidConfig(format!(
                "unit_decimals {} exceeds 38",
                self.currency.unit_decimals
            )));
        }
        Ok(())
    }

    /// Raw → display converter for this network.
    pub fn currency(&self) -> Currency {
        Currency::new(self.currency.unit_decimals)
    }

    /// Rebroadcast ratio (fixed).
    pub fn rebroadcast_ratio(&self) -> f64 {
        REBROADCAST_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StatusConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.currency.short_name, "NANO");
        assert_eq!(config.rebroadcast_ratio(), 0.001);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = StatusConfig::from_yaml(
            "api_url: http://localhost:3000\npoll_interval: 2s 500ms\ncurrency:\n  short_name: XNO\n",
        )
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.poll_interval, Duration::from_millis(2500));
        assert_eq!(config.feed_interval, Duration::from_secs(10));
        assert_eq!(config.currency.short_name, "XNO");
        assert_eq!(config.currency.max_supply, 133_248_297);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = StatusConfig::from_yaml("poll_interval: 0s\n").unwrap_err();
        assert!(matches!(err, StatusError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_request_timeout() {
        let err = StatusConfig::from_yaml("request_timeout: 0s\n").unwrap_err();
        assert!(matches!(err, StatusError::InvalidConfig(msg) if msg.contains("request_timeout")));
    }

    #[test]
    fn test_rejects_oversized_decimals() {
        let err = StatusConfig::from_yaml("currency:\n  unit_decimals: 39\n").unwrap_err();
        assert!(matches!(err, StatusError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = StatusConfig::from_yaml("poll_interval: [not, a, duration]\n").unwrap_err();
        assert!(matches!(err, StatusError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url: http://127.0.0.1:8080").unwrap();
        writeln!(file, "request_timeout: 3s").unwrap();

        let config = StatusConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StatusConfig::from_file(Path::new("/nonexistent/network-status.yaml"))
            .unwrap_err();
        assert!(matches!(err, StatusError::Io(_)));
    }
}
