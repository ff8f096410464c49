//! Explorer API client.
//!
//! [`NetworkApi`] is the seam between the poller and the network: the poller
//! only needs the three counter fetches, and tests substitute their own
//! implementation. [`HttpNetworkApi`] talks to an explorer's JSON API.

use crate::config::StatusConfig;
use crate::currency::RawAmount;
use crate::error::{Result, StatusError};
use crate::types::{BlockCountMap, OfficialRepresentativeMap, PeerMap, RepresentativeWeightMap};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Block counts grouped by block type.
pub const BLOCK_COUNTS_PATH: &str = "/v2/network/block_counts_by_type";
/// Peers currently known to the node.
pub const PEERS_PATH: &str = "/v2/network/peers";
/// Curated official representatives.
pub const OFFICIAL_REPRESENTATIVES_PATH: &str = "/v2/representatives/official";
/// Representatives that voted recently.
pub const REPRESENTATIVES_ONLINE_PATH: &str = "/v2/representatives/online";
/// Remaining balance of the genesis account.
pub const GENESIS_BALANCE_PATH: &str = "/v2/network/genesis_balance";

/// Network-counter fetches polled by [`crate::poller::StatsPoller`].
///
/// Each call is independent and may fail on its own.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Block counts keyed by block type.
    async fn fetch_block_counts_by_type(&self) -> Result<BlockCountMap>;

    /// Known peers and their metadata.
    async fn fetch_peers(&self) -> Result<PeerMap>;

    /// Official representatives and their weights.
    async fn fetch_official_representatives(&self) -> Result<OfficialRepresentativeMap>;
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: RawAmount,
}

/// [`NetworkApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNetworkApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNetworkApi {
    /// Create a client for the API at `config.api_url`.
    pub fn new(config: &StatusConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Representatives currently online and their weights.
    pub async fn fetch_representatives_online(&self) -> Result<RepresentativeWeightMap> {
        self.get_json(REPRESENTATIVES_ONLINE_PATH).await
    }

    /// Balance still held by the genesis account.
    pub async fn fetch_genesis_balance(&self) -> Result<RawAmount> {
        let response: BalanceResponse = self.get_json(GENESIS_BALANCE_PATH).await?;
        Ok(response.balance)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StatusError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl NetworkApi for HttpNetworkApi {
    async fn fetch_block_counts_by_type(&self) -> Result<BlockCountMap> {
        self.get_json(BLOCK_COUNTS_PATH).await
    }

    async fn fetch_peers(&self) -> Result<PeerMap> {
        self.get_json(PEERS_PATH).await
    }

    async fn fetch_official_representatives(&self) -> Result<OfficialRepresentativeMap> {
        self.get_json(OFFICIAL_REPRESENTATIVES_PATH).await
    }
}
