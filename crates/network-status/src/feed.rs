//! Live representative feed.
//!
//! The status view never polls for online representatives itself; it reads
//! whatever value was last pushed into a [`RepresentativeFeed`]. Values can be
//! pushed by any subscription mechanism through [`RepresentativeFeed::publish`],
//! or the feed can refresh itself from the explorer API with
//! [`RepresentativeFeed::spawn_polling`].

use crate::client::HttpNetworkApi;
use crate::error::Result;
use crate::types::NetworkData;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Source of [`NetworkData`] for a self-refreshing feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current online representatives and genesis balance.
    async fn fetch_network_data(&self) -> Result<NetworkData>;
}

#[async_trait]
impl FeedSource for HttpNetworkApi {
    async fn fetch_network_data(&self) -> Result<NetworkData> {
        let (representatives_online, genesis_balance) = tokio::try_join!(
            self.fetch_representatives_online(),
            self.fetch_genesis_balance(),
        )?;

        Ok(NetworkData {
            representatives_online,
            genesis_balance,
        })
    }
}

/// Latest-value channel for the online representative feed.
pub struct RepresentativeFeed {
    tx: watch::Sender<NetworkData>,
}

impl RepresentativeFeed {
    /// Create a feed holding empty data.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(NetworkData::default());
        Self { tx }
    }

    /// Receiver for readers of the feed.
    pub fn subscribe(&self) -> watch::Receiver<NetworkData> {
        self.tx.subscribe()
    }

    /// Replace the current value.
    pub fn publish(&self, data: NetworkData) {
        debug!(
            "Representative feed updated: {} online",
            data.representatives_online.len()
        );
        self.tx.send_replace(data);
    }

    /// Refresh the feed from `source` every `interval` until `token` is
    /// cancelled. A failed refresh keeps the previous value.
    pub fn spawn_polling(
        self,
        source: Arc<dyn FeedSource>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Representative feed refreshing every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match source.fetch_network_data().await {
                    Ok(data) if !token.is_cancelled() => self.publish(data),
                    Ok(_) => break,
                    Err(e) => warn!("Representative feed refresh failed: {}", e),
                }
            }

            info!("Representative feed stopped");
        })
    }
}

impl Default for RepresentativeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RawAmount;
    use crate::error::StatusError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every other call, starting with the second.
    #[derive(Default)]
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for FlakySource {
        async fn fetch_network_data(&self) -> Result<NetworkData> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n % 2 == 0 {
                return Err(StatusError::UnexpectedStatus {
                    endpoint: "/online".to_string(),
                    status: 502,
                });
            }
            Ok(NetworkData {
                representatives_online: [(format!("rep-{n}"), RawAmount(n as u128))]
                    .into_iter()
                    .collect(),
                genesis_balance: RawAmount(7),
            })
        }
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let feed = RepresentativeFeed::new();
        let rx = feed.subscribe();
        assert!(rx.borrow().representatives_online.is_empty());

        feed.publish(NetworkData {
            genesis_balance: RawAmount(42),
            ..Default::default()
        });
        assert_eq!(rx.borrow().genesis_balance, RawAmount(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_keeps_value_on_failure() {
        let source = Arc::new(FlakySource::default());
        let feed = RepresentativeFeed::new();
        let mut rx = feed.subscribe();
        let token = CancellationToken::new();
        let task = feed.spawn_polling(source.clone(), Duration::from_secs(10), token.clone());

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().representatives_online.contains_key("rep-1"));

        // Second refresh fails; the first value stays
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(!rx.has_changed().unwrap());
        assert!(rx.borrow().representatives_online.contains_key("rep-1"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.borrow().representatives_online.contains_key("rep-3"));

        token.cancel();
        task.await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }
}
