//! Self-scheduling network counter poller.
//!
//! # Cycle
//!
//! ```text
//!   start() ──▶ Fetching ──(all three resolve)──▶ Idle ──(interval)──▶ Fetching ...
//!                  │                               │
//!                  └────────── stop() ─────────────┴──▶ Stopped
//! ```
//!
//! - The first cycle runs immediately. Each following cycle starts
//!   `poll_interval` after the previous one *finished*, so a slow API delays
//!   the schedule instead of stacking requests.
//! - The three fetches run concurrently and the cycle waits for all of them.
//!   The snapshot is replaced only if every fetch succeeded; a single failure
//!   keeps the previous snapshot and the next cycle retries on schedule.
//! - `stop()` cancels the pending timer. A fetch already in flight is left to
//!   finish, but its result is dropped.

use crate::client::NetworkApi;
use crate::config::StatusConfig;
use crate::error::Result;
use crate::types::{BlockCountMap, NetworkSnapshot, OfficialRepresentativeMap, PeerMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle state of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollerState {
    /// Waiting for the next cycle
    Idle,
    /// Fetches in flight
    Fetching,
    /// Torn down; no further fetches will be issued
    Stopped,
}

/// Polls the three network counters on a fixed cadence.
pub struct StatsPoller {
    api: Arc<dyn NetworkApi>,
    interval: Duration,
}

impl StatsPoller {
    /// Create a poller using `config.poll_interval`.
    pub fn new(api: Arc<dyn NetworkApi>, config: &StatusConfig) -> Self {
        Self::with_interval(api, config.poll_interval)
    }

    /// Create a poller with an explicit interval.
    pub fn with_interval(api: Arc<dyn NetworkApi>, interval: Duration) -> Self {
        Self { api, interval }
    }

    /// Spawn the polling loop on the current tokio runtime.
    ///
    /// The loop runs until [`PollerHandle::stop`] is called or the handle is
    /// dropped.
    pub fn start(self) -> PollerHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(NetworkSnapshot::default()));
        let (state_tx, state_rx) = watch::channel(PollerState::Fetching);
        let token = CancellationToken::new();

        let task = tokio::spawn(poll_loop(
            self.api,
            self.interval,
            snapshot_tx,
            state_tx,
            token.clone(),
        ));

        PollerHandle {
            snapshot_rx,
            state_rx,
            token,
            task: Some(task),
        }
    }
}

/// Owner-side handle of a running poller.
///
/// Dropping the handle stops the poller.
pub struct PollerHandle {
    snapshot_rx: watch::Receiver<Arc<NetworkSnapshot>>,
    state_rx: watch::Receiver<PollerState>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<NetworkSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified each time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<NetworkSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        if self.token.is_cancelled() {
            PollerState::Stopped
        } else {
            *self.state_rx.borrow()
        }
    }

    /// Token cancelled on teardown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Tear the poller down. Idempotent.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            info!("Stopping stats poller");
            self.token.cancel();
        }
    }

    /// Stop the poller and wait for its task to exit.
    ///
    /// Waits for any in-flight fetch to resolve.
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Stats poller task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn poll_loop(
    api: Arc<dyn NetworkApi>,
    interval: Duration,
    snapshot_tx: watch::Sender<Arc<NetworkSnapshot>>,
    state_tx: watch::Sender<PollerState>,
    token: CancellationToken,
) {
    info!("Stats poller started (interval {:?})", interval);
    let mut cycle: u64 = 0;

    while !token.is_cancelled() {
        state_tx.send_replace(PollerState::Fetching);

        match fetch_counters(api.as_ref()).await {
            Ok((blocks_by_type, peers, official_representatives)) => {
                let snapshot = Arc::new(NetworkSnapshot {
                    blocks_by_type,
                    peers,
                    official_representatives,
                    cycle: cycle + 1,
                    fetched_at: Some(Utc::now()),
                });

                // Checked under the channel lock so nothing lands after stop()
                let published = snapshot_tx.send_if_modified(|current| {
                    if token.is_cancelled() {
                        return false;
                    }
                    *current = snapshot;
                    true
                });

                if published {
                    cycle += 1;
                    debug!("Published network snapshot for cycle {}", cycle);
                } else {
                    debug!("Poller stopped during fetch, discarding result");
                    break;
                }
            }
            Err(e) => {
                warn!("Stats poll failed, keeping previous snapshot: {}", e);
            }
        }

        state_tx.send_replace(PollerState::Idle);

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    state_tx.send_replace(PollerState::Stopped);
    info!("Stats poller stopped after {} successful cycles", cycle);
}

/// Run the three fetches concurrently and wait for all of them.
async fn fetch_counters(
    api: &dyn NetworkApi,
) -> Result<(BlockCountMap, PeerMap, OfficialRepresentativeMap)> {
    let (blocks, peers, official) = tokio::join!(
        api.fetch_block_counts_by_type(),
        api.fetch_peers(),
        api.fetch_official_representatives(),
    );

    Ok((blocks?, peers?, official?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RawAmount;
    use crate::error::StatusError;
    use crate::types::BlockCount;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(10);

    /// Counter API whose payloads are tagged with the call number, so a
    /// snapshot mixing two cycles is detectable.
    #[derive(Default)]
    struct MockApi {
        block_calls: AtomicUsize,
        peer_calls: AtomicUsize,
        official_calls: AtomicUsize,
        fail_peers: AtomicBool,
        official_delay: Option<Duration>,
    }

    impl MockApi {
        fn with_official_delay(delay: Duration) -> Self {
            Self {
                official_delay: Some(delay),
                ..Default::default()
            }
        }

        fn calls(&self) -> [usize; 3] {
            [
                self.block_calls.load(Ordering::SeqCst),
                self.peer_calls.load(Ordering::SeqCst),
                self.official_calls.load(Ordering::SeqCst),
            ]
        }
    }

    #[async_trait]
    impl NetworkApi for MockApi {
        async fn fetch_block_counts_by_type(&self) -> Result<BlockCountMap> {
            let n = self.block_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok([("send".to_string(), BlockCount::from(n as u64))]
                .into_iter()
                .collect())
        }

        async fn fetch_peers(&self) -> Result<PeerMap> {
            let n = self.peer_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_peers.load(Ordering::SeqCst) {
                return Err(StatusError::UnexpectedStatus {
                    endpoint: "/peers".to_string(),
                    status: 500,
                });
            }
            Ok([(format!("peer-{n}"), json!("18"))].into_iter().collect())
        }

        async fn fetch_official_representatives(&self) -> Result<OfficialRepresentativeMap> {
            let n = self.official_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.official_delay {
                tokio::time::sleep(delay).await;
            }
            Ok([(format!("rep-{n}"), RawAmount(n as u128))]
                .into_iter()
                .collect())
        }
    }

    fn assert_single_cycle(snapshot: &NetworkSnapshot) {
        let n = snapshot.blocks_by_type["send"].clone();
        assert!(snapshot.peers.contains_key(&format!("peer-{n}")));
        assert!(
            snapshot
                .official_representatives
                .contains_key(&format!("rep-{n}"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        assert!(handle.snapshot().is_placeholder());

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.cycle, 1);
        assert!(snapshot.fetched_at.is_some());
        assert_single_cycle(&snapshot);
        assert_eq!(api.calls(), [1, 1, 1]);

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_repeat_on_interval() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        handle.subscribe().changed().await.unwrap();

        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(1)).await;
        assert_eq!(api.calls(), [4, 4, 4]);
        assert_eq!(handle.snapshot().cycle, 4);
        assert_eq!(handle.state(), PollerState::Idle);

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_snapshot_and_retries_once() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        handle.subscribe().changed().await.unwrap();
        let before = handle.snapshot();

        api.fail_peers.store(true, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;

        // All three were attempted, none applied
        assert_eq!(api.calls(), [2, 2, 2]);
        assert!(Arc::ptr_eq(&before, &handle.snapshot()));

        api.fail_peers.store(false, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL).await;

        // Exactly one retry, no duplicate timer
        assert_eq!(api.calls(), [3, 3, 3]);
        let after = handle.snapshot();
        assert_eq!(after.cycle, 2);
        assert_single_cycle(&after);

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_timer() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        handle.subscribe().changed().await.unwrap();

        handle.stop();
        assert_eq!(handle.state(), PollerState::Stopped);
        assert!(handle.cancellation_token().is_cancelled());

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(api.calls(), [1, 1, 1]);

        handle.stop();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_after_stop() {
        let api = Arc::new(MockApi::with_official_delay(Duration::from_secs(5)));
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state(), PollerState::Fetching);
        handle.stop();

        tokio::time::sleep(INTERVAL * 2).await;
        assert!(handle.snapshot().is_placeholder());
        assert_eq!(api.calls(), [1, 1, 1]);

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_delays_next_cycle() {
        let api = Arc::new(MockApi::with_official_delay(Duration::from_secs(5)));
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();

        // Cycle 1 finishes at 5s, so cycle 2 starts at 15s rather than 10s
        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(api.calls(), [1, 1, 1]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.calls(), [2, 2, 2]);

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_fields_come_from_one_cycle() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        let mut rx = handle.subscribe();

        for expected_cycle in 1..=5u64 {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            assert_eq!(snapshot.cycle, expected_cycle);
            assert_single_cycle(&snapshot);
        }

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_poller() {
        let api = Arc::new(MockApi::default());
        let handle = StatsPoller::with_interval(api.clone(), INTERVAL).start();
        let token = handle.cancellation_token();
        handle.subscribe().changed().await.unwrap();

        drop(handle);
        assert!(token.is_cancelled());

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(api.calls(), [1, 1, 1]);
    }
}
