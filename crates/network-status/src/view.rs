//! Composition of the live feed and the polled snapshot into a report.
//!
//! [`StatusView`] holds nothing but the two latest-value receivers and the
//! static configuration. Every call to [`StatusView::render`] recomputes the
//! whole report from whatever the feed and the poller last published; the
//! two sources are not synchronized, so a one-cycle skew between them is
//! expected.

use crate::config::StatusConfig;
use crate::metrics::{
    BlockTypeCount, DerivedMetrics, MetricMath, PeerVersionCount, RepresentativeEntry,
};
use crate::types::{NetworkData, NetworkSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Headline figures
    pub metrics: DerivedMetrics,
    /// Peers grouped by protocol version
    pub peer_versions: Vec<PeerVersionCount>,
    /// Parsed block counts per type
    pub blocks_by_type: Vec<BlockTypeCount>,
    /// Online representatives, heaviest first
    pub representatives: Vec<RepresentativeEntry>,
    /// Currency ticker
    pub currency_short_name: String,
    /// Poll cycle the counters come from (0 before the first cycle)
    pub snapshot_cycle: u64,
    /// When the counters were fetched
    pub fetched_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    /// Build a report from one feed value and one snapshot.
    pub fn compose(
        math: &MetricMath,
        currency_short_name: &str,
        data: &NetworkData,
        snapshot: &NetworkSnapshot,
    ) -> Self {
        Self {
            metrics: math.derive(data, snapshot),
            peer_versions: MetricMath::peer_versions(&snapshot.peers),
            blocks_by_type: MetricMath::blocks_by_type(&snapshot.blocks_by_type),
            representatives: math.representatives_by_weight(&data.representatives_online),
            currency_short_name: currency_short_name.to_string(),
            snapshot_cycle: snapshot.cycle,
            fetched_at: snapshot.fetched_at,
        }
    }

    /// Seconds since the counters were fetched, if they ever were.
    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.fetched_at
            .map(|fetched| u64::try_from((now - fetched).num_seconds()).unwrap_or(0))
    }
}

/// Reads the feed and the poller snapshot and renders reports.
pub struct StatusView {
    math: MetricMath,
    currency_short_name: String,
    feed: watch::Receiver<NetworkData>,
    snapshots: watch::Receiver<Arc<NetworkSnapshot>>,
}

impl StatusView {
    /// Create a view over the given sources.
    pub fn new(
        config: &StatusConfig,
        feed: watch::Receiver<NetworkData>,
        snapshots: watch::Receiver<Arc<NetworkSnapshot>>,
    ) -> Self {
        Self {
            math: MetricMath::new(config),
            currency_short_name: config.currency.short_name.clone(),
            feed,
            snapshots,
        }
    }

    /// Compute a report from the latest values of both sources.
    pub fn render(&mut self) -> StatusReport {
        let snapshot = self.snapshots.borrow_and_update().clone();
        let data = self.feed.borrow_and_update().clone();
        StatusReport::compose(&self.math, &self.currency_short_name, &data, &snapshot)
    }

    /// Wait until either source publishes a new value.
    ///
    /// Returns `false` once both sources have shut down.
    pub async fn changed(&mut self) -> bool {
        loop {
            let feed_open = self.feed.has_changed().is_ok();
            let snapshots_open = self.snapshots.has_changed().is_ok();

            let result = match (feed_open, snapshots_open) {
                (true, true) => tokio::select! {
                    r = self.feed.changed() => r,
                    r = self.snapshots.changed() => r,
                },
                (true, false) => self.feed.changed().await,
                (false, true) => self.snapshots.changed().await,
                (false, false) => return false,
            };

            if result.is_ok() {
                return true;
            }
        }
    }

    /// Wait until the poller has completed a cycle and the feed holds
    /// representatives. Returns `false` if a source shuts down first.
    pub async fn wait_for_data(&mut self) -> bool {
        let have_snapshot = !self.snapshots.borrow().is_placeholder();
        if !have_snapshot && self.snapshots.changed().await.is_err() {
            return false;
        }

        let have_feed = !self.feed.borrow().representatives_online.is_empty();
        if !have_feed && self.feed.changed().await.is_err() {
            return false;
        }

        true
    }
}
