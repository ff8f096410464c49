//! Ledger Network Status Monitor
//!
//! This crate watches a block-lattice ledger network through an explorer
//! API and reports its health:
//!
//! - **Representatives**: how much voting power is online, and how much of it
//!   is large enough to rebroadcast votes
//! - **Peers**: connected peers grouped by protocol version
//! - **Blocks**: confirmed block counts by type
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           Explorer API                               │
//! └──────────┬───────────────────────────────────────────┬───────────────┘
//!            │ reps online, genesis balance              │ blocks, peers, official reps
//!            ▼                                           ▼
//!   ┌──────────────────┐                        ┌──────────────────┐
//!   │ RepresentativeFeed│                       │   StatsPoller    │
//!   │  (watch channel) │                        │ (watch channel)  │
//!   └────────┬─────────┘                        └────────┬─────────┘
//!            │ NetworkData                               │ Arc<NetworkSnapshot>
//!            └──────────────────┬────────────────────────┘
//!                               ▼
//!                      ┌──────────────────┐
//!                      │    StatusView    │── MetricMath ──► StatusReport
//!                      └────────┬─────────┘
//!                               ▼
//!                     TUI / JSON log / one-shot print
//! ```
//!
//! # Usage
//!
//! ```bash
//! network-status                         # live terminal UI
//! network-status --quiet                 # log a JSON report on every change
//! network-status --once > status.json    # fetch once and print
//! ```

pub mod client;
pub mod config;
pub mod currency;
pub mod error;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod tui;
pub mod types;
pub mod view;

pub use client::{HttpNetworkApi, NetworkApi};
pub use config::{CurrencyConfig, StatusConfig};
pub use currency::{Currency, RawAmount};
pub use error::{Result, StatusError};
pub use feed::{FeedSource, RepresentativeFeed};
pub use metrics::{DerivedMetrics, MetricMath};
pub use poller::{PollerHandle, PollerState, StatsPoller};
pub use types::{NetworkData, NetworkSnapshot};
pub use view::{StatusReport, StatusView};
