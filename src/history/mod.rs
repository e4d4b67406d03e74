//! Type 2 history of lineup snapshots.
//!
//! `reconcile` replays scrapes over a previously generated history. Artist
//! identifiers are assigned along the way and stay stable across runs.

pub mod ids;
pub mod reconcile;
pub mod stats;

pub use ids::{DEFAULT_ID_LENGTH, DEFAULT_MAX_ID_ATTEMPTS, IdCache, IdGenerator, IdScope};
pub use reconcile::{
    ReconcileOptions, ValidFromPolicy, history_watermark, pending_snapshots, reconcile,
    reconcile_with,
};
pub use stats::HistoryStats;
