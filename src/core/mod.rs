//! Core types for lineup history.
//!
//! Snapshots are the scraper's output; historical records are the type 2
//! history derived from them.

pub mod schema;

// Re-export key types for convenience
pub use schema::{
    ArtistObservation, HistoricalRecord, IdentityKey, OtherData, Snapshot, SocialLinks,
};
