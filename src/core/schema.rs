//! Lineup snapshot and history record schema.
//!
//! Field names match the JSON documents written by the scraper scripts, so
//! existing `lineups.json` / `lineups_historical.json` files load unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{HistoryError, HistoryResult};

/// Platform name -> URL.
pub type SocialLinks = BTreeMap<String, String>;

/// Free-form per-festival extras.
pub type OtherData = BTreeMap<String, Value>;

/// One artist as seen in a single scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ArtistObservation {
    pub artist_name: String,

    /// Stable short identifier; assigned during reconciliation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_short: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_long: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_data: Option<OtherData>,
}

impl ArtistObservation {
    pub fn new(artist_name: impl Into<String>) -> Self {
        ArtistObservation {
            artist_name: artist_name.into(),
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage_name: impl Into<String>) -> Self {
        self.stage_name = Some(stage_name.into());
        self
    }

    pub fn with_id(mut self, artist_id: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id.into());
        self
    }

    pub fn validate(&self) -> HistoryResult<()> {
        if self.artist_name.trim().is_empty() {
            return Err(HistoryError::Validation(
                "artist observation is missing artist_name".to_string(),
            ));
        }
        Ok(())
    }

    /// Structural comparison of every tracked attribute.
    ///
    /// `artist_id` is bookkeeping and never counts as a change.
    pub fn same_attributes(&self, other: &ArtistObservation) -> bool {
        self.artist_name == other.artist_name
            && self.stage_name == other.stage_name
            && self.start_ts == other.start_ts
            && self.end_ts == other.end_ts
            && self.social_links == other.social_links
            && self.bio_short == other.bio_short
            && self.bio_long == other.bio_long
            && self.country_code == other.country_code
            && self.scrape_url == other.scrape_url
            && self.other_data == other.other_data
    }
}

/// One scrape of a festival lineup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub festival_name: String,
    pub festival_year: i32,
    /// ISO 8601 scrape time; snapshots are ordered by comparing these strings.
    pub scrape_ts: String,
    pub artists: Vec<ArtistObservation>,
}

impl Snapshot {
    pub fn new(
        festival_name: impl Into<String>,
        festival_year: i32,
        scrape_ts: impl Into<String>,
        artists: Vec<ArtistObservation>,
    ) -> Self {
        Snapshot {
            festival_name: festival_name.into(),
            festival_year,
            scrape_ts: scrape_ts.into(),
            artists,
        }
    }

    pub fn validate(&self) -> HistoryResult<()> {
        if self.festival_name.trim().is_empty() {
            return Err(HistoryError::Validation(format!(
                "snapshot at '{}' is missing festival_name",
                self.scrape_ts
            )));
        }
        if self.scrape_ts.trim().is_empty() {
            return Err(HistoryError::Validation(format!(
                "snapshot for {} {} is missing scrape_ts",
                self.festival_name, self.festival_year
            )));
        }
        for (i, artist) in self.artists.iter().enumerate() {
            artist.validate().map_err(|e| {
                HistoryError::Validation(format!(
                    "snapshot {} {} at '{}', artist #{}: {e}",
                    self.festival_name, self.festival_year, self.scrape_ts, i
                ))
            })?;
        }
        Ok(())
    }

    pub fn identity_key(&self, artist: &ArtistObservation) -> IdentityKey {
        IdentityKey::new(&self.festival_name, self.festival_year, &artist.artist_name)
    }
}

/// Identity of an artist-run across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub festival_name: String,
    pub festival_year: i32,
    pub artist_name: String,
}

impl IdentityKey {
    pub fn new(festival_name: &str, festival_year: i32, artist_name: &str) -> Self {
        IdentityKey {
            festival_name: festival_name.to_string(),
            festival_year,
            artist_name: artist_name.to_string(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.festival_name, self.festival_year, self.artist_name
        )
    }
}

/// One version of an artist's attributes with its validity interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalRecord {
    #[serde(flatten)]
    pub artist: ArtistObservation,

    pub festival_name: String,

    pub festival_year: i32,

    #[serde(rename = "_valid_from")]
    pub valid_from: String,

    /// `null` while the version is open. The key itself must be present.
    #[serde(rename = "_valid_to", deserialize_with = "Option::deserialize")]
    pub valid_to: Option<String>,

    #[serde(rename = "_is_current")]
    pub is_current: bool,
}

impl HistoricalRecord {
    /// Create an open (current) record.
    pub fn open(
        artist: ArtistObservation,
        festival_name: impl Into<String>,
        festival_year: i32,
        valid_from: impl Into<String>,
    ) -> Self {
        HistoricalRecord {
            artist,
            festival_name: festival_name.into(),
            festival_year,
            valid_from: valid_from.into(),
            valid_to: None,
            is_current: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Copy of this record closed at `ts`.
    pub fn closed_at(&self, ts: &str) -> Self {
        HistoricalRecord {
            valid_to: Some(ts.to_string()),
            is_current: false,
            ..self.clone()
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(
            &self.festival_name,
            self.festival_year,
            &self.artist.artist_name,
        )
    }
}
