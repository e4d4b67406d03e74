//! Artist identifier cache and minting.
//!
//! Identifiers are short random alphanumeric strings. They are only checked
//! for collisions against identifiers already known to the current run, so
//! they are shareable but not globally unique.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::schema::{HistoricalRecord, IdentityKey};
use crate::{HistoryError, HistoryResult};

pub const DEFAULT_ID_LENGTH: usize = 5;
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 1000;

/// What an identifier is cached against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScope {
    /// Same artist name shares one identifier across festivals and years.
    #[default]
    ArtistName,
    /// One identifier per (festival, year, artist name).
    IdentityKey,
}

/// Generates candidate identifiers with a bounded number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    pub length: usize,
    pub max_attempts: usize,
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator {
            length: DEFAULT_ID_LENGTH,
            max_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl IdGenerator {
    pub fn new(length: usize, max_attempts: usize) -> Self {
        IdGenerator {
            length,
            max_attempts,
        }
    }

    /// Draw candidates until one is not in `taken`.
    ///
    /// # Errors
    /// `IdentifierExhaustion` once `max_attempts` candidates all collided.
    pub fn mint<R: Rng>(&self, taken: &HashSet<String>, rng: &mut R) -> HistoryResult<String> {
        if self.length == 0 {
            return Err(HistoryError::Message(
                "artist identifier length must be at least 1".to_string(),
            ));
        }
        for _ in 0..self.max_attempts {
            let candidate: String = (0..self.length)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(HistoryError::IdentifierExhaustion {
            attempts: self.max_attempts,
        })
    }
}

/// Identifiers assigned so far in one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct IdCache {
    scope: IdScope,
    by_key: HashMap<String, String>,
    assigned: HashSet<String>,
}

impl IdCache {
    pub fn new(scope: IdScope) -> Self {
        IdCache {
            scope,
            by_key: HashMap::new(),
            assigned: HashSet::new(),
        }
    }

    /// Build a cache from every record that already carries an identifier.
    ///
    /// The first identifier seen for a cache key wins.
    pub fn seeded(scope: IdScope, records: &[HistoricalRecord]) -> Self {
        let mut cache = IdCache::new(scope);
        for record in records {
            if let Some(id) = &record.artist.artist_id {
                cache.remember(&record.identity_key(), id);
            }
        }
        cache
    }

    pub fn scope(&self) -> IdScope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn cache_key(&self, key: &IdentityKey) -> String {
        match self.scope {
            IdScope::ArtistName => key.artist_name.clone(),
            IdScope::IdentityKey => key.to_string(),
        }
    }

    pub fn lookup(&self, key: &IdentityKey) -> Option<&str> {
        self.by_key.get(&self.cache_key(key)).map(String::as_str)
    }

    /// Record `id` for `key` unless the key already has one.
    pub fn remember(&mut self, key: &IdentityKey, id: &str) {
        let cache_key = self.cache_key(key);
        if !self.by_key.contains_key(&cache_key) {
            self.by_key.insert(cache_key, id.to_string());
        }
        self.assigned.insert(id.to_string());
    }

    /// Identifier for `key`: cached value, else `proposed` when still free,
    /// else a fresh one.
    pub fn assign<R: Rng>(
        &mut self,
        key: &IdentityKey,
        proposed: Option<&str>,
        generator: &IdGenerator,
        rng: &mut R,
    ) -> HistoryResult<String> {
        if let Some(id) = self.lookup(key) {
            return Ok(id.to_string());
        }
        // A supplied identifier is only adopted while no other artist holds it.
        let id = match proposed {
            Some(id) if !id.is_empty() && !self.assigned.contains(id) => id.to_string(),
            _ => {
                let minted = generator.mint(&self.assigned, rng)?;
                debug!(artist = %key.artist_name, id = %minted, "minted artist identifier");
                minted
            }
        };
        self.remember(key, &id);
        Ok(id)
    }
}
