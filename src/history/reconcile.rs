//! Snapshot-to-history reconciliation.
//!
//! Replays lineup snapshots in scrape order against an existing history and
//! returns the updated type 2 history. Every identity key owns a chain of
//! records; only the last record of a chain may be open.

use std::collections::{BTreeSet, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ids::{DEFAULT_ID_LENGTH, DEFAULT_MAX_ID_ATTEMPTS, IdCache, IdGenerator, IdScope};
use crate::HistoryResult;
use crate::core::schema::{ArtistObservation, HistoricalRecord, IdentityKey, Snapshot};

/// How `valid_from` is chosen for a record that supersedes another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidFromPolicy {
    /// Carry the chain's first `valid_from` forward ("in the lineup since").
    #[default]
    FirstSeen,
    /// Use the scrape timestamp of the change (strict type 2).
    ChangeTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub id_length: usize,
    pub max_id_attempts: usize,
    pub id_scope: IdScope,
    pub valid_from: ValidFromPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            id_length: DEFAULT_ID_LENGTH,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            id_scope: IdScope::default(),
            valid_from: ValidFromPolicy::default(),
        }
    }
}

/// Per-snapshot tallies, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PassCounts {
    opened: usize,
    changed: usize,
    reopened: usize,
    closed: usize,
}

/// History grouped into per-key chains, in first-seen order.
#[derive(Debug, Default)]
struct ChainSet {
    chains: Vec<Vec<HistoricalRecord>>,
    index: HashMap<IdentityKey, usize>,
    active: BTreeSet<IdentityKey>,
}

impl ChainSet {
    fn seeded(existing: Vec<HistoricalRecord>) -> Self {
        let mut set = ChainSet::default();
        for record in existing {
            let key = record.identity_key();
            match set.index.get(&key) {
                Some(&pos) => set.chains[pos].push(record),
                None => {
                    set.index.insert(key, set.chains.len());
                    set.chains.push(vec![record]);
                }
            }
        }
        for (key, &pos) in &set.index {
            if set.chains[pos].last().is_some_and(|r| r.is_current) {
                set.active.insert(key.clone());
            }
        }
        set
    }

    /// Close the open tail of `key`'s chain. Returns false if already closed.
    fn close_latest(&mut self, key: &IdentityKey, ts: &str) -> bool {
        let Some(&pos) = self.index.get(key) else {
            return false;
        };
        match self.chains[pos].last_mut() {
            Some(latest) if latest.is_open() => {
                *latest = latest.closed_at(ts);
                true
            }
            _ => false,
        }
    }

    fn apply<R: Rng>(
        &mut self,
        snapshot: &Snapshot,
        ids: &mut IdCache,
        generator: &IdGenerator,
        policy: ValidFromPolicy,
        rng: &mut R,
    ) -> HistoryResult<PassCounts> {
        let ts = snapshot.scrape_ts.as_str();
        let mut counts = PassCounts::default();

        // Keys present in this scrape. A repeated key keeps its first position
        // and takes the later observation.
        let mut current: Vec<(IdentityKey, ArtistObservation)> =
            Vec::with_capacity(snapshot.artists.len());
        let mut positions: HashMap<IdentityKey, usize> = HashMap::new();
        for artist in &snapshot.artists {
            let key = snapshot.identity_key(artist);
            let id = ids.assign(&key, artist.artist_id.as_deref(), generator, rng)?;
            let mut observed = artist.clone();
            observed.artist_id = Some(id);
            match positions.get(&key) {
                Some(&pos) => current[pos].1 = observed,
                None => {
                    positions.insert(key.clone(), current.len());
                    current.push((key, observed));
                }
            }
        }

        let gone: Vec<IdentityKey> = self
            .active
            .iter()
            .filter(|key| !positions.contains_key(*key))
            .cloned()
            .collect();
        for key in gone {
            if self.close_latest(&key, ts) {
                counts.closed += 1;
            }
            self.active.remove(&key);
        }

        for (key, observed) in current {
            self.observe(key, observed, snapshot, policy, &mut counts);
        }

        Ok(counts)
    }

    fn observe(
        &mut self,
        key: IdentityKey,
        mut observed: ArtistObservation,
        snapshot: &Snapshot,
        policy: ValidFromPolicy,
        counts: &mut PassCounts,
    ) {
        let ts = snapshot.scrape_ts.as_str();
        let Some(&pos) = self.index.get(&key) else {
            let record = HistoricalRecord::open(
                observed,
                snapshot.festival_name.clone(),
                snapshot.festival_year,
                ts,
            );
            self.index.insert(key.clone(), self.chains.len());
            self.chains.push(vec![record]);
            self.active.insert(key);
            counts.opened += 1;
            return;
        };

        let chain = &mut self.chains[pos];
        let Some(latest) = chain.last() else {
            return;
        };

        // Unchanged attributes leave the chain as is, including a chain that
        // was closed when the artist dropped out of an earlier scrape.
        let was_open = latest.is_open();
        if latest.artist.same_attributes(&observed) {
            if was_open {
                self.active.insert(key);
            }
            return;
        }

        let valid_from = match policy {
            ValidFromPolicy::FirstSeen => chain[0].valid_from.clone(),
            ValidFromPolicy::ChangeTimestamp => ts.to_string(),
        };
        if let Some(prior_id) = latest.artist.artist_id.clone() {
            observed.artist_id = Some(prior_id);
        }

        if was_open {
            if let Some(latest) = chain.last_mut() {
                *latest = latest.closed_at(ts);
            }
            counts.changed += 1;
        } else {
            counts.reopened += 1;
        }
        debug!(
            key = %key,
            versions = chain.len() + 1,
            reopened = !was_open,
            "new artist version"
        );
        chain.push(HistoricalRecord::open(
            observed,
            snapshot.festival_name.clone(),
            snapshot.festival_year,
            valid_from,
        ));
        self.active.insert(key);
    }

    fn into_records(self) -> Vec<HistoricalRecord> {
        self.chains.into_iter().flatten().collect()
    }
}

/// Latest scrape timestamp recorded anywhere in `records`.
pub fn history_watermark(records: &[HistoricalRecord]) -> Option<&str> {
    records
        .iter()
        .flat_map(|r| std::iter::once(r.valid_from.as_str()).chain(r.valid_to.as_deref()))
        .max()
}

/// Snapshots scraped strictly after the history's watermark.
///
/// Replaying a scrape that is already folded into the history would compare
/// old attributes against newer ones and record spurious versions.
pub fn pending_snapshots(snapshots: Vec<Snapshot>, existing: &[HistoricalRecord]) -> Vec<Snapshot> {
    match history_watermark(existing) {
        Some(mark) => snapshots
            .into_iter()
            .filter(|s| s.scrape_ts.as_str() > mark)
            .collect(),
        None => snapshots,
    }
}

/// Reconcile with default options and a thread-local RNG.
pub fn reconcile(
    snapshots: &[Snapshot],
    existing: Vec<HistoricalRecord>,
) -> HistoryResult<Vec<HistoricalRecord>> {
    reconcile_with(
        snapshots,
        existing,
        &ReconcileOptions::default(),
        &mut rand::thread_rng(),
    )
}

/// Replay `snapshots` over `existing` and return the full updated history.
///
/// Snapshots are processed in ascending `scrape_ts` order (stable for ties).
/// An empty snapshot list returns `existing` untouched.
///
/// # Errors
/// - `Validation` if any snapshot or observation is malformed; nothing is applied.
/// - `IdentifierExhaustion` if no free artist identifier could be minted.
pub fn reconcile_with<R: Rng>(
    snapshots: &[Snapshot],
    existing: Vec<HistoricalRecord>,
    options: &ReconcileOptions,
    rng: &mut R,
) -> HistoryResult<Vec<HistoricalRecord>> {
    if snapshots.is_empty() {
        debug!("no snapshots to reconcile");
        return Ok(existing);
    }
    for snapshot in snapshots {
        snapshot.validate()?;
    }

    let generator = IdGenerator::new(options.id_length, options.max_id_attempts);
    let mut ids = IdCache::seeded(options.id_scope, &existing);
    let mut chains = ChainSet::seeded(existing);
    info!(
        snapshots = snapshots.len(),
        known_keys = chains.index.len(),
        known_ids = ids.len(),
        "reconciling lineup history"
    );

    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| a.scrape_ts.cmp(&b.scrape_ts));

    let mut totals = PassCounts::default();
    for snapshot in ordered {
        let counts = chains.apply(snapshot, &mut ids, &generator, options.valid_from, rng)?;
        debug!(
            festival = %snapshot.festival_name,
            year = snapshot.festival_year,
            scrape_ts = %snapshot.scrape_ts,
            artists = snapshot.artists.len(),
            opened = counts.opened,
            changed = counts.changed,
            reopened = counts.reopened,
            closed = counts.closed,
            "applied snapshot"
        );
        totals.opened += counts.opened;
        totals.changed += counts.changed;
        totals.reopened += counts.reopened;
        totals.closed += counts.closed;
    }

    info!(
        opened = totals.opened,
        changed = totals.changed,
        reopened = totals.reopened,
        closed = totals.closed,
        "reconciliation complete"
    );
    Ok(chains.into_records())
}
