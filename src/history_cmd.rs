//! CLI command handlers.
//!
//! Thin wrappers that load the configured files, call into the library and
//! write results back.

use std::path::{Path, PathBuf};

use time::{OffsetDateTime, UtcOffset};
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::config::Config;
use crate::core::schema::{ArtistObservation, Snapshot};
use crate::history::{HistoryStats, history_watermark, pending_snapshots, reconcile_with};
use crate::storage::{CsvExporter, JsonStore};
use crate::{HistoryError, HistoryResult};

/// Run the `generate` command.
///
/// Reads all scrapes and the existing history, reconciles the scrapes newer
/// than the history and saves the result. Returns `None` when there are no
/// scrapes at all.
pub fn generate(config: &Config) -> HistoryResult<Option<HistoryStats>> {
    let lineups = JsonStore::new(config.lineups_path());
    let history = JsonStore::new(config.history_path());

    eprintln!("Loading lineup data from: {}", lineups.path().display());
    let snapshots = lineups.load_snapshots()?;
    if snapshots.is_empty() {
        eprintln!("No lineup data found.");
        return Ok(None);
    }

    eprintln!("Loading existing history from: {}", history.path().display());
    let existing = history.load_history()?;

    let scraped = snapshots.len();
    let snapshots = pending_snapshots(snapshots, &existing);
    if snapshots.len() < scraped {
        eprintln!(
            "Skipping {} scrape(s) already in history (up to {})",
            scraped - snapshots.len(),
            history_watermark(&existing).unwrap_or_default()
        );
    }

    eprintln!(
        "Generating history from {} scrape(s) over {} existing record(s)",
        snapshots.len(),
        existing.len()
    );
    let records = reconcile_with(
        &snapshots,
        existing,
        &config.reconcile_options(),
        &mut rand::thread_rng(),
    )?;

    history.save(&records)?;
    eprintln!(
        "Saved {} history record(s) to: {}",
        records.len(),
        history.path().display()
    );

    let stats = HistoryStats::from_records(&records);
    info!(
        total = stats.total_records,
        current = stats.current_records,
        closed = stats.closed_records,
        "history generated"
    );
    Ok(Some(stats))
}

/// Run the `stats` command against the saved history.
pub fn stats(config: &Config) -> HistoryResult<HistoryStats> {
    let history = JsonStore::new(config.history_path());
    if !history.exists() {
        return Err(HistoryError::Message(format!(
            "history file not found: {}",
            history.path().display()
        )));
    }
    let records = history.load_history()?;
    Ok(HistoryStats::from_records(&records))
}

/// Run the `export-csv` command. Writes to stdout when `out` is `None`.
pub fn export_csv(config: &Config, out: Option<&Path>) -> HistoryResult<usize> {
    let history = JsonStore::new(config.history_path());
    let records = history.load_history()?;
    let exporter = CsvExporter::new();
    match out {
        Some(path) => {
            exporter.export(&records, path)?;
            eprintln!("Wrote {} record(s) to: {}", records.len(), path.display());
        }
        None => exporter.export_to_stdout(&records)?,
    }
    Ok(records.len())
}

/// Run the `ingest` command: append one scrape to the lineup file.
///
/// `artists_path` must hold a JSON array of artist observations. The scrape
/// time defaults to now; any given offset is converted to UTC.
pub fn ingest(
    config: &Config,
    festival_name: String,
    festival_year: i32,
    artists_path: PathBuf,
    scrape_ts: Option<String>,
) -> HistoryResult<usize> {
    let text = std::fs::read_to_string(&artists_path).map_err(|e| {
        HistoryError::Message(format!("failed to read {}: {e}", artists_path.display()))
    })?;
    let artists: Vec<ArtistObservation> = serde_json::from_str(&text).map_err(|e| {
        HistoryError::Validation(format!(
            "{} is not a list of artists: {e}",
            artists_path.display()
        ))
    })?;

    let scrape_ts = match scrape_ts {
        // Stored in UTC so scrape times order correctly as strings.
        Some(ts) => {
            let parsed = OffsetDateTime::parse(&ts, &Rfc3339).map_err(|e| {
                HistoryError::Validation(format!("scrape timestamp '{ts}' is not RFC 3339: {e}"))
            })?;
            format_rfc3339(parsed.to_offset(UtcOffset::UTC))?
        }
        None => format_rfc3339(OffsetDateTime::now_utc())?,
    };

    let snapshot = Snapshot::new(festival_name, festival_year, scrape_ts, artists);
    snapshot.validate()?;
    let artist_count = snapshot.artists.len();

    let lineups = JsonStore::new(config.lineups_path());
    let total = lineups.append_snapshot(snapshot)?;
    eprintln!(
        "Saved new scrape with {} artist(s) to: {} ({} scrape(s) in file)",
        artist_count,
        lineups.path().display(),
        total
    );
    Ok(total)
}

fn format_rfc3339(ts: OffsetDateTime) -> HistoryResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| HistoryError::Message(format!("failed to format timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().join("data"),
            ..Config::default()
        }
    }

    fn write_artists(dir: &TempDir, name: &str, json: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_generate_without_lineups_is_noop() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        let result = generate(&config).unwrap();
        assert!(result.is_none());
        assert!(!config.history_path().exists());
    }

    #[test]
    fn test_ingest_then_generate() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        let first = write_artists(
            &temp,
            "a.json",
            r#"[{"artist_name": "X", "stage_name": "Orange"}, {"artist_name": "Y"}]"#,
        );
        let second = write_artists(&temp, "b.json", r#"[{"artist_name": "X", "stage_name": "Arena"}]"#);

        ingest(&config, "F".into(), 2025, first, Some("2025-01-01T10:00:00Z".into())).unwrap();
        let total =
            ingest(&config, "F".into(), 2025, second, Some("2025-01-02T10:00:00Z".into())).unwrap();
        assert_eq!(total, 2);

        let stats = generate(&config).unwrap().unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.identity_keys, 2);
        assert_eq!(stats.current_records, 1);
        assert_eq!(stats.closed_records, 2);

        // Running again over the same scrapes changes nothing.
        let again = generate(&config).unwrap().unwrap();
        assert_eq!(again, stats);
        assert_eq!(super::stats(&config).unwrap(), stats);
    }

    #[test]
    fn test_ingest_rejects_bad_timestamp() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let artists = write_artists(&temp, "a.json", r#"[{"artist_name": "X"}]"#);

        let err = ingest(&config, "F".into(), 2025, artists, Some("yesterday".into())).unwrap_err();
        assert!(matches!(err, HistoryError::Validation(_)));
        assert!(!config.lineups_path().exists());
    }

    #[test]
    fn test_ingest_stores_scrape_time_in_utc() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let artists = write_artists(&temp, "a.json", r#"[{"artist_name": "X"}]"#);

        ingest(&config, "F".into(), 2025, artists, Some("2025-01-01T12:00:00+02:00".into())).unwrap();
        let stored = JsonStore::new(config.lineups_path()).load_snapshots().unwrap();
        assert_eq!(stored[0].scrape_ts, "2025-01-01T10:00:00Z");
    }

    #[test]
    fn test_ingest_rejects_unnamed_artist() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let artists = write_artists(&temp, "a.json", r#"[{"artist_name": ""}]"#);

        let err = ingest(&config, "F".into(), 2025, artists, None).unwrap_err();
        assert!(matches!(err, HistoryError::Validation(_)));
    }

    #[test]
    fn test_stats_missing_history() {
        let temp = TempDir::new().unwrap();
        let err = stats(&config_in(&temp)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_export_csv_to_file() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let artists = write_artists(&temp, "a.json", r#"[{"artist_name": "X"}]"#);
        ingest(&config, "F".into(), 2025, artists, Some("2025-01-01T10:00:00Z".into())).unwrap();
        generate(&config).unwrap();

        let out = temp.path().join("out/history.csv");
        let count = export_csv(&config, Some(&out)).unwrap();
        assert_eq!(count, 1);
        let text = std::fs::read_to_string(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
