//! Integration tests for JSON storage.

use lineup_history::core::{ArtistObservation, HistoricalRecord, Snapshot};
use lineup_history::storage::JsonStore;

fn make_snapshot(ts: &str) -> Snapshot {
    Snapshot::new(
        "Roskilde Festival",
        2025,
        ts,
        vec![ArtistObservation::new("Artist 1").with_stage("Orange")],
    )
}

#[test]
fn test_missing_file_is_empty_and_creates_parent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/lineups.json");
    let store = JsonStore::new(&path);

    assert!(store.load_snapshots().unwrap().is_empty());
    assert!(path.parent().unwrap().exists());
    assert!(!store.exists());
}

#[test]
fn test_save_and_load_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("lineups.json"));

    let snapshots = vec![
        make_snapshot("2025-01-01T00:00:00+00:00"),
        make_snapshot("2025-01-02T00:00:00+00:00"),
    ];
    store.save(&snapshots).unwrap();

    let loaded = store.load_snapshots().unwrap();
    assert_eq!(loaded, snapshots);
}

#[test]
fn test_append_snapshot_does_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("lineups.json"));

    assert_eq!(store.append_snapshot(make_snapshot("t1")).unwrap(), 1);
    // a new store instance simulates a later run
    let store2 = JsonStore::new(store.path());
    assert_eq!(store2.append_snapshot(make_snapshot("t2")).unwrap(), 2);

    let loaded = store2.load_snapshots().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].scrape_ts, "t1");
    assert_eq!(loaded[1].scrape_ts, "t2");
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lineups.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonStore::new(&path);

    let loaded = store.load_snapshots().unwrap();
    assert!(loaded.is_empty());
    assert!(!path.exists());

    let backup = store.backup_path();
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
}

#[test]
fn test_wrong_shape_is_backed_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lineups.json");
    std::fs::write(&path, r#"{"festival_name": "F"}"#).unwrap();
    let store = JsonStore::new(&path);

    assert!(store.load_snapshots().unwrap().is_empty());
    assert!(store.backup_path().exists());
}

#[test]
fn test_history_keeps_null_valid_to() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("lineups_historical.json"));

    let open = HistoricalRecord::open(
        ArtistObservation::new("Artist 1").with_id("aB3xZ"),
        "Roskilde Festival",
        2025,
        "t1",
    );
    let records = vec![open.closed_at("t2"), open];
    store.save(&records).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\"_valid_to\": null"));
    assert_eq!(store.load_history().unwrap(), records);
}

#[test]
fn test_history_without_valid_to_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lineups_historical.json");
    std::fs::write(
        &path,
        r#"[{"artist_name": "A", "festival_name": "F", "festival_year": 2025,
             "_valid_from": "t1", "_is_current": true}]"#,
    )
    .unwrap();
    let store = JsonStore::new(&path);

    assert!(store.load_history().unwrap().is_empty());
    assert!(store.backup_path().exists());
}
