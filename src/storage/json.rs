//! JSON document storage for lineup snapshots and history.
//!
//! Both files hold a single JSON array. A file that cannot be read back as the
//! expected shape is moved aside to `<name>.bak` and treated as empty so one
//! bad write never stops the pipeline.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::schema::{HistoricalRecord, Snapshot};
use crate::{HistoryError, HistoryResult};

const SNAPSHOT_FIELDS: &[&str] = &["festival_name", "festival_year", "scrape_ts", "artists"];
const HISTORY_FIELDS: &[&str] = &[
    "artist_name",
    "festival_name",
    "festival_year",
    "_valid_from",
    "_valid_to",
    "_is_current",
];

/// A JSON array document on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Where a corrupt file is moved to.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".bak");
        PathBuf::from(name)
    }

    fn ensure_parent(&self) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| HistoryError::Message(format!("failed to create directory: {e}")))?;
            }
        }
        Ok(())
    }

    /// Load the lineup scrapes stored in this file.
    pub fn load_snapshots(&self) -> HistoryResult<Vec<Snapshot>> {
        self.load_list(SNAPSHOT_FIELDS, Some("artists"))
    }

    /// Load previously generated history; a missing file is an empty history.
    pub fn load_history(&self) -> HistoryResult<Vec<HistoricalRecord>> {
        self.load_list(HISTORY_FIELDS, None)
    }

    fn load_list<T: DeserializeOwned>(
        &self,
        required: &[&str],
        list_field: Option<&str>,
    ) -> HistoryResult<Vec<T>> {
        if !self.path.exists() {
            self.ensure_parent()?;
            debug!(path = %self.path.display(), "no existing file, starting empty");
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path)
            .map_err(|e| HistoryError::Message(format!("failed to read {}: {e}", self.path.display())))?;

        match parse_list(&text, required, list_field) {
            Ok(items) => {
                debug!(path = %self.path.display(), entries = items.len(), "loaded");
                Ok(items)
            }
            Err(reason) => {
                let backup = self.backup_path();
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    %reason,
                    "corrupt data file, moving it aside"
                );
                fs::rename(&self.path, &backup).map_err(|e| {
                    HistoryError::Message(format!(
                        "failed to back up corrupt file {}: {e}",
                        self.path.display()
                    ))
                })?;
                Ok(Vec::new())
            }
        }
    }

    /// Replace the file contents with `items`.
    ///
    /// Data goes to a temporary file in the same directory first, which is then
    /// renamed over the target, so readers never see a half-written file.
    pub fn save<T: Serialize>(&self, items: &[T]) -> HistoryResult<()> {
        self.ensure_parent()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| HistoryError::Message(format!("failed to create temp file: {e}")))?;
        serde_json::to_writer_pretty(&mut tmp, items)
            .map_err(|e| HistoryError::Message(format!("failed to serialize: {e}")))?;
        tmp.write_all(b"\n")
            .and_then(|_| tmp.flush())
            .map_err(|e| HistoryError::Message(format!("failed to write temp file: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            HistoryError::Message(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), entries = items.len(), "saved");
        Ok(())
    }

    /// Append one scrape to the lineup file. Returns the new number of scrapes.
    pub fn append_snapshot(&self, snapshot: Snapshot) -> HistoryResult<usize> {
        let mut snapshots = self.load_snapshots()?;
        snapshots.push(snapshot);
        self.save(&snapshots)?;
        Ok(snapshots.len())
    }
}

/// Parse a JSON array whose entries are objects carrying `required` keys.
fn parse_list<T: DeserializeOwned>(
    text: &str,
    required: &[&str],
    list_field: Option<&str>,
) -> Result<Vec<T>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    let Value::Array(entries) = &value else {
        return Err("top level must be a list".to_string());
    };
    for (i, entry) in entries.iter().enumerate() {
        let Value::Object(map) = entry else {
            return Err(format!("entry {i} is not an object"));
        };
        if let Some(missing) = required.iter().find(|f| !map.contains_key(**f)) {
            return Err(format!("entry {i} is missing required field '{missing}'"));
        }
        if let Some(field) = list_field {
            if !map.get(field).is_some_and(Value::is_array) {
                return Err(format!("entry {i}: '{field}' must be a list"));
            }
        }
    }
    serde_json::from_value(value).map_err(|e| format!("unexpected shape: {e}"))
}
