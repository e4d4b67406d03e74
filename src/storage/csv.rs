//! CSV export for history records.

use std::io::Write;
use std::path::Path;

use crate::HistoryError;
use crate::core::schema::HistoricalRecord;

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "festival_name",
    "festival_year",
    "artist_id",
    "artist_name",
    "stage_name",
    "start_ts",
    "end_ts",
    "country_code",
    "scrape_url",
    "bio_short",
    "bio_long",
    "social_links",
    "other_data",
    "valid_from",
    "valid_to",
    "is_current",
];

/// CSV exporter for history records.
///
/// Nested maps (social links, other data) are written as compact JSON so every
/// record stays a single row.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export records to a CSV file.
    pub fn export(&self, records: &[HistoricalRecord], output: &Path) -> Result<(), HistoryError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| HistoryError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| HistoryError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(records, file)
    }

    pub fn export_to_stdout(&self, records: &[HistoricalRecord]) -> Result<(), HistoryError> {
        let stdout = std::io::stdout();
        let handle = stdout.lock();
        self.export_to_writer(records, handle)
    }

    /// Export records to any writer implementing Write.
    pub fn export_to_writer<W: Write>(
        &self,
        records: &[HistoricalRecord],
        writer: W,
    ) -> Result<(), HistoryError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| HistoryError::Message(format!("failed to write CSV headers: {e}")))?;

        for record in records {
            let row = self.record_to_row(record)?;
            csv_writer
                .write_record(&row)
                .map_err(|e| HistoryError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| HistoryError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    fn record_to_row(&self, record: &HistoricalRecord) -> Result<Vec<String>, HistoryError> {
        let artist = &record.artist;
        let social_links = match &artist.social_links {
            Some(links) => to_json(links)?,
            None => String::new(),
        };
        let other_data = match &artist.other_data {
            Some(data) => to_json(data)?,
            None => String::new(),
        };

        Ok(vec![
            record.festival_name.clone(),
            record.festival_year.to_string(),
            artist.artist_id.clone().unwrap_or_default(),
            artist.artist_name.clone(),
            artist.stage_name.clone().unwrap_or_default(),
            artist.start_ts.clone().unwrap_or_default(),
            artist.end_ts.clone().unwrap_or_default(),
            artist.country_code.clone().unwrap_or_default(),
            artist.scrape_url.clone().unwrap_or_default(),
            artist.bio_short.clone().unwrap_or_default(),
            artist.bio_long.clone().unwrap_or_default(),
            social_links,
            other_data,
            record.valid_from.clone(),
            record.valid_to.clone().unwrap_or_default(),
            record.is_current.to_string(),
        ])
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, HistoryError> {
    serde_json::to_string(value)
        .map_err(|e| HistoryError::Message(format!("failed to serialize nested field: {e}")))
}
