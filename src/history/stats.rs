//! Summary counts over a history.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::schema::HistoricalRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_records: usize,
    pub identity_keys: usize,
    pub current_records: usize,
    pub closed_records: usize,
    pub festivals: usize,
}

impl HistoryStats {
    pub fn from_records(records: &[HistoricalRecord]) -> Self {
        let identity_keys: BTreeSet<_> = records.iter().map(|r| r.identity_key()).collect();
        let festivals: BTreeSet<_> = records
            .iter()
            .map(|r| (r.festival_name.as_str(), r.festival_year))
            .collect();
        let current_records = records.iter().filter(|r| r.is_current).count();
        let closed_records = records.iter().filter(|r| r.valid_to.is_some()).count();

        HistoryStats {
            total_records: records.len(),
            identity_keys: identity_keys.len(),
            current_records,
            closed_records,
            festivals: festivals.len(),
        }
    }
}

impl fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total records: {}", self.total_records)?;
        writeln!(f, "Artists tracked: {}", self.identity_keys)?;
        writeln!(f, "Active records: {}", self.current_records)?;
        writeln!(f, "Closed records: {}", self.closed_records)?;
        write!(f, "Festival editions: {}", self.festivals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ArtistObservation;

    #[test]
    fn test_stats_counts() {
        let a1 = HistoricalRecord::open(ArtistObservation::new("A"), "F", 2024, "t1");
        let a2 = HistoricalRecord::open(ArtistObservation::new("A").with_stage("S"), "F", 2024, "t1");
        let b = HistoricalRecord::open(ArtistObservation::new("B"), "G", 2025, "t1");
        let records = vec![a1.closed_at("t2"), a2, b.closed_at("t3")];

        let stats = HistoryStats::from_records(&records);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.identity_keys, 2);
        assert_eq!(stats.current_records, 1);
        assert_eq!(stats.closed_records, 2);
        assert_eq!(stats.festivals, 2);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(HistoryStats::from_records(&[]), HistoryStats::default());
    }

    #[test]
    fn test_stats_display() {
        let text = HistoryStats::from_records(&[]).to_string();
        assert!(text.contains("Total records: 0"));
        assert!(text.contains("Active records: 0"));
    }
}
