//! Facility records and the deduplicating result set.

use hashbrown::HashMap;
use serde::Serialize;

/// One facility row as returned by the remote lookup.
///
/// Serialized field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityRecord {
    pub name: String,
    pub province: String,
    pub street: String,
    pub district: String,
    pub neighborhood: String,
    /// Longitude of the sample point that returned this record
    #[serde(rename = "lng")]
    pub lon: f64,
    /// Latitude of the sample point that returned this record
    pub lat: f64,
    pub id: String,
}

/// Position of a record in generation order: (sample point index, feature index).
///
/// Lower values win the dedup tie-break, regardless of when the lookup completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub point: usize,
    pub feature: usize,
}

impl Occurrence {
    pub fn new(point: usize, feature: usize) -> Self {
        Self { point, feature }
    }
}

#[derive(Debug)]
struct Entry {
    first_seen: Occurrence,
    record: FacilityRecord,
}

/// Facility records keyed by id, keeping the earliest occurrence of each id.
#[derive(Debug, Default)]
pub struct ResultSet {
    entries: HashMap<String, Entry>,
    duplicates: usize,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record seen at `occurrence`.
    ///
    /// Returns true if the id was not present before. When the id is already
    /// present, the earlier occurrence is kept and the other one is counted as
    /// a duplicate.
    pub fn insert(&mut self, occurrence: Occurrence, record: FacilityRecord) -> bool {
        match self.entries.get_mut(&record.id) {
            Some(existing) => {
                self.duplicates += 1;
                if occurrence < existing.first_seen {
                    existing.first_seen = occurrence;
                    existing.record = record;
                }
                false
            }
            None => {
                self.entries.insert(
                    record.id.clone(),
                    Entry {
                        first_seen: occurrence,
                        record,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&FacilityRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records discarded because their id was already present
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Finalize into rows ordered by first occurrence
    pub fn into_records(self) -> Vec<FacilityRecord> {
        let mut entries: Vec<Entry> = self.entries.into_values().collect();
        entries.sort_by_key(|e| e.first_seen);
        entries.into_iter().map(|e| e.record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, lon: f64, lat: f64) -> FacilityRecord {
        FacilityRecord {
            name: name.to_string(),
            province: String::new(),
            street: String::new(),
            district: String::new(),
            neighborhood: String::new(),
            lon,
            lat,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut set = ResultSet::new();
        assert!(set.insert(Occurrence::new(0, 0), record("A", "first", 1.0, 1.0)));
        assert!(!set.insert(Occurrence::new(3, 0), record("A", "second", 2.0, 2.0)));

        let a = set.get("A").unwrap();
        assert_eq!(a.name, "first");
        assert_eq!(a.lon, 1.0);
        assert_eq!(set.len(), 1);
        assert_eq!(set.duplicates(), 1);
    }

    #[test]
    fn test_earlier_occurrence_replaces_later_arrival() {
        // Out-of-order completion: point 5 merged before point 2
        let mut set = ResultSet::new();
        set.insert(Occurrence::new(5, 0), record("A", "late", 5.0, 5.0));
        set.insert(Occurrence::new(2, 1), record("A", "early", 2.0, 2.0));

        assert_eq!(set.get("A").unwrap().name, "early");
        assert_eq!(set.duplicates(), 1);
    }

    #[test]
    fn test_into_records_ordered_by_first_seen() {
        let mut set = ResultSet::new();
        set.insert(Occurrence::new(4, 0), record("C", "c", 0.0, 0.0));
        set.insert(Occurrence::new(1, 1), record("B", "b", 0.0, 0.0));
        set.insert(Occurrence::new(1, 0), record("A", "a", 0.0, 0.0));

        let ids: Vec<String> = set.into_records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
