#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Append-only history of session outcomes built on the persisted key-value
//! substrate.
//!
//! The record count stored under [`RECORD_COUNT_KEY`] is the single source of
//! truth for the valid index range `1..=count`. Records are never renumbered
//! or removed individually; [`RunRecordStore::clear`] wipes the history as a
//! whole. Appends are not transactional: a crash between writing a record and
//! bumping the count loses that record.

use last_stand_core::{KeyValueStore, LevelNumber, RecordSink, RunRecord};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};

/// Key holding the number of stored records.
pub const RECORD_COUNT_KEY: &str = "GameRecordCount";

const RECORD_PREFIX: &str = "GameRecord_";
const FLAT_FIELDS: [&str; 5] = [
    FIELD_LEVEL,
    FIELD_COMPLETED,
    FIELD_TIME_TAKEN,
    FIELD_KILLS,
    FIELD_DATE_TIME,
];
const FIELD_LEVEL: &str = "_Level";
const FIELD_COMPLETED: &str = "_Completed";
const FIELD_TIME_TAKEN: &str = "_TimeTaken";
const FIELD_KILLS: &str = "_ZombiesKilled";
const FIELD_DATE_TIME: &str = "_DateTime";

/// Encoding used when appending new records.
///
/// Reads understand both layouts regardless of this setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// One JSON document per record under `GameRecord_{n}`.
    #[default]
    Structured,
    /// One key per field under `GameRecord_{n}_{Field}`, readable by older builds.
    Flat,
}

/// Persisted history of run records.
#[derive(Debug)]
pub struct RunRecordStore<'s, S> {
    store: &'s mut S,
    layout: RecordLayout,
}

impl<'s, S: KeyValueStore> RunRecordStore<'s, S> {
    /// Wraps `store`, writing records in the structured layout.
    pub fn new(store: &'s mut S) -> Self {
        Self::with_layout(store, RecordLayout::default())
    }

    /// Wraps `store`, writing records in the provided layout.
    pub fn with_layout(store: &'s mut S, layout: RecordLayout) -> Self {
        Self { store, layout }
    }

    /// Number of records in the history. Missing or negative counts read as zero.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.store
            .get_int(RECORD_COUNT_KEY)
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }

    /// Appends `record` and returns its one-based index.
    pub fn append(&mut self, record: &RunRecord) -> usize {
        let index = self.total_records().saturating_add(1);
        let Ok(count) = i32::try_from(index) else {
            warn!(index, "run_record_history_full");
            return index - 1;
        };

        match self.layout {
            RecordLayout::Structured => self.write_structured(index, record),
            RecordLayout::Flat => self.write_flat(index, record),
        }
        self.store.set_int(RECORD_COUNT_KEY, count);

        if let Err(error) = self.store.save() {
            warn!(error = %error, index, "run_record_not_saved");
        }

        info!(
            index,
            level = record.level.get(),
            completed = record.completed,
            time_taken_secs = record.time_taken_secs,
            entities_killed = record.entities_killed,
            "run_record_saved"
        );
        index
    }

    /// Record stored at the one-based `index`, if it lies within the history.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<RunRecord> {
        (1..=self.total_records())
            .contains(&index)
            .then(|| self.read(index))
    }

    /// Every record in append order. Missing fields decode to zero values.
    #[must_use]
    pub fn all(&self) -> Vec<RunRecord> {
        (1..=self.total_records())
            .map(|index| self.read(index))
            .collect()
    }

    /// Fastest completed run for `level`. Ties keep the earliest record.
    #[must_use]
    pub fn best_for_level(&self, level: LevelNumber) -> Option<RunRecord> {
        self.all()
            .into_iter()
            .filter(|record| record.completed && record.level == level)
            .min_by(|left, right| left.time_taken_secs.total_cmp(&right.time_taken_secs))
    }

    /// Removes every record and the count, leaving an unused store behind.
    pub fn clear(&mut self) {
        let count = self.total_records();
        for index in 1..=count {
            let key = record_key(index);
            self.store.delete_key(&key);
            for field in FLAT_FIELDS {
                self.store.delete_key(&format!("{key}{field}"));
            }
        }
        self.store.delete_key(RECORD_COUNT_KEY);

        if let Err(error) = self.store.save() {
            warn!(error = %error, "run_record_clear_not_saved");
        }
        info!(cleared = count, "run_records_cleared");
    }

    fn write_structured(&mut self, index: usize, record: &RunRecord) {
        let document = StoredRecord::from(record);
        match serde_json::to_string(&document) {
            Ok(encoded) => self.store.set_string(&record_key(index), &encoded),
            Err(error) => warn!(error = %error, index, "run_record_not_encoded"),
        }
    }

    fn write_flat(&mut self, index: usize, record: &RunRecord) {
        let key = record_key(index);
        self.store.set_int(
            &format!("{key}{FIELD_LEVEL}"),
            i32::try_from(record.level.get()).unwrap_or(i32::MAX),
        );
        self.store
            .set_int(&format!("{key}{FIELD_COMPLETED}"), i32::from(record.completed));
        self.store
            .set_float(&format!("{key}{FIELD_TIME_TAKEN}"), record.time_taken_secs);
        self.store.set_int(
            &format!("{key}{FIELD_KILLS}"),
            i32::try_from(record.entities_killed).unwrap_or(i32::MAX),
        );
        self.store.set_string(
            &format!("{key}{FIELD_DATE_TIME}"),
            &format_timestamp(record.recorded_at).unwrap_or_default(),
        );
    }

    fn read(&self, index: usize) -> RunRecord {
        let key = record_key(index);
        if let Some(encoded) = self.store.get_string(&key) {
            return match serde_json::from_str::<StoredRecord>(&encoded) {
                Ok(document) => document.into(),
                Err(error) => {
                    warn!(error = %error, index, "run_record_malformed");
                    StoredRecord::default().into()
                }
            };
        }
        self.read_flat(&key)
    }

    fn read_flat(&self, key: &str) -> RunRecord {
        let int = |field: &str| self.store.get_int(&format!("{key}{field}")).unwrap_or(0);
        RunRecord {
            level: LevelNumber::new(u32::try_from(int(FIELD_LEVEL)).unwrap_or(0)),
            completed: int(FIELD_COMPLETED) == 1,
            time_taken_secs: self
                .store
                .get_float(&format!("{key}{FIELD_TIME_TAKEN}"))
                .unwrap_or(0.0),
            entities_killed: u32::try_from(int(FIELD_KILLS)).unwrap_or(0),
            recorded_at: self
                .store
                .get_string(&format!("{key}{FIELD_DATE_TIME}"))
                .and_then(|raw| parse_timestamp(&raw)),
        }
    }
}

impl<S: KeyValueStore> RecordSink for RunRecordStore<'_, S> {
    fn append(&mut self, record: RunRecord) {
        let _ = RunRecordStore::append(self, &record);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredRecord {
    level: u32,
    completed: bool,
    time_taken: f32,
    entities_killed: u32,
    recorded_at: Option<String>,
}

impl From<&RunRecord> for StoredRecord {
    fn from(record: &RunRecord) -> Self {
        Self {
            level: record.level.get(),
            completed: record.completed,
            time_taken: record.time_taken_secs,
            entities_killed: record.entities_killed,
            recorded_at: format_timestamp(record.recorded_at),
        }
    }
}

impl From<StoredRecord> for RunRecord {
    fn from(document: StoredRecord) -> Self {
        Self {
            level: LevelNumber::new(document.level),
            completed: document.completed,
            time_taken_secs: document.time_taken,
            entities_killed: document.entities_killed,
            recorded_at: document
                .recorded_at
                .as_deref()
                .and_then(parse_timestamp),
        }
    }
}

fn record_key(index: usize) -> String {
    format!("{RECORD_PREFIX}{index}")
}

fn format_timestamp(timestamp: Option<OffsetDateTime>) -> Option<String> {
    timestamp.and_then(|timestamp| timestamp.format(&Rfc3339).ok())
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keys_are_one_based_and_prefixed() {
        assert_eq!(record_key(1), "GameRecord_1");
        assert_eq!(record_key(12), "GameRecord_12");
    }

    #[test]
    fn missing_document_fields_default_to_zero() {
        let document: StoredRecord = serde_json::from_str(r#"{"level":2}"#).expect("decode");
        let record = RunRecord::from(document);
        assert_eq!(record.level, LevelNumber::new(2));
        assert!(!record.completed);
        assert_eq!(record.time_taken_secs, 0.0);
        assert_eq!(record.entities_killed, 0);
        assert_eq!(record.recorded_at, None);
    }

    #[test]
    fn locale_specific_timestamps_decode_as_missing() {
        assert_eq!(parse_timestamp("10/18/2026 4:05:11 PM"), None);
        assert!(parse_timestamp("2026-10-18T16:05:11Z").is_some());
    }
}
