//! Persisted record types.
//!
//! A [`StringFile`] is the full `key -> record` content of one
//! (unit, locale) pair. Each [`StringRecord`] holds the current value and an
//! append-only list of [`HistoryEntry`] edits. [`PersistedFile`] pairs the
//! content with the [`VersionToken`] it was read at.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{StringKey, SubmitterId, VersionToken};

/// One edit of one string. Immutable once created.
///
/// Consecutive entries chain: `history[i].new_value == history[i + 1].old_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Translator who made the edit. Older files call this `userId`.
    #[serde(alias = "userId")]
    pub submitter_id: SubmitterId,
    /// Millis since Unix epoch.
    pub timestamp: i64,
    pub old_value: String,
    pub new_value: String,
}

/// Current value plus edit history for one string key.
///
/// An empty `value` means the translation was erased; the record and its
/// history are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRecord {
    pub value: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl StringRecord {
    /// Creates the record for the first non-empty translation of a key.
    #[must_use]
    pub fn created(value: String, submitter_id: SubmitterId, timestamp: i64) -> Self {
        let entry = HistoryEntry {
            submitter_id,
            timestamp,
            old_value: String::new(),
            new_value: value.clone(),
        };
        Self {
            value,
            history: vec![entry],
        }
    }

    /// Returns a copy with `new_value` as the current value and one more
    /// history entry recording the transition.
    #[must_use]
    pub fn revised(&self, new_value: String, submitter_id: SubmitterId, timestamp: i64) -> Self {
        let mut history = self.history.clone();
        history.push(HistoryEntry {
            submitter_id,
            timestamp,
            old_value: self.value.clone(),
            new_value: new_value.clone(),
        });
        Self {
            value: new_value,
            history,
        }
    }

    /// Whether the record currently holds a translation.
    #[must_use]
    pub fn is_translated(&self) -> bool {
        !self.value.is_empty()
    }
}

/// The `key -> record` content of one (unit, locale) pair.
///
/// Serialized as a plain JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringFile {
    records: BTreeMap<StringKey, StringRecord>,
}

impl StringFile {
    /// Creates an empty file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the stored JSON representation.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the bytes are not a valid file.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Renders the stored JSON representation (two-space indentation).
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    #[must_use]
    pub fn get(&self, key: &StringKey) -> Option<&StringRecord> {
        self.records.get(key)
    }

    /// Inserts or replaces a record, returning the previous one.
    pub fn insert(&mut self, key: StringKey, record: StringRecord) -> Option<StringRecord> {
        self.records.insert(key, record)
    }

    #[must_use]
    pub fn contains_key(&self, key: &StringKey) -> bool {
        self.records.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &StringKey> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StringKey, &StringRecord)> {
        self.records.iter()
    }
}

impl FromIterator<(StringKey, StringRecord)> for StringFile {
    fn from_iter<I: IntoIterator<Item = (StringKey, StringRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// File content as read from the store, with the version it was read at.
///
/// `version` is `None` when the object does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedFile {
    pub content: StringFile,
    pub version: Option<VersionToken>,
}

impl PersistedFile {
    /// The file of a (unit, locale) pair with no translations yet.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}
