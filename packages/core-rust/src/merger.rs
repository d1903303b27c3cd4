//! Record merger: folds one translator's submitted values into the
//! persisted file of a single (unit, locale) pair.
//!
//! Every key in the union of the old file and the submission is classified
//! once into a [`KeyDisposition`] and then dispatched by exhaustive match.
//! History is append-only: records are either passed through untouched or
//! copied with exactly one new [`HistoryEntry`](crate::record::HistoryEntry).

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ContractViolation;
use crate::record::{StringFile, StringRecord};
use crate::types::{StorageUnit, StringKey, SubmitterId};

/// Submitted `key -> value` map for one storage unit.
pub type SubmittedValues = BTreeMap<StringKey, String>;

/// What the merge does with one key.
///
/// Variants that act on a stored record carry it, so dispatch never has to
/// look the record up a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition<'a> {
    /// Neither stored nor submitted. Not added to the result.
    Absent,
    /// Not stored and submitted empty. Nothing to record.
    StillEmpty,
    /// First translation of the key.
    Created(&'a str),
    /// Submitted value equals the stored one. Record passes through.
    Unchanged(&'a StringRecord),
    /// Stored value cleared by an empty submission.
    Erased(&'a StringRecord),
    /// Stored value replaced (or an erased value restored).
    Modified(&'a StringRecord, &'a str),
    /// Stored but not part of this submission. Typically a shared key still
    /// used by another simulation, so the record is kept as-is.
    Preserved(&'a StringRecord),
}

/// Classifies one key. `submitted` must already be trimmed.
#[must_use]
pub fn classify<'a>(
    old: Option<&'a StringRecord>,
    submitted: Option<&'a str>,
) -> KeyDisposition<'a> {
    match (old, submitted) {
        (None, None) => KeyDisposition::Absent,
        (None, Some("")) => KeyDisposition::StillEmpty,
        (None, Some(value)) => KeyDisposition::Created(value),
        (Some(record), None) => KeyDisposition::Preserved(record),
        (Some(record), Some(value)) if record.value == value => KeyDisposition::Unchanged(record),
        (Some(record), Some("")) => KeyDisposition::Erased(record),
        (Some(record), Some(value)) => KeyDisposition::Modified(record, value),
    }
}

/// Trims surrounding whitespace, keeping U+00A0 (non-breaking space) so
/// translators can still express a deliberate leading or trailing space.
#[must_use]
pub fn trim_submitted(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() && c != '\u{00A0}')
}

/// Per-disposition counts of one merge, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub created: usize,
    pub modified: usize,
    pub erased: usize,
    pub unchanged: usize,
    pub preserved: usize,
}

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merged content is identical to the old file; nothing to write.
    Unchanged,
    /// The merged content differs from the old file.
    Changed {
        content: StringFile,
        summary: MergeSummary,
    },
}

impl MergeOutcome {
    /// Returns the new content if the merge changed anything.
    #[must_use]
    pub fn into_changed(self) -> Option<StringFile> {
        match self {
            Self::Unchanged => None,
            Self::Changed { content, .. } => Some(content),
        }
    }

    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Merges `submitted` into `old` for `unit`, attributing every new history
/// entry to `submitter_id` at `timestamp`.
///
/// `old` is `None` when the unit has no file for this locale yet.
///
/// # Errors
///
/// Returns [`ContractViolation`] if the unit name or any submitted key is empty.
pub fn merge(
    unit: &StorageUnit,
    old: Option<&StringFile>,
    submitted: &SubmittedValues,
    submitter_id: &SubmitterId,
    timestamp: i64,
) -> Result<MergeOutcome, ContractViolation> {
    if unit.as_str().is_empty() {
        return Err(ContractViolation::EmptyUnit);
    }
    if submitted.keys().any(|key| key.as_str().is_empty()) {
        return Err(ContractViolation::EmptyKey {
            unit: unit.to_string(),
        });
    }

    let keys: BTreeSet<&StringKey> = old
        .into_iter()
        .flat_map(StringFile::keys)
        .chain(submitted.keys())
        .collect();

    let mut merged = StringFile::new();
    let mut summary = MergeSummary::default();

    for key in keys {
        let old_record = old.and_then(|file| file.get(key));
        let value = submitted.get(key).map(|v| trim_submitted(v));

        match classify(old_record, value) {
            KeyDisposition::Absent | KeyDisposition::StillEmpty => {}
            KeyDisposition::Created(value) => {
                summary.created += 1;
                merged.insert(
                    key.clone(),
                    StringRecord::created(value.to_string(), submitter_id.clone(), timestamp),
                );
            }
            KeyDisposition::Unchanged(record) => {
                summary.unchanged += 1;
                merged.insert(key.clone(), record.clone());
            }
            KeyDisposition::Preserved(record) => {
                summary.preserved += 1;
                merged.insert(key.clone(), record.clone());
            }
            KeyDisposition::Erased(record) => {
                summary.erased += 1;
                merged.insert(
                    key.clone(),
                    record.revised(String::new(), submitter_id.clone(), timestamp),
                );
            }
            KeyDisposition::Modified(record, value) => {
                summary.modified += 1;
                merged.insert(
                    key.clone(),
                    record.revised(value.to_string(), submitter_id.clone(), timestamp),
                );
            }
        }
    }

    let unchanged = match old {
        Some(old) => *old == merged,
        None => merged.is_empty(),
    };

    if unchanged {
        tracing::trace!(unit = %unit, "merge produced no changes");
        Ok(MergeOutcome::Unchanged)
    } else {
        tracing::debug!(
            unit = %unit,
            created = summary.created,
            modified = summary.modified,
            erased = summary.erased,
            preserved = summary.preserved,
            "merge produced changes"
        );
        Ok(MergeOutcome::Changed {
            content: merged,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::record::HistoryEntry;

    fn unit() -> StorageUnit {
        StorageUnit::from("sim1")
    }

    fn who(id: u64) -> SubmitterId {
        SubmitterId::Number(id)
    }

    fn values(pairs: &[(&str, &str)]) -> SubmittedValues {
        pairs
            .iter()
            .map(|(k, v)| (StringKey::from(*k), (*v).to_string()))
            .collect()
    }

    fn file_with(pairs: &[(&str, &str)]) -> StringFile {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    StringKey::from(*k),
                    StringRecord::created((*v).to_string(), SubmitterId::Number(1), 100),
                )
            })
            .collect()
    }

    fn changed(outcome: MergeOutcome) -> StringFile {
        outcome.into_changed().expect("merge should report a change")
    }

    // ---- classification table ----

    #[test]
    fn classify_covers_every_row() {
        let hola = StringRecord::created("Hola".to_string(), SubmitterId::Number(1), 1);

        assert_eq!(classify(None, None), KeyDisposition::Absent);
        assert_eq!(classify(None, Some("")), KeyDisposition::StillEmpty);
        assert_eq!(classify(None, Some("x")), KeyDisposition::Created("x"));
        assert_eq!(classify(Some(&hola), Some("Hola")), KeyDisposition::Unchanged(&hola));
        assert_eq!(classify(Some(&hola), Some("")), KeyDisposition::Erased(&hola));
        assert_eq!(
            classify(Some(&hola), Some("Adiós")),
            KeyDisposition::Modified(&hola, "Adiós")
        );
        assert_eq!(classify(Some(&hola), None), KeyDisposition::Preserved(&hola));
    }

    #[test]
    fn classify_erased_record_resubmitted_empty_is_unchanged() {
        let erased = StringRecord::created("Hola".to_string(), SubmitterId::Number(1), 1)
            .revised(String::new(), SubmitterId::Number(1), 2);
        assert_eq!(classify(Some(&erased), Some("")), KeyDisposition::Unchanged(&erased));
        assert_eq!(
            classify(Some(&erased), Some("Hola")),
            KeyDisposition::Modified(&erased, "Hola")
        );
    }

    // ---- merge ----

    #[test]
    fn modifies_existing_translation() {
        let old = file_with(&[("greeting", "Hola")]);
        let merged = changed(
            merge(&unit(), Some(&old), &values(&[("greeting", "Hola amigo")]), &who(2), 200)
                .unwrap(),
        );

        let record = merged.get(&StringKey::from("greeting")).unwrap();
        assert_eq!(record.value, "Hola amigo");
        assert_eq!(
            record.history,
            vec![
                HistoryEntry {
                    submitter_id: SubmitterId::Number(1),
                    timestamp: 100,
                    old_value: String::new(),
                    new_value: "Hola".to_string(),
                },
                HistoryEntry {
                    submitter_id: SubmitterId::Number(2),
                    timestamp: 200,
                    old_value: "Hola".to_string(),
                    new_value: "Hola amigo".to_string(),
                },
            ]
        );
    }

    #[test]
    fn creates_record_for_first_translation() {
        let merged = changed(
            merge(&unit(), None, &values(&[("title", "Título")]), &who(3), 50).unwrap(),
        );
        let record = merged.get(&StringKey::from("title")).unwrap();
        assert_eq!(record.value, "Título");
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].old_value, "");
    }

    #[test]
    fn empty_submission_for_new_key_is_skipped() {
        let outcome = merge(&unit(), None, &values(&[("title", "")]), &who(3), 50).unwrap();
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn resubmitting_same_value_is_a_no_op() {
        let old = file_with(&[("a", "uno"), ("b", "dos")]);
        let outcome =
            merge(&unit(), Some(&old), &values(&[("a", "uno"), ("b", "dos")]), &who(9), 999)
                .unwrap();
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let old = file_with(&[("a", "uno")]);
        let outcome = merge(&unit(), Some(&old), &values(&[("a", "  uno\n")]), &who(9), 999)
            .unwrap();
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn non_breaking_space_survives_trimming() {
        assert_eq!(trim_submitted("\u{00A0}uno "), "\u{00A0}uno");
        assert_eq!(trim_submitted("\t uno \u{00A0}\n"), "uno \u{00A0}");
    }

    #[test]
    fn shared_keys_absent_from_submission_are_preserved() {
        let old = file_with(&[("A", "v1"), ("B", "v2")]);
        let merged =
            changed(merge(&unit(), Some(&old), &values(&[("A", "v1'")]), &who(2), 2).unwrap());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(&StringKey::from("B")), old.get(&StringKey::from("B")));
        assert_eq!(merged.get(&StringKey::from("A")).unwrap().value, "v1'");
    }

    #[test]
    fn erase_then_restore_keeps_full_history() {
        let old = file_with(&[("k", "v")]);
        let erased =
            changed(merge(&unit(), Some(&old), &values(&[("k", "")]), &who(2), 200).unwrap());
        assert_eq!(erased.get(&StringKey::from("k")).unwrap().value, "");

        let restored =
            changed(merge(&unit(), Some(&erased), &values(&[("k", "v")]), &who(3), 300).unwrap());
        let record = restored.get(&StringKey::from("k")).unwrap();

        assert_eq!(record.value, "v");
        assert_eq!(record.history.len(), 3);
        assert_eq!(record.history[1].old_value, "v");
        assert_eq!(record.history[1].new_value, "");
        assert_eq!(record.history[2].old_value, "");
        assert_eq!(record.history[2].new_value, "v");
    }

    #[test]
    fn erased_record_not_in_submission_is_kept() {
        let old = file_with(&[("k", "v")]);
        let erased =
            changed(merge(&unit(), Some(&old), &values(&[("k", "")]), &who(2), 200).unwrap());

        let outcome = merge(&unit(), Some(&erased), &values(&[]), &who(3), 300).unwrap();
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn summary_counts_dispositions() {
        let old = file_with(&[("keep", "a"), ("same", "b"), ("edit", "c"), ("wipe", "d")]);
        let submitted = values(&[("same", "b"), ("edit", "C"), ("wipe", ""), ("new", "e")]);

        let MergeOutcome::Changed { summary, .. } =
            merge(&unit(), Some(&old), &submitted, &who(2), 2).unwrap()
        else {
            panic!("expected a change");
        };
        assert_eq!(
            summary,
            MergeSummary {
                created: 1,
                modified: 1,
                erased: 1,
                unchanged: 1,
                preserved: 1,
            }
        );
    }

    #[test]
    fn rejects_empty_key() {
        let err = merge(&unit(), None, &values(&[("", "x")]), &who(1), 1).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::EmptyKey {
                unit: "sim1".to_string()
            }
        );
    }

    #[test]
    fn rejects_empty_unit() {
        let err =
            merge(&StorageUnit::from(""), None, &values(&[("k", "x")]), &who(1), 1).unwrap_err();
        assert_eq!(err, ContractViolation::EmptyUnit);
    }

    // ---- properties ----

    fn submission_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from),
                prop::sample::select(vec!["", " ", "x", "y", "z "]).prop_map(String::from),
            ),
            0..4,
        )
    }

    proptest! {
        #[test]
        fn history_is_append_only(rounds in prop::collection::vec(submission_strategy(), 1..6)) {
            let mut current: Option<StringFile> = None;
            for (i, round) in rounds.into_iter().enumerate() {
                let submitted: SubmittedValues = round
                    .into_iter()
                    .map(|(k, v)| (StringKey::new(k), v))
                    .collect();
                let ts = i64::try_from(i).unwrap();
                let outcome = merge(&unit(), current.as_ref(), &submitted, &who(1), ts).unwrap();
                if let Some(next) = outcome.into_changed() {
                    if let Some(prev) = &current {
                        for (key, before) in prev.iter() {
                            let after = next.get(key).expect("records are never dropped");
                            prop_assert!(after.history.len() >= before.history.len());
                            prop_assert_eq!(
                                &after.history[..before.history.len()],
                                &before.history[..]
                            );
                        }
                    }
                    for (_, record) in next.iter() {
                        for pair in record.history.windows(2) {
                            prop_assert_eq!(&pair[0].new_value, &pair[1].old_value);
                        }
                    }
                    current = Some(next);
                }
            }
        }

        #[test]
        fn merging_twice_is_idempotent(round in submission_strategy()) {
            let old = file_with(&[("a", "x"), ("b", "y")]);
            let submitted: SubmittedValues = round
                .into_iter()
                .map(|(k, v)| (StringKey::new(k), v))
                .collect();
            let first = merge(&unit(), Some(&old), &submitted, &who(1), 1)
                .unwrap()
                .into_changed()
                .unwrap_or(old);
            let second = merge(&unit(), Some(&first), &submitted, &who(1), 2).unwrap();
            prop_assert!(second.is_unchanged());
        }
    }
}
