//! `Rosetta` core: translation records, append-only history, and the record merger.

pub mod clock;
pub mod error;
pub mod merger;
pub mod record;
pub mod submission;
pub mod types;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::ContractViolation;
pub use merger::{
    classify, merge, trim_submitted, KeyDisposition, MergeOutcome, MergeSummary, SubmittedValues,
};
pub use record::{HistoryEntry, PersistedFile, StringFile, StringRecord};
pub use submission::SubmittedTranslation;
pub use types::{Locale, StorageUnit, StringKey, SubmitterId, VersionToken};
