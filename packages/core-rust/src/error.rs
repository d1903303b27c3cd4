//! Errors raised when a caller hands the core malformed input.

/// A submission or merge input that breaks the calling contract.
///
/// These are never retried: the same input will always be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("string key must not be empty (unit '{unit}')")]
    EmptyKey { unit: String },
    #[error("storage unit name must not be empty")]
    EmptyUnit,
    #[error("locale must not be empty")]
    EmptyLocale,
    #[error("locale '{locale}' is the source language and is never stored as a translation")]
    CanonicalLocale { locale: String },
    #[error("malformed submission: {reason}")]
    Malformed { reason: String },
}
