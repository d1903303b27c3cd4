//! Identifier newtypes shared by every layer.
//!
//! [`StorageUnit`], [`Locale`] and [`StringKey`] are opaque string identifiers.
//! They are kept distinct at the type level so a locale can never be passed
//! where a unit name is expected. [`SubmitterId`] and [`VersionToken`] carry
//! the remaining scalar identities of the data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate an opaque string identifier newtype.
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Name of an independently versioned collection of strings
    /// (a simulation repo or a shared library repo).
    StorageUnit
);

string_id!(
    /// Opaque locale identifier, e.g. `es` or `zh_CN`.
    Locale
);

string_id!(
    /// Identifier of one translatable string, unique within a [`StorageUnit`].
    StringKey
);

string_id!(
    /// Content hash of a stored object, used for optimistic-concurrency writes.
    VersionToken
);

/// The source language. Its strings live with the code, never in the
/// translation store.
pub const CANONICAL_LOCALE: &str = "en";

/// Prefix of keys that only matter to accessibility (screen-reader) output.
pub const A11Y_KEY_PREFIX: &str = "a11y.";

impl Locale {
    /// Returns `true` for the source-language locale.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.0 == CANONICAL_LOCALE
    }
}

impl StringKey {
    /// Returns `true` if this key belongs to the accessibility-only key set.
    #[must_use]
    pub fn is_a11y(&self) -> bool {
        self.0.starts_with(A11Y_KEY_PREFIX)
    }
}

/// Identity of the translator who made a change.
///
/// Older files carry numeric ids, newer ones may carry textual ids. Both
/// round-trip unchanged through (de)serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitterId {
    /// Numeric account id.
    Number(u64),
    /// Textual account id.
    Text(String),
}

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for SubmitterId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for SubmitterId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
