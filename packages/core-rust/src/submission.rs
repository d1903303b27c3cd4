//! Translator submissions as handed to the persistence engine.
//!
//! The API layer has already split the submitted keys by owning unit (the
//! simulation's own keys, shared keys of other simulations, and common
//! library keys). Deserialization rejects anything that is not a map of maps
//! of strings; [`SubmittedTranslation::validate`] checks the identifiers.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::ContractViolation;
use crate::merger::SubmittedValues;
use crate::types::{Locale, StorageUnit, SubmitterId};

/// One translator's save request.
///
/// ```json
/// {
///   "locale": "es",
///   "primaryUnit": "sim1",
///   "submitterId": 2,
///   "timestamp": 200,
///   "perUnitValues": { "sim1": { "greeting": "Hola amigo" } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTranslation {
    pub locale: Locale,
    /// The simulation the translator was working on.
    pub primary_unit: StorageUnit,
    pub submitter_id: SubmitterId,
    /// Millis since Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub per_unit_values: BTreeMap<StorageUnit, SubmittedValues>,
}

impl SubmittedTranslation {
    /// Parses and validates a submission document.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::Malformed`] for invalid JSON, missing
    /// fields or wrong JSON types, and the [`validate`](Self::validate)
    /// errors for empty identifiers or a canonical-locale submission.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ContractViolation> {
        let translation: Self =
            serde_json::from_slice(bytes).map_err(|e| ContractViolation::Malformed {
                reason: e.to_string(),
            })?;
        translation.validate()?;
        Ok(translation)
    }

    /// Checks the identifier invariants of an already-typed submission.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractViolation`] found.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.locale.as_str().is_empty() {
            return Err(ContractViolation::EmptyLocale);
        }
        if self.locale.is_canonical() {
            return Err(ContractViolation::CanonicalLocale {
                locale: self.locale.to_string(),
            });
        }
        if self.primary_unit.as_str().is_empty() {
            return Err(ContractViolation::EmptyUnit);
        }
        for (unit, values) in &self.per_unit_values {
            if unit.as_str().is_empty() {
                return Err(ContractViolation::EmptyUnit);
            }
            if values.keys().any(|key| key.as_str().is_empty()) {
                return Err(ContractViolation::EmptyKey {
                    unit: unit.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Every unit this submission touches: the primary unit plus each unit
    /// that owns submitted keys.
    #[must_use]
    pub fn touched_units(&self) -> BTreeSet<StorageUnit> {
        let mut units: BTreeSet<StorageUnit> = self.per_unit_values.keys().cloned().collect();
        units.insert(self.primary_unit.clone());
        units
    }

    /// Submitted values for `unit`, empty if the submission has none.
    #[must_use]
    pub fn values_for(&self, unit: &StorageUnit) -> SubmittedValues {
        self.per_unit_values.get(unit).cloned().unwrap_or_default()
    }

    /// Drops accessibility-only keys from every unit.
    pub fn strip_a11y_keys(&mut self) {
        for values in self.per_unit_values.values_mut() {
            values.retain(|key, _| !key.is_a11y());
        }
    }
}
