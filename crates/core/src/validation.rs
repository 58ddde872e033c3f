//! Structured validation for vote candidates.
//!
//! Validation failures are data, not exceptions: a rejected write comes
//! back carrying its errors while storage stays untouched.

use serde::Serialize;
use thiserror::Error;

/// A single validation failure on a vote candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// A required reference is absent.
    #[error("{field} must be present")]
    Presence {
        /// Field the failure is attached to.
        field: &'static str,
    },

    /// A value falls outside its allowed set.
    #[error("{field} contains values outside the allowed set: {invalid:?}")]
    Inclusion {
        /// Field the failure is attached to.
        field: &'static str,
        /// The offending entries.
        invalid: Vec<String>,
    },

    /// Another row already holds this (voter, votable) pair. Advisory;
    /// the storage unique index is authoritative.
    #[error("{field} has already voted on this votable")]
    Uniqueness {
        /// Field the failure is attached to.
        field: &'static str,
    },
}

impl ValidationError {
    /// Field this failure is attached to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Presence { field }
            | Self::Inclusion { field, .. }
            | Self::Uniqueness { field } => field,
        }
    }
}

/// An ordered collection of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Whether validation passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The failures in check order.
    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    /// Iterate over the failures.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// One-line summary for logs and error envelopes.
    #[must_use]
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
