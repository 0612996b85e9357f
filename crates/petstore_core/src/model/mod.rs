//! Catalog record model shared by every storage backend.
//!
//! # Responsibility
//! - Define the `Kind` (parent) and `Pet` (child) records and their write
//!   shapes (`New*` for creation, `*Patch` for partial merge updates).
//! - Define the enriched read projection returned to presentation callers.
//!
//! # Invariants
//! - Identifiers are opaque: callers never do arithmetic on a `RecordId`.
//! - `name` is non-empty for both kinds and pets.
//! - Every pet references exactly one kind through `kind_id`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kind;
pub mod pet;

/// Opaque record identifier generated by the backing store.
///
/// Relational stores render integer primary keys into it, the document store
/// keeps its generated hex keys verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Integer view used by relational adapters.
    ///
    /// Returns `None` when the id was not produced by an integer key, which
    /// adapters treat as "no such row". Only the canonical rendering counts:
    /// `"01"` and `"+1"` are not key 1.
    pub fn as_i64(&self) -> Option<i64> {
        let value = self.0.parse::<i64>().ok()?;
        (value.to_string() == self.0).then_some(value)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Record family targeted by a polymorphic store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Kind,
    Pet,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Pet => "pet",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected write input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required form field was not submitted at all.
    MissingField(&'static str),
    /// A required field was submitted but empty.
    EmptyField(&'static str),
    /// `kind_id` does not reference an existing kind.
    UnknownKind(RecordId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::EmptyField(field) => write!(f, "field `{field}` must not be empty"),
            Self::UnknownKind(id) => {
                write!(f, "kind_id `{id}` does not reference an existing kind")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
