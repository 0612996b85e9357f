//! Kind (species/category) records.
//!
//! # Invariants
//! - `name` is non-empty on every persisted kind.
//! - A patch never clears a field it does not mention.

use super::{require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted kind record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind {
    pub id: RecordId,
    pub name: String,
    pub food: String,
    pub sound: String,
}

impl Kind {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

/// Create input for a kind; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKind {
    pub name: String,
    pub food: String,
    pub sound: String,
}

impl NewKind {
    pub fn new(name: impl Into<String>, food: impl Into<String>, sound: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            food: food.into(),
            sound: sound.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }

    /// Attaches a store-generated id.
    pub fn into_kind(self, id: RecordId) -> Kind {
        Kind {
            id,
            name: self.name,
            food: self.food,
            sound: self.sound,
        }
    }
}

/// Partial update for a kind. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindPatch {
    pub name: Option<String>,
    pub food: Option<String>,
    pub sound: Option<String>,
}

impl KindPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.food.is_none() && self.sound.is_none()
    }

    /// Rejects a patch that would blank out the kind name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.name.as_deref() {
            Some(name) => require_non_empty("name", name),
            None => Ok(()),
        }
    }

    pub fn apply_to(&self, kind: &mut Kind) {
        if let Some(name) = &self.name {
            kind.name.clone_from(name);
        }
        if let Some(food) = &self.food {
            kind.food.clone_from(food);
        }
        if let Some(sound) = &self.sound {
            kind.sound.clone_from(sound);
        }
    }
}
