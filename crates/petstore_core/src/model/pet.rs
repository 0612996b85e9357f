//! Pet records and the enriched pet read projection.
//!
//! # Invariants
//! - `kind_id` is an opaque reference to exactly one kind.
//! - `EnrichedPet` is derived on read and never persisted.

use super::kind::Kind;
use super::{require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted pet record with its raw `kind_id` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: RecordId,
    pub name: String,
    pub age: i64,
    pub owner: String,
    pub kind_id: RecordId,
}

impl Pet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

/// Create input for a pet; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub age: i64,
    pub owner: String,
    pub kind_id: RecordId,
}

impl NewPet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("kind_id", self.kind_id.as_str())
    }

    pub fn into_pet(self, id: RecordId) -> Pet {
        Pet {
            id,
            name: self.name,
            age: self.age,
            owner: self.owner,
            kind_id: self.kind_id,
        }
    }
}

/// Partial update for a pet. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub owner: Option<String>,
    pub kind_id: Option<RecordId>,
}

impl PetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.owner.is_none() && self.kind_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_non_empty("name", name)?;
        }
        if let Some(kind_id) = &self.kind_id {
            require_non_empty("kind_id", kind_id.as_str())?;
        }
        Ok(())
    }

    pub fn apply_to(&self, pet: &mut Pet) {
        if let Some(name) = &self.name {
            pet.name.clone_from(name);
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if let Some(owner) = &self.owner {
            pet.owner.clone_from(owner);
        }
        if let Some(kind_id) = &self.kind_id {
            pet.kind_id = kind_id.clone();
        }
    }
}

/// Pet joined with its kind, flattened for display.
///
/// The kind fields are `None` only when the pet references a kind that no
/// longer exists, which is possible on stores without foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPet {
    pub id: RecordId,
    pub name: String,
    pub age: i64,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl EnrichedPet {
    pub fn from_parts(pet: Pet, kind: Option<&Kind>) -> Self {
        Self {
            id: pet.id,
            name: pet.name,
            age: pet.age,
            owner: pet.owner,
            kind_name: kind.map(|kind| kind.name.clone()),
            food: kind.map(|kind| kind.food.clone()),
            sound: kind.map(|kind| kind.sound.clone()),
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.kind_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{EnrichedPet, NewPet, Pet, PetPatch};
    use crate::model::kind::NewKind;
    use crate::model::{RecordId, ValidationError};
    use serde_json::json;

    fn dorothy() -> Pet {
        NewPet {
            name: "Dorothy".to_string(),
            age: 9,
            owner: "greg".to_string(),
            kind_id: RecordId::from(1_i64),
        }
        .into_pet(RecordId::from(10_i64))
    }

    #[test]
    fn patch_can_repoint_kind_and_keep_other_fields() {
        let mut pet = dorothy();
        let patch = PetPatch {
            kind_id: Some(RecordId::from(2_i64)),
            ..PetPatch::default()
        };
        patch.apply_to(&mut pet);
        assert_eq!(pet.kind_id, RecordId::from(2_i64));
        assert_eq!(pet.name, "Dorothy");
        assert_eq!(pet.age, 9);
    }

    #[test]
    fn new_pet_requires_kind_reference() {
        let pet = NewPet {
            name: "Rex".to_string(),
            age: 0,
            owner: String::new(),
            kind_id: RecordId::new(""),
        };
        assert_eq!(pet.validate(), Err(ValidationError::EmptyField("kind_id")));
    }

    #[test]
    fn enriched_projection_flattens_kind_fields() {
        let kind = NewKind::new("dog", "dogfood", "bark").into_kind(RecordId::from(1_i64));
        let enriched = EnrichedPet::from_parts(dorothy(), Some(&kind));
        assert_eq!(
            serde_json::to_value(&enriched).unwrap(),
            json!({
                "id": "10",
                "name": "Dorothy",
                "age": 9,
                "owner": "greg",
                "kind_name": "dog",
                "food": "dogfood",
                "sound": "bark"
            })
        );
    }

    #[test]
    fn dangling_reference_omits_enrichment_keys() {
        let enriched = EnrichedPet::from_parts(dorothy(), None);
        assert!(!enriched.is_enriched());
        let value = serde_json::to_value(&enriched).unwrap();
        assert!(value.get("kind_name").is_none());
        assert!(value.get("food").is_none());
        assert_eq!(value["name"], "Dorothy");
    }
}
