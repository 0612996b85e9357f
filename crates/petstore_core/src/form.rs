//! Form coercion from untyped request maps into typed write shapes.
//!
//! # Responsibility
//! - Turn string-keyed form submissions into `NewKind`/`NewPet` and patches.
//! - Own the age coercion rule shared by create and update paths.
//!
//! # Invariants
//! - Untyped maps never travel past this module.
//! - String fields pass through byte-for-byte (no trimming, no re-casing).
//! - Age parse failures become `0` and are never reported to the caller.

use crate::model::kind::{KindPatch, NewKind};
use crate::model::pet::{NewPet, PetPatch};
use crate::model::{RecordId, ValidationError};
use log::debug;
use std::collections::HashMap;

/// Form submission as delivered by the request-parsing layer.
pub type FormFields = HashMap<String, String>;

/// Age stored when the submitted value is absent or not an integer.
pub const DEFAULT_AGE: i64 = 0;

/// Coerces a submitted age into an integer, falling back to `DEFAULT_AGE`.
///
/// Surrounding whitespace is ignored for the numeric parse only.
pub fn coerce_age(raw: Option<&str>) -> i64 {
    match raw {
        Some(value) => match value.trim().parse::<i64>() {
            Ok(age) => age,
            Err(_) => {
                debug!("event=coerce_age module=form status=fallback default={DEFAULT_AGE}");
                DEFAULT_AGE
            }
        },
        None => DEFAULT_AGE,
    }
}

/// Builds a kind create request. `name` is required; `food`/`sound` default to empty.
pub fn new_kind_from_form(form: &FormFields) -> Result<NewKind, ValidationError> {
    let kind = NewKind {
        name: required(form, "name")?,
        food: optional(form, "food").unwrap_or_default(),
        sound: optional(form, "sound").unwrap_or_default(),
    };
    kind.validate()?;
    Ok(kind)
}

/// Builds a pet create request. `name` and `kind_id` are required.
pub fn new_pet_from_form(form: &FormFields) -> Result<NewPet, ValidationError> {
    let pet = NewPet {
        name: required(form, "name")?,
        age: coerce_age(form.get("age").map(String::as_str)),
        owner: optional(form, "owner").unwrap_or_default(),
        kind_id: RecordId::new(required(form, "kind_id")?),
    };
    pet.validate()?;
    Ok(pet)
}

/// Builds a kind merge patch from the keys present in the form.
pub fn kind_patch_from_form(form: &FormFields) -> Result<KindPatch, ValidationError> {
    let patch = KindPatch {
        name: optional(form, "name"),
        food: optional(form, "food"),
        sound: optional(form, "sound"),
    };
    patch.validate()?;
    Ok(patch)
}

/// Builds a pet merge patch. A present `age` is coerced, an absent one is kept.
pub fn pet_patch_from_form(form: &FormFields) -> Result<PetPatch, ValidationError> {
    let patch = PetPatch {
        name: optional(form, "name"),
        age: form.get("age").map(|value| coerce_age(Some(value.as_str()))),
        owner: optional(form, "owner"),
        kind_id: optional(form, "kind_id").map(RecordId::new),
    };
    patch.validate()?;
    Ok(patch)
}

fn required(form: &FormFields, field: &'static str) -> Result<String, ValidationError> {
    form.get(field)
        .cloned()
        .ok_or(ValidationError::MissingField(field))
}

fn optional(form: &FormFields, field: &str) -> Option<String> {
    form.get(field).cloned()
}
