//! Backend-independent catalog repository.
//!
//! # Responsibility
//! - Translate typed and form-level catalog operations into storage adapter
//!   calls.
//! - Own the kind/pet join for reads and the delete-kind integrity rule.
//!
//! # Invariants
//! - `delete_kind` rejects a referenced kind on every backend, including
//!   those whose store would not.
//! - A pet is only written when its `kind_id` resolves to an existing kind.
//! - Untyped form maps are coerced before anything reaches the adapter.
//!
//! # Known limitation
//! - On the document backend the delete-kind pre-check and the delete are
//!   two separate calls; a concurrent `create_pet` can slip in between.

mod join;
mod seed;

pub use seed::SeededCatalog;

use crate::form::{
    kind_patch_from_form, new_kind_from_form, new_pet_from_form, pet_patch_from_form, FormFields,
};
use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{EnrichedPet, NewPet, Pet, PetPatch};
use crate::model::{Entity, RecordId, ValidationError};
use crate::store::{Backend, StorageAdapter, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced to presentation callers.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound { entity: Entity, id: RecordId },
    /// Delete of a kind that still has pets.
    ReferentialIntegrity { kind_name: String },
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ReferentialIntegrity { kind_name } => write!(
                f,
                "cannot delete kind '{kind_name}': referenced by one or more pets"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::ReferentialIntegrity { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Store(other),
        }
    }
}

/// Catalog repository owning one storage adapter.
pub struct PetRepository<S: StorageAdapter> {
    store: S,
}

impl<S: StorageAdapter> PetRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    /// Borrow of the owned adapter, for backend-specific calls.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Lists every pet joined with its kind.
    ///
    /// Pets whose kind no longer exists are returned without kind fields.
    pub fn list_pets(&self) -> RepoResult<Vec<EnrichedPet>> {
        let pets = self.store.find_all_pets()?;
        Ok(join::enrich_pets(&self.store, pets)?)
    }

    pub fn list_kinds(&self) -> RepoResult<Vec<Kind>> {
        Ok(self.store.find_all_kinds()?)
    }

    pub fn get_pet(&self, id: &RecordId) -> RepoResult<Pet> {
        self.store
            .find_pet_by_id(id)?
            .ok_or_else(|| not_found(Entity::Pet, id))
    }

    pub fn get_kind(&self, id: &RecordId) -> RepoResult<Kind> {
        self.store
            .find_kind_by_id(id)?
            .ok_or_else(|| not_found(Entity::Kind, id))
    }

    /// Creates a kind from a submitted form.
    pub fn create_kind(&self, form: &FormFields) -> RepoResult<RecordId> {
        self.add_kind(&new_kind_from_form(form)?)
    }

    /// Creates a pet from a submitted form; `age` is coerced, `kind_id` must exist.
    pub fn create_pet(&self, form: &FormFields) -> RepoResult<RecordId> {
        self.add_pet(&new_pet_from_form(form)?)
    }

    /// Merges the submitted keys into an existing kind.
    pub fn update_kind(&self, id: &RecordId, form: &FormFields) -> RepoResult<()> {
        self.patch_kind(id, &kind_patch_from_form(form)?)
    }

    /// Merges the submitted keys into an existing pet.
    pub fn update_pet(&self, id: &RecordId, form: &FormFields) -> RepoResult<()> {
        self.patch_pet(id, &pet_patch_from_form(form)?)
    }

    pub fn add_kind(&self, kind: &NewKind) -> RepoResult<RecordId> {
        let id = self.store.insert_kind(kind)?;
        info!(
            "event=kind_create module=repository status=ok backend={} kind_id={id}",
            self.backend()
        );
        Ok(id)
    }

    pub fn add_pet(&self, pet: &NewPet) -> RepoResult<RecordId> {
        pet.validate()?;
        self.require_kind(&pet.kind_id)?;

        let id = self
            .store
            .insert_pet(pet)
            .map_err(|err| unknown_kind_on_fk(err, &pet.kind_id))?;
        info!(
            "event=pet_create module=repository status=ok backend={} pet_id={id} kind_id={}",
            self.backend(),
            pet.kind_id
        );
        Ok(id)
    }

    pub fn patch_kind(&self, id: &RecordId, patch: &KindPatch) -> RepoResult<()> {
        self.store.update_kind_by_id(id, patch)?;
        info!(
            "event=kind_update module=repository status=ok backend={} kind_id={id} empty_patch={}",
            self.backend(),
            patch.is_empty()
        );
        Ok(())
    }

    pub fn patch_pet(&self, id: &RecordId, patch: &PetPatch) -> RepoResult<()> {
        if let Some(kind_id) = &patch.kind_id {
            self.require_kind(kind_id)?;
        }

        self.store.update_pet_by_id(id, patch).map_err(|err| match &patch.kind_id {
            Some(kind_id) => unknown_kind_on_fk(err, kind_id),
            None => RepoError::from(err),
        })?;
        info!(
            "event=pet_update module=repository status=ok backend={} pet_id={id} empty_patch={}",
            self.backend(),
            patch.is_empty()
        );
        Ok(())
    }

    /// Deletes a pet. Pets never block each other.
    pub fn delete_pet(&self, id: &RecordId) -> RepoResult<()> {
        self.store.delete_pet_by_id(id)?;
        info!(
            "event=pet_delete module=repository status=ok backend={} pet_id={id}",
            self.backend()
        );
        Ok(())
    }

    /// Deletes a kind that no pet references.
    ///
    /// # Errors
    /// - `NotFound` when the kind does not exist.
    /// - `ReferentialIntegrity` when at least one pet references it, whether
    ///   detected by the pre-check or by the store's own foreign key.
    pub fn delete_kind(&self, id: &RecordId) -> RepoResult<()> {
        let started_at = Instant::now();
        let kind = self.get_kind(id)?;

        let referencing = self.store.count_pets_with_kind(id)?;
        if referencing > 0 {
            warn!(
                "event=kind_delete module=repository status=rejected backend={} kind_id={id} pets={referencing}",
                self.backend()
            );
            return Err(RepoError::ReferentialIntegrity {
                kind_name: kind.name,
            });
        }

        match self.store.delete_kind_by_id(id) {
            Ok(()) => {
                info!(
                    "event=kind_delete module=repository status=ok backend={} kind_id={id} duration_ms={}",
                    self.backend(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(StoreError::ForeignKeyViolation(_)) => {
                warn!(
                    "event=kind_delete module=repository status=rejected backend={} kind_id={id} source=store",
                    self.backend()
                );
                Err(RepoError::ReferentialIntegrity {
                    kind_name: kind.name,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn require_kind(&self, kind_id: &RecordId) -> RepoResult<()> {
        if self.store.find_kind_by_id(kind_id)?.is_none() {
            warn!(
                "event=kind_lookup module=repository status=rejected backend={} kind_id={kind_id}",
                self.backend()
            );
            return Err(ValidationError::UnknownKind(kind_id.clone()).into());
        }
        Ok(())
    }
}

fn not_found(entity: Entity, id: &RecordId) -> RepoError {
    RepoError::NotFound {
        entity,
        id: id.clone(),
    }
}

fn unknown_kind_on_fk(err: StoreError, kind_id: &RecordId) -> RepoError {
    match err {
        StoreError::ForeignKeyViolation(_) => {
            RepoError::Validation(ValidationError::UnknownKind(kind_id.clone()))
        }
        other => other.into(),
    }
}
