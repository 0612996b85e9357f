//! Storage adapter contract and backend implementations.
//!
//! # Responsibility
//! - Define the raw persistence contract the repository is written against.
//! - Keep driver details (SQL dialects, ORM entities, documents) inside the
//!   adapter boundary.
//!
//! # Invariants
//! - Write paths validate records before touching the backend.
//! - Lookups report absence as `Ok(None)`; only updates/deletes turn a
//!   missing id into `StoreError::NotFound`.
//! - `find_all_*` ordering is stable: primary-key order for relational
//!   backends, insertion order for the document backend.
//! - Adapters never join kinds into pets; enrichment belongs to the
//!   repository.

use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{NewPet, Pet, PetPatch};
use crate::model::RecordId;
use std::fmt::{Display, Formatter};

pub mod document;
mod error;
pub mod orm;
pub mod postgres;
mod runtime;
pub mod sqlite;

pub use document::DocumentStore;
pub use error::{DocumentError, StoreError, StoreResult};
pub use orm::OrmStore;
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Storage paradigm behind an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Embedded SQLite with declared foreign keys.
    Sqlite,
    /// PostgreSQL over a client/server connection pool.
    Postgres,
    /// Object-relational mapping over sea-orm entities.
    Orm,
    /// Embedded document collections without joins or foreign keys.
    Document,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Orm => "orm",
            Self::Document => "document",
        }
    }

    /// Whether the backend itself rejects deleting a referenced kind.
    pub fn enforces_foreign_keys(self) -> bool {
        !matches!(self, Self::Document)
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw persistence contract shared by all backends.
pub trait StorageAdapter {
    fn backend(&self) -> Backend;

    /// Persists a new kind and returns its generated id.
    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId>;
    /// Persists a new pet and returns its generated id.
    ///
    /// Relational backends reject an unknown `kind_id` with
    /// `ForeignKeyViolation`; the document backend stores it as given.
    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId>;

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>>;
    /// Lists pets with their raw `kind_id`, un-enriched.
    fn find_all_pets(&self) -> StoreResult<Vec<Pet>>;

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>>;
    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>>;

    /// Merges `patch` into the stored kind.
    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()>;
    /// Merges `patch` into the stored pet.
    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()>;

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()>;
    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()>;

    /// Counts pets whose `kind_id` equals `kind_id`.
    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64>;
}

impl<S: StorageAdapter + ?Sized> StorageAdapter for Box<S> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId> {
        (**self).insert_kind(kind)
    }

    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId> {
        (**self).insert_pet(pet)
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        (**self).find_all_kinds()
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        (**self).find_all_pets()
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        (**self).find_kind_by_id(id)
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        (**self).find_pet_by_id(id)
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        (**self).update_kind_by_id(id, patch)
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        (**self).update_pet_by_id(id, patch)
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        (**self).delete_kind_by_id(id)
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        (**self).delete_pet_by_id(id)
    }

    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64> {
        (**self).count_pets_with_kind(kind_id)
    }
}
