//! Pet catalog data-access core.
//!
//! Kinds own pets through a one-to-many `kind_id` reference. The
//! [`PetRepository`] keeps that relationship consistent (no kind is deleted
//! while pets reference it) over any [`StorageAdapter`]: embedded SQLite,
//! PostgreSQL, a sea-orm mapping, or schemaless document collections.

pub mod config;
pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod repository;
pub mod store;

pub use config::{open_repository, DynRepository, StoreConfig};
pub use form::{coerce_age, FormFields, DEFAULT_AGE};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::kind::{Kind, KindPatch, NewKind};
pub use model::pet::{EnrichedPet, NewPet, Pet, PetPatch};
pub use model::{Entity, RecordId, ValidationError};
pub use repository::{PetRepository, RepoError, RepoResult, SeededCatalog};
pub use store::{
    Backend, DocumentStore, OrmStore, PgStore, SqliteStore, StorageAdapter, StoreError,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
