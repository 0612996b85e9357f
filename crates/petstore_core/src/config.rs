//! Store selection.
//!
//! # Responsibility
//! - Describe which backend a process talks to as plain serde data.
//! - Construct the matching adapter and wrap it in a repository.
//!
//! # Invariants
//! - The core never reads environment variables; callers build the config.

use crate::repository::PetRepository;
use crate::store::{DocumentStore, OrmStore, PgStore, SqliteStore, StorageAdapter, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Repository over whichever adapter a [`StoreConfig`] selected.
pub type DynRepository = PetRepository<Box<dyn StorageAdapter>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    SqliteMemory,
    Sqlite { path: PathBuf },
    Postgres { url: String },
    /// Any sea-orm URL (`sqlite://...`, `postgres://...`).
    Orm { url: String },
    DocumentMemory,
    Document { dir: PathBuf },
}

impl StoreConfig {
    /// Short backend label, matching the serde tag.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SqliteMemory => "sqlite_memory",
            Self::Sqlite { .. } => "sqlite",
            Self::Postgres { .. } => "postgres",
            Self::Orm { .. } => "orm",
            Self::DocumentMemory => "document_memory",
            Self::Document { .. } => "document",
        }
    }

    /// Opens the configured adapter.
    pub fn open(&self) -> StoreResult<Box<dyn StorageAdapter>> {
        let store: Box<dyn StorageAdapter> = match self {
            Self::SqliteMemory => Box::new(SqliteStore::open_in_memory()?),
            Self::Sqlite { path } => Box::new(SqliteStore::open(path)?),
            Self::Postgres { url } => Box::new(PgStore::connect(url)?),
            Self::Orm { url } => Box::new(OrmStore::connect(url)?),
            Self::DocumentMemory => Box::new(DocumentStore::in_memory()),
            Self::Document { dir } => Box::new(DocumentStore::open(dir)?),
        };
        Ok(store)
    }
}

/// Opens the configured adapter and hands it to a new repository.
pub fn open_repository(config: &StoreConfig) -> StoreResult<DynRepository> {
    Ok(PetRepository::new(config.open()?))
}

#[cfg(test)]
mod tests {
    use super::{open_repository, StoreConfig};
    use crate::store::Backend;
    use std::path::PathBuf;

    #[test]
    fn config_is_tagged_by_backend() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"backend":"sqlite","path":"/tmp/pets.db"}"#).unwrap();
        assert_eq!(
            config,
            StoreConfig::Sqlite {
                path: PathBuf::from("/tmp/pets.db")
            }
        );

        let memory: StoreConfig = serde_json::from_str(r#"{"backend":"document_memory"}"#).unwrap();
        assert_eq!(memory, StoreConfig::DocumentMemory);
        assert_eq!(memory.label(), "document_memory");
    }

    #[test]
    fn opens_in_memory_backends() {
        let sqlite = open_repository(&StoreConfig::SqliteMemory).unwrap();
        assert_eq!(sqlite.backend(), Backend::Sqlite);

        let document = open_repository(&StoreConfig::DocumentMemory).unwrap();
        assert_eq!(document.backend(), Backend::Document);
        assert!(document.list_pets().unwrap().is_empty());
    }
}
