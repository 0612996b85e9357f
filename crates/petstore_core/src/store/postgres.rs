//! PostgreSQL adapter over a sqlx connection pool.
//!
//! # Responsibility
//! - Persist kinds and pets in PostgreSQL with the same constraint semantics
//!   as the embedded store (`ON DELETE RESTRICT`).
//! - Materialize rows by column name, never by position.
//!
//! # Invariants
//! - Every call checks a connection out of the pool and returns it on all
//!   exit paths; merge updates run in a transaction that rolls back on drop.
//! - Connection acquisition is bounded by `PgStoreOptions::acquire_timeout`.

use super::runtime::BlockingRuntime;
use super::sqlite::relational_reference;
use super::{Backend, StorageAdapter, StoreError, StoreResult};
use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{NewPet, Pet, PetPatch};
use crate::model::{Entity, RecordId};
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Postgres, Row};
use std::time::Duration;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS kind (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL CHECK (name <> ''),
        food TEXT NOT NULL DEFAULT '',
        sound TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS pet (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL CHECK (name <> ''),
        age BIGINT NOT NULL DEFAULT 0,
        owner TEXT NOT NULL DEFAULT '',
        kind_id BIGINT NOT NULL REFERENCES kind(id) ON DELETE RESTRICT
    )",
    "CREATE INDEX IF NOT EXISTS idx_pet_kind_id ON pet(kind_id)",
];

const KIND_SELECT_SQL: &str = "SELECT id, name, food, sound FROM kind";
const PET_SELECT_SQL: &str = "SELECT id, name, age, owner, kind_id FROM pet";

/// Pool settings for [`PgStore::connect_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgStoreOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL-backed catalog store.
pub struct PgStore {
    runtime: BlockingRuntime,
    pool: PgPool,
}

impl PgStore {
    /// Connects with default pool settings and bootstraps the schema.
    pub fn connect(url: &str) -> StoreResult<Self> {
        Self::connect_with(url, &PgStoreOptions::default())
    }

    pub fn connect_with(url: &str, options: &PgStoreOptions) -> StoreResult<Self> {
        let runtime = BlockingRuntime::new()?;
        let pool = runtime.block_on(
            PgPoolOptions::new()
                .max_connections(options.max_connections)
                .acquire_timeout(options.acquire_timeout)
                .connect(url),
        )?;

        let store = Self { runtime, pool };
        store.ensure_schema()?;
        info!(
            "event=store_open module=store backend=postgres status=ok max_connections={}",
            options.max_connections
        );
        Ok(store)
    }

    /// Creates the catalog tables when missing.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        self.runtime.block_on(async {
            for statement in SCHEMA_STATEMENTS {
                self.pool.execute(*statement).await?;
            }
            Ok::<(), StoreError>(())
        })
    }

    /// Drops and recreates both tables. Destroys all catalog data.
    pub fn reset_schema(&self) -> StoreResult<()> {
        self.runtime.block_on(async {
            self.pool.execute("DROP TABLE IF EXISTS pet").await?;
            self.pool.execute("DROP TABLE IF EXISTS kind").await?;
            Ok::<(), StoreError>(())
        })?;
        self.ensure_schema()
    }
}

impl StorageAdapter for PgStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId> {
        kind.validate()?;
        self.runtime.block_on(async {
            let row = sqlx::query(
                "INSERT INTO kind (name, food, sound) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(&kind.name)
            .bind(&kind.food)
            .bind(&kind.sound)
            .fetch_one(&self.pool)
            .await?;
            Ok::<_, StoreError>(RecordId::from(row.try_get::<i64, _>("id")?))
        })
    }

    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId> {
        pet.validate()?;
        let kind_key = relational_reference(&pet.kind_id)?;
        self.runtime.block_on(async {
            let row = sqlx::query(
                "INSERT INTO pet (name, age, owner, kind_id) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(&pet.name)
            .bind(pet.age)
            .bind(&pet.owner)
            .bind(kind_key)
            .fetch_one(&self.pool)
            .await?;
            Ok::<_, StoreError>(RecordId::from(row.try_get::<i64, _>("id")?))
        })
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        self.runtime.block_on(async {
            let rows = sqlx::query(&format!("{KIND_SELECT_SQL} ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(kind_from_row).collect::<StoreResult<Vec<_>>>()
        })
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        self.runtime.block_on(async {
            let rows = sqlx::query(&format!("{PET_SELECT_SQL} ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(pet_from_row).collect::<StoreResult<Vec<_>>>()
        })
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        let Some(key) = id.as_i64() else {
            return Ok(None);
        };
        self.runtime.block_on(select_kind(&self.pool, key, false))
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        let Some(key) = id.as_i64() else {
            return Ok(None);
        };
        self.runtime.block_on(select_pet(&self.pool, key, false))
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = id
            .as_i64()
            .ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;

        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await?;
            let mut kind = select_kind(&mut *tx, key, true)
                .await?
                .ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;
            if patch.is_empty() {
                return Ok(());
            }

            patch.apply_to(&mut kind);
            kind.validate()?;
            sqlx::query("UPDATE kind SET name = $1, food = $2, sound = $3 WHERE id = $4")
                .bind(&kind.name)
                .bind(&kind.food)
                .bind(&kind.sound)
                .bind(key)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok::<(), StoreError>(())
        })
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = id
            .as_i64()
            .ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;

        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await?;
            let mut pet = select_pet(&mut *tx, key, true)
                .await?
                .ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;
            if patch.is_empty() {
                return Ok(());
            }

            patch.apply_to(&mut pet);
            pet.validate()?;
            let kind_key = relational_reference(&pet.kind_id)?;
            sqlx::query(
                "UPDATE pet SET name = $1, age = $2, owner = $3, kind_id = $4 WHERE id = $5",
            )
            .bind(&pet.name)
            .bind(pet.age)
            .bind(&pet.owner)
            .bind(kind_key)
            .bind(key)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<(), StoreError>(())
        })
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.delete_row("DELETE FROM kind WHERE id = $1", Entity::Kind, id)
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.delete_row("DELETE FROM pet WHERE id = $1", Entity::Pet, id)
    }

    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64> {
        let Some(key) = kind_id.as_i64() else {
            return Ok(0);
        };
        self.runtime.block_on(async {
            let row = sqlx::query("SELECT COUNT(*) AS pet_count FROM pet WHERE kind_id = $1")
                .bind(key)
                .fetch_one(&self.pool)
                .await?;
            let count: i64 = row.try_get("pet_count")?;
            Ok::<_, StoreError>(u64::try_from(count).unwrap_or(0))
        })
    }
}

impl PgStore {
    fn delete_row(&self, sql: &str, entity: Entity, id: &RecordId) -> StoreResult<()> {
        let key = id
            .as_i64()
            .ok_or_else(|| StoreError::not_found(entity, id))?;
        let result = self
            .runtime
            .block_on(sqlx::query(sql).bind(key).execute(&self.pool))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity, id));
        }
        Ok(())
    }
}

async fn select_kind<'e, E>(executor: E, key: i64, for_update: bool) -> StoreResult<Option<Kind>>
where
    E: Executor<'e, Database = Postgres>,
{
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let row = sqlx::query(&format!("{KIND_SELECT_SQL} WHERE id = $1{lock}"))
        .bind(key)
        .fetch_optional(executor)
        .await?;
    row.as_ref().map(kind_from_row).transpose()
}

async fn select_pet<'e, E>(executor: E, key: i64, for_update: bool) -> StoreResult<Option<Pet>>
where
    E: Executor<'e, Database = Postgres>,
{
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let row = sqlx::query(&format!("{PET_SELECT_SQL} WHERE id = $1{lock}"))
        .bind(key)
        .fetch_optional(executor)
        .await?;
    row.as_ref().map(pet_from_row).transpose()
}

fn kind_from_row(row: &PgRow) -> StoreResult<Kind> {
    let kind = Kind {
        id: RecordId::from(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        food: row.try_get("food")?,
        sound: row.try_get("sound")?,
    };
    kind.validate()
        .map_err(|err| StoreError::InvalidData(format!("kind {}: {err}", kind.id)))?;
    Ok(kind)
}

fn pet_from_row(row: &PgRow) -> StoreResult<Pet> {
    let pet = Pet {
        id: RecordId::from(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        age: row.try_get("age")?,
        owner: row.try_get("owner")?,
        kind_id: RecordId::from(row.try_get::<i64, _>("kind_id")?),
    };
    pet.validate()
        .map_err(|err| StoreError::InvalidData(format!("pet {}: {err}", pet.id)))?;
    Ok(pet)
}
