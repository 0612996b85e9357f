//! Embedded SQLite adapter.
//!
//! # Responsibility
//! - Persist kinds and pets in the `kind`/`pet` tables created by the
//!   migration bootstrap.
//! - Rely on `pet.kind_id REFERENCES kind(id) ON DELETE RESTRICT` for
//!   store-level integrity.
//!
//! # Invariants
//! - The adapter owns its connection; nothing else writes through it.
//! - Read-merge-write updates run inside one transaction that rolls back on
//!   every early return.

use super::{Backend, StorageAdapter, StoreError, StoreResult};
use crate::db::{ensure_catalog_ready, open_db, open_db_in_memory};
use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{NewPet, Pet, PetPatch};
use crate::model::{Entity, RecordId};
use rusqlite::{params, Connection, Row};
use std::path::Path;

const KIND_SELECT_SQL: &str = "SELECT id, name, food, sound FROM kind";
const PET_SELECT_SQL: &str = "SELECT id, name, age, owner, kind_id FROM pet";

/// SQLite-backed catalog store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already bootstrapped connection.
    ///
    /// # Errors
    /// - Rejects connections that were not migrated or have foreign keys off.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_catalog_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrow of the owned connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StorageAdapter for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId> {
        kind.validate()?;

        self.conn.execute(
            "INSERT INTO kind (name, food, sound) VALUES (?1, ?2, ?3);",
            params![kind.name, kind.food, kind.sound],
        )?;

        Ok(RecordId::from(self.conn.last_insert_rowid()))
    }

    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId> {
        pet.validate()?;
        let kind_key = relational_reference(&pet.kind_id)?;

        self.conn.execute(
            "INSERT INTO pet (name, age, owner, kind_id) VALUES (?1, ?2, ?3, ?4);",
            params![pet.name, pet.age, pet.owner, kind_key],
        )?;

        Ok(RecordId::from(self.conn.last_insert_rowid()))
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{KIND_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut kinds = Vec::new();
        while let Some(row) = rows.next()? {
            kinds.push(parse_kind_row(row)?);
        }
        Ok(kinds)
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PET_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut pets = Vec::new();
        while let Some(row) = rows.next()? {
            pets.push(parse_pet_row(row)?);
        }
        Ok(pets)
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        match id.as_i64() {
            Some(key) => select_kind(&self.conn, key),
            None => Ok(None),
        }
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        match id.as_i64() {
            Some(key) => select_pet(&self.conn, key),
            None => Ok(None),
        }
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = id
            .as_i64()
            .ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;

        let tx = self.conn.unchecked_transaction()?;
        let mut kind =
            select_kind(&tx, key)?.ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;
        if patch.is_empty() {
            return Ok(());
        }

        patch.apply_to(&mut kind);
        kind.validate()?;
        tx.execute(
            "UPDATE kind SET name = ?1, food = ?2, sound = ?3 WHERE id = ?4;",
            params![kind.name, kind.food, kind.sound, key],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = id
            .as_i64()
            .ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;

        let tx = self.conn.unchecked_transaction()?;
        let mut pet =
            select_pet(&tx, key)?.ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;
        if patch.is_empty() {
            return Ok(());
        }

        patch.apply_to(&mut pet);
        pet.validate()?;
        let kind_key = relational_reference(&pet.kind_id)?;
        tx.execute(
            "UPDATE pet SET name = ?1, age = ?2, owner = ?3, kind_id = ?4 WHERE id = ?5;",
            params![pet.name, pet.age, pet.owner, kind_key, key],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        delete_row(&self.conn, "DELETE FROM kind WHERE id = ?1;", Entity::Kind, id)
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        delete_row(&self.conn, "DELETE FROM pet WHERE id = ?1;", Entity::Pet, id)
    }

    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64> {
        let Some(key) = kind_id.as_i64() else {
            return Ok(0);
        };
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pet WHERE kind_id = ?1;",
            [key],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Integer key for a `kind_id`; anything else cannot reference a kind row.
pub(crate) fn relational_reference(kind_id: &RecordId) -> StoreResult<i64> {
    kind_id.as_i64().ok_or_else(|| {
        StoreError::ForeignKeyViolation(format!("kind_id `{kind_id}` is not a kind key"))
    })
}

fn delete_row(conn: &Connection, sql: &str, entity: Entity, id: &RecordId) -> StoreResult<()> {
    let key = id
        .as_i64()
        .ok_or_else(|| StoreError::not_found(entity, id))?;
    let changed = conn.execute(sql, [key])?;
    if changed == 0 {
        return Err(StoreError::not_found(entity, id));
    }
    Ok(())
}

fn select_kind(conn: &Connection, key: i64) -> StoreResult<Option<Kind>> {
    let mut stmt = conn.prepare(&format!("{KIND_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_kind_row(row)?));
    }

    Ok(None)
}

fn select_pet(conn: &Connection, key: i64) -> StoreResult<Option<Pet>> {
    let mut stmt = conn.prepare(&format!("{PET_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_pet_row(row)?));
    }

    Ok(None)
}

fn parse_kind_row(row: &Row<'_>) -> StoreResult<Kind> {
    let kind = Kind {
        id: RecordId::from(row.get::<_, i64>("id")?),
        name: row.get("name")?,
        food: row.get("food")?,
        sound: row.get("sound")?,
    };
    kind.validate()
        .map_err(|err| StoreError::InvalidData(format!("kind {}: {err}", kind.id)))?;
    Ok(kind)
}

fn parse_pet_row(row: &Row<'_>) -> StoreResult<Pet> {
    let pet = Pet {
        id: RecordId::from(row.get::<_, i64>("id")?),
        name: row.get("name")?,
        age: row.get("age")?,
        owner: row.get("owner")?,
        kind_id: RecordId::from(row.get::<_, i64>("kind_id")?),
    };
    pet.validate()
        .map_err(|err| StoreError::InvalidData(format!("pet {}: {err}", pet.id)))?;
    Ok(pet)
}
