//! Object-relational adapter over sea-orm entities.
//!
//! # Responsibility
//! - Map the catalog onto `kind`/`pet` entities whose relation declares
//!   `on_delete = Restrict`.
//! - Materialize live entity models into plain records at the adapter
//!   boundary so the repository sees the same flat contract as every other
//!   backend.
//!
//! # Invariants
//! - Tables are created from the entity definitions, so the foreign key
//!   always matches the declared relation.
//! - Merge updates go through `ActiveModel`: only patched columns are set.

pub mod kind;
pub mod pet;

use super::runtime::BlockingRuntime;
use super::{Backend, StorageAdapter, StoreError, StoreResult};
use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{NewPet, Pet, PetPatch};
use crate::model::{Entity, RecordId};
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Schema, Set,
    TransactionTrait,
};
use std::path::Path;

/// sea-orm backed catalog store.
pub struct OrmStore {
    runtime: BlockingRuntime,
    db: DatabaseConnection,
}

impl OrmStore {
    /// Connects to any sea-orm URL and creates the entity tables.
    ///
    /// SQLite URLs get a single pooled connection so `sqlite::memory:`
    /// keeps one database for the lifetime of the store.
    pub fn connect(url: &str) -> StoreResult<Self> {
        let runtime = BlockingRuntime::new()?;
        let mut options = ConnectOptions::new(url.to_string());
        options.sqlx_logging(false);
        if url.starts_with("sqlite:") {
            options.max_connections(1).min_connections(1);
        }

        let db = runtime.block_on(Database::connect(options))?;
        let store = Self { runtime, db };
        store.create_tables()?;
        info!(
            "event=store_open module=store backend=orm status=ok dialect={:?}",
            store.db.get_database_backend()
        );
        Ok(store)
    }

    /// Opens (or creates) a SQLite file through the ORM.
    pub fn open_sqlite(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::connect(&format!("sqlite://{}?mode=rwc", path.as_ref().display()))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:")
    }

    fn create_tables(&self) -> StoreResult<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let mut kind_table = schema.create_table_from_entity(kind::Entity);
        kind_table.if_not_exists();
        let mut pet_table = schema.create_table_from_entity(pet::Entity);
        pet_table.if_not_exists();

        self.runtime.block_on(async {
            self.db.execute(backend.build(&kind_table)).await?;
            self.db.execute(backend.build(&pet_table)).await?;
            Ok::<(), StoreError>(())
        })
    }

    /// Follows the pet's relation to its kind (`pet.kind`).
    pub fn kind_for_pet(&self, pet_id: &RecordId) -> StoreResult<Option<Kind>> {
        let Some(key) = entity_key(pet_id) else {
            return Ok(None);
        };
        self.runtime.block_on(async {
            let Some(pet) = pet::Entity::find_by_id(key).one(&self.db).await? else {
                return Ok(None);
            };
            let kind = pet.find_related(kind::Entity).one(&self.db).await?;
            Ok::<_, StoreError>(kind.map(Kind::from))
        })
    }
}

impl StorageAdapter for OrmStore {
    fn backend(&self) -> Backend {
        Backend::Orm
    }

    fn insert_kind(&self, new_kind: &NewKind) -> StoreResult<RecordId> {
        new_kind.validate()?;
        let active = kind::ActiveModel {
            name: Set(new_kind.name.clone()),
            food: Set(new_kind.food.clone()),
            sound: Set(new_kind.sound.clone()),
            ..Default::default()
        };
        let model = self.runtime.block_on(active.insert(&self.db))?;
        Ok(RecordId::from(model.id))
    }

    fn insert_pet(&self, new_pet: &NewPet) -> StoreResult<RecordId> {
        new_pet.validate()?;
        let kind_key = reference_key(&new_pet.kind_id)?;
        let active = pet::ActiveModel {
            name: Set(new_pet.name.clone()),
            age: Set(new_pet.age),
            owner: Set(new_pet.owner.clone()),
            kind_id: Set(kind_key),
            ..Default::default()
        };
        let model = self.runtime.block_on(active.insert(&self.db))?;
        Ok(RecordId::from(model.id))
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        let models = self.runtime.block_on(
            kind::Entity::find()
                .order_by_asc(kind::Column::Id)
                .all(&self.db),
        )?;
        Ok(models.into_iter().map(Kind::from).collect())
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        let models = self.runtime.block_on(
            pet::Entity::find()
                .order_by_asc(pet::Column::Id)
                .all(&self.db),
        )?;
        Ok(models.into_iter().map(Pet::from).collect())
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        let Some(key) = entity_key(id) else {
            return Ok(None);
        };
        let model = self
            .runtime
            .block_on(kind::Entity::find_by_id(key).one(&self.db))?;
        Ok(model.map(Kind::from))
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        let Some(key) = entity_key(id) else {
            return Ok(None);
        };
        let model = self
            .runtime
            .block_on(pet::Entity::find_by_id(key).one(&self.db))?;
        Ok(model.map(Pet::from))
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = entity_key(id).ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;

        self.runtime.block_on(async {
            let txn = self.db.begin().await?;
            let model = kind::Entity::find_by_id(key)
                .one(&txn)
                .await?
                .ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;
            if patch.is_empty() {
                return Ok(());
            }

            let mut active: kind::ActiveModel = model.into();
            if let Some(name) = &patch.name {
                active.name = Set(name.clone());
            }
            if let Some(food) = &patch.food {
                active.food = Set(food.clone());
            }
            if let Some(sound) = &patch.sound {
                active.sound = Set(sound.clone());
            }
            active.update(&txn).await?;
            txn.commit().await?;
            Ok::<(), StoreError>(())
        })
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        patch.validate()?;
        let key = entity_key(id).ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;
        let kind_key = patch.kind_id.as_ref().map(reference_key).transpose()?;

        self.runtime.block_on(async {
            let txn = self.db.begin().await?;
            let model = pet::Entity::find_by_id(key)
                .one(&txn)
                .await?
                .ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;
            if patch.is_empty() {
                return Ok(());
            }

            let mut active: pet::ActiveModel = model.into();
            if let Some(name) = &patch.name {
                active.name = Set(name.clone());
            }
            if let Some(age) = patch.age {
                active.age = Set(age);
            }
            if let Some(owner) = &patch.owner {
                active.owner = Set(owner.clone());
            }
            if let Some(kind_key) = kind_key {
                active.kind_id = Set(kind_key);
            }
            active.update(&txn).await?;
            txn.commit().await?;
            Ok::<(), StoreError>(())
        })
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        let key = entity_key(id).ok_or_else(|| StoreError::not_found(Entity::Kind, id))?;
        let result = self
            .runtime
            .block_on(kind::Entity::delete_by_id(key).exec(&self.db))?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found(Entity::Kind, id));
        }
        Ok(())
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        let key = entity_key(id).ok_or_else(|| StoreError::not_found(Entity::Pet, id))?;
        let result = self
            .runtime
            .block_on(pet::Entity::delete_by_id(key).exec(&self.db))?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found(Entity::Pet, id));
        }
        Ok(())
    }

    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64> {
        let Some(key) = entity_key(kind_id) else {
            return Ok(0);
        };
        self.runtime.block_on(async {
            match kind::Entity::find_by_id(key).one(&self.db).await? {
                // kind.pets
                Some(kind) => Ok(kind.find_related(pet::Entity).count(&self.db).await?),
                None => Ok::<_, StoreError>(
                    pet::Entity::find()
                        .filter(pet::Column::KindId.eq(key))
                        .count(&self.db)
                        .await?,
                ),
            }
        })
    }
}

fn entity_key(id: &RecordId) -> Option<i32> {
    id.as_i64().and_then(|value| i32::try_from(value).ok())
}

fn reference_key(kind_id: &RecordId) -> StoreResult<i32> {
    entity_key(kind_id).ok_or_else(|| {
        StoreError::ForeignKeyViolation(format!("kind_id `{kind_id}` is not a kind key"))
    })
}
