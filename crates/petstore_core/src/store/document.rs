//! Embedded document store with two named collections.
//!
//! # Responsibility
//! - Keep kinds and pets as schemaless JSON documents keyed by a generated
//!   `_id` string.
//! - Optionally mirror each collection to `<dir>/<collection>.json`.
//!
//! # Invariants
//! - The store declares no relationships: deleting a referenced kind
//!   succeeds here and integrity is left to the repository pre-check.
//! - Collections keep insertion order.
//! - Updates are `$set`-style merges; keys outside the patch are untouched.
//! - A failed disk write leaves the in-memory collection unchanged.

use super::{Backend, DocumentError, StorageAdapter, StoreError, StoreResult};
use crate::model::kind::{Kind, KindPatch, NewKind};
use crate::model::pet::{NewPet, Pet, PetPatch};
use crate::model::{Entity, RecordId};
use log::{info, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub const KIND_COLLECTION: &str = "kind_collection";
pub const PET_COLLECTION: &str = "pet_collection";
pub const ID_FIELD: &str = "_id";

type Document = Map<String, Value>;

#[derive(Default)]
struct Collections {
    kinds: Vec<Document>,
    pets: Vec<Document>,
}

impl Collections {
    fn get(&self, entity: Entity) -> &Vec<Document> {
        match entity {
            Entity::Kind => &self.kinds,
            Entity::Pet => &self.pets,
        }
    }

    fn get_mut(&mut self, entity: Entity) -> &mut Vec<Document> {
        match entity {
            Entity::Kind => &mut self.kinds,
            Entity::Pet => &mut self.pets,
        }
    }
}

/// Document-oriented catalog store.
pub struct DocumentStore {
    dir: Option<PathBuf>,
    collections: Mutex<Collections>,
}

impl DocumentStore {
    /// Store that lives only as long as the value.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            collections: Mutex::new(Collections::default()),
        }
    }

    /// Opens a directory-backed store, loading any existing collections.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(DocumentError::from)?;

        let collections = Collections {
            kinds: load_collection(&dir, KIND_COLLECTION)?,
            pets: load_collection(&dir, PET_COLLECTION)?,
        };
        info!(
            "event=store_open module=store backend=document status=ok kinds={} pets={}",
            collections.kinds.len(),
            collections.pets.len()
        );

        Ok(Self {
            dir: Some(dir),
            collections: Mutex::new(collections),
        })
    }

    /// Directory holding the collection files, if persistent.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Raw stored documents of one collection, in insertion order.
    pub fn documents(&self, entity: Entity) -> StoreResult<Vec<Value>> {
        let collections = self.lock()?;
        Ok(collections
            .get(entity)
            .iter()
            .cloned()
            .map(Value::Object)
            .collect())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::from(DocumentError::Poisoned))
    }

    fn insert_document(&self, entity: Entity, mut document: Document) -> StoreResult<RecordId> {
        let id = Uuid::new_v4().simple().to_string();
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut collections = self.lock()?;
        let collection = collections.get_mut(entity);
        let mut next = collection.clone();
        next.push(document);
        self.persist(entity, &next)?;
        *collection = next;
        Ok(RecordId::new(id))
    }

    fn find_document(&self, entity: Entity, id: &RecordId) -> StoreResult<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections
            .get(entity)
            .iter()
            .find(|document| has_id(document, id))
            .cloned())
    }

    fn update_document(&self, entity: Entity, id: &RecordId, set: Document) -> StoreResult<()> {
        let mut collections = self.lock()?;
        let collection = collections.get_mut(entity);
        let position = collection
            .iter()
            .position(|document| has_id(document, id))
            .ok_or_else(|| StoreError::not_found(entity, id))?;
        if set.is_empty() {
            return Ok(());
        }

        let mut next = collection.clone();
        next[position].extend(set);
        self.persist(entity, &next)?;
        *collection = next;
        Ok(())
    }

    fn delete_document(&self, entity: Entity, id: &RecordId) -> StoreResult<()> {
        let mut collections = self.lock()?;
        let collection = collections.get_mut(entity);
        let position = collection
            .iter()
            .position(|document| has_id(document, id))
            .ok_or_else(|| StoreError::not_found(entity, id))?;

        let mut next = collection.clone();
        next.remove(position);
        self.persist(entity, &next)?;
        *collection = next;
        Ok(())
    }

    fn persist(&self, entity: Entity, documents: &[Document]) -> StoreResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let name = collection_name(entity);
        let path = collection_path(dir, name);
        let tmp_path = path.with_extension("json.tmp");

        let write = || -> Result<(), DocumentError> {
            let bytes = serde_json::to_vec_pretty(documents)?;
            fs::write(&tmp_path, bytes)?;
            fs::rename(&tmp_path, &path)?;
            Ok(())
        };
        write().map_err(|err| {
            warn!("event=document_persist module=store status=error collection={name} error={err}");
            StoreError::from(err)
        })
    }
}

impl StorageAdapter for DocumentStore {
    fn backend(&self) -> Backend {
        Backend::Document
    }

    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId> {
        kind.validate()?;
        let mut document = Document::new();
        document.insert("name".to_string(), Value::from(kind.name.as_str()));
        document.insert("food".to_string(), Value::from(kind.food.as_str()));
        document.insert("sound".to_string(), Value::from(kind.sound.as_str()));
        self.insert_document(Entity::Kind, document)
    }

    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId> {
        pet.validate()?;
        let mut document = Document::new();
        document.insert("name".to_string(), Value::from(pet.name.as_str()));
        document.insert("age".to_string(), Value::from(pet.age));
        document.insert("owner".to_string(), Value::from(pet.owner.as_str()));
        document.insert("kind_id".to_string(), Value::from(pet.kind_id.as_str()));
        self.insert_document(Entity::Pet, document)
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        let collections = self.lock()?;
        collections.kinds.iter().map(kind_from_document).collect()
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        let collections = self.lock()?;
        collections.pets.iter().map(pet_from_document).collect()
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        self.find_document(Entity::Kind, id)?
            .as_ref()
            .map(kind_from_document)
            .transpose()
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        self.find_document(Entity::Pet, id)?
            .as_ref()
            .map(pet_from_document)
            .transpose()
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        patch.validate()?;
        let mut set = Document::new();
        if let Some(name) = &patch.name {
            set.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(food) = &patch.food {
            set.insert("food".to_string(), Value::from(food.as_str()));
        }
        if let Some(sound) = &patch.sound {
            set.insert("sound".to_string(), Value::from(sound.as_str()));
        }
        self.update_document(Entity::Kind, id, set)
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        patch.validate()?;
        let mut set = Document::new();
        if let Some(name) = &patch.name {
            set.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(age) = patch.age {
            set.insert("age".to_string(), Value::from(age));
        }
        if let Some(owner) = &patch.owner {
            set.insert("owner".to_string(), Value::from(owner.as_str()));
        }
        if let Some(kind_id) = &patch.kind_id {
            set.insert("kind_id".to_string(), Value::from(kind_id.as_str()));
        }
        self.update_document(Entity::Pet, id, set)
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.delete_document(Entity::Kind, id)
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.delete_document(Entity::Pet, id)
    }

    fn count_pets_with_kind(&self, kind_id: &RecordId) -> StoreResult<u64> {
        let collections = self.lock()?;
        let count = collections
            .pets
            .iter()
            .filter(|document| {
                document.get("kind_id").and_then(Value::as_str) == Some(kind_id.as_str())
            })
            .count();
        Ok(count as u64)
    }
}

fn collection_name(entity: Entity) -> &'static str {
    match entity {
        Entity::Kind => KIND_COLLECTION,
        Entity::Pet => PET_COLLECTION,
    }
}

fn collection_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

fn load_collection(dir: &Path, name: &str) -> StoreResult<Vec<Document>> {
    let path = collection_path(dir, name);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = fs::read(&path).map_err(DocumentError::from)?;
    let documents: Vec<Document> = serde_json::from_slice(&bytes).map_err(DocumentError::from)?;
    Ok(documents)
}

fn has_id(document: &Document, id: &RecordId) -> bool {
    document.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str())
}

fn document_id(document: &Document) -> StoreResult<RecordId> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(RecordId::new)
        .ok_or_else(|| StoreError::InvalidData(format!("document without `{ID_FIELD}`")))
}

/// Absent keys read as `""`; a present non-string value is malformed.
fn text(document: &Document, key: &str) -> StoreResult<String> {
    match document.get(key) {
        None => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(malformed_field(document, key, "a string", other)),
    }
}

/// Absent `age` reads as `0`; a present non-integer value is malformed.
fn age(document: &Document) -> StoreResult<i64> {
    match document.get("age") {
        None => Ok(0),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| malformed_field(document, "age", "an integer", value)),
    }
}

fn malformed_field(document: &Document, key: &str, expected: &str, found: &Value) -> StoreError {
    let id = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or("?");
    StoreError::InvalidData(format!(
        "document {id}: `{key}` must be {expected}, found {found}"
    ))
}

fn kind_from_document(document: &Document) -> StoreResult<Kind> {
    let kind = Kind {
        id: document_id(document)?,
        name: text(document, "name")?,
        food: text(document, "food")?,
        sound: text(document, "sound")?,
    };
    kind.validate()
        .map_err(|err| StoreError::InvalidData(format!("kind {}: {err}", kind.id)))?;
    Ok(kind)
}

fn pet_from_document(document: &Document) -> StoreResult<Pet> {
    let pet = Pet {
        id: document_id(document)?,
        name: text(document, "name")?,
        age: age(document)?,
        owner: text(document, "owner")?,
        kind_id: RecordId::new(text(document, "kind_id")?),
    };
    pet.validate()
        .map_err(|err| StoreError::InvalidData(format!("pet {}: {err}", pet.id)))?;
    Ok(pet)
}
