//! `delete_kind` when a referencing pet appears after the pre-check: the
//! relational store's own constraint must still surface as an integrity error.

use petstore_core::{
    Backend, Kind, KindPatch, NewKind, NewPet, OrmStore, Pet, PetPatch, PetRepository, RecordId,
    RepoError, SqliteStore, StorageAdapter, StoreResult,
};

/// Adapter whose reference count always reports zero, so the repository
/// pre-check passes and the store decides.
struct UncountedStore<S>(S);

impl<S: StorageAdapter> StorageAdapter for UncountedStore<S> {
    fn backend(&self) -> Backend {
        self.0.backend()
    }

    fn insert_kind(&self, kind: &NewKind) -> StoreResult<RecordId> {
        self.0.insert_kind(kind)
    }

    fn insert_pet(&self, pet: &NewPet) -> StoreResult<RecordId> {
        self.0.insert_pet(pet)
    }

    fn find_all_kinds(&self) -> StoreResult<Vec<Kind>> {
        self.0.find_all_kinds()
    }

    fn find_all_pets(&self) -> StoreResult<Vec<Pet>> {
        self.0.find_all_pets()
    }

    fn find_kind_by_id(&self, id: &RecordId) -> StoreResult<Option<Kind>> {
        self.0.find_kind_by_id(id)
    }

    fn find_pet_by_id(&self, id: &RecordId) -> StoreResult<Option<Pet>> {
        self.0.find_pet_by_id(id)
    }

    fn update_kind_by_id(&self, id: &RecordId, patch: &KindPatch) -> StoreResult<()> {
        self.0.update_kind_by_id(id, patch)
    }

    fn update_pet_by_id(&self, id: &RecordId, patch: &PetPatch) -> StoreResult<()> {
        self.0.update_pet_by_id(id, patch)
    }

    fn delete_kind_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.0.delete_kind_by_id(id)
    }

    fn delete_pet_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.0.delete_pet_by_id(id)
    }

    fn count_pets_with_kind(&self, _kind_id: &RecordId) -> StoreResult<u64> {
        Ok(0)
    }
}

fn assert_store_rejection_is_integrity_error<S: StorageAdapter>(store: S) {
    let repo = PetRepository::new(UncountedStore(store));
    let dog = repo.add_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
    let dorothy = repo
        .add_pet(&NewPet {
            name: "Dorothy".to_string(),
            age: 9,
            owner: "greg".to_string(),
            kind_id: dog.clone(),
        })
        .unwrap();

    let err = repo.delete_kind(&dog).unwrap_err();

    match &err {
        RepoError::ReferentialIntegrity { kind_name } => assert_eq!(kind_name, "dog"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "cannot delete kind 'dog': referenced by one or more pets"
    );
    assert_eq!(repo.get_kind(&dog).unwrap().name, "dog");
    assert_eq!(repo.get_pet(&dorothy).unwrap().kind_id, dog);
}

#[test]
fn sqlite_constraint_rejection_is_an_integrity_error() {
    assert_store_rejection_is_integrity_error(SqliteStore::open_in_memory().unwrap());
}

#[test]
fn orm_constraint_rejection_is_an_integrity_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_store_rejection_is_integrity_error(
        OrmStore::open_sqlite(dir.path().join("pets_orm.db")).unwrap(),
    );
}
