use petstore_core::db::open_db_in_memory;
use petstore_core::{
    Backend, KindPatch, NewKind, NewPet, PetPatch, RecordId, SqliteStore, StorageAdapter,
    StoreError,
};
use rusqlite::Connection;

fn new_pet(name: &str, kind_id: &RecordId) -> NewPet {
    NewPet {
        name: name.to_string(),
        age: 9,
        owner: "greg".to_string(),
        kind_id: kind_id.clone(),
    }
}

#[test]
fn generated_ids_are_integer_keys_in_insert_order() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.backend(), Backend::Sqlite);

    let dog = store.insert_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
    let cat = store.insert_kind(&NewKind::new("cat", "catfood", "meow")).unwrap();

    assert_eq!(dog.as_i64(), Some(1));
    assert_eq!(cat.as_i64(), Some(2));
    let names: Vec<_> = store
        .find_all_kinds()
        .unwrap()
        .into_iter()
        .map(|kind| kind.name)
        .collect();
    assert_eq!(names, vec!["dog", "cat"]);
}

#[test]
fn store_itself_restricts_deleting_a_referenced_kind() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dog = store.insert_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
    store.insert_pet(&new_pet("Dorothy", &dog)).unwrap();

    let err = store.delete_kind_by_id(&dog).unwrap_err();

    assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    assert!(store.find_kind_by_id(&dog).unwrap().is_some());
    assert_eq!(store.count_pets_with_kind(&dog).unwrap(), 1);
}

#[test]
fn unknown_kind_reference_is_a_foreign_key_violation() {
    let store = SqliteStore::open_in_memory().unwrap();

    let by_key = store.insert_pet(&new_pet("Rex", &RecordId::from(41_i64)));
    let by_text = store.insert_pet(&new_pet("Rex", &RecordId::new("dog")));

    assert!(matches!(by_key, Err(StoreError::ForeignKeyViolation(_))));
    assert!(matches!(by_text, Err(StoreError::ForeignKeyViolation(_))));
    assert!(store.find_all_pets().unwrap().is_empty());
}

#[test]
fn rejected_update_rolls_back() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dog = store.insert_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
    let pet = store.insert_pet(&new_pet("Dorothy", &dog)).unwrap();

    let err = store
        .update_pet_by_id(
            &pet,
            &PetPatch {
                owner: Some("anna".to_string()),
                kind_id: Some(RecordId::from(99_i64)),
                ..PetPatch::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    let stored = store.find_pet_by_id(&pet).unwrap().unwrap();
    assert_eq!(stored.owner, "greg");
    assert_eq!(stored.kind_id, dog);
}

#[test]
fn non_integer_ids_are_absent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let missing = RecordId::new("65a1f0c2");

    assert_eq!(store.find_kind_by_id(&missing).unwrap(), None);
    assert!(matches!(
        store.update_kind_by_id(&missing, &KindPatch::default()),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete_pet_by_id(&missing),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn try_new_accepts_only_bootstrapped_connections() {
    let raw = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteStore::try_new(raw),
        Err(StoreError::Db(_))
    ));

    let store = SqliteStore::try_new(open_db_in_memory().unwrap()).unwrap();
    assert!(store.find_all_pets().unwrap().is_empty());
}

#[test]
fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pets.db");

    let dog = {
        let store = SqliteStore::open(&path).unwrap();
        let dog = store.insert_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
        store.insert_pet(&new_pet("Dorothy", &dog)).unwrap();
        dog
    };

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.find_kind_by_id(&dog).unwrap().unwrap().sound, "bark");
    assert_eq!(store.count_pets_with_kind(&dog).unwrap(), 1);
}

#[test]
fn non_canonical_integer_ids_do_not_resolve() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dog = store.insert_kind(&NewKind::new("dog", "dogfood", "bark")).unwrap();
    assert_eq!(dog.as_str(), "1");

    assert!(store.find_kind_by_id(&RecordId::new("01")).unwrap().is_none());
    assert!(store.find_kind_by_id(&RecordId::new("+1")).unwrap().is_none());
    assert!(store.find_kind_by_id(&dog).unwrap().is_some());
}
