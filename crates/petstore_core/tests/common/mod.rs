//! Repository behaviour shared by every backend's test binary.
#![allow(dead_code)]

use petstore_core::{
    Entity, FormFields, PetRepository, RecordId, RepoError, StorageAdapter, ValidationError,
};
use serde_json::json;

pub fn form(pairs: &[(&str, &str)]) -> FormFields {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn create_dog<S: StorageAdapter>(repo: &PetRepository<S>) -> RecordId {
    repo.create_kind(&form(&[("name", "dog"), ("food", "dogfood"), ("sound", "bark")]))
        .unwrap()
}

pub fn create_cat<S: StorageAdapter>(repo: &PetRepository<S>) -> RecordId {
    repo.create_kind(&form(&[("name", "cat"), ("food", "catfood"), ("sound", "meow")]))
        .unwrap()
}

pub fn create_dorothy<S: StorageAdapter>(repo: &PetRepository<S>, kind_id: &RecordId) -> RecordId {
    repo.create_pet(&form(&[
        ("name", "Dorothy"),
        ("age", "9"),
        ("owner", "greg"),
        ("kind_id", kind_id.as_str()),
    ]))
    .unwrap()
}

pub fn created_kind_reads_back<S: StorageAdapter>(repo: &PetRepository<S>) {
    let id = create_dog(repo);
    let kind = repo.get_kind(&id).unwrap();

    assert_eq!(kind.id, id);
    assert_eq!(kind.name, "dog");
    assert_eq!(kind.food, "dogfood");
    assert_eq!(kind.sound, "bark");
}

pub fn created_pet_is_listed_with_kind_fields<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let cat = create_cat(repo);
    let dorothy = create_dorothy(repo, &dog);
    let heidi = repo
        .create_pet(&form(&[
            ("name", "heidi"),
            ("age", "15"),
            ("owner", "david"),
            ("kind_id", cat.as_str()),
        ]))
        .unwrap();

    let pets = repo.list_pets().unwrap();
    assert_eq!(pets.len(), 2);
    assert_eq!(pets[0].id, dorothy);
    assert_eq!(pets[0].kind_name.as_deref(), Some("dog"));
    assert_eq!(pets[0].food.as_deref(), Some("dogfood"));
    assert_eq!(pets[0].sound.as_deref(), Some("bark"));
    assert_eq!(pets[1].id, heidi);
    assert_eq!(pets[1].kind_name.as_deref(), Some("cat"));
    assert_eq!(pets[1].sound.as_deref(), Some("meow"));
}

pub fn empty_kind_update_changes_nothing<S: StorageAdapter>(repo: &PetRepository<S>) {
    let id = create_dog(repo);
    let before = repo.get_kind(&id).unwrap();

    repo.update_kind(&id, &FormFields::new()).unwrap();

    assert_eq!(repo.get_kind(&id).unwrap(), before);
}

pub fn partial_updates_merge<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let pet = create_dorothy(repo, &dog);

    repo.update_kind(&dog, &form(&[("sound", "woof")])).unwrap();
    repo.update_pet(&pet, &form(&[("owner", "anna")])).unwrap();

    let kind = repo.get_kind(&dog).unwrap();
    assert_eq!((kind.name.as_str(), kind.food.as_str()), ("dog", "dogfood"));
    assert_eq!(kind.sound, "woof");

    let stored = repo.get_pet(&pet).unwrap();
    assert_eq!(stored.name, "Dorothy");
    assert_eq!(stored.age, 9);
    assert_eq!(stored.owner, "anna");
    assert_eq!(stored.kind_id, dog);

    repo.update_pet(&pet, &form(&[("age", "ten")])).unwrap();
    assert_eq!(repo.get_pet(&pet).unwrap().age, 0);
}

pub fn pet_can_move_to_another_existing_kind<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let cat = create_cat(repo);
    let pet = create_dorothy(repo, &dog);

    repo.update_pet(&pet, &form(&[("kind_id", cat.as_str())]))
        .unwrap();
    assert_eq!(repo.get_pet(&pet).unwrap().kind_id, cat);
    assert_eq!(repo.list_pets().unwrap()[0].kind_name.as_deref(), Some("cat"));

    let err = repo
        .update_pet(&pet, &form(&[("kind_id", "424242")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownKind(_))
    ));
    assert_eq!(repo.get_pet(&pet).unwrap().kind_id, cat);
}

pub fn pet_with_unknown_kind_is_rejected<S: StorageAdapter>(repo: &PetRepository<S>) {
    create_dog(repo);

    let err = repo
        .create_pet(&form(&[("name", "Rex"), ("kind_id", "424242")]))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownKind(ref id)) if id.as_str() == "424242"
    ));
    assert!(repo.list_pets().unwrap().is_empty());
}

pub fn referenced_kind_cannot_be_deleted<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let pet = create_dorothy(repo, &dog);

    let err = repo.delete_kind(&dog).unwrap_err();

    assert!(matches!(err, RepoError::ReferentialIntegrity { ref kind_name } if kind_name == "dog"));
    assert_eq!(
        err.to_string(),
        "cannot delete kind 'dog': referenced by one or more pets"
    );
    assert_eq!(repo.get_kind(&dog).unwrap().name, "dog");
    assert_eq!(repo.get_pet(&pet).unwrap().kind_id, dog);
}

pub fn unreferenced_kind_is_deleted<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let cat = create_cat(repo);
    create_dorothy(repo, &dog);

    repo.delete_kind(&cat).unwrap();

    assert!(matches!(
        repo.get_kind(&cat).unwrap_err(),
        RepoError::NotFound {
            entity: Entity::Kind,
            ..
        }
    ));
    assert_eq!(repo.list_kinds().unwrap().len(), 1);
}

pub fn missing_records_are_not_found<S: StorageAdapter>(repo: &PetRepository<S>) {
    let missing = RecordId::new("999999");

    for err in [
        repo.get_pet(&missing).unwrap_err(),
        repo.update_pet(&missing, &form(&[("name", "x")])).unwrap_err(),
        repo.delete_pet(&missing).unwrap_err(),
    ] {
        assert!(matches!(err, RepoError::NotFound { entity: Entity::Pet, .. }));
    }
    for err in [
        repo.update_kind(&missing, &FormFields::new()).unwrap_err(),
        repo.delete_kind(&missing).unwrap_err(),
    ] {
        assert!(matches!(err, RepoError::NotFound { entity: Entity::Kind, .. }));
    }
}

pub fn age_is_coerced_on_create<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);

    let bad = repo
        .create_pet(&form(&[
            ("name", "Rex"),
            ("age", "abc"),
            ("owner", "Al"),
            ("kind_id", dog.as_str()),
        ]))
        .unwrap();
    let good = repo
        .create_pet(&form(&[("name", "Rex"), ("age", "7"), ("kind_id", dog.as_str())]))
        .unwrap();

    assert_eq!(repo.get_pet(&bad).unwrap().age, 0);
    assert_eq!(repo.get_pet(&good).unwrap().age, 7);
    assert_eq!(repo.get_pet(&good).unwrap().owner, "");
}

pub fn dorothy_lifecycle<S: StorageAdapter>(repo: &PetRepository<S>) {
    let dog = create_dog(repo);
    let pet = create_dorothy(repo, &dog);

    let listed = serde_json::to_value(repo.list_pets().unwrap()).unwrap();
    assert_eq!(
        listed,
        json!([{
            "id": pet.as_str(),
            "name": "Dorothy",
            "age": 9,
            "owner": "greg",
            "kind_name": "dog",
            "food": "dogfood",
            "sound": "bark",
        }])
    );

    assert!(matches!(
        repo.delete_kind(&dog),
        Err(RepoError::ReferentialIntegrity { .. })
    ));
    repo.delete_pet(&pet).unwrap();
    repo.delete_kind(&dog).unwrap();

    assert!(repo.list_pets().unwrap().is_empty());
    assert!(repo.list_kinds().unwrap().is_empty());
}

pub fn demo_catalog_seeds_two_kinds_and_four_pets<S: StorageAdapter>(repo: &PetRepository<S>) {
    let seeded = repo.seed_demo_catalog().unwrap();
    assert_eq!(seeded.kinds.len(), 2);
    assert_eq!(seeded.pets.len(), 4);

    let pets = repo.list_pets().unwrap();
    let summary: Vec<_> = pets
        .iter()
        .map(|pet| (pet.name.as_str(), pet.age, pet.kind_name.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("dorothy", 9, Some("dog")),
            ("suzy", 9, Some("dog")),
            ("casey", 9, Some("cat")),
            ("heidi", 15, Some("cat")),
        ]
    );

    for kind_id in &seeded.kinds {
        assert!(matches!(
            repo.delete_kind(kind_id),
            Err(RepoError::ReferentialIntegrity { .. })
        ));
    }
}

pub fn long_text_fields_are_stored_verbatim<S: StorageAdapter>(repo: &PetRepository<S>) {
    let name = "k".repeat(60);
    let food = "f".repeat(150);
    let kind = repo
        .create_kind(&form(&[("name", &name), ("food", &food), ("sound", "hum")]))
        .unwrap();
    let owner = "o".repeat(120);
    let pet = repo
        .create_pet(&form(&[
            ("name", &"p".repeat(120)),
            ("age", "2"),
            ("owner", &owner),
            ("kind_id", kind.as_str()),
        ]))
        .unwrap();

    assert_eq!(repo.get_kind(&kind).unwrap().food, food);
    assert_eq!(repo.get_pet(&pet).unwrap().owner, owner);
    assert_eq!(repo.list_pets().unwrap()[0].kind_name.as_deref(), Some(name.as_str()));
}
