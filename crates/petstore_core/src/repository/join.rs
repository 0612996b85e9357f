//! Kind/pet join performed above the adapter.
//!
//! Every distinct `kind_id` is looked up once; stores without joins (the
//! document backend) and stores with them go through the same path.

use crate::model::kind::Kind;
use crate::model::pet::{EnrichedPet, Pet};
use crate::model::RecordId;
use crate::store::{StorageAdapter, StoreResult};
use log::warn;
use std::collections::HashMap;

pub(crate) fn enrich_pets<S>(store: &S, pets: Vec<Pet>) -> StoreResult<Vec<EnrichedPet>>
where
    S: StorageAdapter + ?Sized,
{
    let mut kinds: HashMap<RecordId, Option<Kind>> = HashMap::new();
    for pet in &pets {
        if kinds.contains_key(&pet.kind_id) {
            continue;
        }
        let kind = store.find_kind_by_id(&pet.kind_id)?;
        if kind.is_none() {
            warn!(
                "event=pet_join module=repository status=dangling backend={} kind_id={}",
                store.backend(),
                pet.kind_id
            );
        }
        kinds.insert(pet.kind_id.clone(), kind);
    }

    Ok(pets
        .into_iter()
        .map(|pet| {
            let kind = kinds.get(&pet.kind_id).and_then(Option::as_ref);
            EnrichedPet::from_parts(pet, kind)
        })
        .collect())
}
