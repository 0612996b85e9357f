//! Demo catalog used by local databases and smoke runs.

use super::{PetRepository, RepoResult};
use crate::model::kind::NewKind;
use crate::model::pet::NewPet;
use crate::model::RecordId;
use crate::store::StorageAdapter;
use log::info;
use serde::Serialize;

const DEMO_KINDS: &[(&str, &str, &str)] = &[("dog", "dogfood", "bark"), ("cat", "catfood", "meow")];

/// `(name, age, owner, index into DEMO_KINDS)`
const DEMO_PETS: &[(&str, i64, &str, usize)] = &[
    ("dorothy", 9, "greg", 0),
    ("suzy", 9, "greg", 0),
    ("casey", 9, "greg", 1),
    ("heidi", 15, "david", 1),
];

/// Ids generated while seeding, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeededCatalog {
    pub kinds: Vec<RecordId>,
    pub pets: Vec<RecordId>,
}

impl<S: StorageAdapter> PetRepository<S> {
    /// Inserts the two demo kinds and four demo pets.
    ///
    /// Seeding is additive; running it twice creates duplicates.
    pub fn seed_demo_catalog(&self) -> RepoResult<SeededCatalog> {
        let mut kinds = Vec::with_capacity(DEMO_KINDS.len());
        for (name, food, sound) in DEMO_KINDS {
            kinds.push(self.add_kind(&NewKind::new(*name, *food, *sound))?);
        }

        let mut pets = Vec::with_capacity(DEMO_PETS.len());
        for (name, age, owner, kind_index) in DEMO_PETS {
            pets.push(self.add_pet(&NewPet {
                name: (*name).to_string(),
                age: *age,
                owner: (*owner).to_string(),
                kind_id: kinds[*kind_index].clone(),
            })?);
        }

        info!(
            "event=seed_demo module=repository status=ok backend={} kinds={} pets={}",
            self.backend(),
            kinds.len(),
            pets.len()
        );
        Ok(SeededCatalog { kinds, pets })
    }
}
