//! `kind` table entity.

use sea_orm::entity::prelude::*;

use crate::model::kind::Kind;
use crate::model::RecordId;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "kind")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub food: String,
    pub sound: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pet::Entity")]
    Pet,
}

impl Related<super::pet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Kind {
    fn from(model: Model) -> Self {
        Kind {
            id: RecordId::from(model.id),
            name: model.name,
            food: model.food,
            sound: model.sound,
        }
    }
}
