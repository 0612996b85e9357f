//! `pet` table entity; each pet belongs to one kind.

use sea_orm::entity::prelude::*;

use crate::model::pet::Pet;
use crate::model::RecordId;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pet")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub age: i64,
    pub owner: String,
    pub kind_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kind::Entity",
        from = "Column::KindId",
        to = "super::kind::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Kind,
}

impl Related<super::kind::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Kind.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Pet {
    fn from(model: Model) -> Self {
        Pet {
            id: RecordId::from(model.id),
            name: model.name,
            age: model.age,
            owner: model.owner,
            kind_id: RecordId::from(model.kind_id),
        }
    }
}
