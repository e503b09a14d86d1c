use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical stock location (shelf, bay, yard row). Names are unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_event::Entity")]
    InventoryEvents,
}

impl Related<super::inventory_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
