use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reference data: the parts catalog slice the core needs for existence
/// checks, SKU collision scans, and error messages. Catalog CRUD lives
/// outside this crate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_event::Entity")]
    InventoryEvents,
    #[sea_orm(has_many = "super::request_item::Entity")]
    RequestItems,
}

impl Related<super::inventory_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEvents.def()
    }
}

impl Related<super::request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
