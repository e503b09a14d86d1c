use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seeded component taxonomy, 2-letter codes scoped to a system.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "component_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub system_code: String,
    pub code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::system_code::Entity",
        from = "Column::SystemCode",
        to = "super::system_code::Column::Code"
    )]
    System,
}

impl Related<super::system_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::System.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
