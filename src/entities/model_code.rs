use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lazily issued (make, model) to short-code mapping. Codes are at most
/// three characters and unique within a make; once issued a code is
/// never reassigned, so already-printed SKUs stay decodable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "model_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub make: String,
    pub model: String,
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
