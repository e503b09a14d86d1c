use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kinds of ledger postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum InventoryEventType {
    #[sea_orm(string_value = "RECEIVE")]
    Receive,
    #[sea_orm(string_value = "RETURN")]
    Return,
    #[sea_orm(string_value = "CORRECTION")]
    Correction,
    #[sea_orm(string_value = "FULFILL")]
    Fulfill,
}

impl InventoryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryEventType::Receive => "RECEIVE",
            InventoryEventType::Return => "RETURN",
            InventoryEventType::Correction => "CORRECTION",
            InventoryEventType::Fulfill => "FULFILL",
        }
    }
}

/// A single immutable quantity change for a part at a location.
///
/// Rows are append-only; the on-hand quantity for any (part, location)
/// pair is the sum of `qty_delta` over its rows and is never stored
/// directly. RECEIVE and RETURN rows are always positive, FULFILL rows
/// always negative, CORRECTION rows carry either sign but never zero.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_type: InventoryEventType,
    pub qty_delta: i32,
    pub part_id: i32,
    pub location_id: i32,
    /// Set only on FULFILL rows, linking back to the originating request.
    pub request_id: Option<i32>,
    /// Required for CORRECTION rows.
    pub reason: Option<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id"
    )]
    Request,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
