use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Request lifecycle states.
///
/// The legal-transition table is first-class data so that the validity
/// check and any caller that needs the set of currently legal actions
/// share one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "FULFILLED")]
    Fulfilled,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Fulfilled => "FULFILLED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    /// States reachable from `self`. Terminal states map to the empty set.
    pub fn legal_transitions(&self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Pending => &[RequestStatus::Approved, RequestStatus::Cancelled],
            RequestStatus::Approved => &[RequestStatus::Fulfilled, RequestStatus::Cancelled],
            RequestStatus::Fulfilled | RequestStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(&self, to: RequestStatus) -> bool {
        self.legal_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.legal_transitions().is_empty()
    }
}

/// A pull request against stock: created PENDING, then approved,
/// then either fulfilled (posting FULFILL ledger rows) or cancelled.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<i32>,
    pub approved_at: Option<DateTime<Utc>>,
    pub fulfilled_by: Option<i32>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::request_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::inventory_event::Entity")]
    InventoryEvents,
}

impl Related<super::request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::inventory_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
