use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::db::{begin_serializable, SERIALIZATION_RETRIES};
use crate::entities::{
    inventory_event,
    part::Entity as Part,
    request::{self, Entity as Request, RequestStatus},
    request_item::{self, Entity as RequestItem},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{fulfill_batch_in, FulfillItem};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequestItem {
    pub part_id: i32,
    pub qty_requested: i32,
    pub location_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub items: Vec<CreateRequestItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestsQuery {
    pub status: Option<RequestStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Snapshot of a request with its items, returned by every operation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    pub request: request::Model,
    pub items: Vec<request_item::Model>,
}

/// Owns the request lifecycle:
///
/// ```text
/// PENDING  -> APPROVED   (approve)
/// PENDING  -> CANCELLED  (cancel)
/// APPROVED -> FULFILLED  (fulfill)
/// APPROVED -> CANCELLED  (cancel)
/// ```
///
/// Fulfillment posts FULFILL ledger rows through the ledger writer in
/// the same transaction as the status change and item updates.
#[derive(Clone)]
pub struct RequestService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl RequestService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a request with its items in one atomic write; initial
    /// status is PENDING. Items are fixed at creation: quantity changes
    /// happen through new requests, never by mutating items.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(
        &self,
        input: CreateRequest,
        actor_id: i32,
    ) -> Result<RequestDetail, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A request needs at least one item".to_string(),
            ));
        }
        for item in &input.items {
            if item.qty_requested <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Requested quantity for part {} must be positive",
                    item.part_id
                )));
            }
        }

        for item in &input.items {
            let exists = Part::find_by_id(item.part_id)
                .one(&*self.db)
                .await
                .map_err(ServiceError::db_error)?;
            if exists.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Part with ID {} not found",
                    item.part_id
                )));
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        let created = request::ActiveModel {
            status: Set(RequestStatus::Pending),
            notes: Set(input.notes),
            created_by: Set(actor_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let model = request_item::ActiveModel {
                request_id: Set(created.id),
                part_id: Set(item.part_id),
                qty_requested: Set(item.qty_requested),
                qty_fulfilled: Set(0),
                location_id: Set(item.location_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(model);
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(request_id = created.id, "request created");
        self.event_sender
            .send(Event::RequestCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(RequestDetail {
            request: created,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, request_id: i32) -> Result<RequestDetail, ServiceError> {
        let request = self.find_request(&*self.db, request_id).await?;
        let items = self.find_items(&*self.db, request_id).await?;
        Ok(RequestDetail { request, items })
    }

    /// Paginated listing, newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: RequestsQuery,
    ) -> Result<(Vec<RequestDetail>, u64), ServiceError> {
        let mut find = Request::find().order_by_desc(request::Column::CreatedAt);
        if let Some(status) = query.status {
            find = find.filter(request::Column::Status.eq(status));
        }

        let paginator = find.paginate(&*self.db, query.limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let requests = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        let items = requests
            .load_many(RequestItem, &*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let details = requests
            .into_iter()
            .zip(items)
            .map(|(request, items)| RequestDetail { request, items })
            .collect();

        Ok((details, total))
    }

    /// PENDING -> APPROVED.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        request_id: i32,
        actor_id: i32,
    ) -> Result<RequestDetail, ServiceError> {
        let request = self.find_request(&*self.db, request_id).await?;

        if !request.status.can_transition(RequestStatus::Approved) {
            return Err(ServiceError::InvalidTransition(format!(
                "Cannot approve request. Current status is {}. Only PENDING requests can be approved.",
                request.status.as_str()
            )));
        }

        let mut active: request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Approved);
        active.approved_by = Set(Some(actor_id));
        active.approved_at = Set(Some(Utc::now()));
        let updated = active
            .update(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(request_id = updated.id, "request approved");
        self.event_sender
            .send(Event::RequestApproved(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        let items = self.find_items(&*self.db, request_id).await?;
        Ok(RequestDetail {
            request: updated,
            items,
        })
    }

    /// APPROVED -> FULFILLED. Posts one FULFILL ledger row per item,
    /// updates item fulfilled quantities, and flips the status, all in
    /// one serializable transaction: any insufficiency aborts the whole
    /// thing and the request stays APPROVED, and a concurrent writer to
    /// the same stock aborts one transaction instead of letting both
    /// commit past the same on-hand read.
    #[instrument(skip(self))]
    pub async fn fulfill(
        &self,
        request_id: i32,
        actor_id: i32,
    ) -> Result<RequestDetail, ServiceError> {
        let mut attempts = 0;
        let (updated, events) = loop {
            match self.try_fulfill(request_id, actor_id).await {
                Ok(outcome) => break outcome,
                Err(err) if err.is_serialization_failure() && attempts < SERIALIZATION_RETRIES => {
                    attempts += 1;
                    debug!(request_id, attempts, "retrying fulfillment after serialization failure");
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            request_id = updated.id,
            postings = events.len(),
            "request fulfilled"
        );
        self.event_sender
            .send(Event::RequestFulfilled {
                request_id: updated.id,
                event_ids: events.iter().map(|e| e.id).collect(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        let items = self.find_items(&*self.db, request_id).await?;
        Ok(RequestDetail {
            request: updated,
            items,
        })
    }

    async fn try_fulfill(
        &self,
        request_id: i32,
        actor_id: i32,
    ) -> Result<(request::Model, Vec<inventory_event::Model>), ServiceError> {
        let txn = begin_serializable(&self.db).await?;

        let request = self.find_request(&txn, request_id).await?;
        if !request.status.can_transition(RequestStatus::Fulfilled) {
            return Err(ServiceError::InvalidTransition(format!(
                "Cannot fulfill request. Current status is {}. Only APPROVED requests can be fulfilled.",
                request.status.as_str()
            )));
        }

        let items = self.find_items(&txn, request_id).await?;

        // Every item must carry a location before any ledger write.
        let mut batch = Vec::with_capacity(items.len());
        for item in &items {
            let location_id = match item.location_id {
                Some(id) => id,
                None => {
                    let label = Part::find_by_id(item.part_id)
                        .one(&txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .map(|p| p.sku)
                        .unwrap_or_else(|| item.part_id.to_string());
                    return Err(ServiceError::ValidationError(format!(
                        "Request item for part {} does not have a location specified",
                        label
                    )));
                }
            };
            batch.push(FulfillItem {
                part_id: item.part_id,
                qty: item.qty_requested,
                location_id,
            });
        }

        let events = fulfill_batch_in(&txn, &batch, request_id, actor_id).await?;

        for item in items {
            let qty = item.qty_requested;
            let mut active: request_item::ActiveModel = item.into();
            active.qty_fulfilled = Set(qty);
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        let mut active: request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Fulfilled);
        active.fulfilled_by = Set(Some(actor_id));
        active.fulfilled_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok((updated, events))
    }

    /// PENDING/APPROVED -> CANCELLED. Never touches the ledger:
    /// fulfillment and cancellation are mutually exclusive outcomes of
    /// APPROVED, so there are no postings to reverse.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        request_id: i32,
        _actor_id: i32,
    ) -> Result<RequestDetail, ServiceError> {
        let request = self.find_request(&*self.db, request_id).await?;

        match request.status {
            RequestStatus::Fulfilled => {
                return Err(ServiceError::InvalidTransition(
                    "Cannot cancel a fulfilled request".to_string(),
                ));
            }
            RequestStatus::Cancelled => {
                return Err(ServiceError::InvalidTransition(
                    "Request is already cancelled".to_string(),
                ));
            }
            _ => {}
        }

        let mut active: request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Cancelled);
        let updated = active
            .update(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(request_id = updated.id, "request cancelled");
        self.event_sender
            .send(Event::RequestCancelled(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        let items = self.find_items(&*self.db, request_id).await?;
        Ok(RequestDetail {
            request: updated,
            items,
        })
    }

    async fn find_request<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        request_id: i32,
    ) -> Result<request::Model, ServiceError> {
        Request::find_by_id(request_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Request not found".to_string()))
    }

    async fn find_items<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        request_id: i32,
    ) -> Result<Vec<request_item::Model>, ServiceError> {
        RequestItem::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .order_by_asc(request_item::Column::Id)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)
    }
}
