use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::db::{begin_serializable, SERIALIZATION_RETRIES};
use crate::entities::{
    inventory_event::{self, Entity as InventoryEvent, InventoryEventType},
    location::{self, Entity as Location},
    part::Entity as Part,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock::on_hand_sum;

/// Input for RECEIVE and RETURN postings.
#[derive(Debug, Clone, Deserialize)]
pub struct StockMovement {
    pub part_id: i32,
    pub location_id: i32,
    pub qty: i32,
    pub reason: Option<String>,
}

/// Input for CORRECTION postings; quantity carries its sign.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CorrectStock {
    pub part_id: i32,
    pub location_id: i32,
    pub qty: i32,
    #[validate(length(min = 1, message = "A reason is required for corrections"))]
    pub reason: String,
}

/// One line of a fulfillment batch.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillItem {
    pub part_id: i32,
    pub qty: i32,
    pub location_id: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocation {
    #[validate(length(min = 1, message = "Location name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
}

/// Paginated ledger listing filters.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    pub part_id: Option<i32>,
    pub location_id: Option<i32>,
    pub event_type: Option<InventoryEventType>,
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

/// The only component permitted to append inventory events. Every
/// operation appends immutable rows; nothing here ever updates or
/// deletes a prior event.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Receive stock: posts a RECEIVE event with a positive delta.
    /// The caller's quantity sign is normalized away.
    #[instrument(skip(self))]
    pub async fn receive(
        &self,
        input: StockMovement,
        actor_id: i32,
    ) -> Result<inventory_event::Model, ServiceError> {
        let event = self
            .post_additive(input, InventoryEventType::Receive, actor_id)
            .await?;

        self.event_sender
            .send(Event::StockReceived {
                event_id: event.id,
                part_id: event.part_id,
                location_id: event.location_id,
                qty: event.qty_delta,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(event)
    }

    /// Return stock: same contract as `receive` but tagged RETURN,
    /// distinguishing stock coming back from new stock.
    #[instrument(skip(self))]
    pub async fn return_stock(
        &self,
        input: StockMovement,
        actor_id: i32,
    ) -> Result<inventory_event::Model, ServiceError> {
        let event = self
            .post_additive(input, InventoryEventType::Return, actor_id)
            .await?;

        self.event_sender
            .send(Event::StockReturned {
                event_id: event.id,
                part_id: event.part_id,
                location_id: event.location_id,
                qty: event.qty_delta,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(event)
    }

    /// Manual correction, either sign. Negative corrections recompute
    /// on-hand inside the write transaction and are rejected when they
    /// would drive the pair's sum negative; positive corrections post
    /// unchecked.
    #[instrument(skip(self))]
    pub async fn correct(
        &self,
        input: CorrectStock,
        actor_id: i32,
    ) -> Result<inventory_event::Model, ServiceError> {
        input.validate()?;
        if input.qty == 0 {
            return Err(ServiceError::ValidationError(
                "Correction quantity must not be zero".to_string(),
            ));
        }
        if input.reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A reason is required for corrections".to_string(),
            ));
        }

        self.ensure_part_exists(input.part_id).await?;
        self.ensure_location_exists(input.location_id).await?;

        let mut attempts = 0;
        let event = loop {
            match self.try_correct(&input, actor_id).await {
                Ok(event) => break event,
                Err(err) if err.is_serialization_failure() && attempts < SERIALIZATION_RETRIES => {
                    attempts += 1;
                    debug!(attempts, "retrying correction after serialization failure");
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            event_id = event.id,
            part_id = event.part_id,
            qty_delta = event.qty_delta,
            "posted correction"
        );

        self.event_sender
            .send(Event::StockCorrected {
                event_id: event.id,
                part_id: event.part_id,
                location_id: event.location_id,
                qty_delta: event.qty_delta,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(event)
    }

    /// One serializable check-then-post attempt. A concurrent writer to
    /// the same pair aborts one of the transactions instead of letting
    /// both commit past the same on-hand read; the retry re-checks
    /// against the winner's committed state.
    async fn try_correct(
        &self,
        input: &CorrectStock,
        actor_id: i32,
    ) -> Result<inventory_event::Model, ServiceError> {
        let txn = begin_serializable(&self.db).await?;

        if input.qty < 0 {
            let on_hand =
                on_hand_sum(&txn, Some(input.part_id), Some(input.location_id)).await?;
            if on_hand + i64::from(input.qty) < 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Cannot correct by {}. Current on-hand is {}",
                    input.qty, on_hand
                )));
            }
        }

        let event = inventory_event::ActiveModel {
            event_type: Set(InventoryEventType::Correction),
            qty_delta: Set(input.qty),
            part_id: Set(input.part_id),
            location_id: Set(input.location_id),
            request_id: Set(None),
            reason: Set(Some(input.reason.clone())),
            created_by: Set(actor_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let event = event.insert(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(event)
    }

    /// Posts one FULFILL event per item inside a single serializable
    /// transaction, retrying when a concurrent writer aborts it. The
    /// whole batch is rejected before anything is written if any item
    /// lacks sufficient on-hand.
    #[instrument(skip(self, items), fields(request_id = request_id, items = items.len()))]
    pub async fn fulfill_batch(
        &self,
        items: &[FulfillItem],
        request_id: i32,
        actor_id: i32,
    ) -> Result<Vec<inventory_event::Model>, ServiceError> {
        let mut attempts = 0;
        let events = loop {
            match self.try_fulfill_batch(items, request_id, actor_id).await {
                Ok(events) => break events,
                Err(err) if err.is_serialization_failure() && attempts < SERIALIZATION_RETRIES => {
                    attempts += 1;
                    debug!(request_id, attempts, "retrying fulfillment batch after serialization failure");
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            request_id = request_id,
            events = events.len(),
            "posted fulfillment batch"
        );
        Ok(events)
    }

    async fn try_fulfill_batch(
        &self,
        items: &[FulfillItem],
        request_id: i32,
        actor_id: i32,
    ) -> Result<Vec<inventory_event::Model>, ServiceError> {
        let txn = begin_serializable(&self.db).await?;
        let events = fulfill_batch_in(&txn, items, request_id, actor_id).await?;
        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(events)
    }

    /// Paginated ledger listing, newest first.
    #[instrument(skip(self))]
    pub async fn events(
        &self,
        query: EventsQuery,
    ) -> Result<(Vec<inventory_event::Model>, u64), ServiceError> {
        let mut find = InventoryEvent::find().order_by_desc(inventory_event::Column::CreatedAt);

        if let Some(part_id) = query.part_id {
            find = find.filter(inventory_event::Column::PartId.eq(part_id));
        }
        if let Some(location_id) = query.location_id {
            find = find.filter(inventory_event::Column::LocationId.eq(location_id));
        }
        if let Some(event_type) = query.event_type {
            find = find.filter(inventory_event::Column::EventType.eq(event_type));
        }

        let paginator = find.paginate(&*self.db, query.limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let events = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((events, total))
    }

    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocation,
    ) -> Result<location::Model, ServiceError> {
        input.validate()?;

        let existing = Location::find()
            .filter(location::Column::Name.eq(&input.name))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Location already exists".to_string(),
            ));
        }

        let model = location::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::LocationCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    pub async fn list_locations(&self) -> Result<Vec<location::Model>, ServiceError> {
        Location::find()
            .order_by_asc(location::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)
    }

    async fn post_additive(
        &self,
        input: StockMovement,
        event_type: InventoryEventType,
        actor_id: i32,
    ) -> Result<inventory_event::Model, ServiceError> {
        if input.qty == 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must not be zero".to_string(),
            ));
        }

        self.ensure_part_exists(input.part_id).await?;
        self.ensure_location_exists(input.location_id).await?;

        let event = inventory_event::ActiveModel {
            event_type: Set(event_type),
            // Additive postings are positive no matter what sign the caller sent.
            qty_delta: Set(input.qty.abs()),
            part_id: Set(input.part_id),
            location_id: Set(input.location_id),
            request_id: Set(None),
            reason: Set(input.reason),
            created_by: Set(actor_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let event = event
            .insert(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(
            event_id = event.id,
            event_type = event.event_type.as_str(),
            part_id = event.part_id,
            location_id = event.location_id,
            qty_delta = event.qty_delta,
            "posted stock movement"
        );

        Ok(event)
    }

    async fn ensure_part_exists(&self, part_id: i32) -> Result<(), ServiceError> {
        Part::find_by_id(part_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound("Part not found".to_string()))
    }

    async fn ensure_location_exists(&self, location_id: i32) -> Result<(), ServiceError> {
        Location::find_by_id(location_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))
    }
}

/// Check-then-post for a fulfillment batch on an already-open
/// transaction; the request lifecycle shares this with the standalone
/// `fulfill_batch` entry point so status changes and postings commit as
/// one unit.
///
/// All items are checked before any row is written: a later item's
/// insufficiency must never leave earlier postings behind.
pub(crate) async fn fulfill_batch_in<C: ConnectionTrait>(
    conn: &C,
    items: &[FulfillItem],
    request_id: i32,
    actor_id: i32,
) -> Result<Vec<inventory_event::Model>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "Nothing to fulfill".to_string(),
        ));
    }

    for item in items {
        if item.qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Fulfillment quantity for part {} must be positive",
                item.part_id
            )));
        }

        let on_hand = on_hand_sum(conn, Some(item.part_id), Some(item.location_id)).await?;
        if on_hand < item.qty as i64 {
            let label = Part::find_by_id(item.part_id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .map(|p| p.sku)
                .unwrap_or_else(|| item.part_id.to_string());
            return Err(ServiceError::ValidationError(format!(
                "Insufficient stock for part {}. Requested: {}, Available: {}",
                label, item.qty, on_hand
            )));
        }
    }

    let mut events = Vec::with_capacity(items.len());
    for item in items {
        let event = inventory_event::ActiveModel {
            event_type: Set(InventoryEventType::Fulfill),
            qty_delta: Set(-item.qty.abs()),
            part_id: Set(item.part_id),
            location_id: Set(item.location_id),
            request_id: Set(Some(request_id)),
            reason: Set(None),
            created_by: Set(actor_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        events.push(event.insert(conn).await.map_err(ServiceError::db_error)?);
    }

    Ok(events)
}
