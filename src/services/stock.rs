use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use tracing::instrument;

use crate::entities::inventory_event::{self, Entity as InventoryEvent};
use crate::errors::ServiceError;

/// One row of the grouped on-hand report.
#[derive(Debug, Clone, Serialize)]
pub struct OnHandRow {
    pub part_id: i32,
    pub location_id: i32,
    pub quantity: i64,
}

/// Cumulative ledger total at end of one day.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopMover {
    pub part_id: i32,
    pub event_count: i64,
    pub net_change: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadStockRow {
    pub part_id: i32,
    pub quantity: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Sums ledger deltas for whichever filters are present. Works on both
/// the pool and an open transaction, so the ledger writer can reuse the
/// same definition of on-hand inside its check-then-post transactions.
pub(crate) async fn on_hand_sum<C: ConnectionTrait>(
    conn: &C,
    part_id: Option<i32>,
    location_id: Option<i32>,
) -> Result<i64, ServiceError> {
    let mut query = InventoryEvent::find().select_only().column_as(
        Expr::col((InventoryEvent, inventory_event::Column::QtyDelta)).sum(),
        "total",
    );

    if let Some(part_id) = part_id {
        query = query.filter(inventory_event::Column::PartId.eq(part_id));
    }
    if let Some(location_id) = location_id {
        query = query.filter(inventory_event::Column::LocationId.eq(location_id));
    }

    let total: Option<Option<i64>> = query
        .into_tuple()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(total.flatten().unwrap_or(0))
}

/// Read-side aggregation over the inventory ledger. Never writes; every
/// result is a pure function of committed events.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// On-hand quantity under the given filters. Callers should normally
    /// supply at least one filter; with neither this sums the whole ledger.
    #[instrument(skip(self))]
    pub async fn on_hand(
        &self,
        part_id: Option<i32>,
        location_id: Option<i32>,
    ) -> Result<i64, ServiceError> {
        on_hand_sum(&*self.db, part_id, location_id).await
    }

    /// Grouped on-hand report. Pairs netting to zero are dropped: a pair
    /// whose deltas cancel out is not "on hand".
    #[instrument(skip(self))]
    pub async fn on_hand_report(
        &self,
        part_id: Option<i32>,
        location_id: Option<i32>,
    ) -> Result<Vec<OnHandRow>, ServiceError> {
        let mut query = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::PartId)
            .column(inventory_event::Column::LocationId)
            .column_as(
                Expr::col((InventoryEvent, inventory_event::Column::QtyDelta)).sum(),
                "quantity",
            )
            .group_by(inventory_event::Column::PartId)
            .group_by(inventory_event::Column::LocationId);

        if let Some(part_id) = part_id {
            query = query.filter(inventory_event::Column::PartId.eq(part_id));
        }
        if let Some(location_id) = location_id {
            query = query.filter(inventory_event::Column::LocationId.eq(location_id));
        }

        let rows: Vec<(i32, i32, Option<i64>)> = query
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut report: Vec<OnHandRow> = rows
            .into_iter()
            .map(|(part_id, location_id, quantity)| OnHandRow {
                part_id,
                location_id,
                quantity: quantity.unwrap_or(0),
            })
            .filter(|row| row.quantity != 0)
            .collect();

        report.sort_by_key(|row| (row.part_id, row.location_id));
        Ok(report)
    }

    /// Total stock level at end of each day in `[today - days, today]`.
    ///
    /// Single ascending scan with a running total; each point carries the
    /// cumulative sum from the beginning of the ledger through end of that
    /// day, so events older than the window still count toward the level.
    #[instrument(skip(self))]
    pub async fn history_over_time(&self, days: u32) -> Result<Vec<HistoryPoint>, ServiceError> {
        let events: Vec<(DateTime<Utc>, i32)> = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::CreatedAt)
            .column(inventory_event::Column::QtyDelta)
            .order_by_asc(inventory_event::Column::CreatedAt)
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let today = Utc::now().date_naive();
        let start = today - Duration::days(days as i64);

        let mut points = Vec::with_capacity(days as usize + 1);
        let mut running: i64 = 0;
        let mut idx = 0;

        for offset in 0..=days as i64 {
            let date = start + Duration::days(offset);
            while idx < events.len() && events[idx].0.date_naive() <= date {
                running += events[idx].1 as i64;
                idx += 1;
            }
            points.push(HistoryPoint {
                date,
                total_quantity: running,
            });
        }

        Ok(points)
    }

    /// Parts with the most ledger activity in the trailing window,
    /// ordered by event count descending.
    #[instrument(skip(self))]
    pub async fn top_movers(&self, days: u32, limit: usize) -> Result<Vec<TopMover>, ServiceError> {
        let cutoff = Utc::now() - Duration::days(days as i64);

        let rows: Vec<(i32, i64, Option<i64>)> = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::PartId)
            .column_as(
                Expr::col((InventoryEvent, inventory_event::Column::Id)).count(),
                "event_count",
            )
            .column_as(
                Expr::col((InventoryEvent, inventory_event::Column::QtyDelta)).sum(),
                "net_change",
            )
            .filter(inventory_event::Column::CreatedAt.gte(cutoff))
            .group_by(inventory_event::Column::PartId)
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut movers: Vec<TopMover> = rows
            .into_iter()
            .map(|(part_id, event_count, net_change)| TopMover {
                part_id,
                event_count,
                net_change: net_change.unwrap_or(0),
            })
            .collect();

        movers.sort_by(|a, b| b.event_count.cmp(&a.event_count));
        movers.truncate(limit);
        Ok(movers)
    }

    /// Parts holding positive stock with no ledger activity inside the
    /// trailing window, stalest first.
    #[instrument(skip(self))]
    pub async fn dead_stock(
        &self,
        days: u32,
        limit: usize,
    ) -> Result<Vec<DeadStockRow>, ServiceError> {
        let cutoff = Utc::now() - Duration::days(days as i64);

        let totals: Vec<(i32, Option<i64>)> = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::PartId)
            .column_as(
                Expr::col((InventoryEvent, inventory_event::Column::QtyDelta)).sum(),
                "quantity",
            )
            .group_by(inventory_event::Column::PartId)
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let last_seen: Vec<(i32, Option<DateTime<Utc>>)> = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::PartId)
            .column_as(
                Expr::col((InventoryEvent, inventory_event::Column::CreatedAt)).max(),
                "last_activity",
            )
            .group_by(inventory_event::Column::PartId)
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let recently_active: Vec<i32> = InventoryEvent::find()
            .select_only()
            .column(inventory_event::Column::PartId)
            .filter(inventory_event::Column::CreatedAt.gte(cutoff))
            .distinct()
            .into_tuple()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let active: HashSet<i32> = recently_active.into_iter().collect();
        let last_activity: HashMap<i32, Option<DateTime<Utc>>> = last_seen.into_iter().collect();

        let mut rows: Vec<DeadStockRow> = totals
            .into_iter()
            .filter_map(|(part_id, quantity)| {
                let quantity = quantity.unwrap_or(0);
                if quantity > 0 && !active.contains(&part_id) {
                    Some(DeadStockRow {
                        part_id,
                        quantity,
                        last_activity: last_activity.get(&part_id).copied().flatten(),
                    })
                } else {
                    None
                }
            })
            .collect();

        rows.sort_by_key(|row| row.last_activity);
        rows.truncate(limit);
        Ok(rows)
    }
}
