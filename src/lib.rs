//! Parts Ledger Library
//!
//! Event-sourced inventory core for an auto parts counter: an append-only
//! stock ledger, a parts-request lifecycle, derived stock reports, and a
//! structured SKU codec.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod seed;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use services::{LedgerService, RequestService, SkuService, StockService};

/// Shared application state handed to whatever surface mounts these
/// services (HTTP, CLI, test harness).
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub ledger_service: LedgerService,
    pub request_service: RequestService,
    pub stock_service: StockService,
    pub sku_service: SkuService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        Self {
            ledger_service: LedgerService::new(db.clone(), event_sender.clone()),
            request_service: RequestService::new(db.clone(), event_sender.clone()),
            stock_service: StockService::new(db.clone()),
            sku_service: SkuService::new(db.clone()),
            db,
            config,
            event_sender,
        }
    }
}
