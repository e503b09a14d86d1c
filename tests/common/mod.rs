#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;

use partsledger::{
    config::AppConfig,
    db,
    entities::{inventory_event, location, part},
    events, seed, AppState,
};

/// Helper harness for spinning up an application state backed by a
/// file-based SQLite database in a throwaway directory. Each test gets
/// its own database, so tests run in parallel without interference.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_max_connections(1).await
    }

    /// Same as [`TestApp::new`] but with a wider pool, so tests can run
    /// transactions truly concurrently instead of queueing on a single
    /// connection.
    pub async fn with_max_connections(max_connections: u32) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("partsledger_test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        Self::with_database(db_dir, url, max_connections).await
    }

    /// Points the harness at an external database instead of a
    /// throwaway SQLite file. Used by ignored tests that need a real
    /// Postgres to exercise isolation-level conflicts.
    pub async fn with_database_url(url: String, max_connections: u32) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        Self::with_database(db_dir, url, max_connections).await
    }

    async fn with_database(db_dir: TempDir, url: String, max_connections: u32) -> Self {
        let mut cfg = AppConfig::new(url, "test".to_string());
        cfg.auto_migrate = true;
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, rx) = events::event_channel(64);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);

        Self {
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    pub async fn seed_part(&self, sku: &str, name: &str) -> part::Model {
        part::ActiveModel {
            sku: Set(sku.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed part")
    }

    pub async fn seed_location(&self, name: &str) -> location::Model {
        location::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed location")
    }

    /// Loads the make/system/component code tables used by the SKU codec.
    pub async fn seed_sku_codes(&self) {
        seed::seed_sku_codes(&*self.state.db)
            .await
            .expect("seed sku codes");
    }

    /// Rewrites an event's timestamp so window-based reports can be
    /// exercised without waiting out real days.
    pub async fn backdate_event(&self, event_id: i32, days: i64) {
        inventory_event::ActiveModel {
            id: Set(event_id),
            created_at: Set(Utc::now() - Duration::days(days)),
            ..Default::default()
        }
        .update(&*self.state.db)
        .await
        .expect("backdate event");
    }
}
