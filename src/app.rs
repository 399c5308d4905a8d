//! Application bootstrap shared by the server binary, the CLI, and HTTP tests.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use lodge_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules::{
    self,
    bookings::{clock::Clock, service::BookingService, BookingsModule},
};

/// A connected, migrated, and initialized application.
pub struct App {
    pub settings: Settings,
    pub db: SqlitePool,
    pub registry: ModuleRegistry,
    bookings: Arc<BookingsModule>,
}

impl App {
    /// Connect to the database, register modules, apply their migrations, and run `init`.
    pub async fn bootstrap(settings: Settings, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let db = lodge_db::connect(&settings.database)
            .await
            .context("failed to open database")?;

        let mut registry = ModuleRegistry::new();
        let bookings = modules::register_all(&mut registry, clock)?;

        let applied = lodge_db::run_migrations(&db, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations up to date");

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_modules(&ctx).await?;

        Ok(Self {
            settings,
            db,
            registry,
            bookings,
        })
    }

    pub fn bookings(&self) -> anyhow::Result<Arc<BookingService>> {
        self.bookings
            .service()
            .cloned()
            .context("bookings module is not initialized")
    }

    pub fn router(&self) -> Router {
        lodge_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve HTTP until shutdown, then stop modules.
    pub async fn serve(&self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
            db: &self.db,
        };
        self.registry.start_modules(&ctx).await?;

        let served = lodge_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_modules().await?;
        self.db.close().await;
        served
    }
}
