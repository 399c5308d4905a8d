//! SQLite pool factory and migration tooling.
//!
//! Migrations are contributed by modules through [`lodge_kernel::Module::migrations`]
//! and applied at most once each; applied ids are recorded in `_lodge_migrations`.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use lodge_kernel::settings::DatabaseSettings;
use lodge_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// How long a connection waits for the write lock before reporting `SQLITE_BUSY`.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _lodge_migrations (
    module     TEXT    NOT NULL,
    id         TEXT    NOT NULL,
    applied_at INTEGER NOT NULL,
    PRIMARY KEY (module, id)
)";

/// Open a connection pool for the configured database.
///
/// In-memory databases are private to each connection, so they are pinned to a single
/// connection that is never recycled. File databases use WAL so readers never block the
/// writer; writers wait up to [`BUSY_TIMEOUT`] for each other.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let in_memory = settings.url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let max_connections = if in_memory {
        1
    } else {
        settings.max_connections.max(1)
    };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to '{}'", settings.url))?;

    tracing::info!(
        target: "lodge-db",
        url = %settings.url,
        max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply every migration that has not been recorded yet, each in its own transaction.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let mut tx = pool.begin().await?;

        let seen: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _lodge_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(&mut *tx)
                .await?;
        if seen.is_some() {
            continue;
        }

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;

        sqlx::query("INSERT INTO _lodge_migrations (module, id, applied_at) VALUES (?, ?, ?)")
            .bind(module)
            .bind(migration.id)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;

        tracing::info!(
            target: "lodge-db",
            module = %module,
            id = migration.id,
            "migration applied"
        );
        applied += 1;
    }

    Ok(applied)
}
