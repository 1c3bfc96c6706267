//! Database Module
//!
//! Owns the SQLite connection pool, applies migrations and exposes the order store.

pub mod order_store;

pub use order_store::{OrderStore, StoreError};

use shared::error::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database service, owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open the database (WAL mode, foreign keys on) and apply migrations
    ///
    /// Connection attempts are retried with a linear backoff (1s, 2s, 3s, ...)
    /// until `connect_timeout` would be exceeded.
    pub async fn new(db_path: &str, connect_timeout: Duration) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(db_path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::database(format!("Failed to create database directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let deadline = Instant::now() + connect_timeout;
        let mut attempt: u32 = 1;
        let pool = loop {
            match SqlitePoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect_with(options.clone())
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    let wait = Duration::from_secs(u64::from(attempt));
                    if Instant::now() + wait > deadline {
                        return Err(AppError::database(format!(
                            "Failed to open database after {attempt} attempts: {e}"
                        )));
                    }
                    tracing::warn!(attempt, error = %e, retry_in = ?wait, "Database not ready");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        };

        tracing::info!(path = %db_path, "Database connection established (SQLite WAL)");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Order store backed by this pool
    pub fn order_store(&self) -> OrderStore {
        OrderStore::new(self.pool.clone())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
