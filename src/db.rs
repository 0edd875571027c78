use std::time::Duration;

use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::{Query, QueryScalar},
    PgPool, Postgres,
};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot reach database")]
    Connectivity(#[source] sqlx::Error),
    #[error("cannot create tables")]
    Schema(#[source] sqlx::migrate::MigrateError),
}

/// Handle to the relational store, shared by every request.
///
/// All reads and writes go through parameterized queries; callers build them
/// with `sqlx::query*` and `.bind(..)` and hand them over here.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool, checks the server answers and makes sure both tables exist.
    pub async fn init(cfg: &DatabaseConfig) -> Result<Self, StartupError> {
        let options = cfg.connect_options().map_err(StartupError::Connectivity)?;
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(StartupError::Connectivity)?;

        let db = Self::from_pool(pool);
        db.ping().await.map_err(StartupError::Connectivity)?;
        info!("connected to database");

        db.ensure_schema().await?;
        Ok(db)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Idempotent: every migration only creates what is missing.
    pub async fn ensure_schema(&self) -> Result<(), StartupError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StartupError::Schema)?;
        info!("users and submitted_code tables ready");
        Ok(())
    }

    /// Parameterized write. Returns the number of affected rows.
    pub async fn execute<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Result<u64, sqlx::Error> {
        let done = query.execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    /// Parameterized single-row aggregate, e.g. `SELECT COUNT(*) ...`.
    pub async fn query_count<'q>(
        &self,
        query: QueryScalar<'q, Postgres, i64, PgArguments>,
    ) -> Result<i64, sqlx::Error> {
        query.fetch_one(&self.pool).await
    }

    /// Parameterized `INSERT ... RETURNING id`.
    pub async fn insert_returning_id<'q>(
        &self,
        query: QueryScalar<'q, Postgres, i32, PgArguments>,
    ) -> Result<i32, sqlx::Error> {
        query.fetch_one(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
