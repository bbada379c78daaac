use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use std::time::Duration;

use crate::configuration::PostgresSettings;
use crate::domain::counter::CounterKey;

use super::{CounterStore, CounterStoreError};

/// Counter rows in the `counters` table (see `migrations/`).
#[derive(Debug, Clone)]
pub struct PostgresCounterStore {
    pool: PgPool,
}

impl PostgresCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lazily connected pool, the first query opens the connection.
    pub fn connect_lazy(settings: &PostgresSettings, timeout: Duration) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(settings.password.expose_secret())
            .database(&settings.database_name);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect_lazy_with(options);

        Self::new(pool)
    }
}

fn classify_sqlx_error(err: sqlx::Error) -> CounterStoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            CounterStoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Tls(_) => CounterStoreError::Unavailable(err.to_string()),
        other => CounterStoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    async fn get(&self, key: &CounterKey) -> Result<Option<i64>, CounterStoreError> {
        sqlx::query_scalar::<_, i64>("SELECT count FROM counters WHERE counter_id = $1")
            .bind(key.as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn increment(&self, key: &CounterKey, delta: i64) -> Result<i64, CounterStoreError> {
        // One statement: the row lock taken by the upsert serializes concurrent increments.
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO counters (counter_id, count) VALUES ($1, $2)
            ON CONFLICT (counter_id) DO UPDATE SET count = counters.count + EXCLUDED.count
            RETURNING count
            "#,
        )
        .bind(key.as_ref())
        .bind(delta)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_sqlx_error)
    }
}
