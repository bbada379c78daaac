//! Module `counter_store` isolates the HTTP handlers from the client API of the store
//! that actually holds the counter.
//!
//! Atomicity of `increment` is a property of the backend, the adapters never
//! coordinate anything locally beyond what the backend primitive gives them.

mod dynamodb;
mod memory;
mod postgres;

pub use dynamodb::DynamoDbCounterStore;
pub use memory::InMemoryCounterStore;
pub use postgres::PostgresCounterStore;

use async_trait::async_trait;

use crate::domain::counter::CounterKey;

#[derive(thiserror::Error, Debug)]
pub enum CounterStoreError {
    /// The store could not be reached: connection refused, dns, timeout.
    #[error("counter store is unavailable: {0}")]
    Unavailable(String),
    /// The store answered but rejected the operation: throttling, permissions, bad request.
    #[error("counter store rejected the operation: {0}")]
    Backend(String),
    /// The record exists but its count is not an integer.
    #[error("counter `{key}` holds a malformed value: {detail}")]
    Malformed { key: String, detail: String },
    #[error("counter `{0}` does not exist")]
    RecordNotFound(String),
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Point read. `Ok(None)` means the store answered and the record is absent.
    async fn get(&self, key: &CounterKey) -> Result<Option<i64>, CounterStoreError>;

    /// Atomically add `delta` and return the value after the update.
    /// A missing record starts from zero.
    async fn increment(&self, key: &CounterKey, delta: i64) -> Result<i64, CounterStoreError>;

    /// Like [`CounterStore::get`] but an absent record is an error.
    async fn get_existing(&self, key: &CounterKey) -> Result<i64, CounterStoreError> {
        self.get(key)
            .await?
            .ok_or_else(|| CounterStoreError::RecordNotFound(key.to_string()))
    }
}
