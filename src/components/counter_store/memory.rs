use async_trait::async_trait;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::counter::CounterKey;

use super::{CounterStore, CounterStoreError};

/// Process-local store. Every operation holds the map lock, so increments do not lose updates.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(self, key: &CounterKey, value: i64) -> Self {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        self
    }

    fn poisoned<T>(e: PoisonError<T>) -> CounterStoreError {
        CounterStoreError::Backend(format!("counter map lock poisoned: {e}"))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get(&self, key: &CounterKey) -> Result<Option<i64>, CounterStoreError> {
        let counters = self.counters.lock().map_err(Self::poisoned)?;
        Ok(counters.get(key.as_ref()).copied())
    }

    async fn increment(&self, key: &CounterKey, delta: i64) -> Result<i64, CounterStoreError> {
        let mut counters = self.counters.lock().map_err(Self::poisoned)?;
        let count = counters.entry(key.to_string()).or_insert(0);
        *count = count
            .checked_add(delta)
            .ok_or_else(|| CounterStoreError::Backend(format!("counter `{key}` would overflow")))?;
        Ok(*count)
    }
}
