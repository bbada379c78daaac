pub mod counter;
pub mod health_check;

pub use counter::*;
pub use health_check::*;

use std::future::Future;
use std::time::Duration;

use crate::components::counter_store::CounterStoreError;
use crate::domain::counter::CounterKey;

/// The record the handlers act on, and how long a single store call may take.
#[derive(Debug, Clone)]
pub struct CounterTarget {
    pub key: CounterKey,
    pub timeout: Duration,
}

impl CounterTarget {
    pub fn new(key: CounterKey, timeout: Duration) -> Self {
        Self { key, timeout }
    }

    /// Run one store call, giving up after `timeout`. No retry.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, CounterStoreError>
    where
        F: Future<Output = Result<T, CounterStoreError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                CounterStoreError::Unavailable(format!(
                    "no answer for `{}` within {:?}",
                    self.key, self.timeout
                ))
            })?
    }
}
