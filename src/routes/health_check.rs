use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::components::counter_store::{CounterStore, CounterStoreError};

use super::CounterTarget;

/// How a failed health check is reported on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthPolicy {
    /// `false` keeps callers that only read the body working: failures still answer 200.
    pub strict_status: bool,
}

impl HealthPolicy {
    fn failure_status(&self) -> StatusCode {
        if self.strict_status {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }
}

/// Reads the counter once to prove the store is reachable. Never writes.
#[tracing::instrument(name = "Health Check", skip(store, target, policy))]
pub async fn health_check(
    store: web::Data<dyn CounterStore>,
    target: web::Data<CounterTarget>,
    policy: web::Data<HealthPolicy>,
) -> HttpResponse {
    match target.bounded(store.get(&target.key)).await {
        Ok(reading) => {
            tracing::info!(counter = %target.key, ?reading, "Counter store answered");
            HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
        }
        // The store answered, only the stored value is off.
        Err(e @ CounterStoreError::Malformed { .. }) => {
            tracing::warn!(counter = %target.key, "Counter store answered: {e}");
            HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
        }
        Err(e) => {
            tracing::error!("{e:?}");
            HttpResponse::build(policy.failure_status()).json(serde_json::json!({ "status": "error" }))
        }
    }
}
