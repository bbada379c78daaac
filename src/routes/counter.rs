use actix_web::{http, web, HttpResponse, ResponseError};
use anyhow::Context;

use crate::components::counter_store::CounterStore;

use super::CounterTarget;

#[derive(thiserror::Error, Debug)]
pub enum CounterError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for CounterError {
    fn status_code(&self) -> http::StatusCode {
        match self {
            Self::UnexpectedError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Details stay in the logs.
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": "internal server error" }))
    }
}

#[tracing::instrument(name = "Increment counter", skip(store, target))]
pub async fn increment_counter(
    store: web::Data<dyn CounterStore>,
    target: web::Data<CounterTarget>,
) -> Result<HttpResponse, CounterError> {
    let counter = target
        .bounded(store.increment(&target.key, 1))
        .await
        .with_context(|| format!("Failed to increment counter `{}`", target.key))
        .inspect_err(|e| tracing::error!("{e:?}"))?;

    tracing::info!(counter, "Counter incremented");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "counter": counter })))
}
