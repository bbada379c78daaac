use anyhow::{anyhow, Context, Result};

use std::net::TcpListener;
use std::sync::Arc;

use crate::components::counter_store::{
    CounterStore, DynamoDbCounterStore, InMemoryCounterStore, PostgresCounterStore,
};
use crate::configuration::{Settings, StoreKind};

/// Everything the engine needs that talks to the outside world.
pub struct Kits {
    pub listener: TcpListener,
    pub counter_store: Arc<dyn CounterStore>,
}

impl Kits {
    pub fn new(listener: TcpListener, counter_store: Arc<dyn CounterStore>) -> Self {
        Self {
            listener,
            counter_store,
        }
    }

    pub async fn prepare(config: &Settings) -> Result<Self> {
        Ok(Self {
            listener: prepare_listener(config)?,
            counter_store: prepare_counter_store(config).await?,
        })
    }
}

pub fn prepare_listener(config: &Settings) -> Result<TcpListener> {
    let address = format!("{}:{}", config.application.host, config.application.port);
    TcpListener::bind(&address).with_context(|| format!("Failed to bind {address}"))
}

/// Built once at startup and shared by every worker, there is no other client handle.
pub async fn prepare_counter_store(config: &Settings) -> Result<Arc<dyn CounterStore>> {
    let store = &config.counter.store;

    let counter_store: Arc<dyn CounterStore> = match store.kind {
        StoreKind::Dynamodb => {
            let settings = store
                .dynamodb
                .as_ref()
                .ok_or_else(|| anyhow!("`counter.store.dynamodb` section is missing"))?;
            Arc::new(DynamoDbCounterStore::connect(settings, store.timeout()).await)
        }
        StoreKind::Postgres => {
            let settings = store
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow!("`counter.store.postgres` section is missing"))?;
            Arc::new(PostgresCounterStore::connect_lazy(settings, store.timeout()))
        }
        StoreKind::Memory => {
            tracing::warn!("Counter lives in process memory and is lost on restart");
            Arc::new(InMemoryCounterStore::new())
        }
    };

    tracing::info!(kind = ?store.kind, counter = %config.counter.key, "Counter store prepared");
    Ok(counter_store)
}
