
use once_cell::sync::Lazy;

use std::sync::Arc;

use tally::components::counter_store::{CounterStore, InMemoryCounterStore};
use tally::configuration::get_configurations;
use tally::domain::counter::CounterKey;
use tally::startup::engine::Engine as WebEngine;
use tally::startup::prepare::Kits;
use tally::telemetry::{get_subscriber, init_subscriber, LoggerFormat, LoggerOutbound};

pub use failing_stores::{FailingCounterStore, MalformedCounterStore, StalledCounterStore};

static TRACING: Lazy<()> = Lazy::new(|| {
    let use_test_log = std::env::var("TEST_LOG").map_or(false, |x| {
        matches!(x.as_str(), "1" | "true" | "yes" | "TRUE")
    });

    let valid_levels = ["info", "error", "trace", "warn", "debug"];
    let level = std::env::var("LOG_LEVEL").ok();
    let log_level = level
        .as_deref()
        .filter(|lvl| valid_levels.contains(lvl))
        .unwrap_or("error");

    let format = LoggerFormat::Pretty;

    if use_test_log {
        let subscriber = get_subscriber(
            log_level.into(),
            format,
            LoggerOutbound::new(std::io::stderr),
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber("debug".into(), format, LoggerOutbound::new(std::io::sink));
        init_subscriber(subscriber);
    }
});

pub const COUNTER_KEY: &str = "Counter1";

/// Knobs a test can turn before the server starts.
#[derive(Default)]
pub struct TestAppOptions {
    pub strict_health_status: bool,
    pub timeout_ms: Option<u64>,
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    /// Present when the server runs on the in-memory store, to check what got persisted.
    pub store: Option<Arc<InMemoryCounterStore>>,
}

impl TestApp {
    pub async fn spawn_server() -> TestApp {
        Self::spawn_with_counter(0).await
    }

    pub async fn spawn_with_counter(initial: i64) -> TestApp {
        let store = Arc::new(InMemoryCounterStore::new().with_counter(&counter_key(), initial));
        let mut app = Self::spawn_with_store(store.clone(), TestAppOptions::default()).await;
        app.store = Some(store);
        app
    }

    pub async fn spawn_with_store(
        counter_store: Arc<dyn CounterStore>,
        options: TestAppOptions,
    ) -> TestApp {
        Lazy::force(&TRACING);
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to create listener");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let configuration = {
            let mut temp_config = get_configurations().expect("Failed to read configuration");
            temp_config.counter.key = COUNTER_KEY.to_string();
            temp_config.application.strict_health_status = options.strict_health_status;
            if let Some(timeout_ms) = options.timeout_ms {
                temp_config.counter.store.timeout_ms = timeout_ms;
            }
            temp_config
        };

        let kits = Kits::new(listener, counter_store);
        let engine = WebEngine::build(configuration, kits).unwrap();
        assert_eq!(engine.port(), port);
        tokio::spawn(engine.spinup());

        TestApp {
            address,
            client: reqwest::Client::new(),
            store: None,
        }
    }

    pub async fn get_root(&self) -> reqwest::Response {
        self.client
            .get(format!("{}/", self.address))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn get_healthcheck(&self) -> reqwest::Response {
        self.client
            .get(format!("{}/healthcheck", self.address))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn stored_counter(&self) -> Option<i64> {
        let store = self.store.as_ref().expect("Server is not backed by memory");
        store.get(&counter_key()).await.unwrap()
    }
}

pub fn counter_key() -> CounterKey {
    CounterKey::try_from(COUNTER_KEY).unwrap()
}
