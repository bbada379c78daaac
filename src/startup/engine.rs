use actix_web::dev::Server;
use actix_web::middleware::{self, TrailingSlash};
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Result};
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::*;

use super::prepare::Kits;

pub struct Engine {
    web_server: Server,
    port: u16,
}

impl Engine {
    pub fn build(config: Settings, kits: Kits) -> Result<Self> {
        let key = config.counter.counter_key().map_err(|e| anyhow!(e))?;
        let target = web::Data::new(CounterTarget::new(key, config.counter.store.timeout()));
        let policy = web::Data::new(HealthPolicy {
            strict_status: config.application.strict_health_status,
        });
        let counter_store = web::Data::from(kits.counter_store);
        let port = kits.listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            App::new()
                .wrap(TracingLogger::default())
                .wrap(middleware::NormalizePath::new(TrailingSlash::Trim))
                .route("/", web::get().to(increment_counter))
                .route("/healthcheck", web::get().to(health_check))
                .app_data(counter_store.clone())
                .app_data(target.clone())
                .app_data(policy.clone())
        })
        .listen(kits.listener)?
        .run();

        Ok(Self {
            web_server: server,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn spinup(self) -> Result<(), std::io::Error> {
        tracing::info!(port = self.port, "Serving counter");
        self.web_server.await
    }
}
