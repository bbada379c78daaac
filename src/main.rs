use tally::configuration::get_configurations;
use tally::startup::engine::Engine;
use tally::startup::prepare::Kits;
use tally::telemetry::{get_subscriber, init_subscriber, LoggerOutbound};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load Configurations
    let config = get_configurations()?;

    // Init Logger
    let log_subscriber = get_subscriber(
        "info".into(),
        config.application.logger_format,
        LoggerOutbound::new(std::io::stderr),
    );
    init_subscriber(log_subscriber);

    let kits = Kits::prepare(&config).await?;
    Engine::build(config, kits)?.spinup().await?;

    Ok(())
}
