use secrecy::SecretBox;

use std::path::Path;
use std::time::Duration;

use crate::domain::counter::CounterKey;
use crate::telemetry::LoggerFormat;

#[derive(serde::Deserialize, Debug)]
pub struct Settings {
    pub application: AppSettings,
    pub counter: CounterSettings,
}

#[derive(serde::Deserialize, Debug)]
pub struct AppSettings {
    pub port: u16,
    pub host: String,
    pub logger_format: LoggerFormat,
    /// Answer a failed health check with 503 instead of 200.
    #[serde(default)]
    pub strict_health_status: bool,
}

#[derive(serde::Deserialize, Debug)]
pub struct CounterSettings {
    pub key: String,
    pub store: StoreSettings,
}

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Dynamodb,
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Debug)]
pub struct StoreSettings {
    pub kind: StoreKind,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    pub dynamodb: Option<DynamoDbSettings>,
    pub postgres: Option<PostgresSettings>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DynamoDbSettings {
    pub region: String,
    pub table_name: String,
    #[serde(default = "default_partition_key")]
    pub partition_key: String,
    #[serde(default = "default_count_attribute")]
    pub count_attribute: String,
    pub endpoint_url: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
pub struct PostgresSettings {
    pub username: String,
    pub password: SecretBox<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_partition_key() -> String {
    "CounterId".into()
}

fn default_count_attribute() -> String {
    "Count".into()
}

impl CounterSettings {
    pub fn counter_key(&self) -> Result<CounterKey, String> {
        self.key.clone().try_into()
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub fn get_configurations() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configurations");

    // If it is in a CI, also load CI configurations
    let is_ci = std::env::var("RUN_CI").map_or(false, |s| {
        matches!(s.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    });

    let environment: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    load_configurations(&configuration_directory, environment, is_ci)
}

/// Layers, later wins: `base`, `secret`, `ci-base` (CI only), `<environment>`,
/// then `APP_`-prefixed environment variables, e.g. `APP_APPLICATION__PORT=80`.
pub fn load_configurations(
    configuration_directory: &Path,
    environment: Environment,
    is_ci: bool,
) -> Result<Settings, config::ConfigError> {
    layer_configurations(
        configuration_directory,
        environment,
        is_ci,
        app_environment_variables(),
    )
}

fn app_environment_variables() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn layer_configurations(
    configuration_directory: &Path,
    environment: Environment,
    is_ci: bool,
    overrides: config::Environment,
) -> Result<Settings, config::ConfigError> {
    let layer = |name: &str| {
        let path = configuration_directory.join(name);
        config::File::with_name(&path.to_string_lossy()).required(false)
    };

    let builder = config::Config::builder()
        .add_source(layer("base"))
        .add_source(layer("secret"));

    let builder = if is_ci {
        builder.add_source(layer("ci-base"))
    } else {
        builder
    };

    let settings = builder
        .add_source(layer(environment.as_str()))
        .add_source(overrides)
        .build()?;

    settings.try_deserialize()
}

/// The possible runtime environment for our application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
