//! Module `telemetry` sets up logging for the service:
//! - picks the output format and the level filter.
//! - installs the subscriber as the global default, bridging `log` records into it.

use is_terminal::IsTerminal;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    EnvFilter, Registry,
};

/// Name stamped on every bunyan record.
const SERVICE_NAME: &str = "tally";

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggerFormat {
    /// One line per event, no timestamps, no targets.
    Compact,
    Full,
    Pretty,
    Json,
    /// Bunyan JSON, span fields flattened into each record.
    Bunyan,
}

pub struct LoggerOutbound<W> {
    make_writer: W,
}

impl<W> LoggerOutbound<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }

    fn fmt_layer<S>(self) -> tracing_subscriber::fmt::Layer<S, DefaultFields, Format, W>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        tracing_subscriber::fmt::Layer::new()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(self.make_writer)
    }

    fn into_layer<S>(self, format: LoggerFormat) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + 'static,
        W: Send + Sync,
    {
        match format {
            LoggerFormat::Full => self.fmt_layer().boxed(),
            LoggerFormat::Pretty => self.fmt_layer().pretty().boxed(),
            LoggerFormat::Json => self.fmt_layer().json().boxed(),
            LoggerFormat::Compact => self
                .fmt_layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .boxed(),
            LoggerFormat::Bunyan => JsonStorageLayer
                .and_then(BunyanFormattingLayer::new(
                    SERVICE_NAME.into(),
                    self.make_writer,
                ))
                .boxed(),
        }
    }
}

/// Get the subscriber for the logger.
/// - `env_filter` is the fallback level when `RUST_LOG` is unset:
///   "info", "debug", "trace", "warn", "error".
/// - `format` picks the layout of each record.
/// - `output` is where the log will be written to.
pub fn get_subscriber<Sink>(
    env_filter: String,
    format: LoggerFormat,
    output: LoggerOutbound<Sink>,
) -> Box<dyn Subscriber + Send + Sync>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    Box::new(
        Registry::default()
            .with(env_filter)
            .with(output.into_layer(format)),
    )
}

/// Init the subscriber for the logger.
/// Be sure to setup this to collect logs.
pub fn init_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}
