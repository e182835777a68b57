use std::io::IsTerminal;
use std::str::FromStr;

use tracing_subscriber::layer::Layered;
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

use crate::error::{Error, ErrorKind, Result};
use crate::Config;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub enum Mode {
    /// Json output plus shipping to loki.
    Production,
    #[default]
    Formatted,
    Json,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input {
            "prod" | "production" => Ok(Self::Production),
            "formatted" => Ok(Self::Formatted),
            "json" => Ok(Self::Json),
            _ => Err(ErrorKind::ParsingError(format!("unknown log mode: {input}")).into()),
        }
    }
}

#[derive(PartialEq, Eq, Default, Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Only shows errors and warnings
    Critical,
    /// Shows errors, warnings, and some informational messages that are likely
    /// to be relevant when troubleshooting such as configuration
    Support,
    /// Shows everything except debug and trace information
    #[default]
    Normal,
    /// Shows debug information
    Debug,
    /// Shows everything
    Trace,
    /// Shows nothing
    Off,
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match &*s.to_ascii_lowercase() {
            "critical" | "error" => Ok(Level::Critical),
            "support" | "warn" => Ok(Level::Support),
            "normal" | "info" => Ok(Level::Normal),
            "debug" | "dbg" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ErrorKind::ParsingError(format!(
                "expected a log level (off, trace, debug, normal, support, critical), got: {s}"
            ))
            .into()),
        }
    }
}

pub fn filter_layer(level: Level) -> EnvFilter {
    let filter_str = match level {
        Level::Critical => "warn",
        Level::Support => "warn",
        Level::Normal => "info",
        Level::Debug => "debug,sled=info",
        Level::Trace => "trace,sled=info,hyper=debug,want=off",
        Level::Off => "off",
    };

    EnvFilter::new(filter_str)
}

/// Human readable output on stderr, stdout is left to the cli.
pub fn default_logging_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber,
    S: for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
}

/// One json object per event on stderr, carrying the request span fields.
pub fn json_logging_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber,
    S: for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(std::io::stderr)
}

/// Subscriber every output layer is stacked on.
type Filtered = Layered<EnvFilter, Registry>;

fn loki_layer(config: &Config) -> Result<tracing_loki::Layer> {
    let address = tracing_loki::url::Url::parse(&config.tracing.loki_address).map_err(|e| {
        ErrorKind::ParsingError(format!(
            "invalid loki address `{}`: {e}",
            config.tracing.loki_address
        ))
    })?;
    let labels = [
        ("host".to_string(), config.address.to_string()),
        ("app".to_string(), config.name.clone()),
    ];
    let (layer, task) = tracing_loki::layer(address, labels.into_iter().collect(), Default::default())
        .map_err(|e| ErrorKind::Other(e.to_string()))?;
    tokio::spawn(task);
    Ok(layer)
}

/// Initializes the global tracing subscriber based on the tracing section
/// of the config. Does nothing if tracing is disabled.
///
/// Needs to be called from within a tokio runtime when using the production
/// mode, as the loki layer delivers logs from a background task.
pub fn init(config: &Config) -> Result<()> {
    use tracing_log::LogTracer;
    use tracing_subscriber::prelude::*;

    if !config.tracing.enabled {
        return Ok(());
    }

    let mut output: Vec<Box<dyn Layer<Filtered> + Send + Sync>> = Vec::new();
    match config.tracing.mode {
        Mode::Formatted => output.push(default_logging_layer().boxed()),
        Mode::Json => output.push(json_logging_layer().boxed()),
        Mode::Production => {
            output.push(json_logging_layer().boxed());
            output.push(loki_layer(config)?.boxed());
        }
    }

    LogTracer::init().map_err(|e| ErrorKind::Other(e.to_string()))?;
    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(filter_layer(config.tracing.level))
            .with(output),
    )
    .map_err(|e| ErrorKind::Other(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_accepts_aliases() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Support);
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Normal);
        assert_eq!("none".parse::<Level>().unwrap(), Level::Off);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn mode_parsing() {
        assert!(matches!("prod".parse::<Mode>().unwrap(), Mode::Production));
        assert!("yaml".parse::<Mode>().is_err());
    }

    #[test]
    fn invalid_loki_address_is_reported() {
        let mut config = Config::default();
        config.tracing.mode = Mode::Production;
        config.tracing.loki_address = "not a url".to_string();
        let err = init(&config).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ParsingError(_)));
    }
}
