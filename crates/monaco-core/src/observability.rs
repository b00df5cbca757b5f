//! Observability infrastructure.
//!
//! Structured logging with consistent spans. Every user-visible error and
//! warning is emitted with the fields `{environment, group, coordinate,
//! type}` so log processors can correlate them.

use std::fmt;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing::Span;
use tracing_subscriber::layer::{Layer as _, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt};

use crate::coordinate::Coordinate;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times; subsequent
/// calls are no-ops. Log levels are controlled via `RUST_LOG`.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        // The format only decides the output layer; everything else is
        // shared, so the branches collapse into one boxed layer.
        let output = match format {
            LogFormat::Json => subscriber_fmt::layer().json().boxed(),
            LogFormat::Pretty => subscriber_fmt::layer().pretty().boxed(),
        };
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(output)
            .init();
    });
}

/// Creates a span for deploying one configuration.
#[must_use]
pub fn deploy_span(environment: &str, group: &str, coordinate: &Coordinate) -> Span {
    tracing::info_span!(
        "deploy",
        environment = environment,
        group = group,
        coordinate = %coordinate,
        config_type = coordinate.config_type.as_str(),
    )
}

/// Creates a span for deleting configurations of one type.
#[must_use]
pub fn delete_span(environment: &str, config_type: &str) -> Span {
    tracing::info_span!(
        "delete",
        environment = environment,
        config_type = config_type,
    )
}

/// A secret value whose content never appears in logs or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Redacted(String);

impl Redacted {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret for use at the transport boundary.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Redacted {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
