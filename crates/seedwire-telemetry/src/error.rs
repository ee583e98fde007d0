//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use prometheus::Error as PrometheusError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Step of collector setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStage {
    /// Constructing the collector from its options.
    Build,
    /// Adding the collector to the registry.
    Register,
}

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed, or installing failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A relay collector could not be set up.
    Collector {
        /// Metric name.
        name: &'static str,
        /// Which step failed.
        stage: CollectorStage,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The text encoder rejected the gathered families.
    Render {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Encoded exposition text was not UTF-8.
    RenderUtf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install tracing subscriber")
            }
            Self::Collector { .. } => formatter.write_str("metrics collector setup failed"),
            Self::Render { .. } | Self::RenderUtf8 { .. } => {
                formatter.write_str("failed to render metrics")
            }
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::Collector { source, .. } | Self::Render { source } => Some(source),
            Self::RenderUtf8 { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_errors_keep_name_and_stage() {
        let err = TelemetryError::Collector {
            name: "relay_connections_active",
            stage: CollectorStage::Register,
            source: PrometheusError::AlreadyReg,
        };
        assert_eq!(err.to_string(), "metrics collector setup failed");
        assert!(err.source().is_some());
        assert!(matches!(
            err,
            TelemetryError::Collector {
                stage: CollectorStage::Register,
                ..
            }
        ));
    }

    #[test]
    fn render_failures_share_a_message() {
        let utf8 = TelemetryError::RenderUtf8 {
            source: String::from_utf8(vec![0, 159]).expect_err("invalid utf-8"),
        };
        let encode = TelemetryError::Render {
            source: PrometheusError::Msg("bad family".to_string()),
        };
        assert_eq!(utf8.to_string(), encode.to_string());
        assert!(utf8.source().is_some());
        assert!(encode.source().is_some());
    }
}
