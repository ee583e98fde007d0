//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Cloning [`Metrics`] shares the same collectors.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{CollectorStage, Result, TelemetryError};

/// Prometheus-backed metrics registry shared by the server and the relay.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    messages_sent_total: IntCounterVec,
    notifications_suppressed_total: IntCounterVec,
    commands_total: IntCounterVec,
    connections_active: IntGauge,
    subscriptions_active: IntGauge,
}

/// Snapshot of the relay gauges for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Observer connections currently open.
    pub connections_active: i64,
    /// Worker subscriptions currently running across all connections.
    pub subscriptions_active: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the relay collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built
    /// or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let messages_sent_total = counter_vec(
            "relay_messages_sent_total",
            "Messages relayed to observers by type",
            &["type"],
        )?;
        let notifications_suppressed_total = counter_vec(
            "relay_notifications_suppressed_total",
            "Throttled notifications that were not sent",
            &["kind"],
        )?;
        let commands_total = counter_vec(
            "relay_commands_total",
            "Control commands received by outcome",
            &["command", "outcome"],
        )?;
        let connections_active = gauge("relay_connections_active", "Open observer connections")?;
        let subscriptions_active = gauge(
            "relay_subscriptions_active",
            "Running worker subscriptions",
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "relay_messages_sent_total", &messages_sent_total)?;
        register(
            &registry,
            "relay_notifications_suppressed_total",
            &notifications_suppressed_total,
        )?;
        register(&registry, "relay_commands_total", &commands_total)?;
        register(&registry, "relay_connections_active", &connections_active)?;
        register(&registry, "relay_subscriptions_active", &subscriptions_active)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                messages_sent_total,
                notifications_suppressed_total,
                commands_total,
                connections_active,
                subscriptions_active,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count a message delivered to the outbound channel.
    pub fn inc_message_sent(&self, message_type: &str) {
        self.inner
            .messages_sent_total
            .with_label_values(&[message_type])
            .inc();
    }

    /// Count a notification dropped by its throttle.
    pub fn inc_notification_suppressed(&self, kind: &str) {
        self.inner
            .notifications_suppressed_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Count a control command by outcome label.
    pub fn inc_command(&self, command: &str, outcome: &str) {
        self.inner
            .commands_total
            .with_label_values(&[command, outcome])
            .inc();
    }

    /// Track a newly opened connection.
    pub fn inc_active_connections(&self) {
        self.inner.connections_active.inc();
    }

    /// Track a closed connection.
    pub fn dec_active_connections(&self) {
        self.inner.connections_active.dec();
    }

    /// Track a started subscription.
    pub fn inc_active_subscriptions(&self) {
        self.inner.subscriptions_active.inc();
    }

    /// Track a finished or aborted subscription.
    pub fn dec_active_subscriptions(&self) {
        self.inner.subscriptions_active.dec();
    }

    /// Messages of `message_type` sent so far.
    #[must_use]
    pub fn messages_sent(&self, message_type: &str) -> u64 {
        self.inner
            .messages_sent_total
            .with_label_values(&[message_type])
            .get()
    }

    /// Notifications of `kind` suppressed so far.
    #[must_use]
    pub fn notifications_suppressed(&self, kind: &str) -> u64 {
        self.inner
            .notifications_suppressed_total
            .with_label_values(&[kind])
            .get()
    }

    /// Commands seen with the given outcome.
    #[must_use]
    pub fn commands(&self, command: &str, outcome: &str) -> u64 {
        self.inner
            .commands_total
            .with_label_values(&[command, outcome])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Take a point-in-time snapshot of the relay gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_active: self.inner.connections_active.get(),
            subscriptions_active: self.inner.subscriptions_active.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels).map_err(|source| {
        TelemetryError::Collector {
            name,
            stage: CollectorStage::Build,
            source,
        }
    })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help)).map_err(|source| TelemetryError::Collector {
        name,
        stage: CollectorStage::Build,
        source,
    })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::Collector {
            name,
            stage: CollectorStage::Register,
            source,
        })
}
