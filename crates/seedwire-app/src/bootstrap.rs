//! Process bootstrap.
//!
//! Order: configuration, logging, metrics, worker registry, optional demo
//! feed, then the HTTP listener until Ctrl-C.

use std::future::Future;
use std::sync::Arc;

use seedwire_api::ApiServer;
use seedwire_config::RelayConfig;
use seedwire_relay::RelaySettings;
use seedwire_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use seedwire_torrent_core::{MemoryRegistry, WorkerRegistry};
use tracing::{error, info, warn};

use crate::demo::{DemoSettings, spawn_demo_feed};
use crate::error::{AppError, AppResult};

const BUILD_SHA: &str = match option_env!("SEEDWIRE_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Dependencies required to bootstrap the relay.
pub(crate) struct BootstrapDependencies {
    config: RelayConfig,
    telemetry: Metrics,
    registry: Arc<MemoryRegistry>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config = seedwire_config::load_from_env()
            .map_err(|err| AppError::config("config.load_from_env", err))?;
        Self::with_config(config)
    }

    pub(crate) fn with_config(config: RelayConfig) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            telemetry,
            registry: Arc::new(MemoryRegistry::new()),
        })
    }
}

/// Entry point for the relay boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, logging cannot be
/// installed, or the HTTP listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    let logging = LoggingConfig {
        level: &dependencies.config.log_level,
        format: LogFormat::from_name(dependencies.config.log_format.as_deref()),
        build_sha: BUILD_SHA,
    };
    seedwire_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("relay");

    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence over injected dependencies; returns once `shutdown` resolves.
pub(crate) async fn run_app_with<F>(
    dependencies: BootstrapDependencies,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let BootstrapDependencies {
        config,
        telemetry,
        registry,
    } = dependencies;
    info!(
        progress_window_ms = millis(config.progress_window),
        selection_window_ms = millis(config.selection_window),
        stats_interval_ms = millis(config.stats_interval),
        outbound_buffer = config.outbound_buffer,
        demo = config.demo,
        "seedwire relay bootstrap starting"
    );

    let demo = config
        .demo
        .then(|| spawn_demo_feed(Arc::clone(&registry), DemoSettings::default()));

    let api = ApiServer::new(
        registry as Arc<dyn WorkerRegistry>,
        relay_settings(&config),
        telemetry,
    );
    let addr = config.socket_addr();
    info!(addr = %addr, "launching api listener");
    let serve_result = api.serve(addr, shutdown).await;

    if let Some(feed) = demo {
        feed.abort();
        if let Err(err) = feed.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "demo feed join failed");
        }
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("relay shutdown complete");
    Ok(())
}

/// Relay tunables taken from the loaded configuration.
pub(crate) const fn relay_settings(config: &RelayConfig) -> RelaySettings {
    RelaySettings {
        progress_window: config.progress_window,
        selection_window: config.selection_window,
        stats_interval: config.stats_interval,
        outbound_buffer: config.outbound_buffer,
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use super::*;

    fn ephemeral_config(demo: bool) -> RelayConfig {
        RelayConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: 0,
            demo,
            ..RelayConfig::default()
        }
    }

    #[test]
    fn relay_settings_follow_config() {
        let config = RelayConfig {
            progress_window: Duration::from_millis(500),
            selection_window: Duration::from_millis(750),
            stats_interval: Duration::from_millis(2_000),
            outbound_buffer: 32,
            ..RelayConfig::default()
        };
        let settings = relay_settings(&config);
        assert_eq!(settings.progress_window, Duration::from_millis(500));
        assert_eq!(settings.selection_window, Duration::from_millis(750));
        assert_eq!(settings.stats_interval, Duration::from_millis(2_000));
        assert_eq!(settings.outbound_buffer, 32);
    }

    #[test]
    fn default_config_maps_to_default_settings() {
        assert_eq!(
            relay_settings(&RelayConfig::default()),
            RelaySettings::default()
        );
    }

    #[tokio::test]
    async fn boot_sequence_stops_on_shutdown() -> AppResult<()> {
        let dependencies = BootstrapDependencies::with_config(ephemeral_config(false))?;
        run_app_with(dependencies, async {}).await
    }

    #[tokio::test]
    async fn demo_feed_is_stopped_with_the_server() -> AppResult<()> {
        let dependencies = BootstrapDependencies::with_config(ephemeral_config(true))?;
        let registry = Arc::clone(&dependencies.registry);
        run_app_with(dependencies, async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await?;
        assert_eq!(registry.len(), 1, "first demo round was registered");
        Ok(())
    }

    #[tokio::test]
    async fn bind_failures_surface_as_api_errors() -> AppResult<()> {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = taken.local_addr().expect("addr").port();
        let dependencies = BootstrapDependencies::with_config(RelayConfig {
            http_port: port,
            ..ephemeral_config(false)
        })?;

        let result = run_app_with(dependencies, async {}).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_server.serve",
                ..
            })
        ));
        Ok(())
    }
}
