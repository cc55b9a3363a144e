use std::future::Future;
use std::sync::Arc;

use seedkeep_api::{ApiServer, ApiState};
use seedkeep_config::{PromoterConfig, load_from_env};
use seedkeep_fsops::FsOpsService;
use seedkeep_qbit::QbitClient;
use seedkeep_telemetry::{LogFormat, LoggingConfig, Metrics, init_logging};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::orchestrator::Orchestrator;

/// Entry point for the promoter boot sequence.
///
/// Loads configuration from the environment, installs logging, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, logging cannot be installed, or the
/// webhook server fails.
pub async fn run_app() -> AppResult<()> {
    let config = load_from_env().map_err(|err| AppError::config("config.load", err))?;
    let logging = LoggingConfig {
        format: LogFormat::from_name(config.log_format.as_deref()),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    run_with(config, shutdown_signal()).await
}

/// Wire the services for `config` and serve the webhook until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the metrics registry, the remote client, or the webhook server
/// cannot be started.
pub async fn run_with<F>(config: PromoterConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = Arc::new(config);
    info!(
        client = %config.client.base_url(),
        watch_category = %config.watch_category,
        promote_category = %config.promote_category,
        canonical_root = %config.storage.canonical_root.display(),
        cross_seed_root = %config.storage.cross_seed_root.display(),
        "seedkeep bootstrap starting"
    );

    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let remote = QbitClient::new(&config.client).map_err(|source| AppError::RemoteSetup {
        operation: "qbit_client.new",
        source,
    })?;
    let fsops = FsOpsService::local().with_metrics(metrics.clone());
    let orchestrator = Orchestrator::new(
        Arc::clone(&config),
        Arc::new(remote),
        fsops,
        metrics.clone(),
    );

    let state = ApiState::new(Arc::new(orchestrator), &config.watch_category, metrics);
    ApiServer::new(state)
        .serve(config.listen.socket_addr(), shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("webhook server shutdown complete");
    Ok(())
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
    use super::*;
    use seedkeep_config::{ClientEndpoint, Credentials, ListenConfig, StorageRoots};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn config(port: u16) -> PromoterConfig {
        PromoterConfig {
            client: ClientEndpoint {
                host: "localhost".to_string(),
                port: 8080,
                credentials: Credentials {
                    username: "admin".to_string(),
                    password: "adminadmin".to_string(),
                },
                timeout: Duration::from_secs(5),
            },
            watch_category: "race".to_string(),
            promote_category: "longterm".to_string(),
            storage: StorageRoots {
                canonical_root: "/data/longterm".into(),
                cross_seed_root: "/data/cross-seed".into(),
            },
            listen: ListenConfig {
                bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port,
            },
            log_format: None,
        }
    }

    #[tokio::test]
    async fn serves_until_shutdown_resolves() -> anyhow::Result<()> {
        run_with(config(0), async {}).await?;
        Ok(())
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() -> anyhow::Result<()> {
        let holder = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let port = holder.local_addr()?.port();
        let result = run_with(config(port), async {}).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                source: seedkeep_api::ApiServerError::Bind { .. },
                ..
            })
        ));
        Ok(())
    }
}
