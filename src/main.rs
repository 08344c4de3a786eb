// src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use roundrobin_proxy::{
    config,
    health::create_health_checker,
    load_balancer::Dispatcher,
    metrics::{start_metrics_server, MetricsRegistry},
    proxy::build_pool,
    server::{RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roundrobin_proxy=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Bad backend addresses abort here, before anything is bound
    let config = config::load_config()?;

    let checker = create_health_checker(&config.health_check)?;
    let pool = build_pool(
        &config.backends,
        checker,
        config.health_check.path.as_deref(),
    )?;

    let mut dispatcher = Dispatcher::new(pool)?;
    info!(
        "Dispatching across {} backends in order: {:?}",
        dispatcher.len(),
        dispatcher.addresses()
    );
    let mut handler_metrics = None;

    if config.metrics.enabled {
        let metrics_registry = MetricsRegistry::new()?;
        let metrics = metrics_registry.collector();
        dispatcher = dispatcher.with_metrics(metrics.clone());
        handler_metrics = Some(metrics);

        let metrics_addr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    let mut handler = RequestHandler::new(Arc::new(dispatcher));
    if let Some(metrics) = handler_metrics {
        handler = handler.with_metrics(metrics);
    }

    let addr = config.listen_addr();
    info!("Load balancer starting on {}", addr);

    ServerBuilder::new(addr)
        .with_handler(handler)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
