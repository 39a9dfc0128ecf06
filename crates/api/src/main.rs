//! Sellersync collector service entry point.
//!
//! Wires configuration, the sink publisher, the marketplace client, the
//! collection scheduler, and the REST server together, then runs until a
//! shutdown signal arrives. Sink construction is the only fatal failure
//! after startup begins; everything downstream logs and continues.

use std::sync::Arc;

use sellersync_api::{router, AppContext};
use sellersync_core::collect::ports::MarketDataSource;
use sellersync_core::publish::ports::Publisher;
use sellersync_core::{CollectionService, JobRegistry};
use sellersync_domain::EndpointCatalog;
use sellersync_infra::http::{HttpClient, RetryPolicy};
use sellersync_infra::marketplace::MarketClient;
use sellersync_infra::publish::NdjsonPublisher;
use sellersync_infra::scheduling::{CollectorScheduler, CollectorSchedulerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first so .env loading is visible
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(_) => info!("No .env file found, using process environment"),
    }

    info!("Starting sellersync collector service");

    let config = sellersync_infra::config::load()?;

    // The sink is the only fatal dependency: no data path exists without it.
    let publisher: Arc<dyn Publisher> = Arc::new(
        NdjsonPublisher::from_config(&config.publish)
            .await
            .map_err(|err| anyhow::anyhow!("failed to construct sink: {err}"))?,
    );

    let http = Arc::new(
        HttpClient::builder()
            .timeout(config.marketplace.request_timeout())
            .policy(RetryPolicy::from(&config.fetch))
            .build()?,
    );
    let catalog = EndpointCatalog::standard(&config.marketplace.base_urls);
    let market_client = Arc::new(MarketClient::new(http, catalog, &config));
    let source: Arc<dyn MarketDataSource> = market_client;

    let registry = Arc::new(JobRegistry::standard(&config.publish.topic_prefix));
    let service = Arc::new(CollectionService::new(source.clone(), publisher.clone()));

    let shutdown = CancellationToken::new();

    let mut scheduler = CollectorScheduler::new(
        service,
        registry,
        CollectorSchedulerConfig { interval: config.scheduler.interval() },
    );
    if config.scheduler.enabled {
        scheduler.start().await.map_err(|err| anyhow::anyhow!("scheduler start failed: {err}"))?;
        info!(interval_secs = config.scheduler.interval_secs, "Collection scheduler running");
    } else {
        info!("Collection scheduler disabled by configuration");
    }

    let ctx = Arc::new(AppContext::new(
        config.clone(),
        source,
        publisher.clone(),
        shutdown.clone(),
    ));
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "REST server listening");

    // Propagate process signals into the shared cancellation token
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            warn!("Shutdown signal received, stopping service");
            shutdown.cancel();
        }
    });

    let graceful = {
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    };
    axum::serve(listener, app).with_graceful_shutdown(graceful).await?;

    if scheduler.is_running() {
        if let Err(err) = scheduler.stop().await {
            error!(error = %err, "Scheduler did not stop cleanly");
        }
    }
    if let Err(err) = publisher.close().await {
        error!(error = %err, "Sink did not close cleanly");
    }

    info!("Service stopped gracefully");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            error!(error = %err, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
