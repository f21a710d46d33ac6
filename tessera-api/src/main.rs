use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tessera_api::{app, AppState};
use tessera_infra::app_config::Config;
use tessera_infra::{CircuitBreaker, HttpProviderGateway, ResilientGateway, RetryPolicy};
use tessera_order::OrderOrchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "tessera_api=debug,tessera_order=debug,tessera_infra=info,tower_http=debug,axum::rejection=trace";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load config")?;
    init_tracing(config.logging.json);

    tracing::info!("Starting Tessera API on port {}", config.server.port);

    // Provider gateway: HTTP client wrapped in retries and a circuit breaker
    let http_gateway =
        HttpProviderGateway::new(&config.provider).context("Failed to create provider client")?;
    let breaker = Arc::new(CircuitBreaker::new(
        "license-provider",
        config.resiliency.failure_threshold,
        Duration::from_secs(config.resiliency.reset_timeout_seconds),
    ));
    let policy = RetryPolicy::from_config(&config.resiliency, &config.provider);
    let gateway = ResilientGateway::new(http_gateway, policy, breaker);

    let app_state = AppState {
        orchestrator: Arc::new(OrderOrchestrator::new(Arc::new(gateway))),
        order_timeout: config.order.timeout(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Tessera API stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
