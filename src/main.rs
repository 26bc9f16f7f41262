//! Ladder HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use ladder::cache::MokaAnswerCache;
use ladder::config::Config;
use ladder::gateway::{HandlerState, create_router_with_state};
use ladder::service::RankService;
use ladder::store::{MemoryScoreStore, seed_demo};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        exact_page_boundaries = config.exact_page_boundaries,
        "Ladder starting"
    );

    let store = match &config.snapshot_path {
        Some(path) => MemoryScoreStore::open(path)?,
        None => {
            tracing::warn!("No LADDER_SNAPSHOT_PATH configured, scores are kept in memory only");
            MemoryScoreStore::new()
        }
    };

    if config.seed_entities > 0 {
        seed_demo(&store, config.seed_entities).await?;
    }

    let cache = MokaAnswerCache::with_capacity(config.cache_capacity);
    let service = Arc::new(RankService::new(
        Arc::new(store),
        Arc::new(cache),
        config.service_config(),
    ));

    let app = create_router_with_state(HandlerState::new(Arc::clone(&service)));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Draining cache maintenance queue...");
    service.shutdown().await;

    tracing::info!("Ladder shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("LADDER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/health", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
