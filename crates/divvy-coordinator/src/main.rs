use clap::Parser;
use divvy_coordinator::server::config::{CliArgs, ServerConfig};
use divvy_coordinator::server::coordinator::Coordinator;
use divvy_coordinator::server::sink::spawn_tracing_sinks;
use divvy_coordinator::server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();
    log_startup_info(&config);

    let (log_sink, connection_sink) = spawn_tracing_sinks();
    let coordinator = Arc::new(Coordinator::new(config, log_sink, connection_sink));

    let mut runner = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.run().await }
    });

    tokio::select! {
        result = &mut runner => result??,
        () = shutdown_signal() => {
            coordinator.stop().await;
            runner.await??;
        }
    }

    tracing::info!("Coordinator shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting coordinator on {} with full config: {:#?}",
            config.bind_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting coordinator on {} with {} workers",
            config.bind_addr,
            config.num_workers
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
