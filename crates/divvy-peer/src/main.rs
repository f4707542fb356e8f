use clap::Parser;
use divvy_core::wire::DEFAULT_PORT;
use divvy_peer::client;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "divvy-peer",
    version,
    about = "Fetches a work interval from a divvy coordinator, computes, reports results"
)]
struct CliArgs {
    /// Coordinator address to connect to.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"))]
    server_addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to coordinator at {}...", args.server_addr);
    let report = client::run(&args.server_addr).await?;

    for (result, ack) in report.results.iter().zip(&report.acks) {
        tracing::info!("{result} (coordinator: {ack})");
    }
    tracing::info!("Done with interval {}", report.interval);

    Ok(())
}
