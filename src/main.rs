//! Dashboard backend for metered container fleets: aggregates node,
//! workload, and price data into the view the fleet UI renders.

use clap::Parser;

use fleet_cost_viewer::client::FleetClient;
use fleet_cost_viewer::server::{run_server, AppState, ServerConfig};

/// Fleet cost and utilization viewer
#[derive(Parser, Debug, Clone)]
#[command(name = "fleet-cost-viewer")]
#[command(about = "Serve the aggregated fleet dashboard view")]
struct Args {
    /// Base URL of the fleet registry (serves /node/)
    #[arg(long, env = "FLEET_REGISTRY_URL", default_value = "http://localhost:8080")]
    registry_url: String,

    /// Port to serve the viewer API on
    #[arg(short, long, default_value = "8060")]
    port: u16,

    /// Fractional second digits in rendered durations
    #[arg(long, default_value = "0")]
    precision: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - RUST_LOG takes precedence, fallback to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!(
        registry_url = %args.registry_url,
        port = args.port,
        precision = args.precision,
        "Starting fleet-cost-viewer"
    );

    let client = FleetClient::new(&args.registry_url)?;
    let state = AppState {
        client,
        precision: args.precision,
    };

    run_server(state, ServerConfig { port: args.port }).await
}
