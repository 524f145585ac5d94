//! Demo driver: runs the bridge against the in-process simulator backend
//! and reports what crossed the bus.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use simgate::core::Node;
use simgate::protocol::SimulationClient;
use simgate::{BridgeConfig, BridgeNode, CameraRole, GateResult};

#[derive(Parser, Debug)]
#[command(name = "simgate", about = "Simulator-to-bus bridge demo")]
struct Args {
    /// Path to a YAML or TOML config file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Number of bridge cycles to run.
    #[arg(short = 'n', long, default_value_t = 50)]
    cycles: u32,

    /// Telemetry samples fed between imagery pulls.
    #[arg(long, default_value_t = 10)]
    feed_rate: u32,
}

fn main() -> GateResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };

    let mut node = BridgeNode::new(config, SimulationClient::new())?;
    let imu = node.publishers.imu.subscribe();
    let odometry = node.publishers.odometry.subscribe();
    let clock = node.publishers.clock.subscribe();
    let left = node.publishers.images[&CameraRole::RgbLeft].subscribe();

    node.init()?;
    for _ in 0..args.cycles {
        for _ in 0..args.feed_rate {
            node.client_mut().emit_feed();
        }
        node.tick_once()?;
    }
    node.shutdown()?;

    if let Some(last) = odometry.drain().last() {
        info!(
            x = last.pose.position.x,
            y = last.pose.position.y,
            z = last.pose.position.z,
            stamp = last.stamp,
            "final ground-truth pose"
        );
    }
    info!(
        imu = imu.pending(),
        images = left.pending(),
        clock = clock.pending(),
        "bus traffic summary"
    );
    Ok(())
}
