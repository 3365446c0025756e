//! Bladeswarm entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use bladeswarm::application::{run_blade, Supervisor};
use bladeswarm::cli::Cli;
use bladeswarm::domain::models::{NodeDescriptor, Topology};
use bladeswarm::infrastructure::config::RuntimeSettings;
use bladeswarm::infrastructure::logging::{LogConfig, LoggerImpl};
use bladeswarm::infrastructure::topology::TopologyLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Re-exec'd as a single blade: skip the supervisor entirely.
    if let (Some(blade_json), Some(topology_json)) = (&cli.blade_json, &cli.topology_json) {
        let node: NodeDescriptor =
            serde_json::from_str(blade_json).context("invalid --blade-json payload")?;
        let topology: Topology =
            serde_json::from_str(topology_json).context("invalid --topology-json payload")?;

        LoggerImpl::init(&LogConfig::new(cli.jlog, node.host_port()))
            .context("failed to initialize logger")?;
        tracing::info!("Hello World !");

        let settings = RuntimeSettings::load().context("failed to load runtime settings")?;
        return run_blade(node, topology, &settings).await;
    }

    let topology = TopologyLoader::load(&cli.config).context("failed to load topology")?;

    if !cli.print_cmd_only.is_empty() {
        return Supervisor::print_cmd_only(&topology, &cli.print_cmd_only, cli.jlog);
    }

    if let Some(name) = &cli.run_as {
        LoggerImpl::init(&LogConfig::new(cli.jlog, name.clone()))
            .context("failed to initialize logger")?;
        return morph(&topology, name, cli.jlog);
    }

    LoggerImpl::init(&LogConfig::new(cli.jlog, "supervisor"))
        .context("failed to initialize logger")?;
    let settings = RuntimeSettings::load().context("failed to load runtime settings")?;

    let supervisor = Supervisor::new(
        topology,
        cli.jlog,
        cli.novenv,
        Duration::from_secs(settings.respawn_delay_seconds),
    );
    supervisor.run().await
}

#[cfg(unix)]
fn morph(topology: &Topology, name: &str, jlog: bool) -> Result<()> {
    Supervisor::morph_into_blade(topology, name, jlog)
}

#[cfg(not(unix))]
fn morph(_topology: &Topology, _name: &str, _jlog: bool) -> Result<()> {
    anyhow::bail!("--as is only supported on unix targets")
}
