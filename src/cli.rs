//! CLI type definitions for the `bladed` binary (`spec.md` §6).

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "bladed")]
#[command(about = "Blade swarm cluster control plane", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Topology file.
    #[arg(short = 'c', long = "config", default_value = "topology/standalone.yaml")]
    pub config: PathBuf,

    /// Print the exact child invocation for the named blade and exit.
    #[arg(long = "print_cmd_only", default_value = "")]
    pub print_cmd_only: String,

    /// Emit structured JSON log records instead of human text.
    #[arg(long)]
    pub jlog: bool,

    /// Run as the specified blade instead of supervising the whole topology.
    #[arg(long = "as")]
    pub run_as: Option<String>,

    /// Skip sandbox materialization, reusing the current executable directly.
    #[arg(long)]
    pub novenv: bool,

    /// Internal: serialized node descriptor, set when re-exec'd as a blade.
    #[arg(long, hide = true)]
    pub blade_json: Option<String>,

    /// Internal: serialized topology, set when re-exec'd as a blade.
    #[arg(long, hide = true)]
    pub topology_json: Option<String>,
}
