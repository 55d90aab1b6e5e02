use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "bus-dispatch")]
#[command(about = "Solve a single-bus dispatch with voltage/current flow limits and plot the flows", long_about = None)]
pub struct CliArgs {
    /// Path to a TOML config file (defaults to config/default.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Solver backend by name (cbc, minilp)
    #[arg(short, long)]
    pub solver: Option<String>,

    /// Echo solver output
    #[arg(long)]
    pub tee: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip the plot window
    #[arg(long)]
    pub no_plot: bool,

    /// Write results as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
