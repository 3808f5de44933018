use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "financekit-inspector",
    about = "Inspect the shared state store of a FinanceKit relay."
)]
pub struct Cli {
    /// Directory holding the app group containers
    #[arg(long, env = "FINANCEKIT_CONTAINER_ROOT")]
    pub root: PathBuf,
    /// App group to open (default: derived from FINANCEKIT_* settings)
    #[arg(long)]
    pub group: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pending batches, one JSON object per line.
    List,
    /// Print the sync markers.
    Markers,
    /// Emit every pending batch to stdout and delete it.
    Drain,
}
