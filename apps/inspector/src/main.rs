mod cli;
mod commands;
mod main_lib;

use clap::Parser;

use cli::{Cli, Commands};
use main_lib::{init_tracing, open_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let store = open_store(&cli)?;

    match cli.command {
        Commands::List => commands::list(&store, &mut std::io::stdout().lock()),
        Commands::Markers => commands::markers(&store, &mut std::io::stdout().lock()),
        Commands::Drain => commands::drain(store).await,
    }
}
