// src/main.rs — TripKoi entry point

use clap::Parser;

use tripkoi::cli::{Cli, Commands};
use tripkoi::infra::config::Config;
use tripkoi::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Plan(args) => tripkoi::cli::plan::run_plan(args, &config).await,
        Commands::Serve { host, port } => tripkoi::cli::serve::run_serve(host, port, &config).await,
        Commands::Weather { date, itinerary } => {
            tripkoi::cli::weather::run_weather(&date, itinerary.as_deref())
        }
    }
}
