// src/cli/mod.rs — CLI definition (clap derive)

pub mod plan;
pub mod progress;
pub mod serve;
pub mod weather;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tripkoi", about = "AI travel itinerary planner", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an itinerary and print it as JSON
    Plan(PlanArgs),
    /// Start the HTTP API
    Serve {
        /// Bind address (defaults to [api].host)
        #[arg(long)]
        host: Option<String>,
        /// Port (defaults to [api].port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check whether a real-time forecast exists for a travel date
    Weather {
        /// Travel date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Saved itinerary whose averageWeather is used past the forecast window
        #[arg(long)]
        itinerary: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Destination, e.g. "오사카" or "Bangkok"
    #[arg(long)]
    pub city: String,

    /// First day of the trip, YYYY-MM-DD
    #[arg(long)]
    pub start: String,

    /// Last day of the trip, YYYY-MM-DD
    #[arg(long)]
    pub end: String,

    /// Party size, free text ("2", "2명")
    #[arg(long, default_value = "1")]
    pub people: String,

    /// Total budget in KRW, free text ("1,500,000원")
    #[arg(long, default_value = "")]
    pub budget: String,

    /// Generate only this day
    #[arg(long, conflicts_with_all = ["remaining", "progressive"])]
    pub day: Option<u32>,

    /// Generate days 5..N in one call
    #[arg(long, conflicts_with = "progressive")]
    pub remaining: bool,

    /// Generate day by day, carrying the running total forward
    #[arg(long)]
    pub progressive: bool,

    /// Write JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also keep a copy under the data directory
    #[arg(long)]
    pub save: bool,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}
