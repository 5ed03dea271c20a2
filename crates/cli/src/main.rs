//! Ride fare estimation CLI
//!
//! A command-line tool for requesting fare estimates and managing the
//! fare service: surge pricing, retraining, and ride statistics.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{admin, predict, stats};

/// Ride fare estimation CLI
#[derive(Parser)]
#[command(name = "fare")]
#[command(author, version, about = "CLI for the ride fare estimation service", long_about = None)]
pub struct Cli {
    /// Service endpoint URL (can also be set via FARE_API_URL env var)
    #[arg(long, env = "FARE_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the fare for a trip distance
    Predict {
        /// Trip distance in kilometres
        distance_km: f64,
    },

    /// Show fare statistics over completed rides
    Stats,

    /// Retrain the pricing model from recent ride history
    Retrain,

    /// Set the surge pricing multiplier
    Surge {
        /// Multiplier, clamped to [1.0, 3.0] by the service
        multiplier: f64,
    },

    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Predict { distance_km } => {
            predict::estimate_fare(&client, distance_km, cli.format).await?;
        }
        Commands::Stats => {
            stats::show_stats(&client, cli.format).await?;
        }
        Commands::Retrain => {
            admin::retrain(&client, cli.format).await?;
        }
        Commands::Surge { multiplier } => {
            admin::set_surge(&client, multiplier, cli.format).await?;
        }
        Commands::Health => {
            admin::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
