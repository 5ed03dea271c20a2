//! Ride statistics command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, RideStats};
use crate::output::{format_fare, OutputFormat};

/// Show aggregate fare statistics over completed rides
pub async fn show_stats(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let stats: RideStats = client.get("api/fare/stats").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Ride Statistics".bold());
            println!("{}", "=".repeat(40));
            println!("Completed rides:        {}", stats.total_rides);
            println!("Average distance:       {:.2} km", stats.avg_distance);
            println!();
            println!("{}", "Fares".bold());
            println!("{}", "-".repeat(40));
            println!("Average:                {}", format_fare(stats.avg_fare));
            println!("Lowest:                 {}", format_fare(stats.min_fare));
            println!("Highest:                {}", format_fare(stats.max_fare));
            println!();
            let model = if stats.model_trained {
                "trained".green()
            } else {
                "fallback".yellow()
            };
            println!("Pricing model:          {}", model);
        }
    }

    Ok(())
}
