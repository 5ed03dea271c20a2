//! Fare estimation command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, FareQuote, PredictRequest};
use crate::output::{color_model, format_fare, OutputFormat};

/// Request a fare estimate for a trip distance
pub async fn estimate_fare(client: &ApiClient, distance_km: f64, format: OutputFormat) -> Result<()> {
    let quote: FareQuote = client
        .post("api/fare/predict", &PredictRequest { distance_km })
        .await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&quote)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Fare Estimate".bold());
            println!("{}", "=".repeat(40));
            println!("Distance:               {:.1} km", distance_km);
            println!(
                "Expected fare:          {}",
                format_fare(quote.average_fare).bold()
            );
            println!(
                "Range:                  {} - {}",
                format_fare(quote.min_fare),
                format_fare(quote.max_fare)
            );
            println!("Pricing model:          {}", color_model(&quote.model));
        }
    }

    Ok(())
}
