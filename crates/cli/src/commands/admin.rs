//! Service management commands: retrain, surge, health

use anyhow::Result;
use serde_json::json;

use crate::client::{ApiClient, HealthStatus, RetrainOutcome, SurgeRequest, SurgeUpdate};
use crate::output::{color_status, print_success, print_warning, OutputFormat};

/// Trigger a retrain from recent ride history
pub async fn retrain(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let outcome: RetrainOutcome = client.post("api/fare/retrain", &json!({})).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if outcome.is_trained {
                print_success(&outcome.message);
            } else {
                print_warning(&format!("{} (fallback pricing active)", outcome.message));
            }
        }
    }

    Ok(())
}

/// Set the surge pricing multiplier
pub async fn set_surge(client: &ApiClient, multiplier: f64, format: OutputFormat) -> Result<()> {
    let update: SurgeUpdate = client
        .post("api/fare/surge", &SurgeRequest { multiplier })
        .await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&update)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if (update.multiplier - multiplier).abs() > f64::EPSILON {
                print_warning(&format!(
                    "Requested {:.2} was clamped, surge multiplier is now {:.2}",
                    multiplier, update.multiplier
                ));
            } else {
                print_success(&format!(
                    "Surge multiplier is now {:.2}",
                    update.multiplier
                ));
            }
        }
    }

    Ok(())
}

/// Check service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthStatus = client.get("health").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&health)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("Service:                {}", health.service);
            println!("Status:                 {}", color_status(&health.status));
            println!(
                "Model trained:          {}",
                if health.model_trained { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
