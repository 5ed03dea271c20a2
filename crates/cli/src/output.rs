//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a fare amount
pub fn format_fare(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Color a model kind based on how the estimate was produced
pub fn color_model(model: &str) -> String {
    match model {
        "ml_trained" => model.green().to_string(),
        "fallback" => model.yellow().to_string(),
        "error_fallback" => model.red().to_string(),
        _ => model.to_string(),
    }
}

/// Color a health status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}
