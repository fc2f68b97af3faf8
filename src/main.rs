use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use ryanair_scraper::{logging, pipeline, Settings};

/// Ryanair flights scraper - fetches live flight data and exports JSON.
#[derive(Parser, Debug)]
#[command(name = "ryanair-scraper", version, about)]
struct Cli {
    /// Path to settings JSON file
    #[arg(long, default_value = "config/settings.json")]
    config: PathBuf,

    /// Path to flight search input JSON
    #[arg(long, default_value = "data/sample_input.json")]
    input: PathBuf,

    /// Path to output JSON file
    #[arg(long, default_value = "data/sample_output.json")]
    output: PathBuf,
}

fn load_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("JSON file not found: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let settings_value = load_json(&cli.config)
        .with_context(|| format!("Error loading settings from {}", cli.config.display()))?;
    let settings: Settings = serde_json::from_value(settings_value)
        .with_context(|| format!("Invalid settings in {}", cli.config.display()))?;

    let search_input = load_json(&cli.input)
        .with_context(|| format!("Error loading search input from {}", cli.input.display()))?;

    pipeline::run_with_settings(&search_input, &settings, &cli.output)
        .await
        .context("Scraper failed")?;
    Ok(())
}
