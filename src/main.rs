// src/main.rs
use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use log::info;

use dedupe_lib::models::property::RawListing;
use dedupe_lib::pipeline;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::MatchingConfig;

fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let args: Vec<String> = std::env::args().collect();
    let input_path = args.get(1).map(String::as_str).unwrap_or("-");
    let output_path = args.get(2).map(String::as_str);

    let config = MatchingConfig::from_env();
    config.log_config();

    let input = read_input(input_path)
        .with_context(|| format!("Failed to read listings from '{}'", input_path))?;
    let listings: Vec<RawListing> =
        serde_json::from_str(&input).context("Failed to parse listings JSON")?;
    info!("Read {} raw listings from '{}'.", listings.len(), input_path);

    let outcome = pipeline::run(&listings, &config).context("Deduplication pipeline failed")?;
    for stats in &outcome.method_stats {
        info!(
            "Method {}: {} edges, {} records, avg confidence {:.2}.",
            stats.method_type.as_str(),
            stats.edges_created,
            stats.records_matched,
            stats.avg_confidence
        );
    }

    let rendered = serde_json::to_string_pretty(&outcome.records)
        .context("Failed to serialize canonical records")?;
    match output_path {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to '{}'", path))?;
            info!(
                "Wrote {} canonical records to '{}'.",
                outcome.records.len(),
                path
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
