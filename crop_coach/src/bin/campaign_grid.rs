// src/bin/campaign_grid.rs
//
// Print the campaigns built over a grid of intervention periodicities.
//
// Each entry carries its periodicity pair, accumulated trigger cost and the
// full agromanagement document, in row-major order (irrigation outer).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crop_coach::agro::{expand_campaign, ApplicationAmounts, CampaignDescriptor};
use crop_coach::config::EnvConfig;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(
    name = "campaign_grid",
    about = "Expand a crop campaign over candidate irrigation/fertilization periods",
    version
)]
struct Args {
    /// YAML environment config (defaults plus env overrides when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Campaign year (defaults to the config's year).
    #[arg(long)]
    year: Option<i32>,

    /// Candidate irrigation periods in days (0 disables).
    #[arg(long, value_delimiter = ',', default_values_t = [0_i64, 7])]
    irrigation_periods: Vec<i64>,

    /// Candidate fertilization periods in days (0 disables).
    #[arg(long, value_delimiter = ',', default_values_t = [0_i64, 30])]
    fertilization_periods: Vec<i64>,

    /// Irrigation per event (cm).
    #[arg(long, default_value_t = 1.0)]
    irrigation: f64,

    /// N per event (kg/ha).
    #[arg(long, default_value_t = 0.0)]
    n: f64,

    /// P per event (kg/ha).
    #[arg(long, default_value_t = 0.0)]
    p: f64,

    /// K per event (kg/ha).
    #[arg(long, default_value_t = 0.0)]
    k: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct GridEntry<'a> {
    irrigation_period: i64,
    fertilization_period: i64,
    cost: f64,
    campaign: &'a CampaignDescriptor,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => EnvConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EnvConfig::from_env_or_default(),
    };
    let year = args.year.unwrap_or(cfg.year);

    let amounts = ApplicationAmounts {
        irrigation: args.irrigation,
        n: args.n,
        p: args.p,
        k: args.k,
    };

    let grid = expand_campaign(
        &cfg.agro,
        &args.irrigation_periods,
        &args.fertilization_periods,
        &amounts,
        year,
        Some(&cfg.trigger_costs),
    )
    .with_context(|| format!("expanding campaign grid for {year}"))?;

    tracing::info!(
        year,
        campaigns = grid.len(),
        crop = %cfg.agro.crop_name,
        variety = %cfg.agro.crop_variety,
        "campaign grid expanded"
    );

    let mut entries = Vec::with_capacity(grid.len());
    for (i, &irrigation_period) in grid.irrigation_periods.iter().enumerate() {
        for (j, &fertilization_period) in grid.fertilization_periods.iter().enumerate() {
            if let Some((campaign, cost)) = grid.get(i, j) {
                entries.push(GridEntry {
                    irrigation_period,
                    fertilization_period,
                    cost,
                    campaign,
                });
            }
        }
    }

    let payload = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&entries)?,
        OutputFormat::Yaml => serde_yaml::to_string(&entries)?,
    };
    println!("{payload}");
    Ok(())
}
