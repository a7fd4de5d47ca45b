// src/bin/rollout.rs
//
// Drive one episode of the crop environment against a replayed daily trace.
//
// The trace is a JSON array of daily records (`{"day": "...", "TWSO": ...}`),
// replayed unchanged for every season. The same action is applied on every
// step. Prints one JSON line per step, then a summary line.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crop_coach::config::EnvConfig;
use crop_coach::rl::{action_from_slice, CropEnv, ACTION_DIM};
use crop_coach::simulator::{DailyRecord, ReplaySimulator};

#[derive(Debug, Parser)]
#[command(
    name = "rollout",
    about = "Run one crop_coach episode against a replayed simulator trace",
    version
)]
struct Args {
    /// YAML environment config (defaults plus env overrides when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file holding the daily trace to replay.
    #[arg(long)]
    trace: PathBuf,

    /// Year sampler seed (overrides the config).
    #[arg(long)]
    seed: Option<u64>,

    /// Normalized action, six comma-separated values in [-1, 1].
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = [0.0_f64; ACTION_DIM]
    )]
    action: Vec<f64>,
}

#[derive(Serialize)]
struct StepLine<'a> {
    step: u32,
    year: i32,
    reward: f64,
    done: bool,
    observation: &'a [f64],
}

#[derive(Serialize)]
struct Summary {
    steps: u32,
    total_reward: f64,
    simulator_calls: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => EnvConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EnvConfig::from_env_or_default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }

    let Some(action) = action_from_slice(&args.action) else {
        bail!(
            "--action needs {ACTION_DIM} values, got {}",
            args.action.len()
        );
    };

    let raw = fs::read_to_string(&args.trace)
        .with_context(|| format!("reading trace {}", args.trace.display()))?;
    let trace: Vec<DailyRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing trace {}", args.trace.display()))?;

    tracing::info!(
        years_count = cfg.years_count,
        sample_year = cfg.sample_year,
        seed = ?cfg.seed,
        trace_days = trace.len(),
        "starting rollout"
    );

    let mut env = CropEnv::new(cfg, ReplaySimulator::new(trace))?;
    env.reset();

    let mut steps = 0;
    let mut total_reward = 0.0;
    loop {
        let result = env.step(&action)?;
        steps += 1;
        total_reward += result.reward;

        let line = StepLine {
            step: steps,
            year: env.campaign_year(),
            reward: result.reward,
            done: result.done,
            observation: &result.observation,
        };
        println!("{}", serde_json::to_string(&line)?);

        if result.done {
            break;
        }
    }

    let summary = Summary {
        steps,
        total_reward,
        simulator_calls: env.simulator().calls(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    env.close();
    Ok(())
}
