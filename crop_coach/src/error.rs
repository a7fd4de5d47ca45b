// src/error.rs
//
// Error types for campaign building, configuration, simulator delegation
// and the episode controller.
//
// Configuration fallbacks (missing parameter files, out-of-range
// coordinates) are not errors: they are logged and recovered where they
// happen. Everything here aborts the current operation.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while materializing or building a campaign.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// The template does not hold exactly one start date with exactly one body.
    #[error(
        "campaign template must hold exactly one start date with one body \
         (found {top_level} top-level entries, {nested} nested keys)"
    )]
    TemplateArity { top_level: usize, nested: usize },

    #[error("crop calendar ends on {end}, which is not after {start}")]
    InvalidCalendar { start: NaiveDate, end: NaiveDate },

    #[error("invalid calendar suffix {suffix:?} for year {year} (expected \"-MM-DD\")")]
    InvalidDateSuffix { year: i32, suffix: String },

    #[error("campaign expansion produced no campaigns")]
    EmptyGrid,

    #[error("failed to parse campaign template: {0}")]
    TemplateParse(#[from] serde_yaml::Error),
}

/// Errors raised while loading or validating an `EnvConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config validation error in '{field}': {message}")]
    Validation { field: String, message: String },
}

/// Failures reported by the external crop simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("crop simulator failed: {0}")]
    Engine(String),

    #[error("crop simulator returned an empty daily trace")]
    EmptyTrace,

    #[error("terminal record has no '{0}' variable")]
    MissingVariable(String),
}

/// Errors surfaced by the episode controller.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// `step()` was called after the episode terminated without a `reset()`.
    #[error("episode is finished; call reset() before stepping again")]
    EpisodeFinished,
}
