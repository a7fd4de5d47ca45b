// src/rl/observation.rs
//
// Observation vector built from the simulator's terminal record.
//
// The observation is the last daily record with the date dropped and null
// fields read as 0, laid out in the configured output-variable order. Its
// width is fixed by the config, so it never depends on which variables the
// engine happened to emit.

use serde::{Deserialize, Serialize};

use crate::config::EnvConfig;
use crate::error::SimulationError;
use crate::simulator::DailyRecord;

/// Current observation schema version.
/// Increment when changing the layout.
pub const OBS_VERSION: u32 = 1;

/// Observation space metadata.
///
/// Every component is a non-negative simulator output with no upper bound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationSpec {
    pub version: u32,
    pub width: usize,
    pub low: f64,
    pub high: f64,
}

impl ObservationSpec {
    pub fn for_width(width: usize) -> Self {
        Self {
            version: OBS_VERSION,
            width,
            low: 0.0,
            high: f64::INFINITY,
        }
    }

    /// Spec for the tracked output variables of `config`.
    pub fn from_config(config: &EnvConfig) -> Self {
        Self::for_width(config.observation_vars().count())
    }

    pub fn validate_dim(&self, vec: &[f64]) -> bool {
        vec.len() == self.width
    }
}

/// All-zero observation of the given width (the reset observation).
pub fn zero_observation(width: usize) -> Vec<f64> {
    vec![0.0; width]
}

/// Last record of a daily trace.
pub fn terminal_record(trace: &[DailyRecord]) -> Result<&DailyRecord, SimulationError> {
    trace.last().ok_or(SimulationError::EmptyTrace)
}

/// Values of `vars` in order. Nulls and variables absent from the record are 0.
pub fn observation_from_record<'a>(
    record: &DailyRecord,
    vars: impl IntoIterator<Item = &'a str>,
) -> Vec<f64> {
    vars.into_iter()
        .map(|var| record.value_or_zero(var).unwrap_or(0.0))
        .collect()
}

/// Yield read from `yield_var`; a null reads as 0 but an absent variable is
/// an error.
pub fn yield_from_record(record: &DailyRecord, yield_var: &str) -> Result<f64, SimulationError> {
    record
        .value_or_zero(yield_var)
        .ok_or_else(|| SimulationError::MissingVariable(yield_var.to_string()))
}

/// Observation and yield extracted from one campaign's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalObservation {
    pub obs_version: u32,
    pub values: Vec<f64>,
    #[serde(rename = "yield")]
    pub yield_: f64,
}

impl TerminalObservation {
    pub fn from_trace(trace: &[DailyRecord], config: &EnvConfig) -> Result<Self, SimulationError> {
        let record = terminal_record(trace)?;
        Ok(Self {
            obs_version: OBS_VERSION,
            values: observation_from_record(record, config.observation_vars()),
            yield_: yield_from_record(record, &config.yield_var)?,
        })
    }
}
