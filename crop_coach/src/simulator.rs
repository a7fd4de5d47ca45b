// src/simulator.rs
//
// Boundary to the external crop-growth engine.
//
// The engine integrates soil, crop and weather state day by day from a
// campaign descriptor. Here it is only a trait: given the campaign and the
// simulation context it returns the daily output trace, or fails. Failures
// are passed through untouched by the episode controller.
//
// `ReplaySimulator` is a stand-in engine that replays a fixed trace and
// records every campaign it was asked to run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::agro::CampaignDescriptor;
use crate::config::{EnvConfig, ParameterSet, SiteConfig};
use crate::error::SimulationError;

/// One day of simulator output. `None` marks a variable the engine did not
/// compute on that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl DailyRecord {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, var: &str, value: Option<f64>) -> Self {
        self.values.insert(var.to_string(), value);
        self
    }

    /// Value of `var` with nulls read as 0; `None` if the variable is absent.
    pub fn value_or_zero(&self, var: &str) -> Option<f64> {
        self.values.get(var).map(|v| v.unwrap_or(0.0))
    }
}

/// Everything the engine needs besides the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationContext {
    pub parameters: ParameterSet,
    /// Weather site, already range-checked.
    pub site: SiteConfig,
    pub engine_config: PathBuf,
}

impl SimulationContext {
    /// Resolve parameter files and coordinates, applying their fallbacks.
    pub fn resolve(config: &EnvConfig) -> Self {
        Self {
            parameters: config.parameter_paths.resolve(&config.bundled_data_dir),
            site: config.site.resolve(),
            engine_config: config.engine_config_path(),
        }
    }
}

/// External crop-growth engine.
///
/// Calls are synchronous and unbounded in time.
pub trait CropSimulator {
    fn simulate(
        &mut self,
        campaign: &CampaignDescriptor,
        context: &SimulationContext,
    ) -> Result<Vec<DailyRecord>, SimulationError>;
}

impl<S: CropSimulator + ?Sized> CropSimulator for Box<S> {
    fn simulate(
        &mut self,
        campaign: &CampaignDescriptor,
        context: &SimulationContext,
    ) -> Result<Vec<DailyRecord>, SimulationError> {
        (**self).simulate(campaign, context)
    }
}

/// Stand-in engine replaying a fixed daily trace.
#[derive(Debug, Clone, Default)]
pub struct ReplaySimulator {
    trace: Vec<DailyRecord>,
    campaigns: Vec<CampaignDescriptor>,
}

impl ReplaySimulator {
    pub fn new(trace: Vec<DailyRecord>) -> Self {
        Self {
            trace,
            campaigns: Vec::new(),
        }
    }

    /// Replay a single terminal record.
    pub fn terminal(record: DailyRecord) -> Self {
        Self::new(vec![record])
    }

    /// Campaigns received so far, in call order.
    pub fn campaigns(&self) -> &[CampaignDescriptor] {
        &self.campaigns
    }

    pub fn calls(&self) -> usize {
        self.campaigns.len()
    }
}

impl CropSimulator for ReplaySimulator {
    fn simulate(
        &mut self,
        campaign: &CampaignDescriptor,
        _context: &SimulationContext,
    ) -> Result<Vec<DailyRecord>, SimulationError> {
        self.campaigns.push(campaign.clone());
        if self.trace.is_empty() {
            return Err(SimulationError::EmptyTrace);
        }
        Ok(self.trace.clone())
    }
}
