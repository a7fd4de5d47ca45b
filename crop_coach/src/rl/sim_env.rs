// src/rl/sim_env.rs
//
// Gym-style episode controller.
//
// One step is one growing season: the action is decoded into application
// amounts and intervention periods, a single campaign is built for the
// campaign year, the external simulator runs it, and the terminal record
// becomes the observation. An episode lasts `years_count` steps.
//
// Lifecycle:
//   new()   -> Ready
//   reset() -> Ready (from Ready or Done)
//   step()  -> Ready while years remain, Done on the last one
//
// Stepping a Done environment is an error until the next reset.

use serde::{Deserialize, Serialize};

use crate::agro::{expand_campaign, horizon_days, CampaignDescriptor};
use crate::config::EnvConfig;
use crate::error::{CampaignError, EnvError};
use crate::simulator::{CropSimulator, SimulationContext};

use super::action_encoding::{ActionVector, PhysicalQuantities, ACTION_DIM};
use super::observation::{zero_observation, ObservationSpec, TerminalObservation};
use super::reward::RewardComponents;
use super::year_sampler::{wall_clock_seed, YearSampler};

/// Result of a single environment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Terminal-record observation for this season.
    pub observation: Vec<f64>,
    pub reward: f64,
    /// True once the episode's seasons are used up.
    pub done: bool,
    pub info: StepInfo,
}

/// Auxiliary step information. Currently always empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodePhase {
    Ready,
    Done,
}

/// Crop-management environment over an external simulator.
pub struct CropEnv<S: CropSimulator> {
    config: EnvConfig,
    context: SimulationContext,
    simulator: S,
    /// Present only when year sampling is enabled.
    year_sampler: Option<YearSampler>,
    observation_spec: ObservationSpec,
    remaining_years: u32,
    campaign_year: i32,
    observation: Vec<f64>,
    last_reward: f64,
    last_quantities: Option<PhysicalQuantities>,
    last_campaign: Option<CampaignDescriptor>,
    phase: EpisodePhase,
}

impl<S: CropSimulator> CropEnv<S> {
    /// Validate the config, resolve parameter files and coordinates, and
    /// start in the Ready state.
    pub fn new(config: EnvConfig, simulator: S) -> Result<Self, EnvError> {
        config.validate()?;
        let context = SimulationContext::resolve(&config);

        let year_sampler = config
            .sample_year
            .then(|| YearSampler::new(config.seed.unwrap_or_else(wall_clock_seed)));

        let observation_spec = ObservationSpec::from_config(&config);

        Ok(Self {
            context,
            simulator,
            year_sampler,
            remaining_years: config.years_count,
            campaign_year: config.year,
            observation: zero_observation(observation_spec.width),
            observation_spec,
            last_reward: 0.0,
            last_quantities: None,
            last_campaign: None,
            phase: EpisodePhase::Ready,
            config,
        })
    }

    /// Start a new episode. Returns the all-zero observation.
    pub fn reset(&mut self) -> Vec<f64> {
        self.remaining_years = self.config.years_count;
        self.observation = zero_observation(self.observation_spec.width);
        self.last_reward = 0.0;
        self.last_quantities = None;
        self.last_campaign = None;
        self.phase = EpisodePhase::Ready;

        tracing::debug!(
            target: "crop_coach::env",
            remaining_years = self.remaining_years,
            observation_width = self.observation_spec.width,
            "env.reset"
        );
        self.observation.clone()
    }

    /// Simulate one season under `action`.
    ///
    /// Campaign and simulator failures are returned as-is; the year counter
    /// has already been consumed by then.
    pub fn step(&mut self, action: &ActionVector) -> Result<StepResult, EnvError> {
        if self.phase == EpisodePhase::Done {
            return Err(EnvError::EpisodeFinished);
        }

        let year = self.next_year();
        self.campaign_year = year;
        self.remaining_years = self.remaining_years.saturating_sub(1);
        if self.remaining_years == 0 {
            self.phase = EpisodePhase::Done;
        }

        let horizon = horizon_days(&self.config.agro, year)?;
        let quantities = PhysicalQuantities::decode(action, horizon);
        let amounts = quantities.amounts();

        // Mono-action: exactly one (irrigation, fertilization) combination.
        let (campaign, schedule_cost) = expand_campaign(
            &self.config.agro,
            &[quantities.irrigation_period],
            &[quantities.fertilization_period],
            &amounts,
            year,
            Some(&self.config.trigger_costs),
        )?
        .into_first()
        .ok_or(CampaignError::EmptyGrid)?;

        let trace = self.simulator.simulate(&campaign, &self.context)?;
        let terminal = TerminalObservation::from_trace(&trace, &self.config)?;

        let components = RewardComponents::compute(
            terminal.yield_,
            &amounts,
            &self.config.costs,
            &self.config.discounts,
        );
        let reward = components.reward();
        let done = self.phase == EpisodePhase::Done;

        tracing::debug!(
            target: "crop_coach::env",
            year,
            horizon,
            irrigation = quantities.irrigation_volume,
            n = quantities.n_mass,
            p = quantities.p_mass,
            k = quantities.k_mass,
            irrigation_period = quantities.irrigation_period,
            fertilization_period = quantities.fertilization_period,
            schedule_cost,
            trace_days = trace.len(),
            yield_ = terminal.yield_,
            revenue = components.revenue,
            input_cost = components.total_cost(),
            reward,
            remaining_years = self.remaining_years,
            done,
            "env.step"
        );

        self.observation = terminal.values;
        self.last_reward = reward;
        self.last_quantities = Some(quantities);
        self.last_campaign = Some(campaign);

        Ok(StepResult {
            observation: self.observation.clone(),
            reward,
            done,
            info: StepInfo::default(),
        })
    }

    /// Reseed the year sampler. No effect when year sampling is off.
    pub fn reseed(&mut self, seed: u64) {
        if let Some(sampler) = self.year_sampler.as_mut() {
            sampler.reseed(seed);
        }
    }

    fn next_year(&mut self) -> i32 {
        match self.year_sampler.as_mut() {
            Some(sampler) => sampler.sample(),
            None => self.config.year,
        }
    }

    pub fn remaining_years(&self) -> u32 {
        self.remaining_years
    }

    /// Year of the last stepped campaign (the configured year before any step).
    pub fn campaign_year(&self) -> i32 {
        self.campaign_year
    }

    pub fn last_observation(&self) -> &[f64] {
        &self.observation
    }

    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    pub fn last_quantities(&self) -> Option<&PhysicalQuantities> {
        self.last_quantities.as_ref()
    }

    pub fn last_campaign(&self) -> Option<&CampaignDescriptor> {
        self.last_campaign.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.phase == EpisodePhase::Done
    }

    pub fn observation_width(&self) -> usize {
        self.observation_spec.width
    }

    pub fn observation_spec(&self) -> &ObservationSpec {
        &self.observation_spec
    }

    pub fn action_dim(&self) -> usize {
        ACTION_DIM
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    /// No-op.
    pub fn render(&self) {}

    /// No-op.
    pub fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agro::InterventionKind;
    use crate::error::SimulationError;
    use crate::simulator::{DailyRecord, ReplaySimulator};
    use chrono::NaiveDate;

    fn harvest_record(twso: f64) -> DailyRecord {
        DailyRecord::new(NaiveDate::from_ymd_opt(2019, 8, 11).unwrap())
            .with("TWSO", Some(twso))
            .with("LAI", None)
    }

    fn env_with(config: EnvConfig, twso: f64) -> CropEnv<ReplaySimulator> {
        CropEnv::new(config, ReplaySimulator::terminal(harvest_record(twso))).unwrap()
    }

    #[test]
    fn test_new_starts_ready_with_zero_observation() {
        let env = env_with(EnvConfig::deterministic(2019), 1000.0);
        assert_eq!(env.remaining_years(), 2);
        assert_eq!(env.observation_width(), 40);
        assert_eq!(env.action_dim(), 6);
        assert!(env.last_observation().iter().all(|&v| v == 0.0));
        assert!(env.observation_spec().validate_dim(env.last_observation()));
        assert!(!env.is_done());
    }

    #[test]
    fn test_step_builds_one_campaign_and_rewards_yield() {
        let mut env = env_with(EnvConfig::deterministic(2019), 1000.0);
        env.reset();
        // 10 cm irrigation, 50 kg N, no P/K, both interventions disabled.
        let action = [0.0, -0.5, -1.0, -1.0, -1.0, -1.0];
        let result = env.step(&action).unwrap();

        assert!(!result.done);
        assert_eq!(result.info, StepInfo::default());
        assert!((result.reward - 600.0).abs() < 1e-9);
        assert_eq!(result.observation.len(), 40);
        assert_eq!(result.observation[3], 1000.0);
        assert_eq!(env.simulator().calls(), 1);

        let campaign = env.last_campaign().unwrap();
        assert!(campaign.timed_events.is_empty());
        assert_eq!(campaign.start_date, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
    }

    #[test]
    fn test_frequencies_use_campaign_horizon() {
        let mut env = env_with(EnvConfig::deterministic(2019), 0.0);
        // Irrigation every 222 days over a 222-day horizon: offsets 0 and 222.
        let action = [-1.0, -1.0, -1.0, -1.0, 1.0, -1.0];
        env.step(&action).unwrap();
        let q = env.last_quantities().unwrap();
        assert_eq!(q.irrigation_period, 222);
        let table = env
            .last_campaign()
            .unwrap()
            .table(InterventionKind::Irrigate)
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_step_after_done_is_rejected() {
        let mut config = EnvConfig::deterministic(2019);
        config.years_count = 1;
        let mut env = env_with(config, 10.0);
        let r = env.step(&[0.0; 6]).unwrap();
        assert!(r.done);
        assert!(matches!(env.step(&[0.0; 6]), Err(EnvError::EpisodeFinished)));
        env.reset();
        assert!(env.step(&[0.0; 6]).is_ok());
    }

    #[test]
    fn test_simulator_failure_propagates() {
        let mut env = CropEnv::new(EnvConfig::deterministic(2019), ReplaySimulator::default()).unwrap();
        let err = env.step(&[0.0; 6]).unwrap_err();
        assert!(matches!(err, EnvError::Simulation(SimulationError::EmptyTrace)));
        assert_eq!(env.remaining_years(), 1);
    }

    #[test]
    fn test_sampled_years_are_seeded() {
        let mut config = EnvConfig::default();
        config.seed = Some(11);
        config.years_count = 5;

        let years = |config: EnvConfig| {
            let mut env = env_with(config, 1.0);
            (0..5)
                .map(|_| {
                    env.step(&[0.0; 6]).unwrap();
                    env.campaign_year()
                })
                .collect::<Vec<_>>()
        };
        let a = years(config.clone());
        let b = years(config);
        assert_eq!(a, b);
        assert!(a.iter().all(|y| *y == 2017 || *y == 2019 || *y >= 2020));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EnvConfig::deterministic(2019);
        config.years_count = 0;
        let err = CropEnv::new(config, ReplaySimulator::default()).err().unwrap();
        assert!(matches!(err, EnvError::Config(_)));
    }
}
