// src/rl/mod.rs
//
// Reinforcement-learning surface of crop_coach.
//
// Key components:
// - ActionEncoding: normalized action vector <-> physical intervention quantities
// - Reward: economic reward with a per-term breakdown
// - YearSampler: seeded campaign-year sampling
// - Observation: terminal simulator record -> fixed-width observation
// - CropEnv: Gym-style episode controller (one campaign per step)

pub mod action_encoding;
pub mod observation;
pub mod reward;
pub mod sim_env;
pub mod year_sampler;

pub use action_encoding::{
    action_from_slice, ActionEncodingSpec, ActionVector, PhysicalQuantities, ACTION_DIM,
    ACTION_VERSION,
};
pub use observation::{ObservationSpec, TerminalObservation, OBS_VERSION};
pub use reward::{calculate_reward, RewardComponents};
pub use sim_env::{CropEnv, StepInfo, StepResult};
pub use year_sampler::{candidate_years, YearSampler};
