//! crop_coach core library.
//!
//! Turns a six-component normalized action into an agromanagement campaign
//! (a crop calendar plus dated irrigation and fertilization events), runs it
//! through an external crop simulator, and scores the season with an
//! economic reward. `rl::CropEnv` wraps this in a Gym-style reset/step loop.
//!
//! The crop engine itself lives behind the `simulator::CropSimulator` trait.

pub mod agro;
pub mod config;
pub mod error;
pub mod rl;
pub mod simulator;

// --- Re-exports for ergonomic external use ---------------------------------

pub use agro::{
    build_campaign, expand_campaign, synthesize, ApplicationAmounts, CampaignDescriptor,
    CampaignGrid, CampaignTemplate, InterventionKind, InterventionSpec, Schedule, TriggerCosts,
};

pub use config::{AgroConfig, CostTable, DiscountFactors, EnvConfig, ParameterPaths, SiteConfig};

pub use error::{CampaignError, ConfigError, EnvError, SimulationError};

pub use rl::{calculate_reward, ActionVector, CropEnv, PhysicalQuantities, StepResult};

pub use simulator::{CropSimulator, DailyRecord, ReplaySimulator, SimulationContext};
