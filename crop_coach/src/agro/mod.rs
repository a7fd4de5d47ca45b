// src/agro/mod.rs
//
// Agromanagement: schedule synthesis, campaign descriptors and the campaign
// builder, and template materialization from the crop identity config.

pub mod campaign;
pub mod schedule;
pub mod template;

pub use campaign::{
    build_campaign, build_campaign_seeded, CampaignBody, CampaignDescriptor, CampaignTemplate,
    CropCalendar, CropEndType, CropStartType, TriggerCosts,
};
pub use schedule::{
    synthesize, ApplicationAmounts, EventTable, InterventionKind, InterventionSpec, Schedule,
    ScheduledEvent, DEFAULT_SCHEDULE_SEED, IRRIGATION_EFFICIENCY, NUTRIENT_RECOVERY,
};
pub use template::{
    campaign_date, expand_campaign, horizon_days, materialize_template, render_template,
    CampaignGrid,
};
