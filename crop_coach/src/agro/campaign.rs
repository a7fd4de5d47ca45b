// src/agro/campaign.rs
//
// Campaign descriptors and the campaign builder.
//
// A campaign is keyed by its start date and carries the crop calendar plus
// one event table per active intervention type. On the wire (the
// agromanagement document read by the crop engine) it is a one-element
// list holding a single `{start_date: body}` map. Templates are parsed in
// that loose shape and only become a `CampaignDescriptor` once the
// one-entry arity is checked.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use super::schedule::{
    synthesize, ApplicationAmounts, EventTable, InterventionKind, DEFAULT_SCHEDULE_SEED,
};
use crate::error::CampaignError;

/// How the crop enters the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStartType {
    Sowing,
    Emergence,
}

impl CropStartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropStartType::Sowing => "sowing",
            CropStartType::Emergence => "emergence",
        }
    }
}

/// How the crop leaves the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropEndType {
    Maturity,
    Harvest,
    Earliest,
}

impl CropEndType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropEndType::Maturity => "maturity",
            CropEndType::Harvest => "harvest",
            CropEndType::Earliest => "earliest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCalendar {
    pub crop_name: String,
    pub variety_name: String,
    pub crop_start_date: NaiveDate,
    pub crop_start_type: CropStartType,
    pub crop_end_date: NaiveDate,
    pub crop_end_type: CropEndType,
    pub max_duration: u32,
}

/// Body of a campaign entry as it appears in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignBody {
    #[serde(rename = "CropCalendar")]
    pub crop_calendar: CropCalendar,
    #[serde(rename = "TimedEvents", default)]
    pub timed_events: Option<Vec<EventTable>>,
    /// Reserved; never populated by the builder.
    #[serde(rename = "StateEvents", default)]
    pub state_events: Option<serde_yaml::Value>,
}

/// Loosely shaped campaign template: a list of `{start_date: body}` maps.
///
/// Only templates with exactly one entry holding exactly one start date can
/// be built; see [`CampaignTemplate::single`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignTemplate {
    pub entries: Vec<BTreeMap<NaiveDate, CampaignBody>>,
}

impl CampaignTemplate {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CampaignError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The sole start date and body, or an arity error.
    pub fn single(&self) -> Result<(NaiveDate, &CampaignBody), CampaignError> {
        let arity_error = || CampaignError::TemplateArity {
            top_level: self.entries.len(),
            nested: self.entries.first().map_or(0, |e| e.len()),
        };

        let [entry] = self.entries.as_slice() else {
            return Err(arity_error());
        };
        if entry.len() != 1 {
            return Err(arity_error());
        }
        entry
            .iter()
            .next()
            .map(|(date, body)| (*date, body))
            .ok_or_else(arity_error)
    }
}

/// A fully built campaign, ready for the crop engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignDescriptor {
    pub start_date: NaiveDate,
    pub crop_calendar: CropCalendar,
    pub timed_events: Vec<EventTable>,
}

impl CampaignDescriptor {
    /// Days from the campaign start to the crop end date.
    pub fn horizon_days(&self) -> i64 {
        (self.crop_calendar.crop_end_date - self.start_date).num_days()
    }

    /// Event table for `kind`, if that intervention is active.
    pub fn table(&self, kind: InterventionKind) -> Option<&EventTable> {
        self.timed_events.iter().find(|t| t.kind == kind)
    }

    pub fn to_yaml_string(&self) -> Result<String, CampaignError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CampaignError> {
        let template = CampaignTemplate::from_yaml_str(yaml)?;
        let (start_date, body) = template.single()?;
        Ok(Self {
            start_date,
            crop_calendar: body.crop_calendar.clone(),
            timed_events: body.timed_events.clone().unwrap_or_default(),
        })
    }
}

#[derive(Serialize)]
struct CampaignBodyRef<'a> {
    #[serde(rename = "CropCalendar")]
    crop_calendar: &'a CropCalendar,
    #[serde(rename = "TimedEvents")]
    timed_events: &'a [EventTable],
    #[serde(rename = "StateEvents")]
    state_events: Option<()>,
}

impl Serialize for CampaignDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = BTreeMap::new();
        entry.insert(
            self.start_date,
            CampaignBodyRef {
                crop_calendar: &self.crop_calendar,
                timed_events: &self.timed_events,
                state_events: None,
            },
        );
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&entry)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for CampaignDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let template = CampaignTemplate::deserialize(deserializer)?;
        let (start_date, body) = template.single().map_err(de::Error::custom)?;
        Ok(Self {
            start_date,
            crop_calendar: body.crop_calendar.clone(),
            timed_events: body.timed_events.clone().unwrap_or_default(),
        })
    }
}

/// Per-activation cost of each intervention type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerCosts {
    pub irrigate: f64,
    pub fertilize: f64,
}

impl TriggerCosts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn for_kind(&self, kind: InterventionKind) -> f64 {
        match kind {
            InterventionKind::Irrigate => self.irrigate,
            InterventionKind::Fertilize => self.fertilize,
        }
    }
}

/// Build a campaign from a single-entry template.
///
/// Any timed events already in the template are discarded. One schedule is
/// synthesized per entry of `periodicities` (in `InterventionKind` order)
/// over the template's own horizon; disabled interventions contribute no
/// table and no cost.
pub fn build_campaign(
    template: &CampaignTemplate,
    periodicities: &BTreeMap<InterventionKind, i64>,
    costs: &TriggerCosts,
    amounts: &ApplicationAmounts,
) -> Result<(CampaignDescriptor, f64), CampaignError> {
    build_campaign_seeded(template, periodicities, costs, amounts, DEFAULT_SCHEDULE_SEED)
}

/// [`build_campaign`] with an explicit schedule seed.
pub fn build_campaign_seeded(
    template: &CampaignTemplate,
    periodicities: &BTreeMap<InterventionKind, i64>,
    costs: &TriggerCosts,
    amounts: &ApplicationAmounts,
    seed: u64,
) -> Result<(CampaignDescriptor, f64), CampaignError> {
    let (start_date, body) = template.single()?;
    let calendar = &body.crop_calendar;
    if calendar.crop_end_date <= calendar.crop_start_date {
        return Err(CampaignError::InvalidCalendar {
            start: calendar.crop_start_date,
            end: calendar.crop_end_date,
        });
    }
    // The schedule horizon runs from the campaign start to the crop end.
    if calendar.crop_end_date < start_date {
        return Err(CampaignError::InvalidCalendar {
            start: start_date,
            end: calendar.crop_end_date,
        });
    }

    let horizon_days = (calendar.crop_end_date - start_date).num_days();
    let mut timed_events = Vec::new();
    let mut total_cost = 0.0;

    for (&kind, &periodicity) in periodicities {
        let schedule = synthesize(
            kind,
            periodicity,
            start_date,
            horizon_days,
            costs.for_kind(kind),
            amounts,
            seed,
        );
        total_cost += schedule.total_cost;
        if let Some(table) = schedule.table {
            timed_events.push(table);
        }
    }

    tracing::debug!(
        target: "crop_coach::campaign",
        start_date = %start_date,
        horizon_days,
        tables = timed_events.len(),
        total_cost,
        "campaign.built"
    );

    Ok((
        CampaignDescriptor {
            start_date,
            crop_calendar: calendar.clone(),
            timed_events,
        },
        total_cost,
    ))
}
