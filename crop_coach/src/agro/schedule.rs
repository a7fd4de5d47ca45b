// src/agro/schedule.rs
//
// Schedule synthesis: turn one intervention type plus a periodicity into a
// date-indexed event table and the accumulated per-trigger cost.
//
// Event tables serialize to the agromanagement shape consumed by the crop
// engine: a signal name, a label, a comment and a list of one-entry maps
// `{date: parameters}`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Water application efficiency attached to every irrigation event.
pub const IRRIGATION_EFFICIENCY: f64 = 0.7;

/// Recovery fraction attached to every N, P and K application.
pub const NUTRIENT_RECOVERY: f64 = 0.7;

/// Seed recorded on every synthesized schedule unless the caller overrides it.
pub const DEFAULT_SCHEDULE_SEED: u64 = 5676;

/// Agronomic intervention type.
///
/// Serializes as the engine signal it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InterventionKind {
    #[serde(rename = "irrigate")]
    Irrigate,
    #[serde(rename = "apply_npk")]
    Fertilize,
}

impl InterventionKind {
    pub const ALL: [InterventionKind; 2] = [InterventionKind::Irrigate, InterventionKind::Fertilize];

    /// Stable lowercase name (used in logs and CLI flags).
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionKind::Irrigate => "irrigate",
            InterventionKind::Fertilize => "fertilize",
        }
    }

    /// Engine signal fired on each scheduled day.
    pub fn event_signal(&self) -> &'static str {
        match self {
            InterventionKind::Irrigate => "irrigate",
            InterventionKind::Fertilize => "apply_npk",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            InterventionKind::Irrigate => "Irrigation application table",
            InterventionKind::Fertilize => "Timed N/P/K application table",
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            InterventionKind::Irrigate => "All irrigation amounts in cm",
            InterventionKind::Fertilize => "All fertilizer amounts in kg/ha",
        }
    }
}

impl fmt::Display for InterventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts applied on every triggered day.
///
/// Irrigation in cm, nutrients in kg/ha.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationAmounts {
    pub irrigation: f64,
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

/// Parameters of a single intervention event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterventionSpec {
    Irrigate {
        amount: f64,
        efficiency: f64,
    },
    Fertilize {
        #[serde(rename = "N_amount")]
        n_amount: f64,
        #[serde(rename = "P_amount")]
        p_amount: f64,
        #[serde(rename = "K_amount")]
        k_amount: f64,
        #[serde(rename = "N_recovery")]
        n_recovery: f64,
        #[serde(rename = "P_recovery")]
        p_recovery: f64,
        #[serde(rename = "K_recovery")]
        k_recovery: f64,
    },
}

impl InterventionSpec {
    /// Build the fixed event parameters for `kind` from the applied amounts.
    pub fn for_kind(kind: InterventionKind, amounts: &ApplicationAmounts) -> Self {
        match kind {
            InterventionKind::Irrigate => InterventionSpec::Irrigate {
                amount: amounts.irrigation,
                efficiency: IRRIGATION_EFFICIENCY,
            },
            InterventionKind::Fertilize => InterventionSpec::Fertilize {
                n_amount: amounts.n,
                p_amount: amounts.p,
                k_amount: amounts.k,
                n_recovery: NUTRIENT_RECOVERY,
                p_recovery: NUTRIENT_RECOVERY,
                k_recovery: NUTRIENT_RECOVERY,
            },
        }
    }

    pub fn kind(&self) -> InterventionKind {
        match self {
            InterventionSpec::Irrigate { .. } => InterventionKind::Irrigate,
            InterventionSpec::Fertilize { .. } => InterventionKind::Fertilize,
        }
    }
}

/// One intervention on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub date: NaiveDate,
    pub spec: InterventionSpec,
}

impl Serialize for ScheduledEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date, &self.spec)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScheduledEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<NaiveDate, InterventionSpec>::deserialize(deserializer)?;
        if entries.len() != 1 {
            return Err(de::Error::invalid_length(
                entries.len(),
                &"a single {date: parameters} entry",
            ));
        }
        let (date, spec) = entries
            .into_iter()
            .next()
            .ok_or_else(|| de::Error::custom("empty scheduled event"))?;
        Ok(ScheduledEvent { date, spec })
    }
}

/// Event table for a single intervention type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    #[serde(rename = "event_signal")]
    pub kind: InterventionKind,
    pub name: String,
    pub comment: String,
    pub events_table: Vec<ScheduledEvent>,
}

impl EventTable {
    fn new(kind: InterventionKind) -> Self {
        Self {
            kind,
            name: kind.table_name().to_string(),
            comment: kind.comment().to_string(),
            events_table: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events_table.is_empty()
    }

    /// Dates of all scheduled events, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.events_table.iter().map(|e| e.date)
    }
}

/// Result of one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// `None` when the intervention never triggers (periodicity <= 0).
    pub table: Option<EventTable>,
    /// Per-trigger cost summed over all triggered days.
    pub total_cost: f64,
    /// Seed the schedule was synthesized under.
    pub seed: u64,
}

/// Synthesize the event table for one intervention type.
///
/// Day offsets `0..=horizon_days` are scanned; every offset divisible by
/// `periodicity` schedules one event at `start_date + offset` and adds
/// `per_trigger_cost`. The end day itself is inclusive. A periodicity of
/// zero or below disables the intervention: no table, zero cost.
pub fn synthesize(
    kind: InterventionKind,
    periodicity: i64,
    start_date: NaiveDate,
    horizon_days: i64,
    per_trigger_cost: f64,
    amounts: &ApplicationAmounts,
    seed: u64,
) -> Schedule {
    if periodicity <= 0 || horizon_days < 0 {
        return Schedule {
            table: None,
            total_cost: 0.0,
            seed,
        };
    }

    let spec = InterventionSpec::for_kind(kind, amounts);
    let mut table = EventTable::new(kind);
    let mut total_cost = 0.0;

    for offset in (0..=horizon_days).step_by(periodicity as usize) {
        table.events_table.push(ScheduledEvent {
            date: start_date + Duration::days(offset),
            spec,
        });
        total_cost += per_trigger_cost;
    }

    Schedule {
        table: (!table.is_empty()).then_some(table),
        total_cost,
        seed,
    }
}
