// src/agro/template.rs
//
// Campaign templates materialized from the crop identity config, and the
// batch expansion over candidate intervention periodicities.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::campaign::{build_campaign, CampaignDescriptor, CampaignTemplate, TriggerCosts};
use super::schedule::{ApplicationAmounts, InterventionKind};
use crate::config::AgroConfig;
use crate::error::CampaignError;

/// Concatenate a 4-digit year with a "-MM-DD" suffix and parse the result.
pub fn campaign_date(year: i32, suffix: &str) -> Result<NaiveDate, CampaignError> {
    NaiveDate::parse_from_str(&format!("{year:04}{suffix}"), "%Y-%m-%d").map_err(|_| {
        CampaignError::InvalidDateSuffix {
            year,
            suffix: suffix.to_string(),
        }
    })
}

/// Days from the campaign start to the harvest date for `year`.
///
/// This is the horizon the frequency actions are rescaled against.
pub fn horizon_days(agro: &AgroConfig, year: i32) -> Result<i64, CampaignError> {
    let start = campaign_date(year, &agro.campaign_start_date)?;
    let end = campaign_date(year, &agro.harvest_date)?;
    Ok((end - start).num_days())
}

/// Render the YAML text of the campaign template for `year`.
///
/// Free-text fields are emitted as YAML scalars so names that look like
/// numbers or booleans still parse back as strings.
pub fn render_template(agro: &AgroConfig, year: i32) -> Result<String, CampaignError> {
    let campaign_start = campaign_date(year, &agro.campaign_start_date)?;
    let emergence = campaign_date(year, &agro.emergence_date)?;
    let harvest = campaign_date(year, &agro.harvest_date)?;
    let crop_name = yaml_scalar(&agro.crop_name)?;
    let variety_name = yaml_scalar(&agro.crop_variety)?;

    Ok(format!(
        "- {campaign_start}:
    CropCalendar:
        crop_name: {crop_name}
        variety_name: {variety_name}
        crop_start_date: {emergence}
        crop_start_type: {start_type}
        crop_end_date: {harvest}
        crop_end_type: {end_type}
        max_duration: {max_duration}
    TimedEvents: null
    StateEvents: null
",
        start_type = agro.crop_start_type.as_str(),
        end_type = agro.crop_end_type.as_str(),
        max_duration = agro.max_duration,
    ))
}

fn yaml_scalar(value: &str) -> Result<String, CampaignError> {
    Ok(serde_yaml::to_string(value)?.trim_end().to_string())
}

/// Materialize and parse the campaign template for `year`.
pub fn materialize_template(agro: &AgroConfig, year: i32) -> Result<CampaignTemplate, CampaignError> {
    CampaignTemplate::from_yaml_str(&render_template(agro, year)?)
}

/// Campaigns built over the cartesian product of candidate periodicities.
///
/// Row-major: index `i * fertilization_periods.len() + j` holds
/// `(irrigation_periods[i], fertilization_periods[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignGrid {
    pub irrigation_periods: Vec<i64>,
    pub fertilization_periods: Vec<i64>,
    pub campaigns: Vec<CampaignDescriptor>,
    pub costs: Vec<f64>,
}

impl CampaignGrid {
    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    /// Campaign and cost for `(irrigation_periods[i], fertilization_periods[j])`.
    pub fn get(&self, i: usize, j: usize) -> Option<(&CampaignDescriptor, f64)> {
        if i >= self.irrigation_periods.len() || j >= self.fertilization_periods.len() {
            return None;
        }
        let idx = i * self.fertilization_periods.len() + j;
        Some((self.campaigns.get(idx)?, *self.costs.get(idx)?))
    }

    /// Consume the grid, yielding the first campaign (the only one for a
    /// singleton combination).
    pub fn into_first(self) -> Option<(CampaignDescriptor, f64)> {
        self.campaigns.into_iter().zip(self.costs).next()
    }
}

/// Build one campaign per `(irrigation, fertilization)` periodicity pair.
///
/// The template is materialized once for `year`; per-trigger costs default
/// to zero unless `costs` is given.
pub fn expand_campaign(
    agro: &AgroConfig,
    irrigation_periods: &[i64],
    fertilization_periods: &[i64],
    amounts: &ApplicationAmounts,
    year: i32,
    costs: Option<&TriggerCosts>,
) -> Result<CampaignGrid, CampaignError> {
    let template = materialize_template(agro, year)?;
    let costs = costs.copied().unwrap_or_else(TriggerCosts::zero);

    let n = irrigation_periods.len() * fertilization_periods.len();
    let mut campaigns = Vec::with_capacity(n);
    let mut grid_costs = Vec::with_capacity(n);

    for &irrigate in irrigation_periods {
        for &fertilize in fertilization_periods {
            let periodicities = BTreeMap::from([
                (InterventionKind::Irrigate, irrigate),
                (InterventionKind::Fertilize, fertilize),
            ]);
            let (campaign, cost) = build_campaign(&template, &periodicities, &costs, amounts)?;
            campaigns.push(campaign);
            grid_costs.push(cost);
        }
    }

    Ok(CampaignGrid {
        irrigation_periods: irrigation_periods.to_vec(),
        fertilization_periods: fertilization_periods.to_vec(),
        campaigns,
        costs: grid_costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agro::campaign::{CropEndType, CropStartType};

    #[test]
    fn test_campaign_date_concatenation() {
        assert_eq!(
            campaign_date(2019, "-04-11").unwrap(),
            NaiveDate::from_ymd_opt(2019, 4, 11).unwrap()
        );
        assert!(matches!(
            campaign_date(2019, "04-11"),
            Err(CampaignError::InvalidDateSuffix { .. })
        ));
        assert!(campaign_date(2019, "-02-29").is_err());
        assert!(campaign_date(2020, "-02-29").is_ok());
    }

    #[test]
    fn test_horizon_tracks_leap_years() {
        let agro = AgroConfig::default();
        assert_eq!(horizon_days(&agro, 2019).unwrap(), 222);
        assert_eq!(horizon_days(&agro, 2020).unwrap(), 223);
    }

    #[test]
    fn test_materialized_template_fields() {
        let agro = AgroConfig::default();
        let template = materialize_template(&agro, 2021).unwrap();
        let (start, body) = template.single().unwrap();
        let cal = &body.crop_calendar;
        assert_eq!(start, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(cal.crop_name, "wheat");
        assert_eq!(cal.variety_name, "Winter_wheat_101");
        assert_eq!(cal.crop_start_date, NaiveDate::from_ymd_opt(2021, 4, 11).unwrap());
        assert_eq!(cal.crop_end_date, NaiveDate::from_ymd_opt(2021, 8, 11).unwrap());
        assert_eq!(cal.crop_start_type, CropStartType::Emergence);
        assert_eq!(cal.crop_end_type, CropEndType::Harvest);
        assert_eq!(cal.max_duration, 100);
        assert!(body.timed_events.is_none());
        assert!(body.state_events.is_none());
    }

    #[test]
    fn test_numeric_looking_names_stay_text() {
        let agro = AgroConfig {
            crop_name: "2019".to_string(),
            crop_variety: "true".to_string(),
            ..AgroConfig::default()
        };
        let template = materialize_template(&agro, 2019).unwrap();
        let (_, body) = template.single().unwrap();
        assert_eq!(body.crop_calendar.crop_name, "2019");
        assert_eq!(body.crop_calendar.variety_name, "true");
    }

    #[test]
    fn test_expand_row_major_order() {
        let agro = AgroConfig::default();
        let amounts = ApplicationAmounts {
            irrigation: 1.0,
            n: 1.0,
            p: 1.0,
            k: 1.0,
        };
        let grid = expand_campaign(&agro, &[0, 1], &[0, 15], &amounts, 2019, None).unwrap();
        assert_eq!(grid.len(), 4);

        let tables = |idx: usize| {
            let c = &grid.campaigns[idx];
            (
                c.table(InterventionKind::Irrigate).map(|t| t.len()),
                c.table(InterventionKind::Fertilize).map(|t| t.len()),
            )
        };
        assert_eq!(tables(0), (None, None));
        assert_eq!(tables(1), (None, Some(222 / 15 + 1)));
        assert_eq!(tables(2), (Some(223), None));
        assert_eq!(tables(3), (Some(223), Some(222 / 15 + 1)));

        let (c, cost) = grid.get(1, 1).unwrap();
        assert_eq!(c, &grid.campaigns[3]);
        assert_eq!(cost, 0.0);
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn test_expand_with_cost_override() {
        let agro = AgroConfig::default();
        let costs = TriggerCosts {
            irrigate: 2.0,
            fertilize: 0.5,
        };
        let grid = expand_campaign(
            &agro,
            &[111],
            &[0],
            &ApplicationAmounts::default(),
            2019,
            Some(&costs),
        )
        .unwrap();
        // Offsets 0, 111, 222.
        assert_eq!(grid.costs, vec![6.0]);
    }

    #[test]
    fn test_expand_empty_candidates() {
        let grid = expand_campaign(
            &AgroConfig::default(),
            &[],
            &[1, 2],
            &ApplicationAmounts::default(),
            2019,
            None,
        )
        .unwrap();
        assert!(grid.is_empty());
        assert!(grid.into_first().is_none());
    }
}
