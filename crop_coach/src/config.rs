// src/config.rs
//
// Central configuration for the crop_coach environment.
//
// Everything the episode controller needs is carried in an explicit
// `EnvConfig` value: crop identity and calendar offsets, the economic
// tables used by the reward, the site coordinates, the physical parameter
// file locations (with their bundled fallbacks) and the episode settings.
// Nothing is looked up from global state, so the core stays testable
// without a filesystem.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::agro::campaign::{CropEndType, CropStartType, TriggerCosts};
use crate::agro::template::campaign_date;
use crate::error::ConfigError;
use crate::rl::year_sampler::candidate_years;

/// Default site latitude (Wageningen area).
pub const DEFAULT_LATITUDE: f64 = 51.97;
/// Default site longitude.
pub const DEFAULT_LONGITUDE: f64 = 5.67;

/// Name of the date field in the simulator's daily records.
pub const DAY_VAR: &str = "day";

/// Output variable holding storage-organ weight (the yield).
pub const DEFAULT_YIELD_VAR: &str = "TWSO";

/// Engine configuration file shipped with the bundled parameters.
pub const DEFAULT_ENGINE_CONFIG: &str = "WLP_NPK.conf";

/// Tracked simulator output variables, in observation order.
pub const DEFAULT_OUTPUT_VARS: [&str; 40] = [
    "DVS",
    "LAI",
    "TAGP",
    "TWSO",
    "TWLV",
    "TWST",
    "TWRT",
    "TRA",
    "RD",
    "SM",
    "WWLOW",
    "NNI",
    "KNI",
    "PNI",
    "NPKI",
    "NSOIL",
    "PSOIL",
    "KSOIL",
    "NAVAIL",
    "PAVAIL",
    "KAVAIL",
    "NDEMLV",
    "NDEMRT",
    "NDEMSO",
    "NDEMST",
    "PDEMLV",
    "PDEMRT",
    "PDEMSO",
    "PDEMST",
    "KDEMLV",
    "KDEMRT",
    "KDEMSO",
    "KDEMST",
    "RNUPTAKE",
    "RPUPTAKE",
    "RKUPTAKE",
    "RNFIX",
    "NTRANSLOCATABLE",
    "PTRANSLOCATABLE",
    "KTRANSLOCATABLE",
];

/// Crop identity and calendar offsets.
///
/// Date fields are "-MM-DD" suffixes; the campaign year is prepended when a
/// template is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgroConfig {
    pub crop_name: String,
    pub crop_variety: String,
    pub campaign_start_date: String,
    pub crop_start_type: CropStartType,
    pub emergence_date: String,
    pub crop_end_type: CropEndType,
    pub harvest_date: String,
    pub max_duration: u32,
}

impl Default for AgroConfig {
    fn default() -> Self {
        Self {
            crop_name: "wheat".to_string(),
            crop_variety: "Winter_wheat_101".to_string(),
            campaign_start_date: "-01-01".to_string(),
            crop_start_type: CropStartType::Emergence,
            emergence_date: "-04-11".to_string(),
            crop_end_type: CropEndType::Harvest,
            harvest_date: "-08-11".to_string(),
            max_duration: 100,
        }
    }
}

impl AgroConfig {
    /// Check that every suffix forms a date in `year` and that the calendar
    /// is ordered: emergence before harvest, harvest not before the
    /// campaign start.
    pub fn validate_calendar(&self, year: i32) -> Result<(), ConfigError> {
        let date = |field: &str, suffix: &str| {
            campaign_date(year, suffix).map_err(|e| validation(field, &e.to_string()))
        };
        let campaign_start = date("agro.campaign_start_date", self.campaign_start_date.as_str())?;
        let emergence = date("agro.emergence_date", self.emergence_date.as_str())?;
        let harvest = date("agro.harvest_date", self.harvest_date.as_str())?;

        if harvest <= emergence {
            return Err(validation(
                "agro.harvest_date",
                &format!("{harvest} is not after emergence on {emergence}"),
            ));
        }
        if harvest < campaign_start {
            return Err(validation(
                "agro.harvest_date",
                &format!("{harvest} is before the campaign start on {campaign_start}"),
            ));
        }
        Ok(())
    }
}

/// Unit costs of each input plus the selling price of the yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    #[serde(rename = "Irrigation")]
    pub irrigation: f64,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "Selling")]
    pub selling: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            irrigation: 150.0,
            n: 8.0,
            p: 8.5,
            k: 7.0,
            selling: 2.5,
        }
    }
}

/// How strongly each input's cost is weighted in the reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountFactors {
    #[serde(rename = "Irrigation")]
    pub irrigation: f64,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl Default for DiscountFactors {
    fn default() -> Self {
        Self {
            irrigation: 1.0,
            n: 1.0,
            p: 1.0,
            k: 1.0,
        }
    }
}

/// Geographic site used by the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }
}

impl SiteConfig {
    /// Replace out-of-range coordinates with the built-in defaults.
    ///
    /// Each axis is checked independently; a bad latitude does not reset a
    /// valid longitude.
    pub fn resolve(&self) -> SiteConfig {
        let mut site = *self;
        if !(-90.0..=90.0).contains(&self.latitude) {
            tracing::warn!(
                target: "crop_coach::config",
                latitude = self.latitude,
                fallback = DEFAULT_LATITUDE,
                "latitude outside [-90, 90]; using default"
            );
            site.latitude = DEFAULT_LATITUDE;
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            tracing::warn!(
                target: "crop_coach::config",
                longitude = self.longitude,
                fallback = DEFAULT_LONGITUDE,
                "longitude outside [-180, 180]; using default"
            );
            site.longitude = DEFAULT_LONGITUDE;
        }
        site
    }
}

/// Where one physical parameter set is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterSource {
    /// User-supplied file that exists.
    File(PathBuf),
    /// Bundled default.
    Bundled(PathBuf),
}

impl ParameterSource {
    pub fn path(&self) -> &Path {
        match self {
            ParameterSource::File(p) | ParameterSource::Bundled(p) => p,
        }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, ParameterSource::Bundled(_))
    }
}

/// Resolved soil, site and crop parameter sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub soil: ParameterSource,
    pub site: ParameterSource,
    pub crop: ParameterSource,
}

/// Optional user paths to the soil, site and crop parameter files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterPaths {
    pub soil: Option<PathBuf>,
    pub site: Option<PathBuf>,
    pub crop: Option<PathBuf>,
}

impl ParameterPaths {
    /// Resolve each file independently, falling back to
    /// `<bundled_dir>/<name>.cab` when the path is unset or not a file.
    pub fn resolve(&self, bundled_dir: &Path) -> ParameterSet {
        ParameterSet {
            soil: resolve_parameter_file("soil", self.soil.as_deref(), bundled_dir),
            site: resolve_parameter_file("site", self.site.as_deref(), bundled_dir),
            crop: resolve_parameter_file("crop", self.crop.as_deref(), bundled_dir),
        }
    }
}

fn resolve_parameter_file(name: &str, path: Option<&Path>, bundled_dir: &Path) -> ParameterSource {
    let bundled = bundled_dir.join(format!("{name}.cab"));
    match path {
        Some(p) if p.is_file() => ParameterSource::File(p.to_path_buf()),
        Some(p) => {
            tracing::warn!(
                target: "crop_coach::config",
                kind = name,
                path = %p.display(),
                fallback = %bundled.display(),
                "parameter file path is not valid; using bundled default"
            );
            ParameterSource::Bundled(bundled)
        }
        None => ParameterSource::Bundled(bundled),
    }
}

/// Environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub agro: AgroConfig,
    pub costs: CostTable,
    pub discounts: DiscountFactors,
    pub site: SiteConfig,
    pub parameter_paths: ParameterPaths,
    /// Directory holding the bundled `*.cab` files and engine config.
    pub bundled_data_dir: PathBuf,
    /// Engine configuration file name, relative to `bundled_data_dir`.
    pub engine_config: String,
    /// Campaigns per episode.
    pub years_count: u32,
    /// Campaign year used when `sample_year` is off.
    pub year: i32,
    pub sample_year: bool,
    /// Seed for the campaign-year sampler. Wall-clock seeded when unset.
    pub seed: Option<u64>,
    pub output_vars: Vec<String>,
    pub yield_var: String,
    /// Per-activation costs used when building the per-step campaign.
    pub trigger_costs: TriggerCosts,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            agro: AgroConfig::default(),
            costs: CostTable::default(),
            discounts: DiscountFactors::default(),
            site: SiteConfig::default(),
            parameter_paths: ParameterPaths::default(),
            bundled_data_dir: PathBuf::from("default_data"),
            engine_config: DEFAULT_ENGINE_CONFIG.to_string(),
            years_count: 2,
            year: 2019,
            sample_year: true,
            seed: None,
            output_vars: DEFAULT_OUTPUT_VARS.iter().map(|v| v.to_string()).collect(),
            yield_var: DEFAULT_YIELD_VAR.to_string(),
            trigger_costs: TriggerCosts::zero(),
        }
    }
}

impl EnvConfig {
    /// Config with year sampling off and a fixed seed (for deterministic tests).
    pub fn deterministic(year: i32) -> Self {
        Self {
            year,
            sample_year: false,
            seed: Some(0),
            ..Self::default()
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: EnvConfig =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse { source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides.
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Apply research overrides from environment variables.
    ///
    /// Supported:
    ///   - CROP_COACH_YEAR          (i32)
    ///   - CROP_COACH_YEARS_COUNT   (u32, > 0)
    ///   - CROP_COACH_SAMPLE_YEAR   (bool)
    ///   - CROP_COACH_SEED          (u64)
    ///
    /// Any variable that fails to parse is ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_override::<i32>("CROP_COACH_YEAR") {
            self.year = v;
        }
        if let Some(v) = env_override::<u32>("CROP_COACH_YEARS_COUNT") {
            if v > 0 {
                self.years_count = v;
            } else {
                tracing::warn!(
                    target: "crop_coach::config",
                    var = "CROP_COACH_YEARS_COUNT",
                    default = self.years_count,
                    "years count must be positive; keeping default"
                );
            }
        }
        if let Some(v) = env_override::<bool>("CROP_COACH_SAMPLE_YEAR") {
            self.sample_year = v;
        }
        if let Some(v) = env_override::<u64>("CROP_COACH_SEED") {
            self.seed = Some(v);
        }
    }

    /// Check the invariants the episode controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years_count == 0 {
            return Err(validation("years_count", "must be at least 1"));
        }
        if self.output_vars.iter().all(|v| v == DAY_VAR) {
            return Err(validation("output_vars", "no tracked output variables"));
        }
        if !self.output_vars.iter().any(|v| v == &self.yield_var) {
            return Err(validation(
                "yield_var",
                &format!("'{}' is not a tracked output variable", self.yield_var),
            ));
        }

        for year in self.campaign_years() {
            self.agro.validate_calendar(year)?;
        }
        Ok(())
    }

    /// Every year a step may build a campaign for: the configured year, plus
    /// the sampler's candidates when year sampling is on.
    pub fn campaign_years(&self) -> Vec<i32> {
        let mut years = vec![self.year];
        if self.sample_year {
            years.extend(candidate_years(chrono::Local::now().year()));
            years.sort_unstable();
            years.dedup();
        }
        years
    }

    /// Tracked variables that make up the observation vector (`day` excluded).
    pub fn observation_vars(&self) -> impl Iterator<Item = &str> {
        self.output_vars
            .iter()
            .map(String::as_str)
            .filter(|v| *v != DAY_VAR)
    }

    pub fn engine_config_path(&self) -> PathBuf {
        self.bundled_data_dir.join(&self.engine_config)
    }
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_override<T>(var: &str) -> Option<T>
where
    T: std::str::FromStr + std::fmt::Display,
{
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => {
            tracing::info!(target: "crop_coach::config", var, value = %v, "override applied");
            Some(v)
        }
        Err(_) => {
            tracing::warn!(
                target: "crop_coach::config",
                var,
                raw = %raw,
                "could not parse override; ignoring"
            );
            None
        }
    }
}
