// crop_coach_env/src/lib.rs
//
// Python bindings for the crop_coach RL environment.
//
// Provides a Gym-style API for training RL agents:
// - Env: reset() and step(action) over a Python-supplied crop simulator
// - calculate_reward / expand_campaign: the pure building blocks
//
// The simulator is any callable `simulator(campaign_yaml, context) -> trace`
// where `context` is a dict of parameter paths, site coordinates and the
// engine config, and `trace` is a list of daily-record dicts (or the same
// list as a JSON string). Exceptions raised by the callable reach the caller
// unchanged.

use std::collections::HashMap;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyString};

use crop_coach::agro::{expand_campaign as rust_expand_campaign, ApplicationAmounts};
use crop_coach::config::{CostTable, DiscountFactors, EnvConfig};
use crop_coach::rl::{
    action_from_slice, calculate_reward as rust_calculate_reward, CropEnv, ACTION_DIM,
    ACTION_VERSION, OBS_VERSION,
};
use crop_coach::{
    CampaignDescriptor, CropSimulator, DailyRecord, EnvError, SimulationContext, SimulationError,
};

/// Crop simulator backed by a Python callable.
struct PySimulator {
    callable: Py<PyAny>,
    /// Exception raised by the last call, re-raised as-is by `Env.step`.
    pending: Option<PyErr>,
}

impl PySimulator {
    fn call(
        &self,
        py: Python<'_>,
        campaign: &CampaignDescriptor,
        context: &SimulationContext,
    ) -> PyResult<Vec<DailyRecord>> {
        let yaml = campaign
            .to_yaml_string()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let ctx = context_to_dict(py, context)?;
        let result = self.callable.bind(py).call1((yaml, ctx))?;

        let json: String = if result.is_instance_of::<PyString>() {
            result.extract()?
        } else {
            // Dates and other non-JSON values are stringified.
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("default", py.import_bound("builtins")?.getattr("str")?)?;
            py.import_bound("json")?
                .call_method("dumps", (result,), Some(&kwargs))?
                .extract()?
        };

        serde_json::from_str(&json)
            .map_err(|e| PyValueError::new_err(format!("invalid simulator trace: {e}")))
    }
}

impl CropSimulator for PySimulator {
    fn simulate(
        &mut self,
        campaign: &CampaignDescriptor,
        context: &SimulationContext,
    ) -> Result<Vec<DailyRecord>, SimulationError> {
        let outcome = Python::with_gil(|py| self.call(py, campaign, context));
        outcome.map_err(|err| {
            let message = err.to_string();
            self.pending = Some(err);
            SimulationError::Engine(message)
        })
    }
}

fn context_to_dict<'py>(
    py: Python<'py>,
    context: &SimulationContext,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    let params = &context.parameters;
    dict.set_item("soil", params.soil.path().display().to_string())?;
    dict.set_item("site", params.site.path().display().to_string())?;
    dict.set_item("crop", params.crop.path().display().to_string())?;
    dict.set_item("latitude", context.site.latitude)?;
    dict.set_item("longitude", context.site.longitude)?;
    dict.set_item("engine_config", context.engine_config.display().to_string())?;
    Ok(dict)
}

fn load_config(config_yaml: Option<&str>) -> PyResult<EnvConfig> {
    match config_yaml {
        Some(yaml) => EnvConfig::from_yaml_str(yaml).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(EnvConfig::from_env_or_default()),
    }
}

/// Deserialize a partial table (e.g. `{"N": 10.0}`) over its defaults.
fn table_from_map<T: serde::de::DeserializeOwned + Default>(
    map: Option<HashMap<String, f64>>,
) -> PyResult<T> {
    match map {
        None => Ok(T::default()),
        Some(map) => serde_json::to_value(map)
            .and_then(serde_json::from_value)
            .map_err(|e| PyValueError::new_err(e.to_string())),
    }
}

/// Gym-style environment wrapper.
///
/// Provides the standard RL interface:
/// - reset(seed) -> observation
/// - step(action) -> (observation, reward, done, info)
#[pyclass]
pub struct Env {
    inner: CropEnv<PySimulator>,
}

impl Env {
    fn map_env_error(&mut self, err: EnvError) -> PyErr {
        match err {
            EnvError::Simulation(SimulationError::Engine(message)) => self
                .inner
                .simulator_mut()
                .pending
                .take()
                .unwrap_or_else(|| PyRuntimeError::new_err(message)),
            EnvError::Simulation(other) => PyRuntimeError::new_err(other.to_string()),
            EnvError::EpisodeFinished => PyRuntimeError::new_err(err.to_string()),
            EnvError::Campaign(_) | EnvError::Config(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

#[pymethods]
impl Env {
    /// Create a new environment.
    ///
    /// Args:
    ///     simulator: callable(campaign_yaml, context) -> daily trace
    ///     config_yaml: YAML environment config (default: built-in defaults + env overrides)
    ///     seed: Year sampler seed (default: config seed, else wall clock)
    #[new]
    #[pyo3(signature = (simulator, config_yaml=None, seed=None))]
    fn new(simulator: Py<PyAny>, config_yaml: Option<&str>, seed: Option<u64>) -> PyResult<Self> {
        let mut config = load_config(config_yaml)?;
        if seed.is_some() {
            config.seed = seed;
        }
        let simulator = PySimulator {
            callable: simulator,
            pending: None,
        };
        let inner = CropEnv::new(config, simulator).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Reset the environment.
    ///
    /// Args:
    ///     seed: Optional seed to reseed the year sampler
    ///
    /// Returns:
    ///     observation: all-zero list of floats
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) -> Vec<f64> {
        if let Some(seed) = seed {
            self.inner.reseed(seed);
        }
        self.inner.reset()
    }

    /// Simulate one season.
    ///
    /// Args:
    ///     action: six floats in [-1, 1]
    ///
    /// Returns:
    ///     Tuple of (observation, reward, done, info)
    fn step(
        &mut self,
        py: Python<'_>,
        action: Vec<f64>,
    ) -> PyResult<(Vec<f64>, f64, bool, Py<PyDict>)> {
        let action = action_from_slice(&action).ok_or_else(|| {
            PyValueError::new_err(format!(
                "action must have {ACTION_DIM} components, got {}",
                action.len()
            ))
        })?;
        let result = match self.inner.step(&action) {
            Ok(result) => result,
            Err(err) => return Err(self.map_env_error(err)),
        };
        let info = PyDict::new_bound(py);
        Ok((result.observation, result.reward, result.done, info.into()))
    }

    #[getter]
    fn remaining_years(&self) -> u32 {
        self.inner.remaining_years()
    }

    #[getter]
    fn campaign_year(&self) -> i32 {
        self.inner.campaign_year()
    }

    #[getter]
    fn observation_width(&self) -> usize {
        self.inner.observation_width()
    }

    /// Observation bounds as (low, high); high is +inf.
    #[getter]
    fn observation_bounds(&self) -> (f64, f64) {
        let spec = self.inner.observation_spec();
        (spec.low, spec.high)
    }

    #[getter]
    fn action_dim(&self) -> usize {
        self.inner.action_dim()
    }

    #[getter]
    fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    #[getter]
    fn last_reward(&self) -> f64 {
        self.inner.last_reward()
    }

    /// Tracked output variables, in observation order.
    #[getter]
    fn observation_vars(&self) -> Vec<String> {
        self.inner
            .config()
            .observation_vars()
            .map(str::to_string)
            .collect()
    }

    /// Agromanagement YAML of the last stepped campaign.
    fn last_campaign(&self) -> PyResult<Option<String>> {
        self.inner
            .last_campaign()
            .map(|c| c.to_yaml_string())
            .transpose()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn render(&self) {
        self.inner.render();
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

/// Economic reward for one campaign.
///
/// `costs` and `discounts` are partial dicts keyed by Irrigation/N/P/K
/// (and Selling for costs); missing keys keep their defaults.
#[pyfunction]
#[pyo3(signature = (yield_, irrigation, n, p, k, costs=None, discounts=None))]
fn calculate_reward(
    yield_: f64,
    irrigation: f64,
    n: f64,
    p: f64,
    k: f64,
    costs: Option<HashMap<String, f64>>,
    discounts: Option<HashMap<String, f64>>,
) -> PyResult<f64> {
    let costs: CostTable = table_from_map(costs)?;
    let discounts: DiscountFactors = table_from_map(discounts)?;
    let amounts = ApplicationAmounts { irrigation, n, p, k };
    Ok(rust_calculate_reward(yield_, &amounts, &costs, &discounts))
}

/// Campaigns over the cartesian product of periodicities, row-major.
///
/// Returns:
///     Tuple of (list of campaign YAML documents, list of trigger costs)
#[pyfunction]
#[pyo3(signature = (
    irrigation_periods,
    fertilization_periods,
    year,
    irrigation=0.0,
    n=0.0,
    p=0.0,
    k=0.0,
    config_yaml=None
))]
#[allow(clippy::too_many_arguments)]
fn expand_campaign(
    irrigation_periods: Vec<i64>,
    fertilization_periods: Vec<i64>,
    year: i32,
    irrigation: f64,
    n: f64,
    p: f64,
    k: f64,
    config_yaml: Option<&str>,
) -> PyResult<(Vec<String>, Vec<f64>)> {
    let config = load_config(config_yaml)?;
    let amounts = ApplicationAmounts { irrigation, n, p, k };
    let grid = rust_expand_campaign(
        &config.agro,
        &irrigation_periods,
        &fertilization_periods,
        &amounts,
        year,
        Some(&config.trigger_costs),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let docs = grid
        .campaigns
        .iter()
        .map(CampaignDescriptor::to_yaml_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok((docs, grid.costs))
}

#[pyfunction]
fn obs_version() -> u32 {
    OBS_VERSION
}

#[pyfunction]
fn action_version() -> u32 {
    ACTION_VERSION
}

/// Python module definition.
#[pymodule]
fn crop_coach_env(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Env>()?;
    m.add_function(wrap_pyfunction!(calculate_reward, m)?)?;
    m.add_function(wrap_pyfunction!(expand_campaign, m)?)?;
    m.add_function(wrap_pyfunction!(obs_version, m)?)?;
    m.add_function(wrap_pyfunction!(action_version, m)?)?;
    Ok(())
}
