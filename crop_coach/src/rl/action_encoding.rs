// src/rl/action_encoding.rs
//
// Action codec: map the agent's normalized action vector to physical
// intervention quantities and back.
//
// Layout (each component in [-1, 1]):
//   [irrigation amount, N amount, P amount, K amount,
//    irrigation frequency, fertilization frequency]
//
// Amounts are rescaled linearly onto fixed ranges. Frequencies are rescaled
// onto [0, horizon_days] and truncated toward zero, so they only round-trip
// approximately. Inputs outside [-1, 1] are not clamped; emitting in-range
// values is the caller's contract.

use serde::{Deserialize, Serialize};

use crate::agro::ApplicationAmounts;

/// Current action encoding version.
/// Increment when changing the layout or ranges.
pub const ACTION_VERSION: u32 = 1;

/// Length of the action vector.
pub const ACTION_DIM: usize = 6;

pub type ActionVector = [f64; ACTION_DIM];

/// Positions within the action vector.
pub mod index {
    pub const IRRIGATION_AMOUNT: usize = 0;
    pub const N_AMOUNT: usize = 1;
    pub const P_AMOUNT: usize = 2;
    pub const K_AMOUNT: usize = 3;
    pub const IRRIGATION_FREQUENCY: usize = 4;
    pub const FERTILIZATION_FREQUENCY: usize = 5;
}

/// Physical ranges of the amount components.
pub mod bounds {
    /// Irrigation per event (cm).
    pub const IRRIGATION_MIN: f64 = 0.0;
    pub const IRRIGATION_MAX: f64 = 20.0;

    /// N, P or K per event (kg/ha).
    pub const NUTRIENT_MIN: f64 = 0.0;
    pub const NUTRIENT_MAX: f64 = 200.0;

    /// Normalized action bounds.
    pub const ACTION_LOW: f64 = -1.0;
    pub const ACTION_HIGH: f64 = 1.0;
}

/// Action space metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionEncodingSpec {
    pub version: u32,
    pub action_dim: usize,
    pub low: f64,
    pub high: f64,
}

impl Default for ActionEncodingSpec {
    fn default() -> Self {
        Self {
            version: ACTION_VERSION,
            action_dim: ACTION_DIM,
            low: bounds::ACTION_LOW,
            high: bounds::ACTION_HIGH,
        }
    }
}

impl ActionEncodingSpec {
    pub fn validate_dim(&self, vec: &[f64]) -> bool {
        vec.len() == self.action_dim
    }
}

/// Map `value` from [-1, 1] onto [low, high].
#[inline]
pub fn denormalize(value: f64, low: f64, high: f64) -> f64 {
    low + 0.5 * (value + 1.0) * (high - low)
}

/// Map `value` from [low, high] onto [-1, 1]. Exact inverse of [`denormalize`].
#[inline]
pub fn normalize(value: f64, low: f64, high: f64) -> f64 {
    2.0 * ((value - low) / (high - low)) - 1.0
}

pub fn denormalize_irrigation(value: f64) -> f64 {
    denormalize(value, bounds::IRRIGATION_MIN, bounds::IRRIGATION_MAX)
}

pub fn normalize_irrigation(amount: f64) -> f64 {
    normalize(amount, bounds::IRRIGATION_MIN, bounds::IRRIGATION_MAX)
}

pub fn denormalize_nutrient(value: f64) -> f64 {
    denormalize(value, bounds::NUTRIENT_MIN, bounds::NUTRIENT_MAX)
}

pub fn normalize_nutrient(mass: f64) -> f64 {
    normalize(mass, bounds::NUTRIENT_MIN, bounds::NUTRIENT_MAX)
}

/// Map `value` onto a period in days within [0, horizon_days], truncated
/// toward zero.
pub fn denormalize_frequency(value: f64, horizon_days: i64) -> i64 {
    denormalize(value, 0.0, horizon_days as f64) as i64
}

/// Map a period in days back onto [-1, 1].
///
/// Lossy against [`denormalize_frequency`]: the truncation there is not
/// undone here.
pub fn normalize_frequency(period_days: i64, horizon_days: i64) -> f64 {
    normalize(period_days as f64, 0.0, horizon_days as f64)
}

/// Decoded action in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalQuantities {
    /// Irrigation per event (cm).
    pub irrigation_volume: f64,
    /// N per event (kg/ha).
    pub n_mass: f64,
    /// P per event (kg/ha).
    pub p_mass: f64,
    /// K per event (kg/ha).
    pub k_mass: f64,
    /// Days between irrigations; 0 disables irrigation.
    pub irrigation_period: i64,
    /// Days between fertilizations; 0 disables fertilization.
    pub fertilization_period: i64,
}

impl PhysicalQuantities {
    /// Decode an action vector, rescaling the frequencies against `horizon_days`.
    pub fn decode(action: &ActionVector, horizon_days: i64) -> Self {
        Self {
            irrigation_volume: denormalize_irrigation(action[index::IRRIGATION_AMOUNT]),
            n_mass: denormalize_nutrient(action[index::N_AMOUNT]),
            p_mass: denormalize_nutrient(action[index::P_AMOUNT]),
            k_mass: denormalize_nutrient(action[index::K_AMOUNT]),
            irrigation_period: denormalize_frequency(
                action[index::IRRIGATION_FREQUENCY],
                horizon_days,
            ),
            fertilization_period: denormalize_frequency(
                action[index::FERTILIZATION_FREQUENCY],
                horizon_days,
            ),
        }
    }

    /// Encode back into a normalized action vector.
    pub fn encode(&self, horizon_days: i64) -> ActionVector {
        let mut action = [0.0; ACTION_DIM];
        action[index::IRRIGATION_AMOUNT] = normalize_irrigation(self.irrigation_volume);
        action[index::N_AMOUNT] = normalize_nutrient(self.n_mass);
        action[index::P_AMOUNT] = normalize_nutrient(self.p_mass);
        action[index::K_AMOUNT] = normalize_nutrient(self.k_mass);
        action[index::IRRIGATION_FREQUENCY] =
            normalize_frequency(self.irrigation_period, horizon_days);
        action[index::FERTILIZATION_FREQUENCY] =
            normalize_frequency(self.fertilization_period, horizon_days);
        action
    }

    /// Amounts applied on every triggered day.
    pub fn amounts(&self) -> ApplicationAmounts {
        ApplicationAmounts {
            irrigation: self.irrigation_volume,
            n: self.n_mass,
            p: self.p_mass,
            k: self.k_mass,
        }
    }
}

/// Copy a slice into an action vector; `None` on a length mismatch.
pub fn action_from_slice(values: &[f64]) -> Option<ActionVector> {
    values.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_spec() {
        let spec = ActionEncodingSpec::default();
        assert_eq!(spec.version, ACTION_VERSION);
        assert_eq!(spec.action_dim, 6);
        assert!(spec.validate_dim(&[0.0; 6]));
        assert!(!spec.validate_dim(&[0.0; 5]));
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        assert_eq!(denormalize_irrigation(-1.0), 0.0);
        assert_eq!(denormalize_irrigation(1.0), 20.0);
        assert_eq!(denormalize_irrigation(0.0), 10.0);
        assert_eq!(denormalize_nutrient(-1.0), 0.0);
        assert_eq!(denormalize_nutrient(1.0), 200.0);
        assert_eq!(denormalize_nutrient(-0.5), 50.0);
    }

    #[test]
    fn test_amount_round_trip() {
        for i in 0..=40 {
            let x = -1.0 + i as f64 * 0.05;
            let irr = normalize_irrigation(denormalize_irrigation(x));
            let nut = normalize_nutrient(denormalize_nutrient(x));
            assert!((irr - x).abs() < 1e-12, "irrigation round-trip at {x}: {irr}");
            assert!((nut - x).abs() < 1e-12, "nutrient round-trip at {x}: {nut}");
        }
    }

    #[test]
    fn test_frequency_truncates_toward_zero() {
        // 0.5 * (0.1 + 1) * 222 = 122.1
        assert_eq!(denormalize_frequency(0.1, 222), 122);
        assert_eq!(denormalize_frequency(-1.0, 222), 0);
        assert_eq!(denormalize_frequency(1.0, 222), 222);
    }

    #[test]
    fn test_frequency_round_trip_is_lossy_but_bounded() {
        let h = 222;
        let x = 0.1;
        let period = denormalize_frequency(x, h);
        let back = normalize_frequency(period, h);
        assert!(back <= x);
        assert!(x - back < 2.0 / h as f64);
        assert_ne!(back, x);
        assert_eq!(denormalize_frequency(x, h), period);
    }

    #[test]
    fn test_decode_layout() {
        let action = [0.0, -1.0, 0.0, 1.0, -1.0, 1.0];
        let q = PhysicalQuantities::decode(&action, 100);
        assert_eq!(q.irrigation_volume, 10.0);
        assert_eq!(q.n_mass, 0.0);
        assert_eq!(q.p_mass, 100.0);
        assert_eq!(q.k_mass, 200.0);
        assert_eq!(q.irrigation_period, 0);
        assert_eq!(q.fertilization_period, 100);

        let amounts = q.amounts();
        assert_eq!(amounts.irrigation, 10.0);
        assert_eq!(amounts.k, 200.0);
    }

    #[test]
    fn test_encode_decode_exact_on_integer_periods() {
        let q = PhysicalQuantities {
            irrigation_volume: 4.0,
            n_mass: 60.0,
            p_mass: 20.0,
            k_mass: 0.0,
            irrigation_period: 50,
            fertilization_period: 0,
        };
        let decoded = PhysicalQuantities::decode(&q.encode(200), 200);
        assert!((decoded.irrigation_volume - 4.0).abs() < 1e-9);
        assert!((decoded.n_mass - 60.0).abs() < 1e-9);
        assert_eq!(decoded.irrigation_period, 50);
        assert_eq!(decoded.fertilization_period, 0);
    }

    #[test]
    fn test_action_from_slice() {
        assert!(action_from_slice(&[0.0; 6]).is_some());
        assert!(action_from_slice(&[0.0; 7]).is_none());
    }
}
