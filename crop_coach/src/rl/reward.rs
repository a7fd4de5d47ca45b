// src/rl/reward.rs
//
// Economic reward: value of the harvested yield minus the discounted cost
// of the applied inputs.
//
//   r = yield * selling_price
//       - Σ_a discount_a * amount_a * unit_cost_a,   a ∈ {Irrigation, N, P, K}
//
// No clamping: the reward is negative whenever inputs cost more than the
// yield is worth.

use serde::{Deserialize, Serialize};

use crate::agro::ApplicationAmounts;
use crate::config::{CostTable, DiscountFactors};

/// Per-term breakdown of a reward, for logging and reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    /// yield * selling price.
    pub revenue: f64,
    pub irrigation_cost: f64,
    pub n_cost: f64,
    pub p_cost: f64,
    pub k_cost: f64,
}

impl RewardComponents {
    pub fn compute(
        yield_: f64,
        amounts: &ApplicationAmounts,
        costs: &CostTable,
        discounts: &DiscountFactors,
    ) -> Self {
        Self {
            revenue: yield_ * costs.selling,
            irrigation_cost: discounts.irrigation * amounts.irrigation * costs.irrigation,
            n_cost: discounts.n * amounts.n * costs.n,
            p_cost: discounts.p * amounts.p * costs.p,
            k_cost: discounts.k * amounts.k * costs.k,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.irrigation_cost + self.n_cost + self.p_cost + self.k_cost
    }

    pub fn reward(&self) -> f64 {
        self.revenue - self.total_cost()
    }
}

/// Scalar reward for one campaign.
pub fn calculate_reward(
    yield_: f64,
    amounts: &ApplicationAmounts,
    costs: &CostTable,
    discounts: &DiscountFactors,
) -> f64 {
    RewardComponents::compute(yield_, amounts, costs, discounts).reward()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_reward() {
        let amounts = ApplicationAmounts {
            irrigation: 10.0,
            n: 50.0,
            p: 0.0,
            k: 0.0,
        };
        let reward = calculate_reward(
            1000.0,
            &amounts,
            &CostTable::default(),
            &DiscountFactors::default(),
        );
        // 1000 * 2.5 - (10 * 150 + 50 * 8) = 600
        assert!((reward - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_reward_can_go_negative() {
        let amounts = ApplicationAmounts {
            irrigation: 20.0,
            n: 200.0,
            p: 200.0,
            k: 200.0,
        };
        let reward = calculate_reward(
            0.0,
            &amounts,
            &CostTable::default(),
            &DiscountFactors::default(),
        );
        assert!((reward + (3000.0 + 1600.0 + 1700.0 + 1400.0)).abs() < 1e-9);
    }

    #[test]
    fn test_discounts_scale_each_term() {
        let amounts = ApplicationAmounts {
            irrigation: 1.0,
            n: 1.0,
            p: 1.0,
            k: 1.0,
        };
        let discounts = DiscountFactors {
            irrigation: 0.0,
            n: 2.0,
            p: 0.5,
            k: 1.0,
        };
        let c = RewardComponents::compute(100.0, &amounts, &CostTable::default(), &discounts);
        assert_eq!(c.revenue, 250.0);
        assert_eq!(c.irrigation_cost, 0.0);
        assert_eq!(c.n_cost, 16.0);
        assert_eq!(c.p_cost, 4.25);
        assert_eq!(c.k_cost, 7.0);
        assert!((c.reward() - (250.0 - 27.25)).abs() < 1e-12);
    }

    #[test]
    fn test_reward_is_deterministic() {
        let amounts = ApplicationAmounts {
            irrigation: 3.3,
            n: 12.5,
            p: 7.1,
            k: 0.4,
        };
        let a = calculate_reward(4321.0, &amounts, &CostTable::default(), &DiscountFactors::default());
        let b = calculate_reward(4321.0, &amounts, &CostTable::default(), &DiscountFactors::default());
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
