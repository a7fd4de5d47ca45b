// tests/codec_properties.rs
//
// Property tests for the action codec, the schedule synthesizer and the
// reward function.

use chrono::NaiveDate;
use proptest::prelude::*;

use crop_coach::agro::{synthesize, ApplicationAmounts, InterventionKind};
use crop_coach::config::{CostTable, DiscountFactors};
use crop_coach::rl::action_encoding::{
    denormalize_frequency, denormalize_irrigation, denormalize_nutrient, normalize_frequency,
    normalize_irrigation, normalize_nutrient, PhysicalQuantities,
};
use crop_coach::rl::calculate_reward;

fn kind() -> impl Strategy<Value = InterventionKind> {
    prop_oneof![
        Just(InterventionKind::Irrigate),
        Just(InterventionKind::Fertilize)
    ]
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
}

proptest! {
    #[test]
    fn amounts_round_trip(x in -1.0_f64..=1.0) {
        prop_assert!((normalize_irrigation(denormalize_irrigation(x)) - x).abs() < 1e-12);
        prop_assert!((normalize_nutrient(denormalize_nutrient(x)) - x).abs() < 1e-12);
    }

    #[test]
    fn frequency_stays_in_horizon_and_never_overshoots(x in -1.0_f64..=1.0, h in 1_i64..400) {
        let period = denormalize_frequency(x, h);
        prop_assert!((0..=h).contains(&period));
        prop_assert_eq!(period, denormalize_frequency(x, h));
        // Truncation only ever rounds down.
        prop_assert!(normalize_frequency(period, h) <= x + 1e-12);
    }

    #[test]
    fn decode_is_deterministic(
        action in proptest::array::uniform6(-1.0_f64..=1.0),
        h in 1_i64..400,
    ) {
        let a = PhysicalQuantities::decode(&action, h);
        let b = PhysicalQuantities::decode(&action, h);
        prop_assert_eq!(a, b);
        prop_assert!(a.irrigation_volume >= 0.0 && a.irrigation_volume <= 20.0);
        prop_assert!(a.n_mass >= 0.0 && a.k_mass <= 200.0);
    }

    #[test]
    fn disabled_interventions_are_absent(
        kind in kind(),
        periodicity in -50_i64..=0,
        horizon in 0_i64..400,
        cost in 0.0_f64..100.0,
    ) {
        let s = synthesize(kind, periodicity, start(), horizon, cost, &ApplicationAmounts::default(), 1);
        prop_assert!(s.table.is_none());
        prop_assert_eq!(s.total_cost, 0.0);
    }

    #[test]
    fn event_count_and_cost_law(
        kind in kind(),
        p in 1_i64..60,
        h in 0_i64..400,
        c in 0.0_f64..50.0,
    ) {
        let s = synthesize(kind, p, start(), h, c, &ApplicationAmounts::default(), 5676);
        let expected = (h / p + 1) as usize;
        let table = s.table.expect("offset 0 always triggers");
        prop_assert_eq!(table.len(), expected);
        prop_assert!((s.total_cost - c * expected as f64).abs() < 1e-6);
        prop_assert!(table.dates().all(|d| (d - start()).num_days() % p == 0));
        prop_assert!(table.dates().all(|d| (d - start()).num_days() <= h));
    }

    #[test]
    fn reward_is_linear_in_yield(y in 0.0_f64..10_000.0, dy in 0.0_f64..1_000.0) {
        let amounts = ApplicationAmounts { irrigation: 5.0, n: 20.0, p: 0.0, k: 10.0 };
        let costs = CostTable::default();
        let discounts = DiscountFactors::default();
        let r0 = calculate_reward(y, &amounts, &costs, &discounts);
        let r1 = calculate_reward(y + dy, &amounts, &costs, &discounts);
        prop_assert!((r1 - r0 - dy * costs.selling).abs() < 1e-6);
    }
}
