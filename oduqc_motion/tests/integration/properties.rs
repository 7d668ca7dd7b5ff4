//! Position tracking properties over random move sequences.

use oduqc_common::motion::types::AxisLabel::{Y, Z};
use proptest::prelude::*;

use super::common::Bench;

/// A signed distance with a whole number of sixteenths.
fn distance(max: i32) -> impl Strategy<Value = f64> {
    (-max..max, 0u32..16).prop_map(|(whole, sixteenths)| f64::from(whole) + f64::from(sixteenths) / 16.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn position_is_the_clamped_running_sum(moves in prop::collection::vec(distance(400), 1..10)) {
        let mut bench = Bench::production();
        let limit = f64::from(bench.coordinator.axis(Y).unwrap().limit());
        let mut expected = 0.0_f64;
        for delta in moves {
            prop_assert!(bench.coordinator.step_axis(Y, delta).is_completed());
            expected = if delta > 0.0 {
                (expected + delta).min(limit)
            } else {
                // backward travel ends on the limit switch
                (expected + delta).max(0.0)
            };
            prop_assert_eq!(bench.position(Y), expected);
            prop_assert_eq!(bench.sim.physical_position(Y), Some(expected + 1.0 / 16.0));
        }
    }

    #[test]
    fn forward_requests_past_the_limit_land_on_it(
        short in 0u32..40,
        excess in distance(60).prop_map(|d| d.abs() + 1.0 / 16.0),
    ) {
        let mut bench = Bench::production();
        let limit = f64::from(bench.coordinator.axis(Z).unwrap().limit());
        let start = limit - f64::from(short);
        bench.coordinator.step_axis(Z, start);
        prop_assert_eq!(bench.position(Z), start);

        prop_assert!(bench.coordinator.step_axis(Z, f64::from(short) + excess).is_completed());
        prop_assert_eq!(bench.position(Z), limit);
    }
}
