//! Connector sequencing: targets, axis order and withdrawal before travel.

use oduqc_common::motion::types::AxisLabel::{R, X, Y, Z};
use oduqc_common::motion::types::{AxisLabel, FixtureType};
use oduqc_motion::{MotionError, SequenceOutcome};

use super::common::{Bench, bench_config};

#[test]
fn reset_home_zeroes_every_axis() {
    let bench = Bench::production();
    for label in AxisLabel::ALL {
        assert_eq!(bench.position(label), 0.0, "{label}");
    }
    assert!(bench.all_home());
    assert!(!bench.coordinator.is_plugged_in());
    assert_eq!(
        bench.coordinator.report_position().to_string(),
        "Connector head at (0.00, 0.00, 0.00, 0.00)"
    );
}

#[test]
fn odd_fixture_connector_one_from_fresh_reset() {
    let mut bench = Bench::production();
    assert_eq!(bench.coordinator.fixture_type(), FixtureType::Odd);

    let outcome = bench.coordinator.move_to_position(1).unwrap();
    assert_eq!(outcome, SequenceOutcome::Completed);
    assert_eq!(bench.position(Y), 46.0);
    assert_eq!(bench.position(X), 450.0);
    assert_eq!(bench.position(R), 581.0);
    assert_eq!(bench.position(Z), 469.0);
    assert_eq!(bench.sim.motion_order(), vec![Y, X, R, Z]);
    assert!(!bench.all_home());
}

#[test]
fn flip_positions_move_vertical_before_rotation() {
    for (raw, index) in [(1, 17), (2, 18)] {
        let mut bench = Bench::production();
        bench.coordinator.set_fixture_type(raw);
        assert!(bench.coordinator.move_to_position(index).unwrap().is_completed());
        assert_eq!(bench.sim.motion_order(), vec![Y, X, Z, R], "type {raw} index {index}");
        assert_eq!(bench.position(Z), 1610.0);
        assert_eq!(bench.position(R), 1107.0);
    }
}

#[test]
fn upper_positions_rotate_before_vertical() {
    for (raw, index) in [(2, 17), (1, 18)] {
        let mut bench = Bench::production();
        bench.coordinator.set_fixture_type(raw);
        assert!(bench.coordinator.move_to_position(index).unwrap().is_completed());
        assert_eq!(bench.sim.motion_order(), vec![Y, X, R, Z], "type {raw} index {index}");
        assert_eq!(bench.position(Z), 679.0);
        assert_eq!(bench.position(R), 63.0);
    }
}

#[test]
fn even_fixture_uses_mirrored_table() {
    let mut bench = Bench::production();
    assert_eq!(bench.coordinator.set_fixture_type(4), FixtureType::Even);
    bench.coordinator.move_to_position(1).unwrap();
    assert_eq!(bench.position(Y), 2370.0);

    assert_eq!(bench.coordinator.set_fixture_type(3), FixtureType::Odd);
    bench.coordinator.move_to_position(2).unwrap();
    assert_eq!(bench.position(Y), 194.0);
}

#[test]
fn travel_between_connectors_withdraws_first() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(3).unwrap();
    assert!(bench.coordinator.engage(false).is_completed());
    assert!(bench.coordinator.is_plugged_in());
    bench.sim.clear_journal();

    assert!(bench.coordinator.move_to_position(5).unwrap().is_completed());
    assert!(!bench.coordinator.is_plugged_in());
    // X withdraws, Y travels; X, R and Z are already on target.
    assert_eq!(bench.sim.motion_order(), vec![X, Y]);
    assert_eq!(bench.position(X), 450.0);
    assert_eq!(bench.position(Y), 720.0);
}

#[test]
fn moves_are_relative_to_tracked_position() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(16).unwrap();
    bench.coordinator.move_to_position(17).unwrap();
    assert_eq!(bench.position(Y), 136.0);
    assert_eq!(bench.position(Z), 1610.0);
    bench.coordinator.move_to_position(2).unwrap();
    assert_eq!(bench.position(Y), 194.0);
    assert_eq!(bench.position(R), 581.0);
    assert_eq!(bench.position(Z), 469.0);
}

#[test]
fn calibration_position() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(19).unwrap();
    assert_eq!(bench.position(Y), 750.0);
    assert_eq!(bench.position(X), 1450.0);
    assert_eq!(bench.position(R), 63.0);
    assert_eq!(bench.position(Z), 469.0);
}

#[test]
fn index_zero_goes_home() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(9).unwrap();
    assert!(bench.coordinator.move_to_position(0).unwrap().is_completed());
    assert!(bench.all_home());
    // Z first, Y last.
    assert_eq!(bench.sim.motion_order().last(), Some(&Y));
    for label in AxisLabel::ALL {
        assert_eq!(bench.position(label), 0.0);
    }
}

#[test]
fn home_single_axis_and_skip_home_axes() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(4).unwrap();
    assert!(bench.coordinator.go_home(Some(R)).is_completed());
    assert!(bench.coordinator.axis(R).unwrap().is_home());
    assert!(!bench.coordinator.axis(Y).unwrap().is_home());

    bench.sim.clear_journal();
    bench.coordinator.go_home(Some(R));
    assert!(bench.sim.motion_order().is_empty());

    bench.coordinator.go_home(None);
    assert!(!bench.sim.motion_order().contains(&R));
    assert!(bench.all_home());
}

#[test]
fn unknown_position_leaves_fixture_untouched() {
    let mut bench = Bench::production();
    let err = bench.coordinator.move_to_position(20).unwrap_err();
    assert!(matches!(err, MotionError::UnknownPosition(20)));
    assert!(bench.sim.journal().is_empty());
}

#[test]
fn overshoot_is_transparent() {
    let mut reached = Vec::new();
    for overshoot in [0.0, 10.0, 40.0] {
        let mut config = bench_config();
        config.motion.overshoot = overshoot;
        let mut bench = Bench::homed(&config);
        bench.coordinator.move_to_position(7).unwrap();
        reached.push(AxisLabel::ALL.map(|l| bench.position(l)));
    }
    assert!(reached.windows(2).all(|w| w[0] == w[1]));
}
