//! Plugging in, withdrawing, rotation, single-axis steps and the placement check.

use oduqc_common::motion::types::AxisLabel::{R, X, Y, Z};
use oduqc_common::motion::types::{Direction, StepStyle};
use oduqc_hal::drivers::simulation::JournalEvent;
use std::time::Duration;

use super::common::Bench;

/// Full steps X was driven forward in DOUBLE style.
fn x_forward_steps(bench: &Bench) -> u32 {
    bench
        .sim
        .journal()
        .iter()
        .filter(|e| e.axis == Some(X))
        .filter_map(|e| match e.event {
            JournalEvent::Step {
                count,
                direction: Direction::Forward,
                style: StepStyle::Double,
            } => Some(count),
            _ => None,
        })
        .sum()
}

#[test]
fn engage_and_disengage() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(8).unwrap();

    assert!(bench.coordinator.engage(false).is_completed());
    assert!(bench.coordinator.is_plugged_in());
    assert_eq!(bench.position(X), 950.0);
    assert!(bench.coordinator.report_position().plugged_in);

    bench.sim.clear_journal();
    bench.coordinator.engage(false);
    assert!(bench.sim.journal().is_empty(), "engaging twice is a no-op");

    assert!(bench.coordinator.disengage().is_completed());
    assert!(!bench.coordinator.is_plugged_in());
    assert_eq!(bench.position(X), 450.0);

    bench.sim.clear_journal();
    bench.coordinator.disengage();
    assert!(bench.sim.journal().is_empty(), "withdrawing twice is a no-op");
}

#[test]
fn calibration_engagement_depth() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(19).unwrap();
    bench.coordinator.engage(true);
    assert_eq!(bench.position(X), 1950.0);
    assert!(bench.coordinator.is_plugged_in());

    bench.coordinator.disengage();
    assert_eq!(bench.position(X), 450.0);
}

#[test]
fn engagement_never_overshoots() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(1).unwrap();
    bench.sim.clear_journal();
    bench.coordinator.engage(false);
    assert_eq!(x_forward_steps(&bench), 500);
    assert!(
        bench
            .sim
            .journal()
            .iter()
            .filter(|e| e.axis == Some(X))
            .all(|e| !matches!(e.event, JournalEvent::Step { direction: Direction::Backward, .. }))
    );
}

#[test]
fn placement_check_returns_home() {
    let mut bench = Bench::production();
    let outcome = bench
        .coordinator
        .check_placement(19, Duration::ZERO)
        .unwrap();
    assert!(outcome.is_completed());
    assert!(bench.all_home());
    assert!(!bench.coordinator.is_plugged_in());
    // 1450 to the calibration withdrawal depth, 500 more to plug in
    assert_eq!(x_forward_steps(&bench), 1950);
}

#[test]
fn rotate_by_degrees() {
    let mut bench = Bench::production();
    assert!(bench.coordinator.rotate_by(90.0).is_completed());
    assert_eq!(bench.position(R), 512.0);
    bench.coordinator.rotate_by(-45.0);
    assert_eq!(bench.position(R), 256.0);

    bench.sim.clear_journal();
    bench.coordinator.rotate_by(0.0);
    assert!(bench.sim.journal().is_empty());
}

#[test]
fn single_axis_step_with_fraction() {
    let mut bench = Bench::production();
    bench.coordinator.step_axis(Y, 10.5);
    assert_eq!(bench.position(Y), 10.5);
    bench.coordinator.step_axis(Y, -0.25);
    assert_eq!(bench.position(Y), 10.25);
    assert_eq!(bench.sim.motion_order(), vec![Y]);
}

#[test]
fn step_past_travel_limit_is_truncated() {
    let mut bench = Bench::production();
    let limit = f64::from(bench.coordinator.axis(Z).unwrap().limit());
    bench.coordinator.step_axis(Z, limit - 3.0);
    assert!(bench.coordinator.step_axis(Z, 10.0).is_completed());
    assert_eq!(bench.position(Z), limit);
}

#[test]
fn backing_into_the_switch_rezeroes() {
    let mut bench = Bench::production();
    // The limit switch is not a sequence abort.
    assert!(bench.coordinator.step_axis(Y, -50.0).is_completed());
    assert_eq!(bench.position(Y), 0.0);
    assert!(!bench.sim.limit_active(Y));
    assert!(!bench.coordinator.axis(Y).unwrap().is_home());
}

#[test]
fn release_drops_holding_torque() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(2).unwrap();
    assert!(bench.sim.is_energised(Z));
    bench.coordinator.release(Z);
    assert!(!bench.sim.is_energised(Z));
    assert!(bench.sim.is_energised(Y));
    bench.coordinator.release_all();
    assert!([X, Y, Z, R].iter().all(|l| !bench.sim.is_energised(*l)));
}
