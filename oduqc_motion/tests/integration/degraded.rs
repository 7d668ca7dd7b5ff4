//! Partially populated fixtures.

use oduqc_common::motion::config::SECONDARY_BOARD;
use oduqc_common::motion::types::AxisLabel;
use oduqc_common::motion::types::AxisLabel::{R, X, Y, Z};
use oduqc_motion::AxisSlot;

use super::common::{Bench, bench_config};

#[test]
fn long_travel_and_engagement_only() {
    let mut config = bench_config();
    config.axes.retain(|a| matches!(a.label, X | Y));
    let mut bench = Bench::homed(&config);
    assert_eq!(bench.report.present, vec![X, Y]);

    assert!(bench.coordinator.move_to_position(17).unwrap().is_completed());
    assert_eq!(bench.position(Y), 136.0);
    assert_eq!(bench.position(X), 450.0);
    assert_eq!(bench.sim.motion_order(), vec![Y, X]);
    assert_eq!(
        bench.coordinator.report_position().to_string(),
        "Connector head at (450.00, 136.00, -, -)"
    );

    bench.sim.clear_journal();
    assert!(bench.coordinator.rotate_by(45.0).is_completed());
    assert!(bench.coordinator.step_axis(Z, 10.0).is_completed());
    assert!(bench.sim.journal().is_empty());
}

#[test]
fn missing_rotation_motor() {
    let config = bench_config();
    let mut bench = Bench::build(&config, |sim| sim.detach_motor(SECONDARY_BOARD, 2));
    assert!(!bench.report.is_complete());
    assert_eq!(bench.report.absent[0].label, R);
    match bench.coordinator.slot(R) {
        AxisSlot::Absent { reason, .. } => assert!(reason.contains("port 2"), "{reason}"),
        AxisSlot::Present(_) => panic!("R must be absent"),
    }

    assert!(bench.coordinator.reset_home().is_completed());
    bench.sim.clear_journal();
    assert!(bench.coordinator.move_to_position(17).unwrap().is_completed());
    assert_eq!(bench.sim.motion_order(), vec![Y, X]);
    assert_eq!(bench.position(Z), 0.0);
    assert!(bench.coordinator.report_position().position(R).is_none());
}

#[test]
fn rotation_without_vertical_axis_stays_put() {
    let mut config = bench_config();
    config.axes.retain(|a| a.label != Z);
    let mut bench = Bench::homed(&config);

    assert!(bench.coordinator.move_to_position(5).unwrap().is_completed());
    assert_eq!(bench.sim.motion_order(), vec![Y, X]);
    assert_eq!(bench.position(R), 0.0);

    // explicit rotation still works
    bench.sim.clear_journal();
    assert!(bench.coordinator.rotate_by(90.0).is_completed());
    assert_eq!(bench.sim.motion_order(), vec![R]);
}

#[test]
fn without_engagement_axis_nothing_plugs_in() {
    let mut config = bench_config();
    config.axes.retain(|a| a.label != X);
    let mut bench = Bench::homed(&config);

    assert!(bench.coordinator.engage(false).is_completed());
    assert!(!bench.coordinator.is_plugged_in());
    assert!(bench.coordinator.disengage().is_completed());
    assert!(bench.coordinator.move_to_position(5).unwrap().is_completed());
    assert_eq!(bench.sim.motion_order(), vec![Y, R, Z]);
}

#[test]
fn empty_fixture() {
    let mut config = bench_config();
    config.axes.clear();
    let mut bench = Bench::homed(&config);
    assert!(bench.report.present.is_empty());
    assert_eq!(bench.report.absent.len(), AxisLabel::ALL.len());
    assert!(bench.coordinator.move_to_position(3).unwrap().is_completed());
    assert!(bench.coordinator.check_placement(3, std::time::Duration::ZERO).unwrap().is_completed());
    assert_eq!(
        bench.coordinator.report_position().to_string(),
        "Connector head at (-, -, -, -)"
    );
}
