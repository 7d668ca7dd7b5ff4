//! Operator stop, emergency stop and fatal condition during sequences.

use oduqc_common::command::Command;
use oduqc_common::motion::types::AxisLabel;
use oduqc_common::motion::types::AxisLabel::{R, X, Y, Z};
use oduqc_motion::{AxisState, SequenceOutcome, StopCause};

use super::common::Bench;

fn nothing_energised(bench: &Bench) -> bool {
    AxisLabel::ALL.iter().all(|l| !bench.sim.is_energised(*l))
}

#[test]
fn emergency_stop_on_long_travel_aborts_sequence() {
    let mut bench = Bench::production();
    bench.estop_after(Y, 5);

    let outcome = bench.coordinator.move_to_position(1).unwrap();
    assert_eq!(
        outcome,
        SequenceOutcome::Interrupted {
            axis: Y,
            cause: StopCause::EmergencyStop
        }
    );
    assert_eq!(bench.position(Y), 5.0);
    assert_eq!(bench.sim.motion_order(), vec![Y]);
    for label in [X, Z, R] {
        assert_eq!(bench.position(label), 0.0);
    }
    assert!(nothing_energised(&bench));
    assert_eq!(bench.coordinator.axis(Y).unwrap().state(), AxisState::Stopped);

    // Nothing moves while the flag is up.
    bench.sim.clear_journal();
    let outcome = bench.coordinator.move_to_position(1).unwrap();
    assert!(!outcome.is_completed());
    assert!(bench.sim.motion_order().is_empty());

    bench.signals.clear_emergency_stop();
    assert!(bench.coordinator.move_to_position(1).unwrap().is_completed());
    assert_eq!(bench.position(Y), 46.0);
    assert_eq!(bench.position(Z), 469.0);
}

#[test]
fn operator_stop_on_last_axis_keeps_progress() {
    let mut bench = Bench::production();
    bench.stop_after(Z, 3);

    let outcome = bench.coordinator.move_to_position(1).unwrap();
    assert_eq!(
        outcome,
        SequenceOutcome::Interrupted {
            axis: Z,
            cause: StopCause::OperatorStop
        }
    );
    assert_eq!(bench.position(Y), 46.0);
    assert_eq!(bench.position(X), 450.0);
    assert_eq!(bench.position(R), 581.0);
    assert_eq!(bench.position(Z), 3.0);
    assert!(bench.latch.is_empty(), "stop request consumed");

    // Re-issuing completes only the remaining distance.
    bench.sim.clear_journal();
    assert!(bench.coordinator.move_to_position(1).unwrap().is_completed());
    assert_eq!(bench.sim.motion_order(), vec![Z]);
    assert_eq!(bench.position(Z), 469.0);
}

#[test]
fn non_stop_commands_do_not_interrupt() {
    let mut bench = Bench::production();
    bench.latch.post(Command::new('m', 4.0, "m4"));
    assert!(bench.coordinator.move_to_position(1).unwrap().is_completed());
    assert_eq!(bench.latch.take().map(|c| c.operation), Some('m'));
}

#[test]
fn fatal_condition_blocks_every_move() {
    let mut bench = Bench::production();
    bench.signals.set_fatal_condition(true);

    let outcome = bench.coordinator.move_to_position(3).unwrap();
    assert_eq!(
        outcome,
        SequenceOutcome::Interrupted {
            axis: Y,
            cause: StopCause::FatalCondition
        }
    );
    assert!(bench.sim.journal().iter().all(|e| !matches!(
        e.event,
        oduqc_hal::drivers::simulation::JournalEvent::Step { .. }
    )));

    let outcome = bench.coordinator.step_axis(R, 20.0);
    assert!(!outcome.is_completed());
    assert_eq!(bench.position(R), 0.0);
}

#[test]
fn emergency_stop_during_withdrawal() {
    let mut bench = Bench::production();
    bench.coordinator.move_to_position(6).unwrap();
    bench.coordinator.engage(false);
    bench.estop_after(X, 100);

    let outcome = bench.coordinator.move_to_position(7).unwrap();
    assert_eq!(
        outcome,
        SequenceOutcome::Interrupted {
            axis: X,
            cause: StopCause::EmergencyStop
        }
    );
    assert_eq!(bench.position(X), 850.0);
    // Still deeper than the travel depth.
    assert!(bench.coordinator.is_plugged_in());
    assert_eq!(bench.position(Y), 870.0);
}

#[test]
fn emergency_stop_during_reset_home() {
    let mut bench = Bench::with_config(&super::common::bench_config());
    bench.estop_after(R, 10);
    let outcome = bench.coordinator.reset_home();
    assert_eq!(
        outcome,
        SequenceOutcome::Interrupted {
            axis: R,
            cause: StopCause::EmergencyStop
        }
    );
    assert!(bench.coordinator.axis(X).unwrap().is_home());
    assert!(!bench.coordinator.axis(R).unwrap().is_home());
    assert!(!bench.coordinator.axis(Z).unwrap().is_home());
    assert!(nothing_energised(&bench));
}
