//! Integration test: read → control → stop on simulated actuators.

use approx::assert_relative_eq;
use mech_common::actuator::{ActuatorConfig, ActuatorRequest};
use mech_common::consts::ASSUMED_ACTUATOR_EFFICIENCY;
use mech_common::setpoint::SetPoint;
use mech_control::{CycleRunner, MechanismFault, MechanismSystem, SystemError};
use mech_hal::{SimHandle, SimulatedActuator};
use std::collections::HashMap;
use std::time::Duration;

use super::{arm, elevator};

// ── Helpers ─────────────────────────────────────────────────────────

struct Rig {
    system: MechanismSystem,
    left: SimHandle,
    right: SimHandle,
    arm: SimHandle,
}

fn sim(name: &str, gear_ratio: f64) -> (SimulatedActuator, SimHandle, ActuatorConfig) {
    let port = SimulatedActuator::new(name);
    let handle = port.handle();
    let config = ActuatorConfig::new(name)
        .with_gear_ratio(gear_ratio)
        .with_pid(2.0, 0.0, 0.1);
    (port, handle, config)
}

fn rig() -> Rig {
    let mut lift = elevator();
    let (port, left, cfg) = sim("elevator-left", 10.0);
    lift.register_actuator(Box::new(port), cfg).unwrap();
    let (port, right, cfg) = sim("elevator-right", 10.0);
    lift.register_actuator(Box::new(port), cfg).unwrap();

    let mut arm_mech = arm();
    let (port, arm, cfg) = sim("arm-motor", 50.0);
    arm_mech.register_actuator(Box::new(port), cfg).unwrap();

    let mut system = MechanismSystem::new("robot");
    system.register_mechanism(lift).unwrap();
    system.register_mechanism(arm_mech).unwrap();
    system.set_parent_child("elevator", "arm").unwrap();
    system
        .set_target_setpoint("elevator", SetPoint::new(1.0, 0.0, 0.0, 0.0))
        .unwrap();
    system
        .set_target_setpoint("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0))
        .unwrap();

    Rig {
        system,
        left,
        right,
        arm,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn control_splits_gravity_across_actuators() {
    let mut rig = rig();
    rig.system.update_all_mechanism_states().unwrap();
    rig.system.execute_all_mechanism_control().unwrap();

    let left = rig.left.last_request().unwrap();
    let right = rig.right.last_request().unwrap();
    assert_eq!(left.target_position, Some(1.0));
    // weighted split over equal gear ratios, scaled up by the assumed efficiency
    let share = 98.1 / 2.0 / ASSUMED_ACTUATOR_EFFICIENCY;
    assert_relative_eq!(left.feedforward, share, epsilon = 1e-9);
    assert_relative_eq!(right.feedforward, share, epsilon = 1e-9);

    let arm = rig.arm.last_request().unwrap();
    assert_eq!(arm.target_position, Some(0.0));
    assert_relative_eq!(
        arm.feedforward,
        14.715 / ASSUMED_ACTUATOR_EFFICIENCY,
        epsilon = 1e-9
    );
}

#[test]
fn at_target_after_reaching_setpoint() {
    let mut rig = rig();
    rig.system.update_all_mechanism_states().unwrap();
    assert!(!rig.system.are_all_mechanisms_at_target());

    rig.left.set_position(1.0);
    rig.right.set_position(1.0);
    rig.system.update_all_mechanism_states().unwrap();
    assert!(rig.system.are_all_mechanisms_at_target());
    assert_relative_eq!(rig.system.mechanism("elevator").unwrap().state().position, 1.0);
}

#[test]
fn planning_does_not_report_arrival() {
    let mut rig = rig();
    rig.system.update_all_mechanism_states().unwrap();

    let targets: HashMap<String, SetPoint> = [
        ("elevator".to_string(), SetPoint::new(1.0, 0.0, 0.0, 0.0)),
        ("arm".to_string(), SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]
    .into_iter()
    .collect();
    let plan = rig.system.calculate_system_feedforward(&targets);
    assert_eq!(plan.len(), 2);

    // actuators still report the old position
    assert!(rig.left.model().position < 0.5);
    assert!(!rig.system.mechanism("elevator").unwrap().is_at_target());
    assert!(!rig.system.are_all_mechanisms_at_target());

    rig.left.set_position(1.0);
    rig.right.set_position(1.0);
    rig.system.update_all_mechanism_states().unwrap();
    assert!(rig.system.are_all_mechanisms_at_target());
}

#[test]
fn emergency_stop_commands_zero_everywhere() {
    let mut rig = rig();
    rig.system.update_all_mechanism_states().unwrap();
    rig.system.execute_all_mechanism_control().unwrap();
    rig.system.emergency_stop_all_mechanisms().unwrap();

    for handle in [&rig.left, &rig.right, &rig.arm] {
        assert_eq!(handle.last_request(), Some(ActuatorRequest::zero()));
    }
    assert!(rig.system.iter().all(|m| m.setpoint().is_none()));
    assert!(!rig.system.are_all_mechanisms_at_target());

    let before = rig.left.commands_issued();
    rig.system.execute_all_mechanism_control().unwrap();
    assert_eq!(rig.left.commands_issued(), before);
}

#[test]
fn emergency_stop_visits_every_port_on_failure() {
    let mut rig = rig();
    rig.left.set_command_failure(true);
    let err = rig.system.emergency_stop_all_mechanisms().unwrap_err();
    match err {
        SystemError::CycleFaults(list) => {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].mechanism(), "elevator");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(rig.right.last_request(), Some(ActuatorRequest::zero()));
    assert_eq!(rig.arm.last_request(), Some(ActuatorRequest::zero()));
}

#[test]
fn disconnected_actuator_blocks_at_target() {
    let mut rig = rig();
    rig.left.set_position(1.0);
    rig.right.set_position(1.0);
    rig.right.set_connected(false);

    rig.system.update_all_mechanism_states().unwrap();
    let lift = rig.system.mechanism("elevator").unwrap();
    assert!(lift.faults().contains(MechanismFault::ACTUATOR_DISCONNECTED));
    assert!(!lift.is_at_target());

    rig.right.set_connected(true);
    rig.system.update_all_mechanism_states().unwrap();
    assert!(rig.system.mechanism("elevator").unwrap().is_at_target());
}

#[test]
fn feedback_failure_skips_control_for_that_mechanism() {
    let mut rig = rig();
    rig.arm.set_feedback_failure(true);

    let err = rig.system.update_all_mechanism_states().unwrap_err();
    assert!(matches!(err, SystemError::CycleFaults(ref l) if l.len() == 1));
    assert!(
        rig.system
            .mechanism("arm")
            .unwrap()
            .faults()
            .contains(MechanismFault::FEEDBACK_FAILED)
    );

    rig.system.execute_all_mechanism_control().unwrap();
    assert_eq!(rig.arm.commands_issued(), 0);
    assert_eq!(rig.left.commands_issued(), 1);

    rig.arm.set_feedback_failure(false);
    rig.system.update_all_mechanism_states().unwrap();
    rig.system.execute_all_mechanism_control().unwrap();
    assert_eq!(rig.arm.commands_issued(), 1);
}

#[test]
fn velocity_setpoint_issues_velocity_request() {
    let mut rig = rig();
    rig.system
        .set_target_setpoint("elevator", SetPoint::velocity_mode(0.3, 0.0, 5.0))
        .unwrap();
    rig.system.update_all_mechanism_states().unwrap();
    rig.system.execute_all_mechanism_control().unwrap();

    let req = rig.left.last_request().unwrap();
    assert!(!req.is_position_mode());
    assert_eq!(req.target_velocity, 0.3);
    // |gravity| plus the extra feedforward, split over two equal gear ratios
    assert_relative_eq!(
        req.feedforward,
        (98.1 + 5.0) / 2.0 / ASSUMED_ACTUATOR_EFFICIENCY,
        epsilon = 1e-9
    );
}

#[test]
fn runner_drives_simulation_and_stops() {
    let rig = rig();
    let mut runner = CycleRunner::new(rig.system, Duration::from_millis(1));
    let stats = runner.run(Some(5)).unwrap();

    assert_eq!(stats.cycle_count, 5);
    assert_eq!(stats.faulted_cycles, 0);
    // one command per cycle plus the final emergency stop
    assert_eq!(rig.left.commands_issued(), 6);
    assert_eq!(rig.arm.last_request(), Some(ActuatorRequest::zero()));
    assert!(rig.left.model().position > 0.0);
}

#[test]
fn runner_counts_faulted_cycles() {
    let rig = rig();
    rig.arm.set_feedback_failure(true);
    let mut runner = CycleRunner::new(rig.system, Duration::from_millis(1));
    let stats = runner.run(Some(3)).unwrap();
    assert_eq!(stats.faulted_cycles, 3);
    assert_eq!(rig.arm.commands_issued(), 1);
}
