//! Integration test: elevator carrying an arm, two-pass propagation.

use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_relative_eq;
use mech_common::setpoint::SetPoint;
use mech_control::{Mechanism, MechanismSystem, SystemError};
use nalgebra::Vector3;

use super::{arm, elevator};

fn robot() -> MechanismSystem {
    let mut system = MechanismSystem::new("robot");
    system.register_mechanism(elevator()).unwrap();
    system.register_mechanism(arm()).unwrap();
    system.set_parent_child("elevator", "arm").unwrap();
    system
}

fn targets(pairs: &[(&str, SetPoint)]) -> HashMap<String, SetPoint> {
    pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect()
}

#[test]
fn arm_reaction_reaches_elevator() {
    let mut system = robot();
    let plan = system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(1.0, 0.0, 0.0, 0.0)),
        ("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));

    assert_eq!(plan.len(), 2);
    assert_relative_eq!(plan.input_motion["elevator"], Vector3::zeros());
    assert_relative_eq!(
        plan.input_motion["arm"],
        Vector3::new(0.0, 0.0, 0.1),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        *plan.get("arm").unwrap(),
        Vector3::new(0.0, 14.715, 0.0),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        *plan.get("elevator").unwrap(),
        Vector3::new(0.0, -1.4715, -98.1),
        epsilon = 1e-9
    );
}

#[test]
fn planning_seeds_mechanism_state() {
    let mut system = robot();
    system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(0.75, 0.2, 0.0, 0.0)),
        ("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));
    let state = system.mechanism("elevator").unwrap().state();
    assert_eq!(state.position, 0.75);
    assert_eq!(state.velocity, 0.2);
}

#[test]
fn unseeded_child_is_left_out() {
    let mut system = robot();
    let plan = system.calculate_system_feedforward(&targets(&[(
        "elevator",
        SetPoint::new(1.0, 0.0, 0.0, 0.0),
    )]));
    assert_eq!(plan.len(), 1);
    assert!(plan.get("arm").is_none());
    assert_relative_eq!(
        *plan.get("elevator").unwrap(),
        Vector3::new(0.0, 0.0, -98.1),
        epsilon = 1e-9
    );
}

#[test]
fn unseeded_root_yields_nothing() {
    let mut system = robot();
    let plan = system.calculate_system_feedforward(&targets(&[(
        "arm",
        SetPoint::new(0.0, 0.0, 0.0, 0.0),
    )]));
    assert!(plan.is_empty());
}

#[test]
fn unknown_names_are_ignored() {
    let mut system = robot();
    let plan = system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(1.0, 0.0, 0.0, 0.0)),
        ("gripper", SetPoint::new(1.0, 0.0, 0.0, 0.0)),
    ]));
    assert_eq!(plan.len(), 1);
}

#[test]
fn velocity_target_keeps_current_position() {
    let mut system = robot();
    system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(0.5, 0.0, 0.0, 0.0)),
        ("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));

    let plan = system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::velocity_mode(0.1, 0.0, 0.0)),
        ("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));
    assert_eq!(system.mechanism("elevator").unwrap().state().position, 0.5);
    assert_relative_eq!(
        plan.input_motion["arm"],
        Vector3::new(0.0, 0.0, 0.05),
        epsilon = 1e-12
    );
}

#[test]
fn explicit_root_limits_the_walk() {
    let mut system = robot();
    system.set_root("arm").unwrap();
    assert_eq!(system.root(), Some("arm"));
    assert_eq!(system.reachable(), vec!["arm"]);

    let plan = system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(1.0, 0.0, 0.0, 0.0)),
        ("arm", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));
    assert_eq!(plan.len(), 1);
    assert_relative_eq!(plan.input_motion["arm"], Vector3::zeros());
    assert_relative_eq!(
        *plan.get("arm").unwrap(),
        Vector3::new(0.0, 14.715, 0.0),
        epsilon = 1e-9
    );
}

#[test]
fn two_linear_stages_cancel_reaction() {
    let mut system = MechanismSystem::new("stack");
    system.register_mechanism(elevator()).unwrap();
    let props = elevator().properties().clone();
    let upper = Mechanism::linear("upper", Arc::new(props), Vector3::z(), Vector3::zeros()).unwrap();
    system.register_mechanism(upper).unwrap();
    system.set_parent_child("elevator", "upper").unwrap();

    let plan = system.calculate_system_feedforward(&targets(&[
        ("elevator", SetPoint::new(2.0, 0.0, 0.0, 0.0)),
        ("upper", SetPoint::new(0.0, 0.0, 0.0, 0.0)),
    ]));
    // linear/linear: motion ×0.5, reaction ×−1
    assert_relative_eq!(
        plan.input_motion["upper"],
        Vector3::new(0.0, 0.0, 1.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(*plan.get("elevator").unwrap(), Vector3::zeros(), epsilon = 1e-9);
}

#[test]
fn relation_errors_leave_tree_untouched() {
    let mut system = robot();
    assert!(matches!(
        system.set_parent_child("arm", "elevator"),
        Err(SystemError::CycleDetected { .. })
    ));
    assert!(matches!(
        system.set_parent_child("arm", "arm"),
        Err(SystemError::SelfRelation(_))
    ));
    assert!(matches!(
        system.set_parent_child("elevator", "ghost"),
        Err(SystemError::UnknownMechanism(_))
    ));
    assert_eq!(system.children("elevator"), vec!["arm"]);
    assert_eq!(system.parent("arm"), Some("elevator"));
    assert!(system.children("arm").is_empty());
}
