//! Property tests for the algebraic invariants of the feedforward math.

use std::sync::Arc;

use approx::relative_eq;
use mech_common::actuator::ActuatorFeedback;
use mech_common::consts::ASSUMED_ACTUATOR_EFFICIENCY;
use mech_common::physics::PhysicalProperties;
use mech_control::{DistributionPolicy, KinematicState, Mechanism};
use nalgebra::Vector3;
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -10.0..10.0f64
}

fn point() -> impl Strategy<Value = Vector3<f64>> {
    (finite(), finite(), finite()).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn arm_with_cog(mass: f64, pivot: Vector3<f64>, lever: Vector3<f64>) -> Mechanism {
    arm_at(mass, pivot + lever, pivot)
}

fn arm_at(mass: f64, cog: Vector3<f64>, pivot: Vector3<f64>) -> Mechanism {
    let props = PhysicalProperties::point_mass(mass, cog).unwrap();
    Mechanism::rotating("arm", Arc::new(props), Vector3::z(), pivot).unwrap()
}

proptest! {
    #[test]
    fn mirrored_lever_negates_gravity_torque(
        mass in 0.1..50.0f64,
        px in finite(), py in finite(), pz in finite(),
        lx in finite(), ly in finite(), lz in finite(),
    ) {
        let pivot = Vector3::new(px, py, pz);
        let lever = Vector3::new(lx, ly, lz);
        let a = arm_with_cog(mass, pivot, lever).feedforward(&Vector3::zeros());
        let b = arm_with_cog(mass, pivot, -lever).feedforward(&Vector3::zeros());
        prop_assert!(relative_eq!(a, -b, epsilon = 1e-9));
    }

    #[test]
    fn cross_product_is_antisymmetric(a in point(), b in point()) {
        prop_assert!(relative_eq!(a.cross(&b), -b.cross(&a), epsilon = 1e-9));
    }

    #[test]
    fn swapping_cog_and_pivot_negates_gravity_torque(
        mass in 0.1..50.0f64,
        p in point(),
        q in point(),
    ) {
        let forward = arm_at(mass, p, q).feedforward(&Vector3::zeros());
        let swapped = arm_at(mass, q, p).feedforward(&Vector3::zeros());
        prop_assert!(relative_eq!(forward, -swapped, epsilon = 1e-9));
    }

    #[test]
    fn mean_of_identical_feedback_is_that_feedback(
        position in finite(), velocity in finite(), acceleration in finite(),
        n in 1usize..16,
    ) {
        let fb = ActuatorFeedback {
            position,
            velocity,
            acceleration,
            connected: true,
            ..Default::default()
        };
        let all = vec![fb; n];
        let state = KinematicState::mean(&all).unwrap();
        prop_assert!(relative_eq!(state.position, position, epsilon = 1e-12));
        prop_assert!(relative_eq!(state.velocity, velocity, epsilon = 1e-12));
        prop_assert!(relative_eq!(state.acceleration, acceleration, epsilon = 1e-12));
    }

    #[test]
    fn shares_sum_to_scaled_magnitude(
        magnitude in 0.0..1000.0f64,
        ratios in prop::collection::vec(0.01..100.0f64, 1..8),
    ) {
        for policy in [DistributionPolicy::EqualSplit, DistributionPolicy::GearRatioWeighted] {
            let shares = policy.distribute(magnitude, &ratios);
            prop_assert_eq!(shares.len(), ratios.len());
            prop_assert!(shares.iter().all(|s| *s >= 0.0));
            let expected = match policy {
                DistributionPolicy::EqualSplit => magnitude,
                DistributionPolicy::GearRatioWeighted => magnitude / ASSUMED_ACTUATOR_EFFICIENCY,
            };
            let sum: f64 = shares.iter().sum();
            prop_assert!(relative_eq!(sum, expected, epsilon = 1e-9, max_relative = 1e-12));
        }
    }

    #[test]
    fn linear_at_rest_is_weight_on_any_axis(
        mass in 0.1..50.0f64,
        ax in finite(), ay in finite(), az in 0.1..10.0f64,
    ) {
        let props = PhysicalProperties::point_mass(mass, Vector3::zeros()).unwrap();
        let lift = Mechanism::linear(
            "lift",
            Arc::new(props),
            Vector3::new(ax, ay, az),
            Vector3::zeros(),
        )
        .unwrap();
        let ff = lift.feedforward(&Vector3::zeros());
        prop_assert!(relative_eq!(ff, Vector3::new(0.0, 0.0, -9.81 * mass), epsilon = 1e-9));
    }
}
