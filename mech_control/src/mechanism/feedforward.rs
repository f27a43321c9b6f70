//! Rigid-body feedforward.
//!
//! Linear (force, N):
//!
//! ```text
//! gravity  = (0, 0, −g·m)
//! inertia  = axis · (m · a)
//! friction = −sign(v) · (μ · |v|) · axis        (zero when v == 0)
//! frame    = −m · (a_f · axis) · axis            (compensation only)
//! ```
//!
//! Rotating (torque, N·m), with `r = cog − pivot` and `ω = axis · ω_s`:
//!
//! ```text
//! gravity  = r × (0, 0, −g·m)
//! inertia  = I · (axis · α)
//! coriolis = ω × (I · ω)
//! frame    = r × (−m · a_f)                      (compensation only)
//! ```
//!
//! The computation is a pure function of state, properties and axis data.

use mech_common::consts::LINEAR_FRICTION_COEFFICIENT;
use mech_common::physics::PhysicalProperties;
use nalgebra::Vector3;

use super::kind::MechanismKind;
use super::state::KinematicState;

/// Feedforward split by physical origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedforwardBreakdown {
    /// Gravity force / torque.
    pub gravity: Vector3<f64>,
    /// Inertial force / torque.
    pub inertia: Vector3<f64>,
    /// Friction force (linear) or coriolis torque (rotating).
    pub dissipative: Vector3<f64>,
    /// Non-inertial frame compensation. Zero unless enabled.
    pub frame: Vector3<f64>,
}

impl FeedforwardBreakdown {
    /// Sum of all components.
    #[inline]
    pub fn total(&self) -> Vector3<f64> {
        self.gravity + self.inertia + self.dissipative + self.frame
    }
}

/// Compute feedforward for one mechanism.
///
/// `frame_acceleration` is the acceleration of the reference frame the
/// mechanism is mounted in; pass `None` to leave frame compensation off.
pub fn compute_feedforward(
    kind: &MechanismKind,
    state: &KinematicState,
    properties: &PhysicalProperties,
    frame_acceleration: Option<&Vector3<f64>>,
) -> FeedforwardBreakdown {
    let mass = properties.mass();
    let weight = properties.gravity_force();

    match kind {
        MechanismKind::Linear { motion_axis, .. } => {
            let friction = if state.velocity != 0.0 {
                motion_axis
                    * (-state.velocity.signum() * LINEAR_FRICTION_COEFFICIENT * state.velocity.abs())
            } else {
                Vector3::zeros()
            };
            let frame = frame_acceleration
                .map(|a| motion_axis * (-mass * a.dot(motion_axis)))
                .unwrap_or_else(Vector3::zeros);

            FeedforwardBreakdown {
                gravity: weight,
                inertia: motion_axis * (mass * state.acceleration),
                dissipative: friction,
                frame,
            }
        }
        MechanismKind::Rotating {
            rotation_axis,
            pivot_point,
        } => {
            let inertia_tensor = properties.moment_of_inertia();
            let lever = properties.center_of_gravity() - pivot_point;
            let omega = rotation_axis * state.velocity;
            let frame = frame_acceleration
                .map(|a| lever.cross(&(a * -mass)))
                .unwrap_or_else(Vector3::zeros);

            FeedforwardBreakdown {
                gravity: lever.cross(&weight),
                inertia: inertia_tensor * (rotation_axis * state.acceleration),
                dissipative: omega.cross(&(inertia_tensor * omega)),
                frame,
            }
        }
    }
}
