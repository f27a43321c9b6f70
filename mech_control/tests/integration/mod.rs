mod config;
mod elevator_arm;
mod lifecycle;
mod properties;

// ── Shared fixtures ─────────────────────────────────────────────────

use std::sync::Arc;

use mech_common::physics::PhysicalProperties;
use mech_control::Mechanism;
use nalgebra::{Matrix3, Vector3};

/// 10 kg linear stage moving along +z.
pub fn elevator() -> Mechanism {
    let props = PhysicalProperties::new(
        10.0,
        Vector3::new(0.0, 0.0, 0.5),
        Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.1)),
        None,
    )
    .unwrap();
    Mechanism::linear("elevator", Arc::new(props), Vector3::z(), Vector3::zeros()).unwrap()
}

/// 5 kg arm turning about +z through the origin, cog 0.3 m out along x.
pub fn arm() -> Mechanism {
    let props = PhysicalProperties::new(
        5.0,
        Vector3::new(0.3, 0.0, 0.0),
        Matrix3::from_diagonal(&Vector3::new(0.1, 0.1, 0.5)),
        None,
    )
    .unwrap();
    Mechanism::rotating("arm", Arc::new(props), Vector3::z(), Vector3::zeros()).unwrap()
}
