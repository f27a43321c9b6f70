//! Coupling tables between mechanism types.
//!
//! | parent   | child    | motion | reaction |
//! |----------|----------|--------|----------|
//! | linear   | linear   | 0.5    | −1.0     |
//! | linear   | rotating | 0.1    | −0.1     |
//! | rotating | linear   | 0.1    | −0.1     |
//! | rotating | rotating | 0.3    | −0.5     |
//!
//! Factors apply component-wise to the 3-vector.

use nalgebra::Vector3;

use crate::mechanism::MechanismType;

/// Scale applied to the parent's effective motion to get the child's motion effect.
#[inline]
pub fn motion_coupling(parent: MechanismType, child: MechanismType) -> f64 {
    use MechanismType::{Linear, Rotating};
    match (parent, child) {
        (Linear, Linear) => 0.5,
        (Linear, Rotating) | (Rotating, Linear) => 0.1,
        (Rotating, Rotating) => 0.3,
    }
}

/// Scale applied to a child's total force to get its reaction on the parent.
#[inline]
pub fn reaction_coupling(parent: MechanismType, child: MechanismType) -> f64 {
    use MechanismType::{Linear, Rotating};
    match (parent, child) {
        (Linear, Linear) => -1.0,
        (Linear, Rotating) | (Rotating, Linear) => -0.1,
        (Rotating, Rotating) => -0.5,
    }
}

/// Motion effect of a parent on a child.
#[inline]
pub fn child_motion_effect(
    parent: MechanismType,
    child: MechanismType,
    parent_motion: &Vector3<f64>,
) -> Vector3<f64> {
    parent_motion * motion_coupling(parent, child)
}

/// Reaction a child's total force exerts on its parent.
#[inline]
pub fn reaction_force(
    parent: MechanismType,
    child: MechanismType,
    child_total: &Vector3<f64>,
) -> Vector3<f64> {
    child_total * reaction_coupling(parent, child)
}
