//! Mechanism kinds.
//!
//! A mechanism is either linear (moves along `motion_axis` from
//! `start_point`) or rotating (turns about `rotation_axis` through
//! `pivot_point`). Axes are normalized on construction.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Type tag used by the coupling tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MechanismType {
    /// Prismatic motion. State in m, m/s, m/s².
    Linear,
    /// Revolute motion. State in rad, rad/s, rad/s².
    Rotating,
}

/// Axis data for each mechanism type.
#[derive(Debug, Clone, PartialEq)]
pub enum MechanismKind {
    /// Prismatic joint.
    Linear {
        /// Unit motion direction.
        motion_axis: Vector3<f64>,
        /// Position of the body when `position = 0`.
        start_point: Vector3<f64>,
    },
    /// Revolute joint.
    Rotating {
        /// Unit rotation axis.
        rotation_axis: Vector3<f64>,
        /// Point the axis passes through.
        pivot_point: Vector3<f64>,
    },
}

impl MechanismKind {
    /// Linear kind. Returns `None` if `motion_axis` is zero or non-finite.
    pub fn linear(motion_axis: Vector3<f64>, start_point: Vector3<f64>) -> Option<Self> {
        Some(Self::Linear {
            motion_axis: unit_axis(&motion_axis)?,
            start_point,
        })
    }

    /// Rotating kind. Returns `None` if `rotation_axis` is zero or non-finite.
    pub fn rotating(rotation_axis: Vector3<f64>, pivot_point: Vector3<f64>) -> Option<Self> {
        Some(Self::Rotating {
            rotation_axis: unit_axis(&rotation_axis)?,
            pivot_point,
        })
    }

    /// Type tag.
    #[inline]
    pub fn tag(&self) -> MechanismType {
        match self {
            Self::Linear { .. } => MechanismType::Linear,
            Self::Rotating { .. } => MechanismType::Rotating,
        }
    }

    /// Unit axis (motion or rotation).
    #[inline]
    pub fn axis(&self) -> &Vector3<f64> {
        match self {
            Self::Linear { motion_axis, .. } => motion_axis,
            Self::Rotating { rotation_axis, .. } => rotation_axis,
        }
    }

    /// Start point (linear) or pivot point (rotating).
    #[inline]
    pub fn origin(&self) -> &Vector3<f64> {
        match self {
            Self::Linear { start_point, .. } => start_point,
            Self::Rotating { pivot_point, .. } => pivot_point,
        }
    }
}

fn unit_axis(axis: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = axis.norm();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return None;
    }
    Some(axis / norm)
}
