//! Kinematic state of a mechanism.

use mech_common::actuator::ActuatorFeedback;
use mech_common::setpoint::SetPoint;

/// Position/velocity/acceleration along (or about) the mechanism axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicState {
    /// m or rad.
    pub position: f64,
    /// m/s or rad/s.
    pub velocity: f64,
    /// m/s² or rad/s².
    pub acceleration: f64,
}

impl KinematicState {
    /// New state.
    pub const fn new(position: f64, velocity: f64, acceleration: f64) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// Arithmetic mean over `feedback`. `None` when empty.
    pub fn mean<'a, I>(feedback: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ActuatorFeedback>,
    {
        let mut sum = Self::default();
        let mut n = 0usize;
        for fb in feedback {
            sum.position += fb.position;
            sum.velocity += fb.velocity;
            sum.acceleration += fb.acceleration;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let n = n as f64;
        Some(Self::new(
            sum.position / n,
            sum.velocity / n,
            sum.acceleration / n,
        ))
    }

    /// State projected from a set-point. Velocity-mode targets keep `self.position`.
    pub fn projected(&self, setpoint: &SetPoint) -> Self {
        Self::new(
            setpoint.position.unwrap_or(self.position),
            setpoint.velocity,
            setpoint.acceleration,
        )
    }
}
