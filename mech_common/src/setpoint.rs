//! Motion targets.
//!
//! A [`SetPoint`] is a value object: a new target replaces the previous one
//! wholesale, there is no partial update.

/// Desired motion of one mechanism.
///
/// Units follow the mechanism kind: metres for linear mechanisms, radians for
/// rotating ones.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetPoint {
    /// Target position. `None` selects velocity-mode tracking.
    pub position: Option<f64>,
    /// Target velocity.
    pub velocity: f64,
    /// Target acceleration.
    pub acceleration: f64,
    /// Extra open-loop magnitude added on top of the computed feedforward.
    pub feedforward: f64,
}

impl SetPoint {
    /// Position-mode target.
    pub const fn new(position: f64, velocity: f64, acceleration: f64, feedforward: f64) -> Self {
        Self {
            position: Some(position),
            velocity,
            acceleration,
            feedforward,
        }
    }

    /// Velocity-mode target (no position tracking).
    pub const fn velocity_mode(velocity: f64, acceleration: f64, feedforward: f64) -> Self {
        Self {
            position: None,
            velocity,
            acceleration,
            feedforward,
        }
    }

    /// True if this target carries a position.
    #[inline]
    pub const fn is_position_mode(&self) -> bool {
        self.position.is_some()
    }
}
