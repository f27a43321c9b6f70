//! The `Mechanism` entity.
//!
//! Owns its actuator ports and drives them every cycle:
//!
//! ```text
//! update_state()     : ports ─► feedback slots ─► mean state
//! execute_control()  : state ─► feedforward ─► distribute ─► one request per port
//! ```
//!
//! A mechanism with no actuators is inert: state updates leave the last state
//! in place and control is a no-op.

use std::sync::Arc;

use mech_common::actuator::{ActuatorConfig, ActuatorFeedback, ActuatorPort, ActuatorRequest};
use mech_common::physics::PhysicalProperties;
use mech_common::setpoint::SetPoint;
use nalgebra::Vector3;
use tracing::{debug, error, info, trace, warn};

use super::distribution::DistributionPolicy;
use super::feedforward::{FeedforwardBreakdown, compute_feedforward};
use super::kind::{MechanismKind, MechanismType};
use super::state::KinematicState;
use crate::error::{MechanismError, MechanismFault};

/// Default position tolerance (m or rad).
pub const DEFAULT_POSITION_TOLERANCE: f64 = 0.01;
/// Default velocity tolerance (m/s or rad/s).
pub const DEFAULT_VELOCITY_TOLERANCE: f64 = 0.1;

struct ActuatorSlot {
    port: Box<dyn ActuatorPort>,
    config: ActuatorConfig,
    feedback: ActuatorFeedback,
}

/// One controllable moving body.
pub struct Mechanism {
    name: String,
    properties: Arc<PhysicalProperties>,
    kind: MechanismKind,
    actuators: Vec<ActuatorSlot>,
    state: KinematicState,
    setpoint: Option<SetPoint>,
    position_tolerance: f64,
    velocity_tolerance: f64,
    distribution: DistributionPolicy,
    frame_compensation: bool,
    frame_acceleration: Vector3<f64>,
    faults: MechanismFault,
}

impl std::fmt::Debug for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mechanism")
            .field("name", &self.name)
            .field("kind", &self.kind.tag())
            .field("actuators", &self.actuator_names())
            .field("state", &self.state)
            .field("setpoint", &self.setpoint)
            .field("faults", &self.faults)
            .finish()
    }
}

impl Mechanism {
    /// Mechanism with default tolerances, weighted distribution and no frame compensation.
    pub fn new(
        name: impl Into<String>,
        properties: Arc<PhysicalProperties>,
        kind: MechanismKind,
    ) -> Self {
        Self {
            name: name.into(),
            properties,
            kind,
            actuators: Vec::new(),
            state: KinematicState::default(),
            setpoint: None,
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            velocity_tolerance: DEFAULT_VELOCITY_TOLERANCE,
            distribution: DistributionPolicy::default(),
            frame_compensation: false,
            frame_acceleration: Vector3::zeros(),
            faults: MechanismFault::empty(),
        }
    }

    /// Linear mechanism moving along `motion_axis` from `start_point`.
    ///
    /// # Errors
    /// `InvalidAxis` if `motion_axis` is zero or non-finite.
    pub fn linear(
        name: impl Into<String>,
        properties: Arc<PhysicalProperties>,
        motion_axis: Vector3<f64>,
        start_point: Vector3<f64>,
    ) -> Result<Self, MechanismError> {
        let name = name.into();
        let kind = MechanismKind::linear(motion_axis, start_point).ok_or_else(|| {
            MechanismError::InvalidAxis {
                mechanism: name.clone(),
            }
        })?;
        Ok(Self::new(name, properties, kind))
    }

    /// Rotating mechanism turning about `rotation_axis` through `pivot_point`.
    ///
    /// # Errors
    /// `InvalidAxis` if `rotation_axis` is zero or non-finite.
    pub fn rotating(
        name: impl Into<String>,
        properties: Arc<PhysicalProperties>,
        rotation_axis: Vector3<f64>,
        pivot_point: Vector3<f64>,
    ) -> Result<Self, MechanismError> {
        let name = name.into();
        let kind = MechanismKind::rotating(rotation_axis, pivot_point).ok_or_else(|| {
            MechanismError::InvalidAxis {
                mechanism: name.clone(),
            }
        })?;
        Ok(Self::new(name, properties, kind))
    }

    /// Builder-style distribution policy.
    pub fn with_distribution(mut self, policy: DistributionPolicy) -> Self {
        self.distribution = policy;
        self
    }

    /// Builder-style frame compensation switch.
    pub fn with_frame_compensation(mut self, enabled: bool) -> Self {
        self.frame_compensation = enabled;
        self
    }

    // ─── Setup ──────────────────────────────────────────────────────

    /// Register an actuator port and push `config` to it.
    ///
    /// # Errors
    /// - `DuplicateActuator` if an actuator with `config.name` exists
    /// - `InvalidGearRatio` if the gear ratio is not finite and > 0
    /// - `Actuator` if the port rejects the configuration
    ///
    /// Nothing is registered on error.
    pub fn register_actuator(
        &mut self,
        mut port: Box<dyn ActuatorPort>,
        config: ActuatorConfig,
    ) -> Result<(), MechanismError> {
        if self.actuators.iter().any(|s| s.config.name == config.name) {
            return Err(MechanismError::DuplicateActuator {
                mechanism: self.name.clone(),
                actuator: config.name,
            });
        }
        if !config.gear_ratio.is_finite() || config.gear_ratio <= 0.0 {
            return Err(MechanismError::InvalidGearRatio {
                mechanism: self.name.clone(),
                actuator: config.name,
                gear_ratio: config.gear_ratio,
            });
        }
        port.apply_config(&config)
            .map_err(|source| MechanismError::Actuator {
                mechanism: self.name.clone(),
                source,
            })?;

        info!(
            mechanism = %self.name,
            actuator = %config.name,
            gear_ratio = config.gear_ratio,
            "Actuator registered"
        );
        self.actuators.push(ActuatorSlot {
            port,
            config,
            feedback: ActuatorFeedback::default(),
        });
        Ok(())
    }

    /// Set position and velocity tolerances used by [`is_at_target`](Self::is_at_target).
    ///
    /// # Errors
    /// `InvalidTolerance` if either value is negative or non-finite.
    pub fn set_tolerances(&mut self, position: f64, velocity: f64) -> Result<(), MechanismError> {
        for (which, value) in [("position", position), ("velocity", velocity)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MechanismError::InvalidTolerance {
                    mechanism: self.name.clone(),
                    which,
                    value,
                });
            }
        }
        self.position_tolerance = position;
        self.velocity_tolerance = velocity;
        Ok(())
    }

    /// Acceleration of the frame this mechanism is mounted in, used by
    /// [`execute_control`](Self::execute_control) when frame compensation is on.
    pub fn set_reference_frame_acceleration(&mut self, acceleration: Vector3<f64>) {
        self.frame_acceleration = acceleration;
    }

    // ─── Cycle ──────────────────────────────────────────────────────

    /// Pull feedback from every port and recompute the mean state.
    ///
    /// All ports are polled even if one fails. On failure the state is left
    /// unchanged, the mechanism is flagged `FEEDBACK_FAILED` for this cycle and
    /// the first error is returned.
    pub fn update_state(&mut self) -> Result<(), MechanismError> {
        self.faults = MechanismFault::empty();
        if self.actuators.is_empty() {
            return Ok(());
        }

        let mut first_error = None;
        for slot in &mut self.actuators {
            if let Err(source) = slot.port.update_feedback(&mut slot.feedback) {
                warn!(
                    mechanism = %self.name,
                    actuator = %slot.config.name,
                    error = %source,
                    "Feedback pull failed"
                );
                first_error.get_or_insert(source);
            } else if !slot.feedback.connected {
                warn!(
                    mechanism = %self.name,
                    actuator = %slot.config.name,
                    "Actuator disconnected"
                );
                self.faults |= MechanismFault::ACTUATOR_DISCONNECTED;
            }
        }

        if let Some(source) = first_error {
            self.faults |= MechanismFault::FEEDBACK_FAILED;
            return Err(MechanismError::Actuator {
                mechanism: self.name.clone(),
                source,
            });
        }

        if let Some(state) = KinematicState::mean(self.actuators.iter().map(|s| &s.feedback)) {
            self.state = state;
        }
        trace!(
            mechanism = %self.name,
            position = self.state.position,
            velocity = self.state.velocity,
            "State updated"
        );
        Ok(())
    }

    /// Replace the current target.
    pub fn set_target_setpoint(&mut self, setpoint: SetPoint) {
        debug!(mechanism = %self.name, ?setpoint, "Set-point replaced");
        self.setpoint = Some(setpoint);
    }

    /// Drop the current target. Control becomes a no-op.
    pub fn clear_setpoint(&mut self) {
        self.setpoint = None;
    }

    /// Issue one request per port for the current target.
    ///
    /// No-op without ports, without a target, or after a failed feedback pull
    /// this cycle. Every port is commanded even if one fails; the first error
    /// is returned.
    pub fn execute_control(&mut self) -> Result<(), MechanismError> {
        let Some(setpoint) = self.setpoint else {
            return Ok(());
        };
        if self.actuators.is_empty() {
            return Ok(());
        }
        if self.faults.intersects(MechanismFault::BLOCKS_CONTROL) {
            debug!(mechanism = %self.name, "Control skipped after feedback failure");
            return Ok(());
        }

        let total = self.feedforward(&self.frame_acceleration);
        let shares = self.distribute_magnitude(total.norm() + setpoint.feedforward);

        let mut first_error = None;
        for (slot, share) in self.actuators.iter_mut().zip(shares) {
            let feedforward = share * slot.config.feedforward_scale;
            let request = match setpoint.position {
                Some(p) => ActuatorRequest::position(
                    p,
                    setpoint.velocity,
                    setpoint.acceleration,
                    feedforward,
                ),
                None => ActuatorRequest::velocity(
                    setpoint.velocity,
                    setpoint.acceleration,
                    feedforward,
                ),
            };
            trace!(
                mechanism = %self.name,
                actuator = %slot.config.name,
                ?request,
                "Command"
            );
            if let Err(source) = slot.port.issue_command(&request) {
                warn!(
                    mechanism = %self.name,
                    actuator = %slot.config.name,
                    error = %source,
                    "Command failed"
                );
                first_error.get_or_insert(source);
            }
        }

        match first_error {
            Some(source) => {
                self.faults |= MechanismFault::COMMAND_FAILED;
                Err(MechanismError::Actuator {
                    mechanism: self.name.clone(),
                    source,
                })
            }
            None => Ok(()),
        }
    }

    /// True when the mean actuator feedback is within tolerance of the target.
    ///
    /// Reads the last polled feedback, not the state seeded by planning.
    /// Position-mode targets check position and velocity; velocity-mode
    /// targets check velocity only. Always false without ports, without a
    /// target, or while any port reports `connected = false`.
    pub fn is_at_target(&self) -> bool {
        let Some(setpoint) = self.setpoint else {
            return false;
        };
        if self.actuators.iter().any(|s| !s.feedback.connected) {
            return false;
        }
        let Some(measured) = KinematicState::mean(self.actuators.iter().map(|s| &s.feedback)) else {
            return false;
        };

        let velocity_ok = (measured.velocity - setpoint.velocity).abs() <= self.velocity_tolerance;
        match setpoint.position {
            Some(p) => velocity_ok && (measured.position - p).abs() <= self.position_tolerance,
            None => velocity_ok,
        }
    }

    /// Command zero position/velocity/acceleration/feedforward on every port
    /// and drop the current target.
    ///
    /// Every port is commanded even if one fails; the first error is returned.
    pub fn emergency_stop(&mut self) -> Result<(), MechanismError> {
        self.setpoint = None;
        let stop = ActuatorRequest::zero();
        let mut first_error = None;
        for slot in &mut self.actuators {
            if let Err(source) = slot.port.issue_command(&stop) {
                error!(
                    mechanism = %self.name,
                    actuator = %slot.config.name,
                    error = %source,
                    "Emergency stop command failed"
                );
                first_error.get_or_insert(source);
            }
        }
        warn!(mechanism = %self.name, actuators = self.actuators.len(), "Emergency stop");

        match first_error {
            Some(source) => {
                self.faults |= MechanismFault::COMMAND_FAILED;
                Err(MechanismError::Actuator {
                    mechanism: self.name.clone(),
                    source,
                })
            }
            None => Ok(()),
        }
    }

    // ─── Feedforward ────────────────────────────────────────────────

    /// Feedforward force (linear) or torque (rotating) for the current state.
    ///
    /// `reference_frame_acceleration` only contributes when frame compensation
    /// is enabled.
    pub fn feedforward(&self, reference_frame_acceleration: &Vector3<f64>) -> Vector3<f64> {
        self.feedforward_breakdown(reference_frame_acceleration).total()
    }

    /// Per-component feedforward for the current state.
    pub fn feedforward_breakdown(
        &self,
        reference_frame_acceleration: &Vector3<f64>,
    ) -> FeedforwardBreakdown {
        let frame = self
            .frame_compensation
            .then_some(reference_frame_acceleration);
        compute_feedforward(&self.kind, &self.state, &self.properties, frame)
    }

    /// Per-actuator shares of `|total_feedforward|`, in registration order.
    pub fn distribute_feedforward(&self, total_feedforward: &Vector3<f64>) -> Vec<f64> {
        self.distribute_magnitude(total_feedforward.norm())
    }

    fn distribute_magnitude(&self, magnitude: f64) -> Vec<f64> {
        let ratios: Vec<f64> = self.actuators.iter().map(|s| s.config.gear_ratio).collect();
        self.distribution.distribute(magnitude, &ratios)
    }

    /// Force the kinematic state to a set-point projection. Used for planning.
    pub(crate) fn seed_state(&mut self, setpoint: &SetPoint) {
        self.state = self.state.projected(setpoint);
    }

    /// Axis-scaled position: `axis · position` (or `axis · angle`).
    pub(crate) fn axis_motion(&self) -> Vector3<f64> {
        self.kind.axis() * self.state.position
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// Mechanism name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical properties.
    #[inline]
    pub fn properties(&self) -> &PhysicalProperties {
        &self.properties
    }

    /// Axis data.
    #[inline]
    pub fn kind(&self) -> &MechanismKind {
        &self.kind
    }

    /// Type tag.
    #[inline]
    pub fn mechanism_type(&self) -> MechanismType {
        self.kind.tag()
    }

    /// Current kinematic state.
    #[inline]
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Current target.
    #[inline]
    pub fn setpoint(&self) -> Option<&SetPoint> {
        self.setpoint.as_ref()
    }

    /// `(position, velocity)` tolerances.
    #[inline]
    pub fn tolerances(&self) -> (f64, f64) {
        (self.position_tolerance, self.velocity_tolerance)
    }

    /// Distribution policy.
    #[inline]
    pub fn distribution(&self) -> DistributionPolicy {
        self.distribution
    }

    /// Faults raised this cycle.
    #[inline]
    pub fn faults(&self) -> MechanismFault {
        self.faults
    }

    /// Number of registered actuators.
    #[inline]
    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    /// Registered actuator names in registration order.
    pub fn actuator_names(&self) -> Vec<&str> {
        self.actuators.iter().map(|s| s.config.name.as_str()).collect()
    }

    /// Latest feedback of each actuator in registration order.
    pub fn feedback(&self) -> impl Iterator<Item = &ActuatorFeedback> {
        self.actuators.iter().map(|s| &s.feedback)
    }

    /// World position of the center of mass.
    ///
    /// Linear: `start_point + position · motion_axis`. Rotating: the
    /// properties' center of gravity.
    pub fn center_of_mass(&self) -> Vector3<f64> {
        match &self.kind {
            MechanismKind::Linear {
                motion_axis,
                start_point,
            } => start_point + motion_axis * self.state.position,
            MechanismKind::Rotating { .. } => *self.properties.center_of_gravity(),
        }
    }
}
