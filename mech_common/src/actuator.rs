//! Actuator port contract and records.
//!
//! This module defines:
//! - `ActuatorPort` trait - hardware-independent interface a mechanism drives
//! - `ActuatorFeedback` - motion feedback pulled every cycle
//! - `ActuatorRequest` - motion command issued every cycle
//! - `ActuatorConfig` - per-actuator configuration (TOML)
//! - `ActuatorError` - error type for port operations
//! - `ActuatorFactory` - factory function type used by driver registries

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for actuator port operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActuatorError {
    /// Command or feedback requested before `apply_config`.
    #[error("Actuator not configured: {0}")]
    NotConfigured(String),

    /// Feedback pull could not reach the device.
    #[error("Actuator disconnected: {0}")]
    Disconnected(String),

    /// Bus / transport failure.
    #[error("Actuator communication error: {0}")]
    Communication(String),

    /// Configuration rejected by the port or by validation.
    #[error("Invalid actuator configuration: {0}")]
    InvalidConfig(String),

    /// No driver registered under this name.
    #[error("Actuator driver not found: {0}")]
    DriverNotFound(String),

    /// A driver with this name is already registered.
    #[error("Actuator driver already registered: {0}")]
    DuplicateDriver(String),
}

/// Factory function type for creating actuator ports from their configuration.
pub type ActuatorFactory = fn(&ActuatorConfig) -> Box<dyn ActuatorPort>;

/// Feedback record filled by [`ActuatorPort::update_feedback`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorFeedback {
    /// Output position [m or rad].
    pub position: f64,
    /// Output velocity [m/s or rad/s].
    pub velocity: f64,
    /// Output acceleration [m/s² or rad/s²].
    pub acceleration: f64,
    /// Current draw [A].
    pub current_draw: f64,
    /// Device temperature [°C].
    pub temperature: f64,
    /// Device reachable.
    pub connected: bool,
    /// Age of the measurement when it was read.
    pub measurement_latency: Duration,
}

impl Default for ActuatorFeedback {
    fn default() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            current_draw: 0.0,
            temperature: 0.0,
            connected: false,
            measurement_latency: Duration::ZERO,
        }
    }
}

/// Motion command for one actuator.
///
/// `target_position = Some(_)` selects position-mode tracking; `None` selects
/// velocity-mode tracking on `target_velocity`/`target_acceleration`.
/// `feedforward` is an open-loop term already converted to device units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorRequest {
    /// Target position (position mode).
    pub target_position: Option<f64>,
    /// Target velocity.
    pub target_velocity: f64,
    /// Target acceleration.
    pub target_acceleration: f64,
    /// Open-loop feedforward magnitude.
    pub feedforward: f64,
}

impl ActuatorRequest {
    /// Position-mode request.
    pub const fn position(position: f64, velocity: f64, acceleration: f64, feedforward: f64) -> Self {
        Self {
            target_position: Some(position),
            target_velocity: velocity,
            target_acceleration: acceleration,
            feedforward,
        }
    }

    /// Velocity-mode request.
    pub const fn velocity(velocity: f64, acceleration: f64, feedforward: f64) -> Self {
        Self {
            target_position: None,
            target_velocity: velocity,
            target_acceleration: acceleration,
            feedforward,
        }
    }

    /// All-zero position-mode request used by emergency stop.
    pub const fn zero() -> Self {
        Self::position(0.0, 0.0, 0.0, 0.0)
    }

    /// True if the request carries a target position.
    #[inline]
    pub const fn is_position_mode(&self) -> bool {
        self.target_position.is_some()
    }
}

/// Per-actuator configuration.
///
/// # TOML Example
///
/// ```toml
/// [[mechanisms.actuators]]
/// name = "elevator-left"
/// id = 1
/// bus = "rio"
/// gear_ratio = 10.0
/// kp = 0.1
/// kd = 0.01
/// supply_current_limit = 40.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Unique name within its mechanism.
    pub name: String,
    /// Device id on the bus.
    #[serde(default)]
    pub id: u32,
    /// Bus name.
    #[serde(default = "default_bus")]
    pub bus: String,
    /// Driver used to create the port (see `mech_hal::ActuatorRegistry`).
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Proportional gain.
    #[serde(default)]
    pub kp: f64,
    /// Integral gain.
    #[serde(default)]
    pub ki: f64,
    /// Derivative gain.
    #[serde(default)]
    pub kd: f64,
    /// Static friction gain.
    #[serde(default)]
    pub ks: f64,
    /// Gravity gain.
    #[serde(default)]
    pub kg: f64,
    /// Velocity gain.
    #[serde(default)]
    pub kv: f64,
    /// Acceleration gain.
    #[serde(default)]
    pub ka: f64,
    /// Torque constant used by the device to turn feedforward into current.
    #[serde(default = "default_one")]
    pub kt: f64,

    /// Motion profile velocity limit.
    #[serde(default)]
    pub max_velocity: f64,
    /// Motion profile acceleration limit.
    #[serde(default)]
    pub max_acceleration: f64,

    /// Mechanical advantage (sensor-to-mechanism ratio). Must be > 0.
    #[serde(default = "default_one")]
    pub gear_ratio: f64,
    /// Invert positive direction.
    #[serde(default)]
    pub reversed: bool,
    /// Brake (true) or coast (false) when neutral.
    #[serde(default)]
    pub brake_mode: bool,

    /// Supply current limit [A] (`None` = disabled).
    #[serde(default)]
    pub supply_current_limit: Option<f64>,
    /// Stator current limit [A] (`None` = disabled).
    #[serde(default)]
    pub stator_current_limit: Option<f64>,

    /// Scale applied by the mechanism to its feedforward share before issuing it.
    #[serde(default = "default_one")]
    pub feedforward_scale: f64,
}

fn default_bus() -> String {
    "rio".to_string()
}
fn default_driver() -> String {
    "simulation".to_string()
}
fn default_one() -> f64 {
    1.0
}

impl ActuatorConfig {
    /// Config with defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: 0,
            bus: default_bus(),
            driver: default_driver(),
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            ks: 0.0,
            kg: 0.0,
            kv: 0.0,
            ka: 0.0,
            kt: 1.0,
            max_velocity: 0.0,
            max_acceleration: 0.0,
            gear_ratio: 1.0,
            reversed: false,
            brake_mode: false,
            supply_current_limit: None,
            stator_current_limit: None,
            feedforward_scale: 1.0,
        }
    }

    /// Builder-style gear ratio.
    pub fn with_gear_ratio(mut self, gear_ratio: f64) -> Self {
        self.gear_ratio = gear_ratio;
        self
    }

    /// Builder-style PID gains.
    pub fn with_pid(mut self, kp: f64, ki: f64, kd: f64) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    /// Effective current limit: the tighter of the enabled limits.
    pub fn current_limit(&self) -> Option<f64> {
        match (self.supply_current_limit, self.stator_current_limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Validate parameter bounds.
    ///
    /// # Errors
    /// `ActuatorError::InvalidConfig` if:
    /// - `name` is empty
    /// - `gear_ratio` is not finite or not > 0
    /// - a current limit is negative or non-finite
    /// - `feedforward_scale` is not finite
    pub fn validate(&self) -> Result<(), ActuatorError> {
        if self.name.is_empty() {
            return Err(ActuatorError::InvalidConfig(
                "actuator name cannot be empty".to_string(),
            ));
        }
        if !self.gear_ratio.is_finite() || self.gear_ratio <= 0.0 {
            return Err(ActuatorError::InvalidConfig(format!(
                "{}: gear_ratio must be > 0, got {}",
                self.name, self.gear_ratio
            )));
        }
        for (label, limit) in [
            ("supply_current_limit", self.supply_current_limit),
            ("stator_current_limit", self.stator_current_limit),
        ] {
            if let Some(l) = limit {
                if !l.is_finite() || l < 0.0 {
                    return Err(ActuatorError::InvalidConfig(format!(
                        "{}: {label} must be >= 0, got {l}",
                        self.name
                    )));
                }
            }
        }
        if !self.feedforward_scale.is_finite() {
            return Err(ActuatorError::InvalidConfig(format!(
                "{}: feedforward_scale must be finite",
                self.name
            )));
        }
        Ok(())
    }
}

/// Trait defining the interface a mechanism uses to talk to one actuator.
///
/// Implementations bind to real motor controllers or to simulation. The
/// control core calls the methods below from a single control thread.
///
/// # Lifecycle
///
/// 1. `apply_config()` - Called once when the port is registered on a mechanism
/// 2. `update_feedback()` - Called every cycle (read path)
/// 3. `issue_command()` - Called every cycle with an active setpoint (write path)
///
/// # Timing Contracts
///
/// | Operation | Blocking | Notes |
/// |-----------|----------|-------|
/// | `apply_config()` | allowed | setup phase only |
/// | `update_feedback()` | bounded | treated as synchronous within the tick |
/// | `issue_command()` | never | fire-and-forget |
///
/// Retry/backoff, if any, belongs to the implementation.
pub trait ActuatorPort: Send {
    /// Port name used in logs.
    fn name(&self) -> &str;

    /// Push configuration to the device.
    fn apply_config(&mut self, config: &ActuatorConfig) -> Result<(), ActuatorError>;

    /// Fill `feedback` with the latest measurement.
    ///
    /// A reachable-but-offline device reports `connected = false` and returns `Ok`;
    /// `Err` means the pull itself failed and the cycle is lost for this port.
    fn update_feedback(&mut self, feedback: &mut ActuatorFeedback) -> Result<(), ActuatorError>;

    /// Issue a motion command.
    fn issue_command(&mut self, request: &ActuatorRequest) -> Result<(), ActuatorError>;
}
