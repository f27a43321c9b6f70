//! Prelude module for common re-exports.
//!
//! `use mech_common::prelude::*;` brings in the types most call sites need.
//!
//! # Usage
//!
//! ```rust
//! use mech_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{ASSUMED_ACTUATOR_EFFICIENCY, CYCLE_TIME_MS, GRAVITY};

// ─── Actuators ──────────────────────────────────────────────────────
pub use crate::actuator::{
    ActuatorConfig, ActuatorError, ActuatorFactory, ActuatorFeedback, ActuatorPort,
    ActuatorRequest,
};

// ─── Physics / Motion ───────────────────────────────────────────────
pub use crate::physics::{Material, PhysicalProperties, PhysicsError};
pub use crate::setpoint::SetPoint;

/// Default control period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_millis(CYCLE_TIME_MS);
