//! Workspace-wide constants.
//!
//! Single source of truth for physical constants, model coefficients and
//! numeric limits. Imported by all crates.

/// Standard gravitational acceleration [m/s²]. Gravity acts along −Z.
pub const GRAVITY: f64 = 9.81;

/// Viscous friction coefficient used by linear mechanisms [N·s/m].
pub const LINEAR_FRICTION_COEFFICIENT: f64 = 0.1;

/// Efficiency assumed for every actuator when splitting feedforward.
pub const ASSUMED_ACTUATOR_EFFICIENCY: f64 = 0.85;

/// Nominal control period [ms].
pub const CYCLE_TIME_MS: u64 = 20;

/// Lower bound for a configured control period [ms].
pub const CYCLE_TIME_MS_MIN: u64 = 1;

/// Upper bound for a configured control period [ms].
pub const CYCLE_TIME_MS_MAX: u64 = 1000;

/// Maximum number of mechanisms in one system description.
pub const MAX_MECHANISMS: usize = 64;

/// Maximum number of actuators registered on one mechanism.
pub const MAX_ACTUATORS_PER_MECHANISM: usize = 16;

/// Default system description path used by the CLI.
pub const DEFAULT_CONFIG_PATH: &str = "config/example_robot.toml";
