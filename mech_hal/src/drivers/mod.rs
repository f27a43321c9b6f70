//! Actuator driver implementations.
//!
//! - [`simulation`] - Software motor model for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `ActuatorPort` from `mech_common::actuator`
//! 3. Register its factory in [`register_builtin`]

pub mod simulation;

use crate::driver_registry::ActuatorRegistry;
use tracing::warn;

/// Register every built-in driver on `registry`.
///
/// Names already present are left alone.
pub fn register_builtin(registry: &mut ActuatorRegistry) {
    if let Err(e) = registry.register("simulation", simulation::create_port) {
        warn!(error = %e, "Built-in driver not registered");
    }
}
