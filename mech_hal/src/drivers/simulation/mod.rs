//! Simulation driver.
//!
//! Software actuators for development and testing without hardware.

mod motor;
mod port;

pub use motor::MotorModel;
pub use port::{SimHandle, SimulatedActuator};

use mech_common::actuator::{ActuatorConfig, ActuatorPort};

/// Factory registered under `"simulation"`.
pub fn create_port(config: &ActuatorConfig) -> Box<dyn ActuatorPort> {
    Box::new(SimulatedActuator::new(config.name.clone()))
}
