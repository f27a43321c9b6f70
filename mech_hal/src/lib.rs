//! # Mechanism HAL Library
//!
//! Actuator drivers behind the [`ActuatorPort`](mech_common::actuator::ActuatorPort)
//! contract, plus the registry that turns a driver name from a system
//! description into a live port.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        mech_hal                           │
//! │  ┌──────────────────┐         ┌────────────────────────┐  │
//! │  │ ActuatorRegistry │ ──────► │ Box<dyn ActuatorPort>  │  │
//! │  │ name → factory   │ create  │ (simulation, ...)      │  │
//! │  └──────────────────┘         └────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::ActuatorRegistry;
pub use crate::drivers::simulation::{SimHandle, SimulatedActuator};
