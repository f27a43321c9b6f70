//! Mechanism control common library
//!
//! Shared value types and contracts used by every crate of the mechanism
//! control workspace.
//!
//! # Module Structure
//!
//! - [`actuator`] - Actuator port trait, feedback/request records, actuator configuration
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Physical constants and workspace-wide limits
//! - [`physics`] - Immutable physical properties of a moving body
//! - [`setpoint`] - Motion targets handed to mechanisms
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use mech_common::prelude::*;
//!
//! let target = SetPoint::new(1.0, 0.0, 0.0, 0.0);
//! assert!(target.is_position_mode());
//! ```

pub mod actuator;
pub mod config;
pub mod consts;
pub mod physics;
pub mod prelude;
pub mod setpoint;
