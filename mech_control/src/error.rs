//! Error types and per-cycle fault flags.
//!
//! Configuration mistakes (bad axis, duplicate names, relations that break the
//! tree) are rejected with an error and leave the target untouched. Runtime
//! actuator failures are reported per mechanism; bulk operations visit every
//! mechanism first and then return all failures together.

use bitflags::bitflags;
use mech_common::actuator::ActuatorError;
use mech_common::physics::PhysicsError;
use thiserror::Error;

bitflags! {
    /// Degraded conditions seen by a mechanism during the current cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MechanismFault: u8 {
        /// A feedback pull returned an error; control is skipped this cycle.
        const FEEDBACK_FAILED       = 0x01;
        /// An actuator reported `connected = false`.
        const ACTUATOR_DISCONNECTED = 0x02;
        /// A command could not be issued.
        const COMMAND_FAILED        = 0x04;
    }
}

impl MechanismFault {
    /// Faults that make the mechanism skip `execute_control`.
    pub const BLOCKS_CONTROL: Self = Self::FEEDBACK_FAILED;
}

/// Errors raised by a single mechanism.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MechanismError {
    /// Axis vector is zero or non-finite.
    #[error("{mechanism}: axis must be a finite non-zero vector")]
    InvalidAxis {
        /// Mechanism name.
        mechanism: String,
    },

    /// An actuator with this name is already registered.
    #[error("{mechanism}: actuator '{actuator}' is already registered")]
    DuplicateActuator {
        /// Mechanism name.
        mechanism: String,
        /// Actuator name.
        actuator: String,
    },

    /// Gear ratio is not a finite positive number.
    #[error("{mechanism}: actuator '{actuator}' gear ratio must be > 0, got {gear_ratio}")]
    InvalidGearRatio {
        /// Mechanism name.
        mechanism: String,
        /// Actuator name.
        actuator: String,
        /// Rejected value.
        gear_ratio: f64,
    },

    /// Tolerance is negative or non-finite.
    #[error("{mechanism}: {which} tolerance must be finite and >= 0, got {value}")]
    InvalidTolerance {
        /// Mechanism name.
        mechanism: String,
        /// `"position"` or `"velocity"`.
        which: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Physical properties rejected.
    #[error("{mechanism}: {source}")]
    Physics {
        /// Mechanism name.
        mechanism: String,
        /// Underlying error.
        source: PhysicsError,
    },

    /// An actuator port operation failed.
    #[error("{mechanism}: {source}")]
    Actuator {
        /// Mechanism name.
        mechanism: String,
        /// Underlying error.
        source: ActuatorError,
    },
}

impl MechanismError {
    /// Name of the mechanism that raised the error.
    pub fn mechanism(&self) -> &str {
        match self {
            Self::InvalidAxis { mechanism }
            | Self::DuplicateActuator { mechanism, .. }
            | Self::InvalidGearRatio { mechanism, .. }
            | Self::InvalidTolerance { mechanism, .. }
            | Self::Physics { mechanism, .. }
            | Self::Actuator { mechanism, .. } => mechanism,
        }
    }
}

/// Errors raised by [`MechanismSystem`](crate::system::MechanismSystem).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SystemError {
    /// A mechanism with this name is already registered.
    #[error("mechanism '{0}' is already registered")]
    DuplicateMechanism(String),

    /// No mechanism with this name.
    #[error("unknown mechanism '{0}'")]
    UnknownMechanism(String),

    /// Parent and child are the same mechanism.
    #[error("mechanism '{0}' cannot be its own parent")]
    SelfRelation(String),

    /// Child already has a parent.
    #[error("mechanism '{child}' already has parent '{existing}'")]
    ParentConflict {
        /// Child name.
        child: String,
        /// Current parent.
        existing: String,
    },

    /// Relation would close a cycle.
    #[error("relation '{parent}' -> '{child}' would create a cycle")]
    CycleDetected {
        /// Proposed parent.
        parent: String,
        /// Proposed child.
        child: String,
    },

    /// Mechanism-level error.
    #[error(transparent)]
    Mechanism(#[from] MechanismError),

    /// A bulk operation finished but some mechanisms failed.
    #[error("{} mechanism(s) failed this cycle", .0.len())]
    CycleFaults(Vec<MechanismError>),
}
