//! # Mechanism Control Library
//!
//! Hierarchical feedforward/control engine for multi-body mechanical
//! structures such as an elevator carrying an arm.
//!
//! ## Layers
//!
//! 1. **Mechanism**: one moving body with actuator ports, aggregated state,
//!    set-point tracking, feedforward and its distribution across actuators
//! 2. **MechanismKind**: `Linear` / `Rotating` axis data, dispatched through a
//!    single feedforward function per tag
//! 3. **MechanismSystem**: arena tree of mechanisms with two-pass feedforward
//!    propagation (motion top-down, reactions bottom-up) and bulk lifecycle
//! 4. **CycleRunner**: fixed-period `update → control` loop
//! 5. **SystemConfig**: TOML description, validated and built into a system
//!
//! ## Data Flow
//!
//! ```text
//! ActuatorPort::update_feedback ─► Mechanism state (mean)
//!                                        │
//!            calculate_system_feedforward (optional planning pass)
//!                                        │
//! Mechanism::execute_control ─► distribute ─► ActuatorPort::issue_command
//! ```

pub mod config;
pub mod cycle;
pub mod error;
pub mod mechanism;
pub mod system;

pub use crate::config::{BuildError, SystemConfig};
pub use crate::cycle::{CycleRunner, CycleStats};
pub use crate::error::{MechanismError, MechanismFault, SystemError};
pub use crate::mechanism::{
    DistributionPolicy, FeedforwardBreakdown, KinematicState, Mechanism, MechanismKind,
    MechanismType,
};
pub use crate::system::{MechanismId, MechanismSystem, SystemFeedforward};
