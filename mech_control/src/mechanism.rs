//! Mechanism module root.
//!
//! One controllable moving body and the pieces it is built from.

pub mod body;
pub mod distribution;
pub mod feedforward;
pub mod kind;
pub mod state;

pub use body::Mechanism;
pub use distribution::DistributionPolicy;
pub use feedforward::{FeedforwardBreakdown, compute_feedforward};
pub use kind::{MechanismKind, MechanismType};
pub use state::KinematicState;
