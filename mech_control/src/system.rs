//! Mechanism system root.
//!
//! A named, rooted tree of mechanisms stored in an arena, the coupling tables
//! between mechanism types, and the two-pass feedforward propagation.

pub mod coupling;
pub mod manager;
pub mod propagation;
pub mod topology;

pub use manager::MechanismSystem;
pub use propagation::SystemFeedforward;
pub use topology::MechanismId;
