//! System description (TOML) with validation and build.
//!
//! ```toml
//! [shared]
//! service_name = "example-robot"
//!
//! [system]
//! name = "robot"
//! cycle_time_ms = 20
//!
//! [[mechanisms]]
//! name = "elevator"
//! kind = "linear"
//! axis = [0.0, 0.0, 1.0]
//!
//! [mechanisms.properties]
//! mass = 10.0
//!
//! [[mechanisms.actuators]]
//! name = "elevator-left"
//! gear_ratio = 10.0
//!
//! [[relations]]
//! parent = "elevator"
//! child = "arm"
//!
//! [[setpoints]]
//! mechanism = "elevator"
//! position = 1.0
//! ```
//!
//! Validation covers name uniqueness, numeric bounds, relation endpoints, one
//! parent per child and acyclicity. [`SystemConfig::build`] turns a valid
//! description into a ready [`MechanismSystem`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use mech_common::actuator::{ActuatorConfig, ActuatorError};
use mech_common::config::{ConfigError, SharedConfig, Validate};
use mech_common::consts::{
    CYCLE_TIME_MS, CYCLE_TIME_MS_MAX, CYCLE_TIME_MS_MIN, MAX_ACTUATORS_PER_MECHANISM,
    MAX_MECHANISMS,
};
use mech_common::physics::PhysicalPropertiesConfig;
use mech_common::setpoint::SetPoint;
use mech_hal::ActuatorRegistry;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::{MechanismError, SystemError};
use crate::mechanism::{DistributionPolicy, Mechanism, MechanismType};
use crate::mechanism::body::{DEFAULT_POSITION_TOLERANCE, DEFAULT_VELOCITY_TOLERANCE};
use crate::system::MechanismSystem;

// ─── Error Type ─────────────────────────────────────────────────────

/// Failure while turning a description into a live system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Description rejected by validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Driver lookup failed.
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
    /// System assembly failed.
    #[error(transparent)]
    System(#[from] SystemError),
}

impl From<MechanismError> for BuildError {
    fn from(e: MechanismError) -> Self {
        Self::System(SystemError::Mechanism(e))
    }
}

// ─── Description ────────────────────────────────────────────────────

/// `[system]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSection {
    /// System name.
    pub name: String,
    /// Control period [ms].
    #[serde(default = "default_cycle_time_ms")]
    pub cycle_time_ms: u64,
    /// Propagation root (default: first mechanism).
    #[serde(default)]
    pub root: Option<String>,
}

fn default_cycle_time_ms() -> u64 {
    CYCLE_TIME_MS
}

/// One `[[mechanisms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanismConfig {
    /// Unique name.
    pub name: String,
    /// `linear` or `rotating`.
    pub kind: MechanismType,
    /// Motion axis (linear) or rotation axis (rotating).
    pub axis: [f64; 3],
    /// Start point (linear) or pivot point (rotating).
    #[serde(default)]
    pub origin: [f64; 3],
    /// Position tolerance [m or rad].
    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: f64,
    /// Velocity tolerance [m/s or rad/s].
    #[serde(default = "default_velocity_tolerance")]
    pub velocity_tolerance: f64,
    /// Feedforward distribution policy.
    #[serde(default)]
    pub distribution: DistributionPolicy,
    /// Enable non-inertial frame compensation.
    #[serde(default)]
    pub frame_compensation: bool,
    /// Mass properties.
    pub properties: PhysicalPropertiesConfig,
    /// Actuators in registration order.
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

fn default_position_tolerance() -> f64 {
    DEFAULT_POSITION_TOLERANCE
}
fn default_velocity_tolerance() -> f64 {
    DEFAULT_VELOCITY_TOLERANCE
}

/// One `[[relations]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Parent mechanism.
    pub parent: String,
    /// Child mechanism.
    pub child: String,
}

/// One `[[setpoints]]` entry. Omit `position` for a velocity-mode target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPointConfig {
    /// Target mechanism.
    pub mechanism: String,
    /// Target position.
    #[serde(default)]
    pub position: Option<f64>,
    /// Target velocity.
    #[serde(default)]
    pub velocity: f64,
    /// Target acceleration.
    #[serde(default)]
    pub acceleration: f64,
    /// Extra feedforward.
    #[serde(default)]
    pub feedforward: f64,
}

impl SetPointConfig {
    /// Value object.
    pub fn to_setpoint(&self) -> SetPoint {
        SetPoint {
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            feedforward: self.feedforward,
        }
    }
}

/// Whole system description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Common fields.
    #[serde(default)]
    pub shared: SharedConfig,
    /// System table.
    pub system: SystemSection,
    /// Mechanisms in registration order.
    #[serde(default)]
    pub mechanisms: Vec<MechanismConfig>,
    /// Parent/child relations.
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    /// Initial targets.
    #[serde(default)]
    pub setpoints: Vec<SetPointConfig>,
}

impl SystemConfig {
    /// Control period.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_millis(self.system.cycle_time_ms)
    }

    /// Initial targets keyed by mechanism name.
    pub fn setpoint_map(&self) -> HashMap<String, SetPoint> {
        self.setpoints
            .iter()
            .map(|s| (s.mechanism.clone(), s.to_setpoint()))
            .collect()
    }

    /// Validate, create actuator ports through `registry` and assemble the system.
    ///
    /// Mechanisms are registered in file order, then relations, root and
    /// initial targets are applied.
    pub fn build(&self, registry: &ActuatorRegistry) -> Result<MechanismSystem, BuildError> {
        self.validate()?;

        let mut system = MechanismSystem::new(self.system.name.clone());
        for mc in &self.mechanisms {
            let mechanism = build_mechanism(mc, registry)?;
            system.register_mechanism(mechanism)?;
        }
        for rel in &self.relations {
            system.set_parent_child(&rel.parent, &rel.child)?;
        }
        if let Some(root) = &self.system.root {
            system.set_root(root)?;
        }
        for sp in &self.setpoints {
            system.set_target_setpoint(&sp.mechanism, sp.to_setpoint())?;
        }

        info!(
            system = %self.system.name,
            mechanisms = system.len(),
            relations = self.relations.len(),
            root = ?system.root(),
            "System built"
        );
        Ok(system)
    }
}

fn build_mechanism(
    mc: &MechanismConfig,
    registry: &ActuatorRegistry,
) -> Result<Mechanism, BuildError> {
    let properties = mc
        .properties
        .to_properties()
        .map_err(|source| MechanismError::Physics {
            mechanism: mc.name.clone(),
            source,
        })?;
    let properties = Arc::new(properties);
    let axis = Vector3::from(mc.axis);
    let origin = Vector3::from(mc.origin);

    let mut mechanism = match mc.kind {
        MechanismType::Linear => Mechanism::linear(mc.name.clone(), properties, axis, origin)?,
        MechanismType::Rotating => Mechanism::rotating(mc.name.clone(), properties, axis, origin)?,
    }
    .with_distribution(mc.distribution)
    .with_frame_compensation(mc.frame_compensation);
    mechanism.set_tolerances(mc.position_tolerance, mc.velocity_tolerance)?;

    for ac in &mc.actuators {
        let port = registry.create(ac)?;
        mechanism.register_actuator(port, ac.clone())?;
    }
    Ok(mechanism)
}

// ─── Validation ─────────────────────────────────────────────────────

impl Validate for SystemConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        validate_system_section(&self.system)?;
        validate_mechanisms(&self.mechanisms)?;

        let names: HashSet<&str> = self.mechanisms.iter().map(|m| m.name.as_str()).collect();
        validate_relations(&self.relations, &names)?;

        if let Some(root) = &self.system.root {
            if !names.contains(root.as_str()) {
                return Err(invalid(format!("root '{root}' is not a mechanism")));
            }
        }
        for sp in &self.setpoints {
            if !names.contains(sp.mechanism.as_str()) {
                return Err(invalid(format!(
                    "set-point references unknown mechanism '{}'",
                    sp.mechanism
                )));
            }
            let sp = sp.to_setpoint();
            let values = [
                sp.position.unwrap_or(0.0),
                sp.velocity,
                sp.acceleration,
                sp.feedforward,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(invalid("set-point values must be finite".to_string()));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn validate_system_section(system: &SystemSection) -> Result<(), ConfigError> {
    if system.name.is_empty() {
        return Err(invalid("system name cannot be empty".to_string()));
    }
    if !(CYCLE_TIME_MS_MIN..=CYCLE_TIME_MS_MAX).contains(&system.cycle_time_ms) {
        return Err(invalid(format!(
            "cycle_time_ms {} out of range [{CYCLE_TIME_MS_MIN}, {CYCLE_TIME_MS_MAX}]",
            system.cycle_time_ms
        )));
    }
    Ok(())
}

fn validate_mechanisms(mechanisms: &[MechanismConfig]) -> Result<(), ConfigError> {
    if mechanisms.len() > MAX_MECHANISMS {
        return Err(invalid(format!(
            "{} mechanisms exceed the limit of {MAX_MECHANISMS}",
            mechanisms.len()
        )));
    }

    let mut seen = HashSet::new();
    for m in mechanisms {
        if m.name.is_empty() {
            return Err(invalid("mechanism name cannot be empty".to_string()));
        }
        if !seen.insert(m.name.as_str()) {
            return Err(invalid(format!("duplicate mechanism '{}'", m.name)));
        }

        let axis = Vector3::from(m.axis);
        let norm = axis.norm();
        if !norm.is_finite() || norm <= f64::EPSILON {
            return Err(invalid(format!(
                "{}: axis must be a finite non-zero vector",
                m.name
            )));
        }
        if m.origin.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!("{}: origin must be finite", m.name)));
        }
        for (which, t) in [
            ("position", m.position_tolerance),
            ("velocity", m.velocity_tolerance),
        ] {
            if !t.is_finite() || t < 0.0 {
                return Err(invalid(format!(
                    "{}: {which}_tolerance must be >= 0, got {t}",
                    m.name
                )));
            }
        }
        m.properties
            .to_properties()
            .map_err(|e| invalid(format!("{}: {e}", m.name)))?;

        if m.actuators.len() > MAX_ACTUATORS_PER_MECHANISM {
            return Err(invalid(format!(
                "{}: {} actuators exceed the limit of {MAX_ACTUATORS_PER_MECHANISM}",
                m.name,
                m.actuators.len()
            )));
        }
        let mut actuator_names = HashSet::new();
        for a in &m.actuators {
            a.validate()
                .map_err(|e| invalid(format!("{}: {e}", m.name)))?;
            if !actuator_names.insert(a.name.as_str()) {
                return Err(invalid(format!(
                    "{}: duplicate actuator '{}'",
                    m.name, a.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_relations(
    relations: &[RelationConfig],
    names: &HashSet<&str>,
) -> Result<(), ConfigError> {
    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();

    for rel in relations {
        for end in [&rel.parent, &rel.child] {
            if !names.contains(end.as_str()) {
                return Err(invalid(format!("relation references unknown mechanism '{end}'")));
            }
        }
        if rel.parent == rel.child {
            return Err(invalid(format!("'{}' cannot be its own parent", rel.parent)));
        }
        if let Some(existing) = parent_of.insert(rel.child.as_str(), rel.parent.as_str()) {
            return Err(invalid(format!(
                "'{}' has two parents: '{existing}' and '{}'",
                rel.child, rel.parent
            )));
        }
        children_of
            .entry(rel.parent.as_str())
            .or_default()
            .push(rel.child.as_str());
    }

    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut nodes: Vec<&str> = names.iter().copied().collect();
    nodes.sort_unstable();
    for node in nodes {
        if !visited.contains(node) && has_cycle(node, &children_of, &mut visited, &mut on_stack) {
            return Err(invalid("relation graph contains a cycle".to_string()));
        }
    }
    Ok(())
}

fn has_cycle<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    on_stack.insert(node);

    if let Some(children) = graph.get(node) {
        for &child in children {
            if !visited.contains(child) {
                if has_cycle(child, graph, visited, on_stack) {
                    return true;
                }
            } else if on_stack.contains(child) {
                return true;
            }
        }
    }

    on_stack.remove(node);
    false
}
