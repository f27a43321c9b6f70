//! `MechanismSystem`: registry, tree and bulk lifecycle.
//!
//! Setup phase: register mechanisms, link them, optionally pick a root.
//! Control phase: the topology is read-only; bulk operations walk the arena in
//! registration order and visit every mechanism even when some fail.

use std::collections::HashMap;

use mech_common::setpoint::SetPoint;
use tracing::{debug, info, warn};

use super::propagation::{self, SystemFeedforward};
use super::topology::{LinkRejection, MechanismId, Topology};
use crate::error::{MechanismError, SystemError};
use crate::mechanism::Mechanism;

/// A named tree of mechanisms.
#[derive(Debug)]
pub struct MechanismSystem {
    name: String,
    mechanisms: Vec<Mechanism>,
    index: HashMap<String, MechanismId>,
    topology: Topology,
    root: Option<MechanismId>,
}

impl MechanismSystem {
    /// Empty system.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mechanisms: Vec::new(),
            index: HashMap::new(),
            topology: Topology::new(),
            root: None,
        }
    }

    // ─── Setup ──────────────────────────────────────────────────────

    /// Add a mechanism. The first one becomes the root.
    ///
    /// # Errors
    /// `DuplicateMechanism` if the name is taken.
    pub fn register_mechanism(&mut self, mechanism: Mechanism) -> Result<MechanismId, SystemError> {
        if self.index.contains_key(mechanism.name()) {
            return Err(SystemError::DuplicateMechanism(mechanism.name().to_string()));
        }
        let id = self.topology.push();
        self.index.insert(mechanism.name().to_string(), id);
        info!(
            system = %self.name,
            mechanism = mechanism.name(),
            kind = ?mechanism.mechanism_type(),
            actuators = mechanism.actuator_count(),
            "Mechanism registered"
        );
        self.mechanisms.push(mechanism);
        if self.root.is_none() {
            self.root = Some(id);
        }
        Ok(id)
    }

    /// Declare `child` as mounted on `parent`.
    ///
    /// # Errors
    /// - `UnknownMechanism` if either name is unknown
    /// - `SelfRelation` if both names are equal
    /// - `ParentConflict` if `child` already has a parent
    /// - `CycleDetected` if `child` is an ancestor of `parent`
    ///
    /// Nothing changes on error.
    pub fn set_parent_child(&mut self, parent: &str, child: &str) -> Result<(), SystemError> {
        let parent_id = self.id(parent)?;
        let child_id = self.id(child)?;
        self.topology
            .link(parent_id, child_id)
            .map_err(|rejection| match rejection {
                LinkRejection::SelfLink => SystemError::SelfRelation(parent.to_string()),
                LinkRejection::HasParent(existing) => SystemError::ParentConflict {
                    child: child.to_string(),
                    existing: self.mechanisms[existing.0].name().to_string(),
                },
                LinkRejection::Cycle => SystemError::CycleDetected {
                    parent: parent.to_string(),
                    child: child.to_string(),
                },
            })?;
        info!(system = %self.name, parent, child, "Relation added");
        Ok(())
    }

    /// Make `name` the propagation root.
    ///
    /// # Errors
    /// `UnknownMechanism` if the name is unknown.
    pub fn set_root(&mut self, name: &str) -> Result<(), SystemError> {
        let id = self.id(name)?;
        self.root = Some(id);
        info!(system = %self.name, root = name, "Root set");
        Ok(())
    }

    // ─── Targets / planning ─────────────────────────────────────────

    /// Replace the target of one mechanism.
    ///
    /// # Errors
    /// `UnknownMechanism` if the name is unknown.
    pub fn set_target_setpoint(&mut self, name: &str, setpoint: SetPoint) -> Result<(), SystemError> {
        let id = self.id(name)?;
        self.mechanisms[id.0].set_target_setpoint(setpoint);
        Ok(())
    }

    /// Replace the targets of every named mechanism. Unknown names are skipped.
    pub fn set_mechanism_setpoints(&mut self, setpoints: &HashMap<String, SetPoint>) {
        for (name, setpoint) in setpoints {
            match self.index.get(name) {
                Some(id) => self.mechanisms[id.0].set_target_setpoint(*setpoint),
                None => warn!(system = %self.name, mechanism = %name, "Set-point for unknown mechanism ignored"),
            }
        }
    }

    /// Tree feedforward for a set of planned targets.
    ///
    /// Each supplied mechanism's state is forced to its set-point projection,
    /// then motion is propagated from the root down and reactions back up.
    /// Mechanisms without a set-point, and everything below them, are left
    /// out. Unknown names are skipped.
    pub fn calculate_system_feedforward(
        &mut self,
        setpoints: &HashMap<String, SetPoint>,
    ) -> SystemFeedforward {
        let mut resolved = Vec::with_capacity(setpoints.len());
        for (name, setpoint) in setpoints {
            match self.index.get(name) {
                Some(&id) => resolved.push((id, *setpoint)),
                None => warn!(system = %self.name, mechanism = %name, "Set-point for unknown mechanism ignored"),
            }
        }
        let result = propagation::propagate(&mut self.mechanisms, &self.topology, self.root, &resolved);
        debug!(system = %self.name, reached = result.len(), "System feedforward computed");
        result
    }

    // ─── Bulk lifecycle ─────────────────────────────────────────────

    /// Pull feedback into every mechanism.
    ///
    /// # Errors
    /// `CycleFaults` listing every mechanism whose feedback pull failed.
    pub fn update_all_mechanism_states(&mut self) -> Result<(), SystemError> {
        collect_faults(self.mechanisms.iter_mut().map(Mechanism::update_state))
    }

    /// Run control on every mechanism.
    ///
    /// # Errors
    /// `CycleFaults` listing every mechanism with a failed command.
    pub fn execute_all_mechanism_control(&mut self) -> Result<(), SystemError> {
        collect_faults(self.mechanisms.iter_mut().map(Mechanism::execute_control))
    }

    /// True if every mechanism is at its target. True for an empty system.
    pub fn are_all_mechanisms_at_target(&self) -> bool {
        self.mechanisms.iter().all(Mechanism::is_at_target)
    }

    /// Zero command to every actuator of every mechanism.
    ///
    /// # Errors
    /// `CycleFaults` listing mechanisms where a command failed. All other
    /// actuators have still been commanded.
    pub fn emergency_stop_all_mechanisms(&mut self) -> Result<(), SystemError> {
        warn!(system = %self.name, mechanisms = self.mechanisms.len(), "Emergency stop all");
        collect_faults(self.mechanisms.iter_mut().map(Mechanism::emergency_stop))
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// System name.
    #[inline]
    pub fn system_name(&self) -> &str {
        &self.name
    }

    /// Root mechanism name.
    pub fn root(&self) -> Option<&str> {
        self.root.map(|id| self.mechanisms[id.0].name())
    }

    /// Names reachable from the root, depth-first pre-order. Empty without a root.
    ///
    /// Mechanisms missing from this list never receive propagated motion.
    pub fn reachable(&self) -> Vec<&str> {
        self.root
            .map(|root| {
                self.topology
                    .subtree(root)
                    .into_iter()
                    .map(|id| self.mechanisms[id.0].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mechanism by name.
    pub fn mechanism(&self, name: &str) -> Option<&Mechanism> {
        self.index.get(name).map(|id| &self.mechanisms[id.0])
    }

    /// Mutable mechanism by name.
    pub fn mechanism_mut(&mut self, name: &str) -> Option<&mut Mechanism> {
        let id = *self.index.get(name)?;
        self.mechanisms.get_mut(id.0)
    }

    /// Mechanism by id.
    pub fn get(&self, id: MechanismId) -> Option<&Mechanism> {
        self.mechanisms.get(id.0)
    }

    /// Id of `name`.
    pub fn id_of(&self, name: &str) -> Option<MechanismId> {
        self.index.get(name).copied()
    }

    /// Children of `name` in link order. Empty for unknown names.
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.index
            .get(name)
            .map(|&id| {
                self.topology
                    .children(id)
                    .iter()
                    .map(|c| self.mechanisms[c.0].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent of `name`.
    pub fn parent(&self, name: &str) -> Option<&str> {
        let id = *self.index.get(name)?;
        self.topology
            .parent(id)
            .map(|p| self.mechanisms[p.0].name())
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.mechanisms.iter().map(Mechanism::name).collect()
    }

    /// Mechanisms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Mechanism> {
        self.mechanisms.iter()
    }

    /// Number of mechanisms.
    #[inline]
    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    /// True if no mechanism is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }

    fn id(&self, name: &str) -> Result<MechanismId, SystemError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SystemError::UnknownMechanism(name.to_string()))
    }
}

fn collect_faults<I>(results: I) -> Result<(), SystemError>
where
    I: Iterator<Item = Result<(), MechanismError>>,
{
    let faults: Vec<MechanismError> = results.filter_map(Result::err).collect();
    if faults.is_empty() {
        Ok(())
    } else {
        Err(SystemError::CycleFaults(faults))
    }
}
