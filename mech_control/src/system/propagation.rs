//! Two-pass feedforward propagation over the mechanism tree.
//!
//! ```text
//! Pass 0  seed      : state ← set-point projection for every supplied target
//! Pass 1  top-down  : ff[n] = n.feedforward(motion_in[n])
//!                     effective = motion_in[n] + axis_n · position_n
//!                     motion_in[c] = motion_in[n] + k_motion(n, c) · effective
//! Pass 2  bottom-up : ff[n] += Σ k_reaction(n, c) · ff[c]     (children first)
//! ```
//!
//! Only seeded nodes take part. An unseeded node stops propagation into its
//! whole subtree; siblings are unaffected.

use std::collections::BTreeMap;

use mech_common::setpoint::SetPoint;
use nalgebra::Vector3;
use tracing::debug;

use super::coupling::{child_motion_effect, reaction_force};
use super::topology::{MechanismId, Topology};
use crate::mechanism::Mechanism;

/// Result of [`MechanismSystem::calculate_system_feedforward`](super::MechanismSystem::calculate_system_feedforward).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemFeedforward {
    /// Final feedforward per mechanism (after reactions).
    pub feedforward: BTreeMap<String, Vector3<f64>>,
    /// Top-down input motion each mechanism received.
    pub input_motion: BTreeMap<String, Vector3<f64>>,
}

impl SystemFeedforward {
    /// Final feedforward for `name`.
    pub fn get(&self, name: &str) -> Option<&Vector3<f64>> {
        self.feedforward.get(name)
    }

    /// Number of mechanisms in the result.
    pub fn len(&self) -> usize {
        self.feedforward.len()
    }

    /// True if no mechanism was reached.
    pub fn is_empty(&self) -> bool {
        self.feedforward.is_empty()
    }
}

struct Walk<'a> {
    mechanisms: &'a [Mechanism],
    topology: &'a Topology,
    seeded: Vec<bool>,
    visited: Vec<bool>,
    feedforward: Vec<Option<Vector3<f64>>>,
    input_motion: Vec<Option<Vector3<f64>>>,
}

/// Run all three passes. `mechanisms` is indexed by `MechanismId`.
pub(crate) fn propagate(
    mechanisms: &mut [Mechanism],
    topology: &Topology,
    root: Option<MechanismId>,
    setpoints: &[(MechanismId, SetPoint)],
) -> SystemFeedforward {
    let n = mechanisms.len();
    let mut seeded = vec![false; n];
    for (id, setpoint) in setpoints {
        if let Some(m) = mechanisms.get_mut(id.0) {
            m.seed_state(setpoint);
            seeded[id.0] = true;
        }
    }

    let Some(root) = root else {
        return SystemFeedforward::default();
    };

    let mut walk = Walk {
        mechanisms: &*mechanisms,
        topology,
        seeded,
        visited: vec![false; n],
        feedforward: vec![None; n],
        input_motion: vec![None; n],
    };
    walk.top_down(root, Vector3::zeros());
    walk.bottom_up(root);

    let mut out = SystemFeedforward::default();
    for (i, m) in walk.mechanisms.iter().enumerate() {
        if let (Some(ff), Some(motion)) = (walk.feedforward[i], walk.input_motion[i]) {
            out.feedforward.insert(m.name().to_string(), ff);
            out.input_motion.insert(m.name().to_string(), motion);
        }
    }
    out
}

impl Walk<'_> {
    fn top_down(&mut self, id: MechanismId, parent_motion: Vector3<f64>) {
        if !self.seeded[id.0] || self.visited[id.0] {
            return;
        }
        self.visited[id.0] = true;

        let mechanism = &self.mechanisms[id.0];
        let base = mechanism.feedforward(&parent_motion);
        let effective = parent_motion + mechanism.axis_motion();
        let parent_type = mechanism.mechanism_type();
        debug!(
            mechanism = mechanism.name(),
            ?parent_motion,
            ?base,
            "Top-down feedforward"
        );

        self.feedforward[id.0] = Some(base);
        self.input_motion[id.0] = Some(parent_motion);

        let topology = self.topology;
        for &child in topology.children(id) {
            if !self.seeded[child.0] {
                continue;
            }
            let child_type = self.mechanisms[child.0].mechanism_type();
            let effect = child_motion_effect(parent_type, child_type, &effective);
            self.top_down(child, parent_motion + effect);
        }
    }

    fn bottom_up(&mut self, id: MechanismId) -> Vector3<f64> {
        let Some(own) = self.feedforward[id.0] else {
            return Vector3::zeros();
        };
        let parent_type = self.mechanisms[id.0].mechanism_type();

        let mut reaction = Vector3::zeros();
        let topology = self.topology;
        for &child in topology.children(id) {
            if self.feedforward[child.0].is_none() {
                continue;
            }
            let child_total = self.bottom_up(child);
            let child_type = self.mechanisms[child.0].mechanism_type();
            reaction += reaction_force(parent_type, child_type, &child_total);
        }

        let total = own + reaction;
        debug!(
            mechanism = self.mechanisms[id.0].name(),
            ?reaction,
            ?total,
            "Bottom-up reaction"
        );
        self.feedforward[id.0] = Some(total);
        total
    }
}
