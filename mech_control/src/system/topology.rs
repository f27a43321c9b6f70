//! Parent/child links of the mechanism arena.
//!
//! Mechanisms are addressed by a stable [`MechanismId`] (their index in the
//! arena). Each node stores at most one parent and an ordered child list.
//! Links are only added through [`Topology::link`], which keeps the graph a
//! forest: no self-links, no second parent, no cycles.

/// Stable index of a mechanism inside a [`MechanismSystem`](super::MechanismSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MechanismId(pub(crate) usize);

impl MechanismId {
    /// Arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Why a link was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    /// Parent and child are the same node.
    SelfLink,
    /// Child already has a parent (carried).
    HasParent(MechanismId),
    /// Child is an ancestor of the parent.
    Cycle,
}

/// Forest of parent/child links.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    parent: Vec<Option<MechanismId>>,
    children: Vec<Vec<MechanismId>>,
}

impl Topology {
    /// Empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unlinked node and return its id.
    pub fn push(&mut self) -> MechanismId {
        let id = MechanismId(self.parent.len());
        self.parent.push(None);
        self.children.push(Vec::new());
        id
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// True if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Parent of `id`.
    #[inline]
    pub fn parent(&self, id: MechanismId) -> Option<MechanismId> {
        self.parent.get(id.0).copied().flatten()
    }

    /// Children of `id` in link order.
    #[inline]
    pub fn children(&self, id: MechanismId) -> &[MechanismId] {
        self.children.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether `parent → child` may be added.
    pub fn check_link(&self, parent: MechanismId, child: MechanismId) -> Result<(), LinkRejection> {
        if parent == child {
            return Err(LinkRejection::SelfLink);
        }
        if let Some(existing) = self.parent(child) {
            return Err(LinkRejection::HasParent(existing));
        }
        if self.is_ancestor(child, parent) {
            return Err(LinkRejection::Cycle);
        }
        Ok(())
    }

    /// Add `parent → child`. Nothing changes on rejection.
    pub fn link(&mut self, parent: MechanismId, child: MechanismId) -> Result<(), LinkRejection> {
        self.check_link(parent, child)?;
        self.parent[child.0] = Some(parent);
        self.children[parent.0].push(child);
        Ok(())
    }

    /// True if `ancestor` is `node` or lies on the parent chain above it.
    pub fn is_ancestor(&self, ancestor: MechanismId, node: MechanismId) -> bool {
        let mut steps = 0;
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.len() {
                return false;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nodes reachable from `root`, depth-first pre-order.
    pub fn subtree(&self, root: MechanismId) -> Vec<MechanismId> {
        let mut out = Vec::new();
        let mut visited = vec![false; self.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id.0 >= visited.len() || visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }
}
