//! Deferred node removal.

use std::collections::HashSet;

use crate::dom::{NodeId, XmlDom};

/// Nodes consumed by a substitution, detached only after the walk is done so
/// sibling iteration in progress stays valid.
#[derive(Debug, Default)]
pub struct RemovalSet {
    pending: HashSet<NodeId>,
    order: Vec<NodeId>,
}

impl RemovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: NodeId) {
        if self.pending.insert(id) {
            self.order.push(id);
        }
    }

    /// True if `id` or any of its ancestors is pending removal.
    pub fn covers(&self, dom: &XmlDom, id: NodeId) -> bool {
        self.pending.contains(&id) || dom.ancestors(id).any(|a| self.pending.contains(&a))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Detach every marked node and clear the set. Returns how many were
    /// removed.
    pub fn apply(&mut self, dom: &mut XmlDom) -> usize {
        let count = self.order.len();
        for id in self.order.drain(..) {
            dom.detach(id);
        }
        self.pending.clear();
        count
    }
}
