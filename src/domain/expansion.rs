//! Which departments are shown expanded.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::entities::NodeId;
use crate::domain::search::SearchOutcome;

/// Baseline expansion used while no query is active.
///
/// Supplied by the caller (usually from settings); nothing is expanded
/// unless it is listed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionPolicy {
    default_expanded: BTreeSet<NodeId>,
}

impl ExpansionPolicy {
    pub fn new(default_expanded: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            default_expanded: default_expanded.into_iter().collect(),
        }
    }

    pub fn default_expanded(&self) -> &BTreeSet<NodeId> {
        &self.default_expanded
    }

    /// Expansion set for `outcome`: the search's set when a query is active,
    /// the configured defaults otherwise.
    pub fn active_set(&self, outcome: &SearchOutcome) -> BTreeSet<NodeId> {
        if outcome.is_active() {
            outcome.expansion_set.clone()
        } else {
            self.default_expanded.clone()
        }
    }
}

/// Caller-side expansion state: policy plus manual toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    policy: ExpansionPolicy,
    expanded: BTreeSet<NodeId>,
}

impl ExpansionState {
    pub fn new(policy: ExpansionPolicy) -> Self {
        let expanded = policy.default_expanded().clone();
        Self { policy, expanded }
    }

    pub fn policy(&self) -> &ExpansionPolicy {
        &self.policy
    }

    pub fn expanded(&self) -> &BTreeSet<NodeId> {
        &self.expanded
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expand(&mut self, id: NodeId) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: &NodeId) {
        self.expanded.remove(id);
    }

    /// Flip `id`; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    /// Replace manual toggles with the set implied by a fresh search.
    pub fn apply_search(&mut self, outcome: &SearchOutcome) {
        self.expanded = self.policy.active_set(outcome);
        debug!(
            "expansion reset for query {:?}: {} expanded",
            outcome.query,
            self.expanded.len()
        );
    }
}
