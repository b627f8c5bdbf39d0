//! Flat preorder views of the forest.

use serde::Serialize;
use tracing::instrument;

use crate::domain::arena::OrgArena;
use crate::domain::entities::{Department, NodeId};
use crate::domain::level::MAX_DEPTH;

/// A department together with the ids of its ancestors, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry<'a> {
    pub node: &'a Department,
    pub ancestors: Vec<NodeId>,
}

impl FlatEntry<'_> {
    pub fn to_owned_entry(&self) -> FlatNode {
        FlatNode {
            department: self.node.clone(),
            ancestors: self.ancestors.clone(),
        }
    }
}

/// Owned counterpart of [`FlatEntry`], for snapshots handed across a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatNode {
    pub department: Department,
    pub ancestors: Vec<NodeId>,
}

/// Entry of a parent-selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentOption {
    pub id: NodeId,
    pub level: u8,
    /// Name indented two spaces per level below the root
    pub label: String,
}

/// Preorder over the whole forest: parents before children, siblings in
/// insertion order, roots in insertion order.
#[instrument(level = "debug", skip(arena), fields(len = arena.len()))]
pub fn flatten(arena: &OrgArena) -> Vec<FlatEntry<'_>> {
    let mut out = Vec::with_capacity(arena.len());
    let mut chain = Vec::new();
    for root in arena.roots() {
        visit(arena, root, &mut chain, &mut out);
    }
    out
}

fn visit<'a>(
    arena: &'a OrgArena,
    node: &'a Department,
    chain: &mut Vec<NodeId>,
    out: &mut Vec<FlatEntry<'a>>,
) {
    out.push(FlatEntry {
        node,
        ancestors: chain.clone(),
    });
    chain.push(node.id.clone());
    for child in arena.children(&node.id) {
        visit(arena, child, chain, out);
    }
    chain.pop();
}

/// Departments that can still take a child, in preorder.
pub fn parent_options(arena: &OrgArena) -> Vec<ParentOption> {
    arena
        .iter()
        .filter(|node| node.level < MAX_DEPTH)
        .map(|node| ParentOption {
            id: node.id.clone(),
            level: node.level,
            label: format!(
                "{}{}",
                "  ".repeat(usize::from(node.level.saturating_sub(1))),
                node.name
            ),
        })
        .collect()
}
