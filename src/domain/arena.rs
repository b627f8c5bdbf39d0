//! Arena + index storage for the department forest.
//!
//! All departments live in one [`generational_arena::Arena`]; a map from
//! [`NodeId`] to arena [`Index`] makes lookups O(1). Relationships are ids only:
//! `parent_id` upwards, `children` downwards, plus the ordered root list.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::entities::{Department, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Owns every department of the forest.
#[derive(Debug, Clone, Default)]
pub struct OrgArena {
    /// Arena storage for all departments
    arena: Arena<Department>,
    /// Id lookup into the arena
    index: HashMap<NodeId, Index>,
    /// Root ids in insertion order
    roots: Vec<NodeId>,
}

impl OrgArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &Department> + '_ {
        self.roots.iter().filter_map(|id| self.find_by_id(id))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find_by_id(&self, id: &NodeId) -> Option<&Department> {
        self.index.get(id).and_then(|&idx| self.arena.get(idx))
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &NodeId) -> Option<&mut Department> {
        let idx = *self.index.get(id)?;
        self.arena.get_mut(idx)
    }

    /// Children of `id` in insertion order; empty if `id` is unknown.
    pub fn children(&self, id: &NodeId) -> Vec<&Department> {
        self.find_by_id(id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.find_by_id(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &NodeId) -> Option<&Department> {
        let node = self.find_by_id(id)?;
        node.parent_id.as_ref().and_then(|p| self.find_by_id(p))
    }

    /// Ancestor ids of `id`, root first, excluding `id` itself.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.find_by_id(id).and_then(|n| n.parent_id.clone());
        while let Some(parent_id) = current {
            current = self.find_by_id(&parent_id).and_then(|n| n.parent_id.clone());
            chain.push(parent_id);
        }
        chain.reverse();
        chain
    }

    /// Descendant ids of `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<&NodeId> = match self.find_by_id(id) {
            Some(node) => node.children.iter().rev().collect(),
            None => return result,
        };
        while let Some(current) = stack.pop() {
            if let Some(node) = self.find_by_id(current) {
                stack.extend(node.children.iter().rev());
                result.push(current.clone());
            }
        }
        result
    }

    /// Deepest level present in the forest, 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> u8 {
        self.arena.iter().map(|(_, node)| node.level).max().unwrap_or(0)
    }

    /// Preorder over the whole forest: roots in order, parents before children.
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self)
    }

    /// Postorder over the whole forest: children before their parent.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Link a fully built department into the forest.
    ///
    /// The parent (if any) must exist and the id must be fresh; on error the
    /// arena is untouched.
    #[instrument(level = "trace", skip(self, node), fields(id = %node.id))]
    pub(crate) fn attach(&mut self, node: Department) -> DomainResult<()> {
        if self.index.contains_key(&node.id) {
            return Err(DomainError::DuplicateId(node.id));
        }
        let parent_idx = match &node.parent_id {
            Some(parent_id) => Some(
                *self
                    .index
                    .get(parent_id)
                    .ok_or_else(|| DomainError::NotFound(parent_id.clone()))?,
            ),
            None => None,
        };

        let id = node.id.clone();
        let node_idx = self.arena.insert(node);
        self.index.insert(id.clone(), node_idx);

        match parent_idx.and_then(|idx| self.arena.get_mut(idx)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        Ok(())
    }

    /// Unlink and drop `id` together with its whole subtree.
    ///
    /// Returns the number of departments removed.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn remove_subtree(&mut self, id: &NodeId) -> DomainResult<usize> {
        let parent_id = self
            .find_by_id(id)
            .ok_or_else(|| DomainError::NotFound(id.clone()))?
            .parent_id
            .clone();

        let mut doomed = self.descendants(id);
        doomed.push(id.clone());

        match parent_id {
            Some(parent_id) => {
                if let Some(parent) = self.find_by_id_mut(&parent_id) {
                    parent.children.retain(|sibling| sibling != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }

        for victim in &doomed {
            if let Some(idx) = self.index.remove(victim) {
                self.arena.remove(idx);
                trace!("removed {}", victim);
            }
        }
        Ok(doomed.len())
    }
}

pub struct PreOrderIterator<'a> {
    arena: &'a OrgArena,
    stack: Vec<&'a NodeId>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(arena: &'a OrgArena) -> Self {
        // Reverse so the first root is popped first
        let stack = arena.roots.iter().rev().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = &'a Department;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.arena.find_by_id(current) {
                self.stack.extend(node.children.iter().rev());
                return Some(node);
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a OrgArena,
    stack: Vec<(&'a NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a OrgArena) -> Self {
        let stack = arena.roots.iter().rev().map(|id| (id, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = &'a Department;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.find_by_id(current) {
                if visited {
                    return Some(node);
                }
                self.stack.push((current, true));
                for child in node.children.iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::entities::DepartmentFields;

    fn node(id: &str, parent: Option<&str>, level: u8) -> Department {
        Department::from_fields(
            NodeId::from(id),
            parent.map(NodeId::from),
            level,
            DepartmentFields::new(id, id),
            Utc::now(),
        )
    }

    /// a -> (b -> d), c ; e
    fn sample() -> OrgArena {
        let mut arena = OrgArena::new();
        for dept in [
            node("a", None, 1),
            node("b", Some("a"), 2),
            node("c", Some("a"), 2),
            node("d", Some("b"), 3),
            node("e", None, 1),
        ] {
            arena.attach(dept).unwrap();
        }
        arena
    }

    fn ids<'a>(it: impl Iterator<Item = &'a Department>) -> Vec<&'a str> {
        it.map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn given_forest_when_iterating_then_preorder_and_postorder_are_deterministic() {
        let arena = sample();
        assert_eq!(ids(arena.iter()), vec!["a", "b", "d", "c", "e"]);
        assert_eq!(ids(arena.iter_postorder()), vec!["d", "b", "c", "a", "e"]);
    }

    #[test]
    fn given_forest_when_querying_relations_then_ids_follow_structure() {
        let arena = sample();
        let d = NodeId::from("d");
        assert_eq!(arena.ancestors(&d), vec![NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(
            arena.descendants(&NodeId::from("a")),
            vec![NodeId::from("b"), NodeId::from("d"), NodeId::from("c")]
        );
        assert_eq!(arena.parent(&d).map(|p| p.id.as_str()), Some("b"));
        assert_eq!(ids(arena.children(&NodeId::from("a")).into_iter()), vec!["b", "c"]);
        assert_eq!(arena.root_count(), 2);
        assert_eq!(arena.depth(), 3);
    }

    #[test]
    fn given_existing_id_when_attaching_then_duplicate_rejected_and_arena_unchanged() {
        let mut arena = sample();
        let before = arena.len();

        let result = arena.attach(node("b", None, 1));

        assert_eq!(result, Err(DomainError::DuplicateId(NodeId::from("b"))));
        assert_eq!(arena.len(), before);
        assert_eq!(arena.root_count(), 2);
    }

    #[test]
    fn given_unknown_parent_when_attaching_then_not_found() {
        let mut arena = sample();
        let result = arena.attach(node("x", Some("nope"), 2));
        assert_eq!(result, Err(DomainError::NotFound(NodeId::from("nope"))));
        assert!(!arena.contains(&NodeId::from("x")));
    }

    #[test]
    fn given_inner_node_when_removing_subtree_then_siblings_keep_order() {
        let mut arena = sample();

        let removed = arena.remove_subtree(&NodeId::from("b")).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(ids(arena.iter()), vec!["a", "c", "e"]);
        assert!(arena.find_by_id(&NodeId::from("d")).is_none());
    }

    #[test]
    fn given_empty_arena_when_measuring_then_everything_is_zero() {
        let arena = OrgArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.depth(), 0);
        assert_eq!(arena.iter().count(), 0);
        assert_eq!(arena.iter_postorder().count(), 0);
    }
}
