//! Mutation engine: the only writer of the forest.
//!
//! Every operation validates first and writes last, so a failed call leaves
//! the arena exactly as it was.

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::domain::arena::OrgArena;
use crate::domain::entities::{Department, DepartmentFields, DepartmentPatch, NodeId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::id::{IdGenerator, SequentialIdGenerator};
use crate::domain::level::{compute_level, MAX_DEPTH};

/// Owns the forest together with the id generator that feeds it.
#[derive(Debug, Clone)]
pub struct MutationEngine<G = Box<dyn IdGenerator>> {
    arena: OrgArena,
    ids: G,
}

impl MutationEngine<SequentialIdGenerator> {
    /// Empty forest with `"1"`, `"2"`, ... ids.
    pub fn sequential() -> Self {
        Self::new(SequentialIdGenerator::new())
    }
}

impl<G: IdGenerator> MutationEngine<G> {
    pub fn new(ids: G) -> Self {
        Self::with_arena(OrgArena::new(), ids)
    }

    pub fn with_arena(arena: OrgArena, ids: G) -> Self {
        Self { arena, ids }
    }

    pub fn arena(&self) -> &OrgArena {
        &self.arena
    }

    pub fn into_arena(self) -> OrgArena {
        self.arena
    }

    /// Create a department under `parent_id`, or as a new root when `None`.
    ///
    /// # Errors
    /// * [`DomainError::NotFound`] if the parent does not exist
    /// * [`DomainError::DepthExceeded`] if the new level would exceed [`MAX_DEPTH`]
    /// * [`DomainError::DuplicateId`] if the generator returned an id already in use
    #[instrument(level = "debug", skip(self, fields), fields(name = %fields.name))]
    pub fn insert(
        &mut self,
        parent_id: Option<&NodeId>,
        fields: DepartmentFields,
    ) -> DomainResult<NodeId> {
        let level = compute_level(parent_id, &self.arena)?;
        if level > MAX_DEPTH {
            warn!("insert rejected: level {} exceeds {}", level, MAX_DEPTH);
            return Err(DomainError::DepthExceeded { max: MAX_DEPTH });
        }

        let id = self.ids.next_id();
        let node = Department::from_fields(id.clone(), parent_id.cloned(), level, fields, Utc::now());
        self.arena.attach(node)?;

        debug!("inserted {} at level {}", id, level);
        Ok(id)
    }

    /// Merge `patch` into the department `id`.
    ///
    /// Only name, code, manager and status change; level, parent and children
    /// are never touched.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update(&mut self, id: &NodeId, patch: DepartmentPatch) -> DomainResult<()> {
        let node = self
            .arena
            .find_by_id_mut(id)
            .ok_or_else(|| DomainError::NotFound(id.clone()))?;
        node.apply(patch);
        debug!("updated {}", id);
        Ok(())
    }

    /// Remove `id` and its entire subtree. Returns how many departments were removed.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: &NodeId) -> DomainResult<usize> {
        let removed = self.arena.remove_subtree(id)?;
        debug!("deleted {} ({} departments)", id, removed);
        Ok(removed)
    }
}
