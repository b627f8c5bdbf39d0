//! Level derivation from the parent chain.

use tracing::instrument;

use crate::domain::arena::OrgArena;
use crate::domain::entities::NodeId;
use crate::domain::error::{DomainError, DomainResult};

/// Deepest level a department may have. Roots are level 1.
pub const MAX_DEPTH: u8 = 6;

/// Level a new child of `parent_id` would get.
///
/// Pure function of the current arena: roots are 1, everything else is the
/// parent's level plus one. Does not check [`MAX_DEPTH`]; the mutation engine does.
#[instrument(level = "trace", skip(arena))]
pub fn compute_level(parent_id: Option<&NodeId>, arena: &OrgArena) -> DomainResult<u8> {
    match parent_id {
        None => Ok(1),
        Some(id) => arena
            .find_by_id(id)
            .map(|parent| parent.level.saturating_add(1))
            .ok_or_else(|| DomainError::NotFound(id.clone())),
    }
}
