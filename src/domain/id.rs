//! Node id allocation.
//!
//! Generators never fail and never hand out the same id twice for their lifetime.
//! The arena still rejects duplicates (see [`DomainError::DuplicateId`]) in case a
//! caller mixes generators or seeds ids by hand.
//!
//! [`DomainError::DuplicateId`]: crate::domain::DomainError::DuplicateId

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::NodeId;

/// Source of fresh node ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&mut self) -> NodeId;
}

/// Monotonic counter: `"1"`, `"2"`, `"3"`, ...
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        NodeId::new(id.to_string())
    }
}

/// Random UUID v4 ids.
#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> NodeId {
        NodeId::new(Uuid::new_v4().to_string())
    }
}

/// Which generator to build, as named in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Sequential,
    Uuid,
}

impl IdStrategy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            IdStrategy::Sequential => Box::new(SequentialIdGenerator::new()),
            IdStrategy::Uuid => Box::new(UuidIdGenerator),
        }
    }
}

impl IdGenerator for Box<dyn IdGenerator> {
    fn next_id(&mut self) -> NodeId {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn given_sequential_generator_when_called_then_counts_up_from_one() {
        let mut gen = SequentialIdGenerator::new();
        assert_eq!(gen.next_id().as_str(), "1");
        assert_eq!(gen.next_id().as_str(), "2");
        assert_eq!(gen.next_id().as_str(), "3");
    }

    #[test]
    fn given_rapid_calls_when_generating_then_ids_are_unique() {
        for strategy in [IdStrategy::Sequential, IdStrategy::Uuid] {
            let mut gen = strategy.generator();
            let ids: HashSet<NodeId> = (0..10_000).map(|_| gen.next_id()).collect();
            assert_eq!(ids.len(), 10_000, "{strategy:?} produced a collision");
        }
    }
}
