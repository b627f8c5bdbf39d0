//! Domain layer: the department tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod id;
pub mod level;
pub mod mutation;
pub mod search;
pub mod stats;

pub use arena::OrgArena;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use expansion::{ExpansionPolicy, ExpansionState};
pub use flatten::{flatten, parent_options, FlatEntry, FlatNode, ParentOption};
pub use id::{IdGenerator, IdStrategy, SequentialIdGenerator, UuidIdGenerator};
pub use level::{compute_level, MAX_DEPTH};
pub use mutation::MutationEngine;
pub use search::{fold_case, FieldMatch, SearchEngine, SearchField, SearchOutcome};
pub use stats::OrgStats;
