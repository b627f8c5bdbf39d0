//! Application services
//!
//! Concrete service implementations that orchestrate the tree engine.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod import;
mod organization;

pub use import::{ImportService, SeedDepartment, SeedDocument};
pub use organization::OrganizationService;
