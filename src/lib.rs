//! Organization tree engine: an arena-backed forest of departments with
//! bounded depth, cascading delete and ancestor-aware search.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
