//! Application layer: services and use cases
//!
//! This layer orchestrates the tree engine and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod request;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use request::{ErrorKind, Payload, Request, RequestError, RequestScript, Response};
