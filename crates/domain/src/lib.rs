//! Order workflow engine.
//!
//! [`OrderOrchestrator`] composes the order store, the two cache
//! namespaces, and the resilient inventory gateway into the
//! create/read/update/delete workflows, keeping the caches coherent
//! with every mutation.

mod error;
mod orchestrator;

pub use error::OrderError;
pub use orchestrator::OrderOrchestrator;
