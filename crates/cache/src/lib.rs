//! Two-tier read cache for the order service.
//!
//! [`EntryCache`] holds one order view per order id; [`QueryCache`]
//! holds one page of search results per canonical composite key. The
//! two namespaces are independent: the orchestrator decides when to
//! write, evict, or clear each one. Absence is never cached, and
//! expired slots are evicted lazily on read.

mod entry;
mod query;

pub use entry::EntryCache;
pub use query::{QueryCache, QueryKey};

use std::time::Duration;

/// Default time-to-live for both cache namespaces.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
