//! Order persistence: the `Order` record, search types, and the
//! [`OrderStore`] contract with in-memory and PostgreSQL backends.
//!
//! Every read path applies the soft-delete filter: a record with a
//! non-null `deleted_at` is invisible to lookups and searches while
//! still occupying storage.

mod error;
mod memory;
mod order;
mod postgres;
mod query;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use order::{Order, OrderStatus, OrderView};
pub use postgres::PostgresOrderStore;
pub use query::{OrderFilter, Page, PageRequest};
pub use store::OrderStore;
