//! Search filter and pagination types for order queries.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};

/// Filter for order searches.
///
/// Both fields are optional; an empty filter matches every non-deleted
/// order. The item-id filter uses overlap semantics: an order matches
/// when its item list contains at least one of the requested ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub item_ids: Option<Vec<ItemId>>,
}

impl OrderFilter {
    /// Creates an empty filter matching all non-deleted orders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to orders with the given status.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to orders containing any of the given items.
    pub fn with_item_ids(mut self, item_ids: Vec<ItemId>) -> Self {
        self.item_ids = Some(item_ids);
        self
    }

    /// Returns true when the order satisfies the filter predicates.
    ///
    /// Does not apply the soft-delete filter; that is the store's
    /// responsibility on every read path.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(ref wanted) = self.item_ids
            && !wanted.is_empty()
            && !order.item_ids.iter().any(|id| wanted.contains(id))
        {
            return false;
        }
        true
    }
}

/// Zero-based page request with a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// Default page size when the caller does not specify one.
    pub const DEFAULT_SIZE: usize = 10;

    /// Creates a page request, clamping the size to at least 1.
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    /// Returns the number of records to skip.
    ///
    /// Saturates rather than overflowing: page numbers are
    /// client-supplied, and a page past the end of the data is an empty
    /// result, not a panic.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// One page of results together with the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Creates a page from already-sliced items.
    pub fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
        }
    }

    /// Maps the page items, preserving pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}
