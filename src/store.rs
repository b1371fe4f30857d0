//! Persistence seam for cart headers and line items.
//!
//! The storage engine itself is an external collaborator; the service only
//! depends on the [`CartStore`] trait. [`MemoryStore`] is the in-process
//! implementation used by the server and the test suite.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::model::{CartHeader, CartLine};

/// Storage layer failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to cart headers and line items.
///
/// Lookup by user is first-match-wins in insertion order; uniqueness of
/// (user) and (header, product) pairs is maintained by the service's upsert
/// protocol, not enforced here.
pub trait CartStore: Send + Sync {
    fn header_for_user(&self, user_id: &str) -> StoreResult<Option<CartHeader>>;
    fn header_by_id(&self, header_id: u64) -> StoreResult<Option<CartHeader>>;
    fn insert_header(&self, user_id: &str, coupon_code: Option<String>) -> StoreResult<CartHeader>;
    /// Attach (`Some`) or clear (`None`) the header's coupon code.
    fn set_coupon(&self, header_id: u64, coupon_code: Option<String>) -> StoreResult<bool>;
    fn delete_header(&self, header_id: u64) -> StoreResult<bool>;

    fn lines_for_header(&self, header_id: u64) -> StoreResult<Vec<CartLine>>;
    fn line_by_id(&self, line_id: u64) -> StoreResult<Option<CartLine>>;
    fn line_for_product(&self, header_id: u64, product_id: u64) -> StoreResult<Option<CartLine>>;
    fn count_lines(&self, header_id: u64) -> StoreResult<usize>;
    fn insert_line(&self, header_id: u64, product_id: u64, count: u32) -> StoreResult<CartLine>;
    /// Overwrite the count of one row. Returns the updated row, or `None`
    /// when no row with that id exists.
    fn set_line_count(&self, line_id: u64, count: u32) -> StoreResult<Option<CartLine>>;
    fn delete_line(&self, line_id: u64) -> StoreResult<bool>;

    /// Overall row counts, used by health reporting.
    fn stats(&self) -> StoreResult<StoreStats>;
}

#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub headers: usize,
    pub lines: usize,
}

/// In-memory cart store guarded for concurrent access.
///
/// Row ids are issued from monotonically increasing counters, mirroring
/// identity columns; `BTreeMap` keeps iteration in insertion order so
/// first-match-wins lookups are deterministic.
pub struct MemoryStore {
    headers: RwLock<BTreeMap<u64, CartHeader>>,
    lines: RwLock<BTreeMap<u64, CartLine>>,
    next_header_id: AtomicU64,
    next_line_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            headers: RwLock::new(BTreeMap::new()),
            lines: RwLock::new(BTreeMap::new()),
            next_header_id: AtomicU64::new(1),
            next_line_id: AtomicU64::new(1),
        }
    }

}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore for MemoryStore {
    fn header_for_user(&self, user_id: &str) -> StoreResult<Option<CartHeader>> {
        let headers = self.headers.read();
        Ok(headers
            .values()
            .find(|header| header.user_id == user_id)
            .cloned())
    }

    fn header_by_id(&self, header_id: u64) -> StoreResult<Option<CartHeader>> {
        Ok(self.headers.read().get(&header_id).cloned())
    }

    fn insert_header(&self, user_id: &str, coupon_code: Option<String>) -> StoreResult<CartHeader> {
        let id = self.next_header_id.fetch_add(1, Ordering::Relaxed);
        let header = CartHeader {
            id,
            user_id: user_id.to_string(),
            coupon_code,
        };
        self.headers.write().insert(id, header.clone());
        Ok(header)
    }

    fn set_coupon(&self, header_id: u64, coupon_code: Option<String>) -> StoreResult<bool> {
        let mut headers = self.headers.write();
        match headers.get_mut(&header_id) {
            Some(header) => {
                header.coupon_code = coupon_code;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_header(&self, header_id: u64) -> StoreResult<bool> {
        Ok(self.headers.write().remove(&header_id).is_some())
    }

    fn lines_for_header(&self, header_id: u64) -> StoreResult<Vec<CartLine>> {
        let lines = self.lines.read();
        Ok(lines
            .values()
            .filter(|line| line.header_id == header_id)
            .cloned()
            .collect())
    }

    fn line_by_id(&self, line_id: u64) -> StoreResult<Option<CartLine>> {
        Ok(self.lines.read().get(&line_id).cloned())
    }

    fn line_for_product(&self, header_id: u64, product_id: u64) -> StoreResult<Option<CartLine>> {
        let lines = self.lines.read();
        Ok(lines
            .values()
            .find(|line| line.header_id == header_id && line.product_id == product_id)
            .cloned())
    }

    fn count_lines(&self, header_id: u64) -> StoreResult<usize> {
        let lines = self.lines.read();
        Ok(lines
            .values()
            .filter(|line| line.header_id == header_id)
            .count())
    }

    fn insert_line(&self, header_id: u64, product_id: u64, count: u32) -> StoreResult<CartLine> {
        let id = self.next_line_id.fetch_add(1, Ordering::Relaxed);
        let line = CartLine {
            id,
            header_id,
            product_id,
            count,
        };
        self.lines.write().insert(id, line.clone());
        Ok(line)
    }

    fn set_line_count(&self, line_id: u64, count: u32) -> StoreResult<Option<CartLine>> {
        let mut lines = self.lines.write();
        match lines.get_mut(&line_id) {
            Some(line) => {
                line.count = count;
                Ok(Some(line.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete_line(&self, line_id: u64) -> StoreResult<bool> {
        Ok(self.lines.write().remove(&line_id).is_some())
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats {
            headers: self.headers.read().len(),
            lines: self.lines.read().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_first_match_in_insertion_order() {
        let store = MemoryStore::new();
        let first = store.insert_header("user-1", None).unwrap();
        // Duplicate user rows are not rejected by the store.
        let _second = store.insert_header("user-1", None).unwrap();

        let found = store.header_for_user("user-1").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn line_queries_scope_to_header() {
        let store = MemoryStore::new();
        let a = store.insert_header("a", None).unwrap();
        let b = store.insert_header("b", None).unwrap();
        store.insert_line(a.id, 10, 1).unwrap();
        store.insert_line(a.id, 11, 2).unwrap();
        store.insert_line(b.id, 10, 5).unwrap();

        assert_eq!(store.count_lines(a.id).unwrap(), 2);
        assert_eq!(store.count_lines(b.id).unwrap(), 1);
        let found = store.line_for_product(b.id, 10).unwrap().unwrap();
        assert_eq!(found.count, 5);
        assert!(store.line_for_product(b.id, 11).unwrap().is_none());
    }

    #[test]
    fn set_line_count_reports_missing_rows() {
        let store = MemoryStore::new();
        assert!(store.set_line_count(99, 3).unwrap().is_none());

        let header = store.insert_header("u", None).unwrap();
        let line = store.insert_line(header.id, 1, 1).unwrap();
        let updated = store.set_line_count(line.id, 3).unwrap().unwrap();
        assert_eq!(updated.count, 3);
    }

    #[test]
    fn coupon_attach_and_clear() {
        let store = MemoryStore::new();
        let header = store.insert_header("u", None).unwrap();
        assert!(store.set_coupon(header.id, Some("SAVE10".into())).unwrap());
        assert_eq!(
            store
                .header_by_id(header.id)
                .unwrap()
                .unwrap()
                .coupon_code
                .as_deref(),
            Some("SAVE10")
        );
        assert!(store.set_coupon(header.id, None).unwrap());
        assert!(
            store
                .header_by_id(header.id)
                .unwrap()
                .unwrap()
                .coupon_code
                .is_none()
        );
        assert!(!store.set_coupon(999, None).unwrap());
    }
}
