//! In-memory storage backend
//!
//! Clones share the same map, so a test can keep a handle while the store
//! owns another. An optional byte quota mimics LocalStorage's
//! `QuotaExceededError`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::Storage;
use crate::error::{StateError, StateResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
    quota: Rc<Cell<Option<usize>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose value exceeds `bytes`
    pub fn with_quota(self, bytes: usize) -> Self {
        self.quota.set(Some(bytes));
        self
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota.set(bytes);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StateResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StateResult<()> {
        if let Some(quota) = self.quota.get() {
            if value.len() > quota {
                return Err(StateError::storage(
                    key,
                    format!("quota exceeded ({} > {} bytes)", value.len(), quota),
                ));
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StateResult<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_items() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(handle.get_item("k").unwrap().as_deref(), Some("v"));
        handle.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_quota_rejects_large_values() {
        let storage = MemoryStorage::new().with_quota(4);
        assert!(storage.set_item("k", "1234").is_ok());
        let err = storage.set_item("k", "12345").unwrap_err();
        assert!(matches!(err, StateError::Storage { .. }));
        // failed write leaves the old value
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("1234"));

        storage.set_quota(None);
        assert!(storage.set_item("k", "12345").is_ok());
    }
}
