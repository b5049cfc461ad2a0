//! Document persistence
//!
//! Features:
//! - `Storage` trait over any string key/value substrate
//! - Whole-document JSON encoding under a single key
//! - Backends: in-memory, filesystem (native), LocalStorage (wasm32)

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;

use serde_json::Value;

use crate::error::StateResult;

/// A durable string key/value substrate (LocalStorage semantics)
pub trait Storage {
    fn get_item(&self, key: &str) -> StateResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StateResult<()>;
    fn remove_item(&self, key: &str) -> StateResult<()>;
}

/// Encode `document` and write it under `key`
pub fn save_document(
    storage: &dyn Storage,
    key: &str,
    document: &Value,
    pretty: bool,
) -> StateResult<()> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    storage.set_item(key, &json)
}

/// Read and decode the document stored under `key`
pub fn load_document(storage: &dyn Storage, key: &str) -> StateResult<Option<Value>> {
    match storage.get_item(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
