//! Browser LocalStorage backend (wasm32 only)

use wasm_bindgen::JsValue;

use super::Storage;
use crate::error::{StateError, StateResult};

pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// Grab `window.localStorage`
    pub fn open() -> StateResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| StateError::Unavailable("no window".into()))?;
        let inner = window
            .local_storage()
            .map_err(|e| StateError::Unavailable(describe(&e)))?
            .ok_or_else(|| StateError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { inner })
    }
}

/// Best-effort text for a thrown JS value (DOMException name/message)
fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> StateResult<Option<String>> {
        self.inner
            .get_item(key)
            .map_err(|e| StateError::storage(key, describe(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> StateResult<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StateError::storage(key, describe(&e)))
    }

    fn remove_item(&self, key: &str) -> StateResult<()> {
        self.inner
            .remove_item(key)
            .map_err(|e| StateError::storage(key, describe(&e)))
    }
}
