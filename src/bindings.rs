//! JavaScript API for page scripts (wasm32 only)
//!
//! Mirrors the page-level `StateManager` object: camelCase method names,
//! plain JS values in and out. Values cross the boundary as JSON text.

use wasm_bindgen::prelude::*;

use crate::config::StoreConfig;
use crate::persistence::LocalStorage;
use crate::store::StateStore;

/// Install the panic hook and console logger. Safe to call more than once.
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("keepsake state bindings ready");
    }
}

fn to_js(value: &serde_json::Value) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn from_js(value: &JsValue) -> Result<serde_json::Value, JsValue> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    let text: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct StateManager {
    store: StateStore,
}

#[wasm_bindgen]
impl StateManager {
    /// Open a store on `localStorage`, optionally under a custom key
    #[wasm_bindgen(constructor)]
    pub fn new(storage_key: Option<String>) -> Result<StateManager, JsValue> {
        start();
        let mut config = StoreConfig::default();
        if let Some(key) = storage_key {
            config = config.with_storage_key(key);
        }
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let storage = LocalStorage::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            store: StateStore::new(storage, config),
        })
    }

    pub fn init(&self) {
        self.store.init();
    }

    /// Whole document without a path, `undefined` for absent paths
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, path: Option<String>) -> Result<JsValue, JsValue> {
        let value = match path.as_deref() {
            None | Some("") => Some(self.store.snapshot()),
            Some(path) => self.store.get(path),
        };
        match value {
            Some(value) => to_js(&value),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&self, path: &str, value: JsValue) -> Result<JsValue, JsValue> {
        self.store.set(path, from_js(&value)?);
        Ok(value)
    }

    #[wasm_bindgen(js_name = updateState)]
    pub fn update_state(&self, path: &str, partial: JsValue) -> Result<(), JsValue> {
        self.store.update(path, from_js(&partial)?);
        Ok(())
    }

    /// Returns the unsubscribe function
    pub fn subscribe(&self, path: String, callback: js_sys::Function) -> js_sys::Function {
        let observed = path.clone();
        let subscription = self.store.subscribe(&path, move |new, old| {
            let new = to_js(new).unwrap_or(JsValue::NULL);
            let old = old
                .map(|old| to_js(old).unwrap_or(JsValue::NULL))
                .unwrap_or(JsValue::NULL);
            if let Err(e) = callback.call2(&JsValue::NULL, &new, &old) {
                log::error!("Observer on {} threw: {:?}", observed, e);
            }
        });

        let closure = Closure::<dyn FnMut()>::new(move || subscription.unsubscribe());
        let unsubscribe: js_sys::Function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        closure.forget();
        unsubscribe
    }

    #[wasm_bindgen(js_name = resetState)]
    pub fn reset_state(&self) {
        self.store.reset();
    }

    #[wasm_bindgen(js_name = clearStorage)]
    pub fn clear_storage(&self) {
        self.store.clear_storage();
    }

    pub fn debug(&self) {
        self.store.debug();
    }
}
