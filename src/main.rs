//! Keepsake entry point
//!
//! On the web this installs logging and the JS bindings. Natively it opens a
//! file-backed store, counts a visit and dumps the document.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    keepsake::bindings::start();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use keepsake::persistence::FileStorage;
    use keepsake::{StateStore, StoreConfig};

    env_logger::init();
    log::info!("Keepsake (native) starting...");

    let config = match std::env::var("KEEPSAKE_CONFIG") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(keepsake::StateError::from)
            .and_then(|json| StoreConfig::from_json(&json))
        {
            Ok(config) => config,
            Err(e) => {
                log::error!("Ignoring config {}: {}", path, e);
                StoreConfig::default()
            }
        },
        Err(_) => StoreConfig::default(),
    };

    let dir = std::env::var("KEEPSAKE_STATE_DIR").unwrap_or_else(|_| ".keepsake".to_string());
    let storage = match FileStorage::open(&dir) {
        Ok(storage) => storage,
        Err(e) => {
            log::error!("Cannot open state directory {}: {}", dir, e);
            std::process::exit(1);
        }
    };

    let store = StateStore::new(storage, config);
    keepsake::bootstrap(&store);
    store.debug();

    println!(
        "visit #{} (state in {})",
        store.get("user.visitCount").unwrap_or_default(),
        dir
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
