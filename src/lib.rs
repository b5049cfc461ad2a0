//! Keepsake - state store for the keepsake site
//!
//! Core modules:
//! - `store`: Path-addressed document with persistence and change notification
//! - `document`: Default skeleton, traversal and merge helpers
//! - `persistence`: Storage backends (LocalStorage, file, memory)
//! - `platform`: Clock abstraction
//! - `letters`, `preferences`, `progress`, `ui`: Typed accessors for known paths

#[cfg(target_arch = "wasm32")]
pub mod bindings;
pub mod config;
pub mod document;
pub mod error;
pub mod letters;
pub mod path;
pub mod persistence;
pub mod platform;
pub mod preferences;
pub mod progress;
pub mod store;
pub mod ui;

pub use config::{InitMerge, StoreConfig};
pub use error::{StateError, StateResult};
pub use letters::{GeneratedLetter, LetterArchive, LetterDraft, LetterKind};
pub use path::{StatePath, WILDCARD};
pub use preferences::{PreferenceManager, Preferences};
pub use progress::GameProgress;
pub use store::{StateStore, Subscription};
pub use ui::UiState;

/// Bring up a store and its page-level managers the way every page does
pub fn bootstrap(store: &StateStore) {
    store.init();
    LetterArchive::new(store.clone()).init();
    PreferenceManager::new(store.clone()).init();
    log::info!("State management initialized");
}
