//! Transient UI state: toasts, modal, loading indicator
//!
//! Rendering is left to page scripts; they subscribe to these paths.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::platform::unique_millis;
use crate::store::StateStore;

pub const TOASTS_PATH: &str = "ui.toasts";
pub const MODAL_PATH: &str = "ui.modal";
const MODAL_OPEN_PATH: &str = "ui.modal.isOpen";
pub const LOADING_PATH: &str = "ui.loading";
const TRANSITION_PATH: &str = "ui.pageTransitioning";

/// How long a toast stays up unless dismissed
pub const DEFAULT_TOAST_DURATION_MS: i64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    /// Also stands in for kinds this build does not know
    #[default]
    #[serde(other)]
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ToastKind,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// UI state accessors over a store
#[derive(Debug, Clone)]
pub struct UiState {
    store: StateStore,
}

impl UiState {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Readable toasts in display order; entries that do not parse are skipped
    pub fn toasts(&self) -> Vec<Toast> {
        self.entries()
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| match Toast::deserialize(entry) {
                Ok(toast) => Some(toast),
                Err(e) => {
                    log::warn!("Skipping unreadable toast: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Queue a toast; returns it so the caller can schedule removal.
    ///
    /// `None` when `ui.toasts` holds something other than a list.
    pub fn show_toast(&self, message: &str, kind: ToastKind) -> Option<Toast> {
        let mut entries = self.entries()?;
        let clock = self.store.clock();
        let toast = Toast {
            id: unique_millis(clock, entries.iter().filter_map(toast_id)),
            message: message.to_string(),
            kind,
            timestamp: clock.now_millis(),
        };
        match serde_json::to_value(&toast) {
            Ok(encoded) => entries.push(encoded),
            Err(e) => {
                log::error!("Failed to encode toast: {}", e);
                return None;
            }
        }
        self.store.set(TOASTS_PATH, entries);
        Some(toast)
    }

    pub fn remove_toast(&self, id: i64) {
        let Some(mut entries) = self.entries() else {
            return;
        };
        let before = entries.len();
        entries.retain(|entry| toast_id(entry) != Some(id));
        if entries.len() != before {
            self.store.set(TOASTS_PATH, entries);
        }
    }

    /// Drop toasts older than `max_age`; returns how many were removed.
    ///
    /// Entries without a timestamp are left alone.
    pub fn expire_toasts(&self, max_age: Duration) -> usize {
        let Some(mut entries) = self.entries() else {
            return 0;
        };
        let cutoff = self.store.clock().now_millis() - max_age.num_milliseconds();
        let before = entries.len();
        entries.retain(|entry| {
            entry
                .get("timestamp")
                .and_then(Value::as_i64)
                .is_none_or(|timestamp| timestamp > cutoff)
        });
        let removed = before - entries.len();
        if removed > 0 {
            self.store.set(TOASTS_PATH, entries);
        }
        removed
    }

    pub fn show_modal(&self, id: &str, content: Value) {
        self.store.set(
            MODAL_PATH,
            json!({ "isOpen": true, "id": id, "content": content }),
        );
    }

    pub fn close_modal(&self) {
        self.store.set(MODAL_OPEN_PATH, false);
    }

    pub fn is_modal_open(&self) -> bool {
        self.store.get_as(MODAL_OPEN_PATH).unwrap_or(false)
    }

    pub fn set_loading(&self, active: bool, message: &str) {
        self.store
            .set(LOADING_PATH, json!({ "active": active, "message": message }));
    }

    pub fn set_page_transitioning(&self, transitioning: bool) {
        self.store.set(TRANSITION_PATH, transitioning);
    }

    fn entries(&self) -> Option<Vec<Value>> {
        self.store.get_list(TOASTS_PATH)
    }
}

fn toast_id(entry: &Value) -> Option<i64> {
    entry.get("id").and_then(Value::as_i64)
}
