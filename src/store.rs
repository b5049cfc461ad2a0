//! The state store
//!
//! A path-addressed JSON document with persistence and change notification.
//! Every write persists the whole document and then notifies observers of
//! the written path followed by observers of each ancestor, nearest first.
//!
//! The store is single-threaded (`Rc`/`RefCell`). No internal borrow is held
//! while an observer runs, so observers may read, write, subscribe and
//! unsubscribe from inside a notification.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::StoreConfig;
use crate::document::{self, kind_name, lookup, skeleton};
use crate::error::StateResult;
use crate::path::{StatePath, WILDCARD};
use crate::persistence::{self, MemoryStorage, Storage};
use crate::platform::{Clock, SystemClock};

/// Observer callback: `(new value, old value)`.
///
/// `old` is only provided to observers of the exact path that was written;
/// ancestor and reset notifications pass `None`.
pub type Observer = dyn Fn(&Value, Option<&Value>);

struct ObserverEntry {
    id: u64,
    callback: Rc<Observer>,
}

struct StoreInner {
    config: StoreConfig,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    document: RefCell<Value>,
    observers: RefCell<BTreeMap<String, Vec<ObserverEntry>>>,
    next_observer_id: Cell<u64>,
    last_persist_error: RefCell<Option<String>>,
}

impl StoreInner {
    fn remove_observer(&self, path: &str, id: u64) -> bool {
        let mut observers = self.observers.borrow_mut();
        let Some(entries) = observers.get_mut(path) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            observers.remove(path);
        }
        removed
    }
}

/// Handle returned by [`StateStore::subscribe`].
///
/// Dropping the handle keeps the observer registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    store: Weak<StoreInner>,
    path: String,
    id: u64,
}

impl Subscription {
    /// Remove this observer. Later calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.store.upgrade() {
            if inner.remove_observer(&self.path, self.id) {
                log::debug!("Unsubscribed observer {} from {}", self.id, self.path);
            }
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Shared handle to one state document. Clones refer to the same store.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<StoreInner>,
}

impl StateStore {
    pub fn new(storage: impl Storage + 'static, config: StoreConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }

    pub fn with_clock(
        storage: impl Storage + 'static,
        config: StoreConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                config,
                storage: Box::new(storage),
                clock: Box::new(clock),
                document: RefCell::new(skeleton()),
                observers: RefCell::new(BTreeMap::new()),
                next_observer_id: Cell::new(0),
                last_persist_error: RefCell::new(None),
            }),
        }
    }

    /// Store backed by a fresh in-memory map
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new(), StoreConfig::default())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Load the saved document, count the visit and persist.
    ///
    /// Every call counts as a visit. Observers are not notified.
    pub fn init(&self) {
        let config = &self.inner.config;
        let current = self.inner.document.replace(Value::Null);

        let loaded =
            match persistence::load_document(self.inner.storage.as_ref(), &config.storage_key) {
                Ok(Some(Value::Object(saved))) => {
                    log::info!("Loaded saved state ({} sections)", saved.len());
                    document::overlay_saved(current, saved, config.merge)
                }
                Ok(Some(other)) => {
                    log::warn!(
                        "Ignoring saved state: expected an object, found {}",
                        kind_name(&other)
                    );
                    current
                }
                Ok(None) => {
                    log::info!("No saved state, starting fresh");
                    current
                }
                Err(e) => {
                    log::warn!("Could not read saved state: {}", e);
                    current
                }
            };

        let visits = {
            let mut document_slot = self.inner.document.borrow_mut();
            *document_slot = loaded;
            let visits = lookup(&document_slot, &StatePath::parse("user.visitCount"))
                .and_then(Value::as_u64)
                .unwrap_or(0)
                + 1;
            document::assign(
                &mut document_slot,
                &StatePath::parse("user.visitCount"),
                json!(visits),
            );
            document::assign(
                &mut document_slot,
                &StatePath::parse("user.lastVisit"),
                json!(self.inner.clock.now_iso()),
            );
            visits
        };

        self.persist();
        log::info!("State initialized (visit #{})", visits);
    }

    /// Copy of the whole document
    pub fn snapshot(&self) -> Value {
        self.inner.document.borrow().clone()
    }

    /// Copy of the value at `path`, `None` when absent
    pub fn get(&self, path: &str) -> Option<Value> {
        self.read(path, |value| value.cloned())
    }

    /// Borrow the value at `path` without cloning.
    ///
    /// # Panics
    ///
    /// The document stays borrowed while `f` runs, so `f` panics if it
    /// writes to the store (`set`, `update`, `reset`, `init`).
    pub fn read<R>(&self, path: &str, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let document = self.inner.document.borrow();
        f(lookup(&document, &StatePath::parse(path)))
    }

    /// Typed read; `None` when absent or shaped differently than `T`
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.read(path, |value| {
            value.and_then(|value| T::deserialize(value).ok())
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read(path, |value| value.is_some())
    }

    /// Elements of the list at `path`; absent or null reads as empty.
    ///
    /// `None` when something other than an array sits there, so callers do
    /// not write a fresh list over it.
    pub fn get_list(&self, path: &str) -> Option<Vec<Value>> {
        match self.get(path) {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                log::warn!("{} holds {}, expected a list", path, kind_name(&other));
                None
            }
        }
    }

    /// Write `value` at `path`, persist, notify. Returns the value written.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Value {
        let path = StatePath::parse(path);
        let value = value.into();
        let previous = document::assign(
            &mut self.inner.document.borrow_mut(),
            &path,
            value.clone(),
        );
        log::debug!("Set {}", path);

        self.persist();
        self.notify(&path, &value, previous.as_ref());
        value
    }

    /// Serialize `value` and write it at `path`
    pub fn set_as<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> StateResult<Value> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(path, value))
    }

    /// Shallow-merge `partial` into the object at `path`.
    ///
    /// When either side is not an object, `partial` replaces the value.
    pub fn update(&self, path: &str, partial: impl Into<Value>) {
        let partial = partial.into();
        let merged = match (self.get(path), partial) {
            (Some(Value::Object(mut current)), Value::Object(partial)) => {
                document::shallow_merge(&mut current, partial);
                Value::Object(current)
            }
            (_, partial) => partial,
        };
        self.set(path, merged);
    }

    /// Register `callback` for writes to `path` or anything below it.
    ///
    /// Observers on the same path run in registration order. Subscribe to
    /// [`WILDCARD`] to hear about resets.
    pub fn subscribe<F>(&self, path: &str, callback: F) -> Subscription
    where
        F: Fn(&Value, Option<&Value>) + 'static,
    {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id + 1);

        self.inner
            .observers
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push(ObserverEntry {
                id,
                callback: Rc::new(callback),
            });
        log::debug!("Subscribed observer {} to {}", id, path);

        Subscription {
            store: Rc::downgrade(&self.inner),
            path: path.to_string(),
            id,
        }
    }

    pub fn subscriber_count(&self, path: &str) -> usize {
        self.inner
            .observers
            .borrow()
            .get(path)
            .map_or(0, Vec::len)
    }

    /// Replace the document with the skeleton, persist, notify.
    ///
    /// Wildcard observers get the whole document first, then every other
    /// registered path is told its new value (null when it no longer exists),
    /// in path order.
    pub fn reset(&self) {
        *self.inner.document.borrow_mut() = skeleton();
        self.persist();
        log::info!("State reset to defaults");

        let document = self.snapshot();
        self.dispatch(WILDCARD, &document, None);

        let paths: Vec<String> = self
            .inner
            .observers
            .borrow()
            .keys()
            .filter(|path| path.as_str() != WILDCARD)
            .cloned()
            .collect();
        for path in paths {
            let value = self.get(&path).unwrap_or(Value::Null);
            self.dispatch(&path, &value, None);
        }
    }

    /// Erase the persisted copy, then [`reset`](Self::reset)
    pub fn clear_storage(&self) {
        if let Err(e) = self.inner.storage.remove_item(&self.inner.config.storage_key) {
            log::error!("Failed to clear saved state: {}", e);
        }
        self.reset();
    }

    /// Log the document and subscriber counts
    pub fn debug(&self) {
        match serde_json::to_string_pretty(&*self.inner.document.borrow()) {
            Ok(json) => log::info!("Current state: {}", json),
            Err(e) => log::info!("Current state: <unprintable: {}>", e),
        }
        let observers = self.inner.observers.borrow();
        log::info!("Subscribers: {} path(s)", observers.len());
        for (path, entries) in observers.iter() {
            log::info!("  {} -> {}", path, entries.len());
        }
    }

    /// Message of the most recent failed write, cleared by the next success
    pub fn last_persist_error(&self) -> Option<String> {
        self.inner.last_persist_error.borrow().clone()
    }

    fn persist(&self) {
        let result = persistence::save_document(
            self.inner.storage.as_ref(),
            &self.inner.config.storage_key,
            &self.inner.document.borrow(),
            self.inner.config.pretty,
        );
        let error = match result {
            Ok(()) => None,
            Err(e) => {
                log::error!("Failed to persist state: {}", e);
                Some(e.to_string())
            }
        };
        *self.inner.last_persist_error.borrow_mut() = error;
    }

    fn notify(&self, path: &StatePath, new: &Value, old: Option<&Value>) {
        self.dispatch(path.as_str(), new, old);

        for ancestor in path.ancestors() {
            if self.subscriber_count(&ancestor) == 0 {
                continue;
            }
            let current = self.get(&ancestor).unwrap_or(Value::Null);
            self.dispatch(&ancestor, &current, None);
        }
    }

    /// Run the observers registered on `path` when the call starts
    fn dispatch(&self, path: &str, new: &Value, old: Option<&Value>) {
        let callbacks: Vec<Rc<Observer>> = match self.inner.observers.borrow().get(path) {
            Some(entries) => entries.iter().map(|entry| entry.callback.clone()).collect(),
            None => return,
        };

        for callback in callbacks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(new, old)));
            if outcome.is_err() {
                log::error!("Observer on {} panicked; remaining observers still run", path);
            }
        }
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("storage_key", &self.inner.config.storage_key)
            .field("document", &self.inner.document.borrow())
            .field(
                "observed_paths",
                &self.inner.observers.borrow().keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
