//! Front-end state container.
//!
//! Holds decoded application state as JSON values under string keys and republishes a key's
//! full value to its subscribers after every change. Named events can be triggered and
//! subscribed to separately. Three keys are managed: `widgets` and `tabs` are objects keyed by
//! id, and `logs` is a capped, newest-first array of `[id, entry]` pairs.
//!
//! Changes are published one at a time, in the order they were made, even when several threads
//! mutate the store. Callbacks run outside the state lock and may read or mutate the store
//! themselves; a mutation made from inside a callback is published before the outer one
//! finishes. A callback must not block on another thread that is mutating the same store.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use parking_lot::{Mutex, ReentrantMutex};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Most log entries kept.
pub const LOG_MAX: usize = 100;

pub const WIDGETS: &str = "widgets";
pub const TABS: &str = "tabs";
pub const LOGS: &str = "logs";

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Hands out identifiers for subscriptions, widgets, tabs and log entries. Each store owns one.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `first`, e.g. past the ids of restored state.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Key,
    Event,
}

struct Inner {
    state: Map<String, Value>,
    subscribers: HashMap<String, BTreeMap<u64, Callback>>,
    event_subscribers: HashMap<String, BTreeMap<u64, Callback>>,
}

impl Inner {
    fn channel(&mut self, channel: Channel) -> &mut HashMap<String, BTreeMap<u64, Callback>> {
        match channel {
            Channel::Key => &mut self.subscribers,
            Channel::Event => &mut self.event_subscribers,
        }
    }

    fn listeners(&self, channel: Channel, name: &str) -> Vec<Callback> {
        let map = match channel {
            Channel::Key => &self.subscribers,
            Channel::Event => &self.event_subscribers,
        };
        map.get(name)
            .map(|subs| subs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The object stored under `key`, replacing whatever else was there.
    fn object_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>> {
        let entry = self
            .state
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        entry.as_object_mut()
    }
}

struct Shared {
    inner: Mutex<Inner>,
    /// Held from a change until its subscribers have seen it.
    publish: ReentrantMutex<()>,
    ids: IdGenerator,
}

/// Handle to a state container. Clones share the same state.
#[derive(Clone)]
pub struct StateStore {
    shared: Arc<Shared>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::new())
    }

    pub fn with_ids(ids: IdGenerator) -> Self {
        let mut state = Map::new();
        state.insert(WIDGETS.to_owned(), Value::Object(Map::new()));
        state.insert(TABS.to_owned(), Value::Object(Map::new()));
        state.insert(LOGS.to_owned(), Value::Array(Vec::new()));
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    subscribers: HashMap::new(),
                    event_subscribers: HashMap::new(),
                }),
                publish: ReentrantMutex::new(()),
                ids,
            }),
        }
    }

    fn add_listener<F>(&self, channel: Channel, name: String, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.shared.ids.next_id();
        self.shared
            .inner
            .lock()
            .channel(channel)
            .entry(name.clone())
            .or_default()
            .insert(id, Arc::new(callback));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            channel,
            name,
            id,
        }
    }

    /// Call `callback` with the full value of `key` every time it changes.
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.add_listener(Channel::Key, key.into(), callback)
    }

    /// Call `callback` with the data of every `event` triggered.
    pub fn subscribe_to_event<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.add_listener(Channel::Event, event.into(), callback)
    }

    /// Apply `change` under the lock, then hand the key's new value to its subscribers.
    fn mutate<R>(&self, key: &str, change: impl FnOnce(&mut Inner) -> R) -> R {
        let _publishing = self.shared.publish.lock();
        let (out, value, listeners) = {
            let mut inner = self.shared.inner.lock();
            let out = change(&mut inner);
            let value = inner.state.get(key).cloned().unwrap_or(Value::Null);
            (out, value, inner.listeners(Channel::Key, key))
        };
        tracing::trace!(key, subscribers = listeners.len(), "publishing state");
        for listener in listeners {
            listener(&value);
        }
        out
    }

    pub fn set_state(&self, key: &str, value: Value) {
        tracing::debug!(key, "setting state");
        self.mutate(key, |inner| {
            inner.state.insert(key.to_owned(), value);
        })
    }

    /// Serialize `value` to JSON and store it under `key`.
    pub fn set_serialized<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_state(key, value);
        Ok(())
    }

    /// Current value of `key`, or `Null` if it was never set.
    pub fn state(&self, key: &str) -> Value {
        self.shared
            .inner
            .lock()
            .state
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Deserialize the current value of `key`, if it has one.
    pub fn deserialized<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.state(key) {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn insert_keyed(&self, key: &str, id: Option<u64>, item: Value) -> u64 {
        let id = id.unwrap_or_else(|| self.shared.ids.next_id());
        self.mutate(key, |inner| {
            if let Some(items) = inner.object_mut(key) {
                items.insert(id.to_string(), item);
            }
        });
        id
    }

    fn remove_keyed(&self, key: &str, id: u64) {
        self.mutate(key, |inner| {
            if let Some(items) = inner.object_mut(key) {
                items.remove(&id.to_string());
            }
        })
    }

    /// Add a widget under `id`, or under a fresh id when `None`. Returns the id used.
    pub fn add_widget(&self, id: Option<u64>, widget: Value) -> u64 {
        self.insert_keyed(WIDGETS, id, widget)
    }

    pub fn remove_widget(&self, id: u64) {
        self.remove_keyed(WIDGETS, id)
    }

    /// Add a tab under `id`, or under a fresh id when `None`. Returns the id used.
    pub fn add_tab(&self, id: Option<u64>, tab: Value) -> u64 {
        self.insert_keyed(TABS, id, tab)
    }

    pub fn remove_tab(&self, id: u64) {
        self.remove_keyed(TABS, id)
    }

    /// Put `entry` at the front of the log. When the log is full, `LOG_MAX / 100` entries at a
    /// time are dropped from the back until there is room, so it never holds more than
    /// `LOG_MAX` entries. Returns the entry's id.
    pub fn add_log(&self, entry: Value) -> u64 {
        let id = self.shared.ids.next_id();
        self.mutate(LOGS, |inner| {
            let logs = inner
                .state
                .entry(LOGS)
                .or_insert_with(|| Value::Array(Vec::new()));
            if !logs.is_array() {
                *logs = Value::Array(Vec::new());
            }
            if let Value::Array(logs) = logs {
                let chunk = (LOG_MAX / 100).max(1);
                let before = logs.len();
                while logs.len() >= LOG_MAX {
                    let keep = logs.len().saturating_sub(chunk);
                    logs.truncate(keep);
                }
                if logs.len() < before {
                    tracing::debug!(dropped = before - logs.len(), "log full, dropped oldest entries");
                }
                logs.insert(0, json!([id, entry]));
            }
        });
        id
    }

    /// Hand `data` to every subscriber of `event`. Nothing is stored.
    pub fn trigger_event(&self, event: &str, data: &Value) {
        let _publishing = self.shared.publish.lock();
        let listeners = self.shared.inner.lock().listeners(Channel::Event, event);
        tracing::trace!(event, subscribers = listeners.len(), "triggering event");
        for listener in listeners {
            listener(data);
        }
    }
}

/// A registered callback. Stays registered until [`dispose`][Subscription::dispose] is called.
#[must_use = "dropping a Subscription leaves the callback registered"]
pub struct Subscription {
    shared: Weak<Shared>,
    channel: Channel,
    name: String,
    id: u64,
}

impl Subscription {
    /// Unregister the callback. Does nothing if the store is gone.
    pub fn dispose(self) {
        if let Some(shared) = self.shared.upgrade() {
            let mut inner = shared.inner.lock();
            let map = inner.channel(self.channel);
            if let Some(subs) = map.get_mut(&self.name) {
                subs.remove(&self.id);
                if subs.is_empty() {
                    map.remove(&self.name);
                }
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
