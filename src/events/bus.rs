//! Per-datastore listener registry and dispatch.

use crate::path::{matches, Path};
use crate::store::Datastore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{Event, EventData, Handler, ListenerId, Propagation, TriggerOptions};

/// Internal listener state.
#[derive(Clone)]
struct Listener {
    id: ListenerId,
    handler: Handler,
}

/// One string per path token, so a key containing a dot stays distinct
/// from the path spelled with the same dots.
type PathKey = Vec<String>;

/// Listeners by path, then by event name, in registration order.
type Registry = HashMap<PathKey, HashMap<String, Vec<Listener>>>;

fn path_key(path: &Path) -> PathKey {
    path.tokens().iter().map(ToString::to_string).collect()
}

/// Listener registry for one datastore.
///
/// Dispatch works on a copy of the listener list, so handlers may register
/// or remove listeners (including themselves) while an event is running.
pub struct EventBus {
    listeners: RwLock<Registry>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn insert(&self, path: &Path, name: &str, id: ListenerId, handler: Handler) {
        self.listeners
            .write()
            .entry(path_key(path))
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(Listener { id, handler });
    }

    /// Register `handler` for `name` events at `path`.
    ///
    /// Registering the same handler twice makes it run twice.
    pub fn on(&self, path: &Path, name: &str, handler: Handler) -> ListenerId {
        let id = self.allocate_id();
        self.insert(path, name, id, handler);
        id
    }

    /// Register a handler that removes itself the first time it runs,
    /// whether the event was aimed at `path` or bubbled up to it.
    pub fn one(&self, path: &Path, name: &str, handler: Handler) -> ListenerId {
        let id = self.allocate_id();
        let own_path = path.clone();
        let own_name = name.to_string();

        let wrapper: Handler = Arc::new(move |store: &Datastore, event: &Event, data: &EventData| {
            store.bus().remove(&own_path, Some(&own_name), Some(id));
            handler(store, event, data)
        });

        self.insert(path, name, id, wrapper);
        id
    }

    /// Register a handler at `path` that only runs for events whose target
    /// matches `pattern`. Other events pass through untouched.
    pub fn delegate(&self, path: &Path, name: &str, pattern: Path, handler: Handler) -> ListenerId {
        let wrapper: Handler = Arc::new(move |store: &Datastore, event: &Event, data: &EventData| {
            if !matches(&event.target, &pattern) {
                return Propagation::Continue;
            }
            handler(store, event, data)
        });

        self.on(path, name, wrapper)
    }

    /// Remove listeners at `path`.
    ///
    /// - name and listener: that listener from that event's list
    /// - listener only: that listener, whatever event it is registered for
    /// - name only: every listener for that event
    /// - neither: every listener at the path
    ///
    /// Returns the number of listeners removed.
    pub fn remove(&self, path: &Path, name: Option<&str>, listener: Option<ListenerId>) -> usize {
        let key = path_key(path);
        let mut registry = self.listeners.write();
        let Some(by_name) = registry.get_mut(&key) else {
            return 0;
        };

        let removed = match (name, listener) {
            (Some(name), Some(id)) => by_name
                .get_mut(name)
                .map(|list| remove_first(list, id))
                .unwrap_or(0),
            (None, Some(id)) => by_name
                .values_mut()
                .find_map(|list| match remove_first(list, id) {
                    0 => None,
                    n => Some(n),
                })
                .unwrap_or(0),
            (Some(name), None) => by_name.remove(name).map(|list| list.len()).unwrap_or(0),
            (None, None) => by_name.values().map(Vec::len).sum::<usize>(),
        };

        if name.is_none() && listener.is_none() {
            registry.remove(&key);
        } else {
            by_name.retain(|_, list| !list.is_empty());
            if by_name.is_empty() {
                registry.remove(&key);
            }
        }

        removed
    }

    /// Dispatch `name` at `path`, then at each ancestor up to the root.
    ///
    /// Handlers at one level run in registration order. A handler returning
    /// [`Propagation::Stop`] ends the dispatch: later handlers at its level
    /// and every ancestor level are skipped, and `Stop` is returned.
    pub fn trigger(
        &self,
        store: &Datastore,
        path: &Path,
        name: &str,
        options: TriggerOptions,
    ) -> Propagation {
        let target = options.target.unwrap_or_else(|| path.clone());
        let data = options.data;
        let mut current = path.clone();

        loop {
            if self.dispatch_level(store, &current, &target, name, &data) == Propagation::Stop {
                tracing::debug!(event = name, path = %current, target = %target, "propagation stopped");
                return Propagation::Stop;
            }
            if current.pop().is_none() {
                break;
            }
        }

        Propagation::Continue
    }

    fn dispatch_level(
        &self,
        store: &Datastore,
        path: &Path,
        target: &Path,
        name: &str,
        data: &EventData,
    ) -> Propagation {
        let key = path_key(path);
        let snapshot = self.snapshot(&key, name);
        if snapshot.is_empty() {
            return Propagation::Continue;
        }

        tracing::trace!(event = name, path = %path, listeners = snapshot.len(), "dispatching");
        let event = Event {
            name: name.to_string(),
            path: path.clone(),
            target: target.clone(),
        };

        for listener in snapshot {
            // Removed by an earlier handler during this dispatch.
            if !self.is_registered(&key, name, listener.id) {
                continue;
            }
            if (listener.handler)(store, &event, data) == Propagation::Stop {
                return Propagation::Stop;
            }
        }
        Propagation::Continue
    }

    fn snapshot(&self, key: &[String], name: &str) -> Vec<Listener> {
        self.listeners
            .read()
            .get(key)
            .and_then(|by_name| by_name.get(name))
            .cloned()
            .unwrap_or_default()
    }

    fn is_registered(&self, key: &[String], name: &str, id: ListenerId) -> bool {
        self.listeners
            .read()
            .get(key)
            .and_then(|by_name| by_name.get(name))
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    /// Number of listeners for `name` at exactly `path`.
    pub fn listener_count(&self, path: &Path, name: &str) -> usize {
        self.listeners
            .read()
            .get(&path_key(path))
            .and_then(|by_name| by_name.get(name))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_first(list: &mut Vec<Listener>, id: ListenerId) -> usize {
    match list.iter().position(|l| l.id == id) {
        Some(index) => {
            list.remove(index);
            1
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Grammar;
    use parking_lot::Mutex;

    fn path(s: &str) -> Path {
        Path::parse(s, Grammar::Query).unwrap()
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Handler {
        let log = Arc::clone(log);
        let label = label.to_string();
        Arc::new(move |_: &Datastore, event: &Event, _: &EventData| {
            log.lock().push(format!("{}@{}", label, event.path));
            Propagation::Continue
        })
    }

    #[test]
    fn test_on_and_remove() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = bus.on(&path("a"), "x", recorder(&log, "first"));
        bus.on(&path("a"), "x", recorder(&log, "second"));
        bus.on(&path("a"), "y", recorder(&log, "other"));
        assert_eq!(bus.listener_count(&path("a"), "x"), 2);

        assert_eq!(bus.remove(&path("a"), Some("x"), Some(first)), 1);
        assert_eq!(bus.listener_count(&path("a"), "x"), 1);

        assert_eq!(bus.remove(&path("a"), Some("x"), None), 1);
        assert_eq!(bus.listener_count(&path("a"), "x"), 0);
        assert_eq!(bus.listener_count(&path("a"), "y"), 1);

        assert_eq!(bus.remove(&path("a"), None, None), 1);
        assert_eq!(bus.listener_count(&path("a"), "y"), 0);
        assert_eq!(bus.remove(&path("a"), None, None), 0);
    }

    #[test]
    fn test_remove_by_id_only() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.on(&path("a"), "x", recorder(&log, "keep"));
        let id = bus.on(&path("a"), "y", recorder(&log, "drop"));

        assert_eq!(bus.remove(&path("a"), None, Some(id)), 1);
        assert_eq!(bus.listener_count(&path("a"), "y"), 0);
        assert_eq!(bus.listener_count(&path("a"), "x"), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, "h");

        let a = bus.on(&path(""), "x", Arc::clone(&handler));
        let b = bus.on(&path(""), "x", handler);
        assert_ne!(a, b);
        assert_eq!(bus.listener_count(&Path::root(), "x"), 2);
    }

    #[test]
    fn test_propagation_from_return_values() {
        assert_eq!(Propagation::from(()), Propagation::Continue);
        assert_eq!(Propagation::from(true), Propagation::Continue);
        assert_eq!(Propagation::from(false), Propagation::Stop);
    }
}
