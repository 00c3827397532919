//! The datastore: single-node access, queries and events over one shared tree.

use crate::error::{Result, StoreError};
use crate::events::{
    Event, EventBus, EventData, Handler, ListenerId, Propagation, TriggerOptions, ACCESS, ADD,
    CHANGE, REMOVE,
};
use crate::path::{Grammar, Path, PathInput, PathParser};
use crate::query::{self, Match, Mode, QueryOptions, QueryResult, Update};
use crate::tree;
use crate::types::{Node, Value};
use crate::view::View;
use std::sync::Arc;

/// Default capacity of the parsed-path cache.
pub const DEFAULT_PATH_CACHE_SIZE: usize = 1000;

/// Datastore configuration.
#[derive(Clone, Debug)]
pub struct DatastoreConfig {
    /// Allow multi-node queries. When off, `*`, `..` and `a,b` are plain keys.
    pub queries: bool,

    /// Allow listeners and fire mutation events.
    pub events: bool,

    /// Parsed-path cache size (number of distinct path strings).
    pub path_cache_size: usize,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            queries: true,
            events: true,
            path_cache_size: DEFAULT_PATH_CACHE_SIZE,
        }
    }
}

/// Options for reads.
#[derive(Clone, Copy, Debug)]
pub struct GetOptions {
    /// Fire `access` when the value is undefined.
    pub trigger: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self { trigger: true }
    }
}

impl GetOptions {
    pub fn silent() -> Self {
        Self { trigger: false }
    }
}

/// Options for writes.
#[derive(Clone, Debug)]
pub struct SetOptions {
    /// Fire change events.
    pub trigger: bool,

    /// Custom data delivered in [`EventData::Change`].
    pub data: Value,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            trigger: true,
            data: Value::Undefined,
        }
    }
}

impl SetOptions {
    pub fn silent() -> Self {
        Self {
            trigger: false,
            ..Default::default()
        }
    }

    pub fn with_data(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }
}

/// An in-memory tree with path access, queries and events.
///
/// Provides a unified interface for:
/// - Reading and writing single nodes by path
/// - Querying, updating and deleting many nodes at once
/// - Subscribing to changes at any path, with bubbling to ancestors
///
/// All operations are synchronous. Handlers run before the mutating call
/// returns and may call back into the datastore.
pub struct Datastore {
    /// Datastore configuration.
    config: DatastoreConfig,

    /// Root node of the tree.
    root: Node,

    /// Path normalizer with its parse cache.
    parser: PathParser,

    /// Listener registry.
    events: EventBus,
}

impl Datastore {
    /// Create an empty datastore with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DatastoreConfig::default())
    }

    /// Create an empty datastore.
    pub fn with_config(config: DatastoreConfig) -> Self {
        Self::from_node(Node::new(), config)
    }

    /// Wrap an existing tree.
    pub fn from_node(root: Node, config: DatastoreConfig) -> Self {
        let parser = PathParser::new(config.path_cache_size);
        Self {
            config,
            root,
            parser,
            events: EventBus::new(),
        }
    }

    /// Build a datastore from a JSON object (or array).
    pub fn from_json(doc: serde_json::Value) -> Result<Self> {
        match Value::from(doc) {
            Value::Node(root) => Ok(Self::from_node(root, DatastoreConfig::default())),
            _ => Err(StoreError::InvalidNode(
                "the root of a datastore must be an object".into(),
            )),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.events
    }

    /// Render the whole tree as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        Value::Node(self.root.clone()).to_json()
    }

    // --- Path Handling ---

    /// Normalize a path under `grammar`, using this datastore's parse cache.
    pub fn normalize<'a>(&self, path: impl Into<PathInput<'a>>, grammar: Grammar) -> Result<Path> {
        self.parser.normalize(path, grammar)
    }

    pub(crate) fn parse_literal<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Path> {
        self.normalize(path, Grammar::Simple)
    }

    pub(crate) fn parse_query<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Path> {
        if !self.config.queries {
            return Err(StoreError::QueriesDisabled);
        }
        self.normalize(path, Grammar::Query)
    }

    pub(crate) fn parse_event<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Path> {
        let grammar = if self.config.queries {
            Grammar::Query
        } else {
            Grammar::Simple
        };
        self.normalize(path, grammar)
    }

    /// A view of the subtree at `offset`.
    pub fn view<'a>(&self, offset: impl Into<PathInput<'a>>) -> Result<View<'_>> {
        let offset = self.parse_literal(offset)?;
        Ok(View::new(self, offset))
    }

    // --- Single-Node Operations ---

    /// Read the value at `path`.
    pub fn get<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.get_with(path, GetOptions::default())
    }

    /// Read the value at `path`.
    ///
    /// If the value is undefined and `options.trigger` is set, an `access`
    /// event fires first; handlers may populate the value, which is then
    /// read once more.
    pub fn get_with<'a>(&self, path: impl Into<PathInput<'a>>, options: GetOptions) -> Result<Value> {
        let path = self.parse_literal(path)?;
        self.get_path(&path, options)
    }

    pub(crate) fn get_path(&self, path: &Path, options: GetOptions) -> Result<Value> {
        let keys = path.literal_keys()?;
        let value = tree::get(&self.root, &keys);
        if !value.is_undefined() || !options.trigger || !self.config.events {
            return Ok(value);
        }

        let access = EventData::Access { path: path.clone() };
        self.events
            .trigger(self, path, ACCESS, TriggerOptions::data(access));
        Ok(tree::get(&self.root, &keys))
    }

    /// Write `value` at `path`, creating intermediate nodes.
    pub fn set<'a>(&self, path: impl Into<PathInput<'a>>, value: impl Into<Value>) -> Result<()> {
        self.set_with(path, value, SetOptions::default())
    }

    pub fn set_with<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        value: impl Into<Value>,
        options: SetOptions,
    ) -> Result<()> {
        let path = self.parse_literal(path)?;
        self.set_path(&path, value.into(), options)
    }

    pub(crate) fn set_path(&self, path: &Path, value: Value, options: SetOptions) -> Result<()> {
        let keys = path.literal_keys()?;
        let before = tree::get(&self.root, &keys);
        tree::set(&self.root, &keys, value)?;
        let after = tree::get(&self.root, &keys);

        if options.trigger {
            self.trigger_changes(path, before, after, options.data);
        }
        Ok(())
    }

    /// Remove the value at `path`, leaving its parents in place.
    ///
    /// Returns the removed value (`Undefined` if there was none).
    pub fn unset<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.unset_with(path, SetOptions::default())
    }

    pub fn unset_with<'a>(&self, path: impl Into<PathInput<'a>>, options: SetOptions) -> Result<Value> {
        let path = self.parse_literal(path)?;
        self.remove_path(&path, options, false)
    }

    /// Remove the value at `path`, then every ancestor node left empty.
    pub fn cleanup<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.cleanup_with(path, SetOptions::default())
    }

    pub fn cleanup_with<'a>(&self, path: impl Into<PathInput<'a>>, options: SetOptions) -> Result<Value> {
        let path = self.parse_literal(path)?;
        self.remove_path(&path, options, true)
    }

    pub(crate) fn remove_path(&self, path: &Path, options: SetOptions, cleanup: bool) -> Result<Value> {
        let keys = path.literal_keys()?;
        if keys.is_empty() {
            return Err(StoreError::InvalidPath("cannot remove the root node".into()));
        }

        let before = tree::get(&self.root, &keys);
        if before.is_undefined() {
            return Ok(before);
        }

        if cleanup {
            tree::cleanup(&self.root, &keys);
        } else {
            tree::unset(&self.root, &keys);
        }

        if options.trigger {
            self.trigger_changes(path, before.clone(), Value::Undefined, options.data);
        }
        Ok(before)
    }

    /// Fire the standard events for a value going from `before` to `after`.
    ///
    /// Nothing fires when the two are equal (nodes compare by identity).
    /// Otherwise `change` fires, followed by `add` when `before` was
    /// undefined or `remove` when `after` is.
    pub fn trigger_changes(&self, path: &Path, before: Value, after: Value, data: Value) {
        if !self.config.events || before == after {
            return;
        }

        let added = before.is_undefined();
        let removed = after.is_undefined();
        tracing::debug!(path = %path, added, removed, "value changed");

        let change = EventData::Change {
            before,
            after,
            data,
        };
        self.events
            .trigger(self, path, CHANGE, TriggerOptions::data(change.clone()));

        if added {
            self.events
                .trigger(self, path, ADD, TriggerOptions::data(change));
        } else if removed {
            self.events
                .trigger(self, path, REMOVE, TriggerOptions::data(change));
        }
    }

    // --- Multi-Node Operations ---

    /// Run a query. The result shape follows `options.mode`.
    pub fn mget<'a>(&self, query: impl Into<PathInput<'a>>, options: &QueryOptions) -> Result<QueryResult> {
        let query = self.parse_query(query)?;
        Ok(query::traverse(&self.root, &query, options))
    }

    /// Number of leaves matched by `query`.
    pub fn count<'a>(&self, query: impl Into<PathInput<'a>>) -> Result<usize> {
        let query = self.parse_query(query)?;
        let result = query::traverse(&self.root, &query, &QueryOptions::mode(Mode::Count));
        Ok(result.len())
    }

    /// Assign `value` to every leaf matched by `query`.
    ///
    /// With events enabled every leaf goes through [`Datastore::set`], so
    /// each one fires its own change events.
    pub fn mset<'a>(
        &self,
        query: impl Into<PathInput<'a>>,
        value: impl Into<Value>,
        options: &QueryOptions,
    ) -> Result<QueryResult> {
        let query = self.parse_query(query)?;
        self.mset_path(&query, value.into(), options)
    }

    pub(crate) fn mset_path(&self, query: &Path, value: Value, options: &QueryOptions) -> Result<QueryResult> {
        ensure_not_root(query)?;
        if !self.config.events {
            return Ok(query::traverse_update(&self.root, query, options, Update::Set(value)));
        }

        let visited = self.each_live_match(query, options, true, |found| {
            let path = Path::from_keys(found.keys.iter().cloned());
            self.set_path(&path, value.clone(), SetOptions::default())
        })?;
        Ok(QueryResult::Updated(visited))
    }

    /// Replace every leaf matched by `query` with what `transform` returns.
    ///
    /// `transform` receives the current value and the keys leading to it;
    /// returning `None` leaves the leaf untouched.
    pub fn mupdate<'a, F>(
        &self,
        query: impl Into<PathInput<'a>>,
        options: &QueryOptions,
        transform: F,
    ) -> Result<QueryResult>
    where
        F: FnMut(&Value, &[String]) -> Option<Value>,
    {
        let query = self.parse_query(query)?;
        self.mupdate_path(&query, options, transform)
    }

    pub(crate) fn mupdate_path<F>(
        &self,
        query: &Path,
        options: &QueryOptions,
        mut transform: F,
    ) -> Result<QueryResult>
    where
        F: FnMut(&Value, &[String]) -> Option<Value>,
    {
        ensure_not_root(query)?;
        if !self.config.events {
            return Ok(query::traverse_update(
                &self.root,
                query,
                options,
                Update::With(&mut transform),
            ));
        }

        let visited = self.each_live_match(query, options, true, |found| {
            match transform(&found.value, &found.keys) {
                Some(value) => {
                    let path = Path::from_keys(found.keys.iter().cloned());
                    self.set_path(&path, value, SetOptions::default())
                }
                None => Ok(()),
            }
        })?;
        Ok(QueryResult::Updated(visited))
    }

    /// Remove every leaf matched by `query`.
    pub fn munset<'a>(&self, query: impl Into<PathInput<'a>>, options: &QueryOptions) -> Result<QueryResult> {
        let query = self.parse_query(query)?;
        self.munset_path(&query, options)
    }

    pub(crate) fn munset_path(&self, query: &Path, options: &QueryOptions) -> Result<QueryResult> {
        ensure_not_root(query)?;
        if !self.config.events {
            let options = options.clone().with_mode(Mode::Delete);
            return Ok(query::traverse(&self.root, query, &options));
        }

        let mut removed = 0;
        self.each_live_match(query, options, options.undef, |found| {
            if found.value.is_undefined() {
                // Nothing observable changes, so no events fire.
                if tree::unset(&self.root, &found.keys).is_some() {
                    removed += 1;
                }
                return Ok(());
            }
            let path = Path::from_keys(found.keys.iter().cloned());
            if !self.remove_path(&path, SetOptions::default(), false)?.is_undefined() {
                removed += 1;
            }
            Ok(())
        })?;
        Ok(QueryResult::Deleted(removed))
    }

    /// Apply `visit` to every match of `query` in traversal order, the way
    /// the engine's write walk would reach them.
    ///
    /// A match below a node that an earlier visit replaced or removed is
    /// dropped, and only visited matches count toward `options.limit`.
    /// Returns the number of matches visited.
    fn each_live_match<F>(&self, query: &Path, options: &QueryOptions, undef: bool, mut visit: F) -> Result<usize>
    where
        F: FnMut(&Match) -> Result<()>,
    {
        let collect = options.clone().with_limit(0).with_undef(undef);
        let matches = query::collect_matches(&self.root, query, &collect);

        let mut replaced: Vec<&[String]> = Vec::new();
        let mut visited = 0;
        for found in &matches {
            if options.limit > 0 && visited == options.limit {
                break;
            }
            if replaced.iter().any(|prefix| found.keys.starts_with(prefix)) {
                continue;
            }

            visit(found)?;
            visited += 1;

            if let Value::Node(before) = &found.value {
                let kept = match tree::get(&self.root, &found.keys) {
                    Value::Node(now) => now.ptr_eq(before),
                    _ => false,
                };
                if !kept {
                    replaced.push(&found.keys);
                }
            }
        }

        tracing::debug!(query = %query, matched = matches.len(), visited, "evented write finished");
        Ok(visited)
    }

    // --- Events ---

    fn ensure_events(&self) -> Result<()> {
        if self.config.events {
            Ok(())
        } else {
            Err(StoreError::EventsDisabled)
        }
    }

    /// Run `handler` whenever `name` fires at `path` or bubbles up to it.
    ///
    /// Handlers return `()`, a `bool` (`false` stops propagation) or a
    /// [`Propagation`].
    pub fn on<'a, F, R>(&self, path: impl Into<PathInput<'a>>, name: &str, handler: F) -> Result<ListenerId>
    where
        F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        let path = self.parse_event(path)?;
        self.on_path(&path, name, into_handler(handler))
    }

    pub(crate) fn on_path(&self, path: &Path, name: &str, handler: Handler) -> Result<ListenerId> {
        self.ensure_events()?;
        Ok(self.events.on(path, name, handler))
    }

    /// Like [`Datastore::on`], but the handler removes itself after its
    /// first run.
    pub fn one<'a, F, R>(&self, path: impl Into<PathInput<'a>>, name: &str, handler: F) -> Result<ListenerId>
    where
        F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        let path = self.parse_event(path)?;
        self.one_path(&path, name, into_handler(handler))
    }

    pub(crate) fn one_path(&self, path: &Path, name: &str, handler: Handler) -> Result<ListenerId> {
        self.ensure_events()?;
        Ok(self.events.one(path, name, handler))
    }

    /// Listen at `path` for `name` events whose target matches `pattern`.
    pub fn delegate<'a, 'b, F, R>(
        &self,
        path: impl Into<PathInput<'a>>,
        name: &str,
        pattern: impl Into<PathInput<'b>>,
        handler: F,
    ) -> Result<ListenerId>
    where
        F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        let path = self.parse_event(path)?;
        let pattern = self.parse_event(pattern)?;
        self.delegate_path(&path, name, pattern, into_handler(handler))
    }

    pub(crate) fn delegate_path(
        &self,
        path: &Path,
        name: &str,
        pattern: Path,
        handler: Handler,
    ) -> Result<ListenerId> {
        self.ensure_events()?;
        Ok(self.events.delegate(path, name, pattern, handler))
    }

    /// Remove listeners at `path`: one listener, every listener for `name`,
    /// or every listener at the path. Returns how many were removed.
    pub fn off<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        name: Option<&str>,
        listener: Option<ListenerId>,
    ) -> Result<usize> {
        let path = self.parse_event(path)?;
        self.off_path(&path, name, listener)
    }

    pub(crate) fn off_path(&self, path: &Path, name: Option<&str>, listener: Option<ListenerId>) -> Result<usize> {
        self.ensure_events()?;
        Ok(self.events.remove(path, name, listener))
    }

    /// Fire `name` at `path` and bubble it up to the root.
    ///
    /// Returns [`Propagation::Stop`] if a handler cancelled it.
    pub fn trigger<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        name: &str,
        options: TriggerOptions,
    ) -> Result<Propagation> {
        let path = self.parse_event(path)?;
        self.trigger_path(&path, name, options)
    }

    pub(crate) fn trigger_path(&self, path: &Path, name: &str, options: TriggerOptions) -> Result<Propagation> {
        self.ensure_events()?;
        Ok(self.events.trigger(self, path, name, options))
    }
}

impl Default for Datastore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_not_root(query: &Path) -> Result<()> {
    if query.is_empty() {
        return Err(StoreError::InvalidPath(
            "the root node cannot be written by a query".into(),
        ));
    }
    Ok(())
}

pub(crate) fn into_handler<F, R>(handler: F) -> Handler
where
    F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
    R: Into<Propagation>,
{
    Arc::new(move |store: &Datastore, event: &Event, data: &EventData| {
        handler(store, event, data).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn event_log(store: &Datastore, path: &str, names: &[&str]) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in names {
            let log = Arc::clone(&log);
            store
                .on(path, name, move |_, event: &Event, _| {
                    log.lock().push(event.name.clone());
                })
                .unwrap();
        }
        log
    }

    #[test]
    fn test_set_and_get() {
        let store = Datastore::new();
        store.set("a.b.c", 42).unwrap();

        assert_eq!(store.get("a.b.c").unwrap(), Value::from(42));
        assert!(store.get("a.x").unwrap().is_undefined());
        assert_eq!(store.to_json(), json!({"a": {"b": {"c": 42}}}));
    }

    #[test]
    fn test_get_root() {
        let store = Datastore::from_json(json!({"a": 1})).unwrap();
        assert_eq!(store.get("").unwrap(), Value::Node(store.root().clone()));
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(matches!(
            Datastore::from_json(json!(5)),
            Err(StoreError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_set_new_value_fires_change_and_add() {
        let store = Datastore::new();
        let log = event_log(&store, "a", &[CHANGE, ADD, REMOVE]);

        store.set("a", 1).unwrap();
        assert_eq!(*log.lock(), vec!["change", "add"]);
    }

    #[test]
    fn test_set_existing_value_fires_change_only() {
        let store = Datastore::from_json(json!({"a": 1})).unwrap();
        let log = event_log(&store, "a", &[CHANGE, ADD, REMOVE]);

        store.set("a", 2).unwrap();
        assert_eq!(*log.lock(), vec!["change"]);
    }

    #[test]
    fn test_set_same_value_fires_nothing() {
        let store = Datastore::from_json(json!({"a": 1, "n": {}})).unwrap();
        let log = event_log(&store, "", &[CHANGE, ADD, REMOVE]);

        store.set("a", 1).unwrap();
        let node = store.get("n").unwrap();
        store.set("n", node).unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unset_fires_change_and_remove() {
        let store = Datastore::from_json(json!({"a": 1})).unwrap();
        let log = event_log(&store, "a", &[CHANGE, ADD, REMOVE]);

        assert_eq!(store.unset("a").unwrap(), Value::from(1));
        assert_eq!(*log.lock(), vec!["change", "remove"]);

        // Already gone: nothing to report.
        assert!(store.unset("a").unwrap().is_undefined());
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_silent_writes() {
        let store = Datastore::new();
        let log = event_log(&store, "", &[CHANGE]);

        store.set_with("a", 1, SetOptions::silent()).unwrap();
        store.unset_with("a", SetOptions::silent()).unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_change_payload_carries_custom_data() {
        let store = Datastore::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        store
            .on("a", CHANGE, move |_, _, data: &EventData| {
                *sink.lock() = Some(data.clone());
            })
            .unwrap();

        store.set_with("a", "new", SetOptions::with_data("why")).unwrap();

        assert_eq!(
            seen.lock().clone(),
            Some(EventData::Change {
                before: Value::Undefined,
                after: Value::from("new"),
                data: Value::from("why"),
            })
        );
    }

    #[test]
    fn test_unset_root_fails() {
        let store = Datastore::new();
        assert!(matches!(store.unset(""), Err(StoreError::InvalidPath(_))));
        assert!(matches!(store.set("", 1), Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_access_lazily_populates() {
        let store = Datastore::new();
        store
            .on("config", ACCESS, |store: &Datastore, _, data: &EventData| {
                if let EventData::Access { path } = data {
                    store.set_with(path, "loaded", SetOptions::silent()).unwrap();
                }
            })
            .unwrap();

        assert_eq!(store.get("config").unwrap(), Value::from("loaded"));
    }

    #[test]
    fn test_silent_get_skips_access() {
        let store = Datastore::new();
        let log = event_log(&store, "", &[ACCESS]);

        store.get_with("missing", GetOptions::silent()).unwrap();
        assert!(log.lock().is_empty());

        store.get("missing").unwrap();
        assert_eq!(*log.lock(), vec!["access"]);
    }

    #[test]
    fn test_queries_disabled() {
        let store = Datastore::with_config(DatastoreConfig {
            queries: false,
            ..Default::default()
        });

        assert!(matches!(
            store.mget("*", &QueryOptions::default()),
            Err(StoreError::QueriesDisabled)
        ));

        // "*" is an ordinary key for single-node access.
        store.set("*", 1).unwrap();
        assert_eq!(store.get("*").unwrap(), Value::from(1));
    }

    #[test]
    fn test_events_disabled() {
        let store = Datastore::with_config(DatastoreConfig {
            events: false,
            ..Default::default()
        });

        let result = store.on("a", CHANGE, |_, _, _| {});
        assert!(matches!(result, Err(StoreError::EventsDisabled)));

        store.set("a.b", 1).unwrap();
        let result = store.mset("a.*", 2, &QueryOptions::default()).unwrap();
        assert_eq!(result, QueryResult::Updated(1));
        assert_eq!(store.to_json(), json!({"a": {"b": 2}}));

        let result = store.munset("a.*", &QueryOptions::default()).unwrap();
        assert_eq!(result, QueryResult::Deleted(1));
        assert_eq!(store.to_json(), json!({"a": {}}));
    }
}
