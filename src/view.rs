//! Offset views.
//!
//! A [`View`] is a datastore scoped to a subtree: every path given to it is
//! resolved relative to a fixed offset. Views hold no state of their own, so
//! they are cheap to create and always see the live tree.

use crate::error::{Result, StoreError};
use crate::events::{Event, EventData, ListenerId, Propagation, TriggerOptions};
use crate::path::{Path, PathInput};
use crate::query::{QueryOptions, QueryResult};
use crate::store::{into_handler, Datastore, GetOptions, SetOptions};
use crate::tree;
use crate::types::{Node, Value};
use indexmap::IndexMap;

/// A datastore seen from `offset`.
///
/// Results that carry paths (`Paths`, `Full`) are reported relative to the
/// offset. Handlers registered through a view still receive the datastore
/// and absolute event paths.
#[derive(Clone)]
pub struct View<'s> {
    origin: &'s Datastore,
    offset: Path,
}

impl<'s> View<'s> {
    pub(crate) fn new(origin: &'s Datastore, offset: Path) -> Self {
        Self { origin, offset }
    }

    pub fn offset(&self) -> &Path {
        &self.offset
    }

    pub fn origin(&self) -> &'s Datastore {
        self.origin
    }

    /// The node at the offset, if there is one.
    pub fn node(&self) -> Option<Node> {
        let keys = self.offset.literal_keys().ok()?;
        tree::node_at(self.origin.root(), &keys)
    }

    /// A view nested below this one.
    pub fn view<'a>(&self, offset: impl Into<PathInput<'a>>) -> Result<View<'s>> {
        let offset = self.literal(offset)?;
        Ok(View::new(self.origin, offset))
    }

    fn literal<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Path> {
        Ok(self.origin.parse_literal(path)?.rebase(&self.offset))
    }

    fn query<'a>(&self, query: impl Into<PathInput<'a>>) -> Result<(Path, bool)> {
        let query = self.origin.parse_query(query)?;
        let relative_root = query.is_empty();
        Ok((query.rebase(&self.offset), relative_root))
    }

    fn event<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Path> {
        Ok(self.origin.parse_event(path)?.rebase(&self.offset))
    }

    // --- Single-Node Operations ---

    pub fn get<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.get_with(path, GetOptions::default())
    }

    pub fn get_with<'a>(&self, path: impl Into<PathInput<'a>>, options: GetOptions) -> Result<Value> {
        let path = self.literal(path)?;
        self.origin.get_path(&path, options)
    }

    pub fn set<'a>(&self, path: impl Into<PathInput<'a>>, value: impl Into<Value>) -> Result<()> {
        self.set_with(path, value, SetOptions::default())
    }

    pub fn set_with<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        value: impl Into<Value>,
        options: SetOptions,
    ) -> Result<()> {
        let path = self.literal(path)?;
        self.origin.set_path(&path, value.into(), options)
    }

    pub fn unset<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.unset_with(path, SetOptions::default())
    }

    pub fn unset_with<'a>(&self, path: impl Into<PathInput<'a>>, options: SetOptions) -> Result<Value> {
        let path = self.literal(path)?;
        self.origin.remove_path(&path, options, false)
    }

    pub fn cleanup<'a>(&self, path: impl Into<PathInput<'a>>) -> Result<Value> {
        self.cleanup_with(path, SetOptions::default())
    }

    pub fn cleanup_with<'a>(&self, path: impl Into<PathInput<'a>>, options: SetOptions) -> Result<Value> {
        let path = self.literal(path)?;
        self.origin.remove_path(&path, options, true)
    }

    // --- Multi-Node Operations ---

    /// Run a query below the offset. The empty query returns the node at
    /// the offset.
    pub fn mget<'a>(&self, query: impl Into<PathInput<'a>>, options: &QueryOptions) -> Result<QueryResult> {
        let (query, relative_root) = self.query(query)?;
        if relative_root && !self.offset.is_empty() {
            return Ok(match self.node() {
                Some(node) => QueryResult::Root(node),
                None => QueryResult::Values(Vec::new()),
            });
        }

        let result = self.origin.mget(&query, options)?;
        Ok(self.relativize(result))
    }

    pub fn count<'a>(&self, query: impl Into<PathInput<'a>>) -> Result<usize> {
        let (query, relative_root) = self.query(query)?;
        if relative_root {
            return Ok(usize::from(self.node().is_some()));
        }
        self.origin.count(&query)
    }

    pub fn mset<'a>(
        &self,
        query: impl Into<PathInput<'a>>,
        value: impl Into<Value>,
        options: &QueryOptions,
    ) -> Result<QueryResult> {
        let query = self.write_query(query)?;
        self.origin.mset_path(&query, value.into(), options)
    }

    pub fn mupdate<'a, F>(
        &self,
        query: impl Into<PathInput<'a>>,
        options: &QueryOptions,
        transform: F,
    ) -> Result<QueryResult>
    where
        F: FnMut(&Value, &[String]) -> Option<Value>,
    {
        let query = self.write_query(query)?;
        self.origin.mupdate_path(&query, options, transform)
    }

    pub fn munset<'a>(&self, query: impl Into<PathInput<'a>>, options: &QueryOptions) -> Result<QueryResult> {
        let query = self.write_query(query)?;
        self.origin.munset_path(&query, options)
    }

    fn write_query<'a>(&self, query: impl Into<PathInput<'a>>) -> Result<Path> {
        let (query, relative_root) = self.query(query)?;
        if relative_root {
            return Err(StoreError::InvalidPath(
                "the root of a view cannot be written by a query".into(),
            ));
        }
        Ok(query)
    }

    /// Strip the offset from `Paths` and `Full` results.
    fn relativize(&self, result: QueryResult) -> QueryResult {
        if self.offset.is_empty() {
            return result;
        }
        let prefix = format!("{}.", self.offset);
        let strip = |path: String| match path.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None => path,
        };

        match result {
            QueryResult::Paths(paths) => QueryResult::Paths(paths.into_iter().map(strip).collect()),
            QueryResult::Full(map) => QueryResult::Full(
                map.into_iter()
                    .map(|(path, value)| (strip(path), value))
                    .collect::<IndexMap<_, _>>(),
            ),
            other => other,
        }
    }

    // --- Events ---

    pub fn on<'a, F, R>(&self, path: impl Into<PathInput<'a>>, name: &str, handler: F) -> Result<ListenerId>
    where
        F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        let path = self.event(path)?;
        self.origin.on_path(&path, name, into_handler(handler))
    }

    pub fn one<'a, F, R>(&self, path: impl Into<PathInput<'a>>, name: &str, handler: F) -> Result<ListenerId>
    where
        F: Fn(&Datastore, &Event, &EventData) -> R + Send + Sync + 'static,
        R: Into<Propagation>,
    {
        let path = self.event(path)?;
        self.origin.one_path(&path, name, into_handler(handler))
    }

    /// Delegate below the offset. The pattern is relative to the offset too.
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
        let path = self.event(path)?;
        let pattern = self.event(pattern)?;
        self.origin
            .delegate_path(&path, name, pattern, into_handler(handler))
    }

    pub fn off<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        name: Option<&str>,
        listener: Option<ListenerId>,
    ) -> Result<usize> {
        let path = self.event(path)?;
        self.origin.off_path(&path, name, listener)
    }

    /// Trigger below the offset. An explicit target is relative to the
    /// offset as well.
    pub fn trigger<'a>(
        &self,
        path: impl Into<PathInput<'a>>,
        name: &str,
        mut options: TriggerOptions,
    ) -> Result<Propagation> {
        let path = self.event(path)?;
        options.target = options.target.map(|target| target.rebase(&self.offset));
        self.origin.trigger_path(&path, name, options)
    }
}
