//! Core types for the datastore: tree values and node handles.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Ordered key/value storage behind a [`Node`].
pub type Map = IndexMap<String, Value>;

/// A value stored in the tree.
///
/// Ordinals compare by value; nodes compare by identity, so two
/// structurally equal nodes are still different values.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value. A missing key reads as `Undefined`.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Node(Node),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a JSON document into a fresh tree value.
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let json: serde_json::Value = serde_json::from_str(s)?;
        Ok(Value::from(json))
    }

    /// Render this value as JSON.
    ///
    /// `Undefined` entries are omitted from objects. A node that is already
    /// being rendered further up (a loopback) renders as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut ancestors = Vec::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut Vec<Node>) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Node(node) => {
                if ancestors.iter().any(|a| a.ptr_eq(node)) {
                    return serde_json::Value::Null;
                }
                ancestors.push(node.clone());
                let mut out = serde_json::Map::new();
                for (key, value) in node.entries() {
                    if value.is_undefined() {
                        continue;
                    }
                    out.insert(key, value.to_json_inner(ancestors));
                }
                ancestors.pop();
                serde_json::Value::Object(out)
            }
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    // i64::MAX as f64 rounds up to 2^63, which does not fit.
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Undefined)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            // Arrays become nodes keyed by index.
            serde_json::Value::Array(items) => {
                let map = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), Value::from(item)))
                    .collect();
                Value::Node(Node::from_map(map))
            }
            serde_json::Value::Object(obj) => {
                let map = obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Node(Node::from_map(map))
            }
        }
    }
}

/// Shared handle to a mapping node in the tree.
///
/// Cloning the handle does not copy the mapping; both handles refer to the
/// same node, which is what loopback detection relies on.
///
/// Handles are reference counted. A node that holds itself, directly or
/// through its descendants, keeps itself alive after every outside handle
/// (including the owning datastore) is dropped. Remove the back-reference
/// before letting go of such a tree.
#[derive(Clone, Default)]
pub struct Node(Arc<RwLock<Map>>);

impl Node {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map) -> Self {
        Node(Arc::new(RwLock::new(map)))
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read a key. Missing keys read as `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        self.0.read().get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Insert a value, returning the previous one (`Undefined` if none).
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Value {
        self.0
            .write()
            .insert(key.into(), value.into())
            .unwrap_or_default()
    }

    /// Remove a key, keeping the order of the remaining keys.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Own keys in enumeration order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of the node's entries. The lock is released on return, so
    /// callers may mutate the node while walking the snapshot.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:p}, {} keys)", Arc::as_ptr(&self.0), self.len())
    }
}
