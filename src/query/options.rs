//! Query configuration and results.

use crate::error::StoreError;
use crate::types::{Node, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a read query produces for each matched leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Leaf keys, in match order.
    Keys,
    /// Leaf values, in match order.
    #[default]
    Values,
    /// Leaf key to value. Later leaves overwrite earlier ones with the same key.
    Both,
    /// Dot-joined full paths, in match order.
    Paths,
    /// Dot-joined full path to value.
    Full,
    /// Remove each matched leaf from its parent.
    Delete,
    /// Number of matched leaves.
    Count,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Keys => "keys",
            Mode::Values => "values",
            Mode::Both => "both",
            Mode::Paths => "paths",
            Mode::Full => "full",
            Mode::Delete => "delete",
            Mode::Count => "count",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keys" => Ok(Mode::Keys),
            "values" => Ok(Mode::Values),
            "both" => Ok(Mode::Both),
            "paths" => Ok(Mode::Paths),
            "full" => Ok(Mode::Full),
            "delete" => Ok(Mode::Delete),
            "count" => Ok(Mode::Count),
            other => Err(StoreError::InvalidOption(format!("unknown query mode '{}'", other))),
        }
    }
}

/// Options for a multi-node query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Stop the whole traversal after this many accepted leaves. 0 = unlimited.
    pub limit: usize,

    /// Result shape for read queries.
    pub mode: Mode,

    /// Follow references back into a node that is already being walked.
    /// A cyclic tree may then never finish.
    pub loopback: bool,

    /// Accept leaves whose value is undefined.
    pub undef: bool,
}

impl QueryOptions {
    pub fn mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    pub fn with_undef(mut self, undef: bool) -> Self {
        self.undef = undef;
        self
    }
}

/// Signature of a per-leaf transform: receives the current value and the
/// keys leading to the leaf, and returns the replacement (`None` = no write).
pub type TransformFn<'f> = dyn FnMut(&Value, &[String]) -> Option<Value> + 'f;

/// A write applied to every matched leaf, used instead of a read [`Mode`].
pub enum Update<'f> {
    /// Assign the same value to every leaf.
    Set(Value),
    /// Compute each leaf's new value.
    With(&'f mut TransformFn<'f>),
}

impl fmt::Debug for Update<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Update::With(_) => f.write_str("With(..)"),
        }
    }
}

/// A matched leaf: its full key path and the value it held.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub keys: Vec<String>,
    pub value: Value,
}

/// Result of a query. The variant follows the mode or update used.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    /// The empty query addresses the root node itself.
    Root(Node),
    Keys(Vec<String>),
    Values(Vec<Value>),
    Both(IndexMap<String, Value>),
    Paths(Vec<String>),
    Full(IndexMap<String, Value>),
    Count(usize),
    /// Number of keys removed: keys present when reached, including keys
    /// holding `Undefined` when `undef` is set. Absent keys do not count.
    ///
    /// Matches below a subtree removed earlier in the same call are never
    /// reached. Evented and direct deletes count the same way.
    Deleted(usize),
    /// Number of leaves visited by an update, whether or not a transform
    /// chose to write them.
    ///
    /// Matches below a subtree replaced earlier in the same call are never
    /// reached and do not count toward the limit. Evented and direct
    /// updates count the same way.
    Updated(usize),
}

impl QueryResult {
    /// Number of results held (or counted).
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Root(_) => 1,
            QueryResult::Keys(v) | QueryResult::Paths(v) => v.len(),
            QueryResult::Values(v) => v.len(),
            QueryResult::Both(m) | QueryResult::Full(m) => m.len(),
            QueryResult::Count(n) | QueryResult::Deleted(n) | QueryResult::Updated(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values for `Values` results, map values for `Both`/`Full`.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            QueryResult::Values(v) => v,
            QueryResult::Both(m) | QueryResult::Full(m) => m.into_values().collect(),
            QueryResult::Root(node) => vec![Value::Node(node)],
            _ => Vec::new(),
        }
    }

    /// Strings for `Keys`/`Paths` results, map keys for `Both`/`Full`.
    pub fn into_keys(self) -> Vec<String> {
        match self {
            QueryResult::Keys(v) | QueryResult::Paths(v) => v,
            QueryResult::Both(m) | QueryResult::Full(m) => m.into_keys().collect(),
            _ => Vec::new(),
        }
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            QueryResult::Count(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names() {
        for mode in [
            Mode::Keys,
            Mode::Values,
            Mode::Both,
            Mode::Paths,
            Mode::Full,
            Mode::Delete,
            Mode::Count,
        ] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
        assert!(matches!("all".parse::<Mode>(), Err(StoreError::InvalidOption(_))));
    }

    #[test]
    fn test_options_from_json() {
        let options: QueryOptions =
            serde_json::from_str(r#"{"mode": "count", "limit": 3}"#).unwrap();
        assert_eq!(options, QueryOptions::mode(Mode::Count).with_limit(3));

        let defaults: QueryOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.mode, Mode::Values);
        assert!(!defaults.loopback);
    }
}
