//! Multi-node traversal.
//!
//! The walk is a recursive descent over the tree, driven by the query's
//! tokens. Every leaf addressed by the last token is handed to the
//! configured action. A positive limit ends the whole traversal, not just the
//! current branch, once it is used up.

use super::options::{Match, Mode, QueryOptions, QueryResult, Update};
use crate::path::{Path, Token};
use crate::types::{Node, Value};
use indexmap::IndexMap;

/// Run a read query (or a delete/count) against `root`.
pub fn traverse(root: &Node, query: &Path, options: &QueryOptions) -> QueryResult {
    if query.is_empty() {
        return QueryResult::Root(root.clone());
    }
    let sink = Sink::for_mode(options.mode);
    run(root, query, options, Action::Read(options.mode), sink)
}

/// Apply `update` to every leaf matched by `query`.
///
/// Returns [`QueryResult::Updated`] with the number of leaves visited. A
/// transform that returns `None` visits a leaf without writing it.
pub fn traverse_update(
    root: &Node,
    query: &Path,
    options: &QueryOptions,
    update: Update<'_>,
) -> QueryResult {
    if query.is_empty() {
        return QueryResult::Root(root.clone());
    }
    run(root, query, options, Action::Update(update), Sink::Updated(0))
}

/// Every leaf matched by `query`, with its full key path.
///
/// Read rules apply: undefined leaves are skipped unless `options.undef`.
pub fn collect_matches(root: &Node, query: &Path, options: &QueryOptions) -> Vec<Match> {
    if query.is_empty() {
        return Vec::new();
    }
    match run_sink(root, query, options, Action::Collect, Sink::Matches(Vec::new())) {
        Sink::Matches(matches) => matches,
        _ => Vec::new(),
    }
}

fn run(
    root: &Node,
    query: &Path,
    options: &QueryOptions,
    action: Action<'_>,
    sink: Sink,
) -> QueryResult {
    let result = run_sink(root, query, options, action, sink).into_result();
    tracing::debug!(query = %query, results = result.len(), "query finished");
    result
}

fn run_sink(
    root: &Node,
    query: &Path,
    options: &QueryOptions,
    action: Action<'_>,
    sink: Sink,
) -> Sink {
    let mut walker = Walker {
        tokens: query.tokens(),
        options,
        action,
        remaining: (options.limit > 0).then_some(options.limit),
        ancestors: Vec::new(),
        keys: Vec::new(),
        sink,
    };
    walker.walk(root, 0);
    walker.sink
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt,
}

enum Action<'f> {
    Read(Mode),
    Update(Update<'f>),
    Collect,
}

enum Sink {
    Keys(Vec<String>),
    Values(Vec<Value>),
    Both(IndexMap<String, Value>),
    Paths(Vec<String>),
    Full(IndexMap<String, Value>),
    Count(usize),
    Deleted(usize),
    Updated(usize),
    Matches(Vec<Match>),
}

impl Sink {
    fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Keys => Sink::Keys(Vec::new()),
            Mode::Values => Sink::Values(Vec::new()),
            Mode::Both => Sink::Both(IndexMap::new()),
            Mode::Paths => Sink::Paths(Vec::new()),
            Mode::Full => Sink::Full(IndexMap::new()),
            Mode::Delete => Sink::Deleted(0),
            Mode::Count => Sink::Count(0),
        }
    }

    fn into_result(self) -> QueryResult {
        match self {
            Sink::Keys(v) => QueryResult::Keys(v),
            Sink::Values(v) => QueryResult::Values(v),
            Sink::Both(m) => QueryResult::Both(m),
            Sink::Paths(v) => QueryResult::Paths(v),
            Sink::Full(m) => QueryResult::Full(m),
            Sink::Count(n) => QueryResult::Count(n),
            Sink::Deleted(n) => QueryResult::Deleted(n),
            Sink::Updated(n) => QueryResult::Updated(n),
            Sink::Matches(m) => QueryResult::Count(m.len()),
        }
    }
}

struct Walker<'q, 'f> {
    tokens: &'q [Token],
    options: &'q QueryOptions,
    action: Action<'f>,
    /// Leaves left before the limit is reached; `None` when unlimited.
    remaining: Option<usize>,
    /// Nodes on the current descent, for loopback detection.
    ancestors: Vec<Node>,
    /// Keys from the root to the current position.
    keys: Vec<String>,
    sink: Sink,
}

impl Walker<'_, '_> {
    fn walk(&mut self, node: &Node, depth: usize) -> Flow {
        let tokens = self.tokens;
        self.ancestors.push(node.clone());

        let flow = match &tokens[depth] {
            Token::Key(key) => self.visit(node, key, node.get(key), depth),
            Token::Set(keys) => {
                let mut flow = Flow::Continue;
                for key in keys {
                    flow = self.visit(node, key, node.get(key), depth);
                    if flow == Flow::Halt {
                        break;
                    }
                }
                flow
            }
            Token::Wildcard => {
                let mut flow = Flow::Continue;
                for (key, value) in node.entries() {
                    flow = self.visit(node, &key, value, depth);
                    if flow == Flow::Halt {
                        break;
                    }
                }
                flow
            }
            Token::Skip => self.skip(node, depth),
        };

        self.ancestors.pop();
        flow
    }

    /// Handle one child addressed by the token at `depth`.
    fn visit(&mut self, parent: &Node, key: &str, value: Value, depth: usize) -> Flow {
        if depth + 1 == self.tokens.len() {
            self.leaf(parent, key, value)
        } else {
            self.descend(key, value, depth + 1)
        }
    }

    /// A skip branches two ways at every key: it may end here (the next token
    /// is tried against this same node) and it may continue below the key.
    fn skip(&mut self, node: &Node, depth: usize) -> Flow {
        let tokens = self.tokens;
        let next = tokens.get(depth + 1);
        let mut rewalked = false;

        for (key, value) in node.entries() {
            match next {
                None => {
                    if self.leaf(node, &key, value.clone()) == Flow::Halt {
                        return Flow::Halt;
                    }
                }
                Some(next) => {
                    if !rewalked && next.accepts(&key) {
                        rewalked = true;
                        if self.walk(node, depth + 1) == Flow::Halt {
                            return Flow::Halt;
                        }
                    }
                }
            }
            // A write above may have replaced or removed this subtree.
            if self.mutates() && !holds_node(node, &key, &value) {
                continue;
            }
            if self.descend(&key, value, depth) == Flow::Halt {
                return Flow::Halt;
            }
        }
        Flow::Continue
    }

    fn descend(&mut self, key: &str, value: Value, depth: usize) -> Flow {
        let Value::Node(child) = value else {
            return Flow::Continue;
        };
        if !self.options.loopback && self.ancestors.iter().any(|a| a.ptr_eq(&child)) {
            tracing::trace!(key, "skipping loopback");
            return Flow::Continue;
        }

        self.keys.push(key.to_string());
        let flow = self.walk(&child, depth);
        self.keys.pop();
        flow
    }

    fn leaf(&mut self, parent: &Node, key: &str, value: Value) -> Flow {
        let writes = matches!(self.action, Action::Update(_));
        if !writes && value.is_undefined() && !self.options.undef {
            return Flow::Continue;
        }

        self.keys.push(key.to_string());
        match (&mut self.action, &mut self.sink) {
            (Action::Read(_), Sink::Keys(out)) => out.push(key.to_string()),
            (Action::Read(_), Sink::Values(out)) => out.push(value),
            (Action::Read(_), Sink::Both(out)) => {
                out.insert(key.to_string(), value);
            }
            (Action::Read(_), Sink::Paths(out)) => out.push(self.keys.join(".")),
            (Action::Read(_), Sink::Full(out)) => {
                out.insert(self.keys.join("."), value);
            }
            (Action::Read(_), Sink::Deleted(n)) => {
                if parent.remove(key).is_some() {
                    *n += 1;
                }
            }
            (Action::Read(_), Sink::Count(n)) => *n += 1,
            (Action::Update(Update::Set(new_value)), Sink::Updated(n)) => {
                parent.insert(key, new_value.clone());
                *n += 1;
            }
            (Action::Update(Update::With(transform)), Sink::Updated(n)) => {
                if let Some(new_value) = transform(&value, &self.keys) {
                    parent.insert(key, new_value);
                }
                *n += 1;
            }
            (Action::Collect, Sink::Matches(out)) => out.push(Match {
                keys: self.keys.clone(),
                value,
            }),
            _ => {}
        }
        self.keys.pop();

        match self.remaining.as_mut() {
            Some(remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    Flow::Halt
                } else {
                    Flow::Continue
                }
            }
            None => Flow::Continue,
        }
    }

    fn mutates(&self) -> bool {
        matches!(self.action, Action::Update(_)) || matches!(self.sink, Sink::Deleted(_))
    }
}

/// Whether `node[key]` is still the node `before` held.
fn holds_node(node: &Node, key: &str, before: &Value) -> bool {
    match (before, node.get(key)) {
        (Value::Node(before), Value::Node(now)) => before.ptr_eq(&now),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Grammar;
    use serde_json::json;

    fn tree(doc: serde_json::Value) -> Node {
        Value::from(doc).as_node().unwrap().clone()
    }

    fn query(s: &str) -> Path {
        Path::parse(s, Grammar::Query).unwrap()
    }

    fn fourth() -> Node {
        tree(json!({
            "fourth": {
                "1": {"a": "One", "b": "Two"},
                "2": {"a": "Three", "b": "Four"},
                "3": {"a": "Five", "b": "Six"}
            }
        }))
    }

    #[test]
    fn test_count_and_values() {
        let root = fourth();

        let count = traverse(&root, &query("fourth.*.a"), &QueryOptions::mode(Mode::Count));
        assert_eq!(count, QueryResult::Count(3));

        let values = traverse(&root, &query("fourth.*.a"), &QueryOptions::default());
        assert_eq!(
            values,
            QueryResult::Values(vec!["One".into(), "Three".into(), "Five".into()])
        );
    }

    #[test]
    fn test_keys_paths_and_full() {
        let root = fourth();
        let q = query("fourth.*.a,b");

        let keys = traverse(&root, &q, &QueryOptions::mode(Mode::Keys)).into_keys();
        assert_eq!(keys, vec!["a", "b", "a", "b", "a", "b"]);

        let paths = traverse(&root, &query("fourth.2.*"), &QueryOptions::mode(Mode::Paths));
        assert_eq!(
            paths,
            QueryResult::Paths(vec!["fourth.2.a".into(), "fourth.2.b".into()])
        );

        let full = traverse(&root, &q, &QueryOptions::mode(Mode::Full));
        assert_eq!(full.len(), 6);
        if let QueryResult::Full(map) = full {
            assert_eq!(map["fourth.3.b"], Value::from("Six"));
        }
    }

    #[test]
    fn test_both_overwrites_duplicate_keys() {
        let root = fourth();
        let both = traverse(&root, &query("fourth.*.a"), &QueryOptions::mode(Mode::Both));

        let QueryResult::Both(map) = both else {
            panic!("expected Both result");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], Value::from("Five"));
    }

    #[test]
    fn test_root_shortcut() {
        let root = fourth();
        let result = traverse(&root, &Path::root(), &QueryOptions::mode(Mode::Count));
        assert_eq!(result, QueryResult::Root(root));
    }

    #[test]
    fn test_unmatched_is_empty() {
        let root = fourth();
        assert!(traverse(&root, &query("nope.*"), &QueryOptions::default()).is_empty());
        assert_eq!(
            traverse(&root, &query("fourth.*.z"), &QueryOptions::mode(Mode::Count)),
            QueryResult::Count(0)
        );
    }

    #[test]
    fn test_undefined_leaves() {
        let root = tree(json!({"a": 1}));
        root.insert("u", Value::Undefined);

        let q = query("a,u,missing");
        let values = traverse(&root, &q, &QueryOptions::default());
        assert_eq!(values, QueryResult::Values(vec![Value::from(1)]));

        let values = traverse(&root, &q, &QueryOptions::default().with_undef(true));
        assert_eq!(
            values,
            QueryResult::Values(vec![Value::from(1), Value::Undefined, Value::Undefined])
        );
    }

    #[test]
    fn test_skip_finds_key_at_any_depth() {
        let root = tree(json!({
            "x": {"id": 1, "deep": {"id": 2, "deeper": {"id": 3}}},
            "y": {"other": {"id": 4}},
            "id": 0
        }));

        let paths = traverse(&root, &query("..id"), &QueryOptions::mode(Mode::Paths));
        assert_eq!(
            paths.into_keys(),
            vec!["x.id", "x.deep.id", "x.deep.deeper.id", "y.other.id", "id"]
        );
    }

    #[test]
    fn test_skip_between_keys() {
        let root = tree(json!({
            "a": {"c": 1, "b": {"c": 2, "x": {"c": 3}}}
        }));

        let values = traverse(&root, &query("a..c"), &QueryOptions::default());
        assert_eq!(
            values,
            QueryResult::Values(vec![1.into(), 2.into(), 3.into()])
        );
    }

    #[test]
    fn test_terminal_skip_visits_every_descendant() {
        let root = tree(json!({"a": {"b": {"c": 1}, "d": 2}}));

        let paths = traverse(&root, &query("a.."), &QueryOptions::mode(Mode::Paths));
        assert_eq!(paths.into_keys(), vec!["a.b", "a.b.c", "a.d"]);
    }

    #[test]
    fn test_loopback_is_not_revisited() {
        let root = Node::new();
        let node = Node::new();
        node.insert("name", "n");
        node.insert("self", node.clone());
        root.insert("node", node.clone());

        let paths = traverse(&root, &query("..name"), &QueryOptions::mode(Mode::Paths));
        assert_eq!(paths.into_keys(), vec!["node.name"]);

        let count = traverse(&root, &query("node.."), &QueryOptions::mode(Mode::Count));
        assert_eq!(count, QueryResult::Count(2));
    }

    #[test]
    fn test_loopback_followed_when_allowed() {
        let root = Node::new();
        root.insert("self", root.clone());

        // With loopback the walk only ends because of the limit.
        let options = QueryOptions::mode(Mode::Count).with_loopback(true).with_limit(10);
        assert_eq!(traverse(&root, &query(".."), &options), QueryResult::Count(10));
    }

    #[test]
    fn test_limit_halts_entire_walk() {
        let root = tree(json!({
            "a": {"x": 1, "y": 2},
            "b": {"x": 3},
            "c": {"x": 4, "y": 5}
        }));
        let mut calls = 0;
        let mut transform = |_: &Value, _: &[String]| -> Option<Value> {
            calls += 1;
            None
        };

        let result = traverse_update(
            &root,
            &query("*.*"),
            &QueryOptions::default().with_limit(1),
            Update::With(&mut transform),
        );

        assert_eq!(result, QueryResult::Updated(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_limit_on_reads() {
        let root = fourth();
        let values = traverse(&root, &query("fourth.*.*"), &QueryOptions::default().with_limit(3));
        assert_eq!(
            values,
            QueryResult::Values(vec!["One".into(), "Two".into(), "Three".into()])
        );
    }

    #[test]
    fn test_update_with_literal() {
        let root = fourth();
        let result = traverse_update(
            &root,
            &query("fourth.*.a"),
            &QueryOptions::default(),
            Update::Set(Value::from("X")),
        );

        assert_eq!(result, QueryResult::Updated(3));
        assert_eq!(
            Value::Node(root).to_json()["fourth"],
            json!({
                "1": {"a": "X", "b": "Two"},
                "2": {"a": "X", "b": "Four"},
                "3": {"a": "X", "b": "Six"}
            })
        );
    }

    #[test]
    fn test_update_with_transform() {
        let root = tree(json!({"n": {"a": 1, "b": 2, "c": "skip"}}));
        let mut seen = Vec::new();
        let mut double = |value: &Value, keys: &[String]| {
            seen.push(keys.join("."));
            value.as_f64().map(|n| Value::from(n * 2.0))
        };

        traverse_update(
            &root,
            &query("n.*"),
            &QueryOptions::default(),
            Update::With(&mut double),
        );

        assert_eq!(seen, vec!["n.a", "n.b", "n.c"]);
        assert_eq!(
            Value::Node(root).to_json(),
            json!({"n": {"a": 2, "b": 4, "c": "skip"}})
        );
    }

    #[test]
    fn test_update_creates_literal_leaf() {
        let root = tree(json!({"a": {}, "b": {}}));
        traverse_update(
            &root,
            &query("*.flag"),
            &QueryOptions::default(),
            Update::Set(Value::Bool(true)),
        );
        assert_eq!(
            Value::Node(root).to_json(),
            json!({"a": {"flag": true}, "b": {"flag": true}})
        );
    }

    #[test]
    fn test_delete_mode() {
        let root = fourth();
        let result = traverse(&root, &query("fourth.*.b"), &QueryOptions::mode(Mode::Delete));

        assert_eq!(result, QueryResult::Deleted(3));
        assert_eq!(
            Value::Node(root).to_json(),
            json!({"fourth": {"1": {"a": "One"}, "2": {"a": "Three"}, "3": {"a": "Five"}}})
        );
    }

    #[test]
    fn test_collect_matches() {
        let root = fourth();
        let matches = collect_matches(&root, &query("fourth.1,3.b"), &QueryOptions::default());

        assert_eq!(
            matches,
            vec![
                Match {
                    keys: vec!["fourth".into(), "1".into(), "b".into()],
                    value: "Two".into(),
                },
                Match {
                    keys: vec!["fourth".into(), "3".into(), "b".into()],
                    value: "Six".into(),
                },
            ]
        );
    }

    #[test]
    fn test_delete_does_not_descend_into_removed_subtree() {
        let root = tree(json!({"a": {"b": {"c": 1}}}));
        let result = traverse(&root, &query("a.."), &QueryOptions::mode(Mode::Delete));
        assert_eq!(result, QueryResult::Deleted(1));
        assert_eq!(Value::Node(root).to_json(), json!({"a": {}}));

        let root = tree(json!({"c": {"c": 1}}));
        let result = traverse(&root, &query("..c"), &QueryOptions::mode(Mode::Delete));
        assert_eq!(result, QueryResult::Deleted(1));
        assert!(root.is_empty());
    }

    #[test]
    fn test_update_does_not_descend_into_replaced_subtree() {
        let root = tree(json!({"id": {"id": 1}}));
        let result = traverse_update(
            &root,
            &query("..id"),
            &QueryOptions::default(),
            Update::Set(Value::from(5)),
        );
        assert_eq!(result, QueryResult::Updated(1));
        assert_eq!(Value::Node(root).to_json(), json!({"id": 5}));

        // The limit is spent only on writes that land in the tree.
        let root = tree(json!({"a": {"b": {"c": 1}, "d": 2}}));
        let result = traverse_update(
            &root,
            &query("a.."),
            &QueryOptions::default().with_limit(2),
            Update::Set(Value::from(0)),
        );
        assert_eq!(result, QueryResult::Updated(2));
        assert_eq!(Value::Node(root).to_json(), json!({"a": {"b": 0, "d": 0}}));
    }

    #[test]
    fn test_update_descends_when_transform_keeps_subtree() {
        let root = tree(json!({"id": {"id": 1}}));
        let mut scale = |value: &Value, _: &[String]| value.as_f64().map(|n| Value::from(n * 10.0));

        let result = traverse_update(
            &root,
            &query("..id"),
            &QueryOptions::default(),
            Update::With(&mut scale),
        );
        assert_eq!(result, QueryResult::Updated(2));
        assert_eq!(Value::Node(root).to_json(), json!({"id": {"id": 10}}));
    }
}
