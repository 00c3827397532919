//! Single-node operations on a tree.
//!
//! These walk plain keys only; patterns are handled by the query engine.

use crate::error::{Result, StoreError};
use crate::types::{Node, Value};

/// Read the value at `keys`. Anything unreachable reads as `Undefined`.
///
/// The empty key list addresses the root itself.
pub fn get(root: &Node, keys: &[String]) -> Value {
    let mut current = Value::Node(root.clone());
    for key in keys {
        current = match current {
            Value::Node(node) => node.get(key),
            _ => return Value::Undefined,
        };
    }
    current
}

/// Write `value` at `keys`, creating missing intermediate nodes.
pub fn set(root: &Node, keys: &[String], value: Value) -> Result<()> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(StoreError::InvalidPath("cannot replace the root node".into()));
    };

    let mut node = root.clone();
    for (depth, key) in parents.iter().enumerate() {
        node = match node.get(key) {
            Value::Node(child) => child,
            Value::Undefined => {
                let child = Node::new();
                node.insert(key.clone(), child.clone());
                child
            }
            _ => {
                return Err(StoreError::InvalidNode(format!(
                    "'{}' does not hold a node",
                    keys[..=depth].join(".")
                )))
            }
        };
    }

    node.insert(last.clone(), value);
    Ok(())
}

/// Remove the value at `keys`, returning it if it was present.
pub fn unset(root: &Node, keys: &[String]) -> Option<Value> {
    let (last, parents) = keys.split_last()?;
    node_at(root, parents)?.remove(last)
}

/// Remove the value at `keys`, then remove every ancestor node left empty,
/// stopping at the first non-empty ancestor. The root is never removed.
pub fn cleanup(root: &Node, keys: &[String]) -> Option<Value> {
    let (last, parents) = keys.split_last()?;

    let mut chain = Vec::with_capacity(keys.len());
    let mut node = root.clone();
    chain.push(node.clone());
    for key in parents {
        node = node.get(key).as_node()?.clone();
        chain.push(node.clone());
    }

    let removed = node.remove(last)?;

    for depth in (1..chain.len()).rev() {
        if !chain[depth].is_empty() {
            break;
        }
        chain[depth - 1].remove(&keys[depth - 1]);
    }

    Some(removed)
}

/// The node at `keys`, if every step is a node.
pub fn node_at(root: &Node, keys: &[String]) -> Option<Node> {
    let mut node = root.clone();
    for key in keys {
        node = node.get(key).as_node()?.clone();
    }
    Some(node)
}
