//! Single-node access over a tree of [`Node`](crate::Node)s.

mod operations;

pub use operations::{cleanup, get, node_at, set, unset};
