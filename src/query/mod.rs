//! Multi-node queries.
//!
//! A query is a [`Path`](crate::path::Path) that may contain wildcards,
//! key sets and skips. [`traverse`] walks the tree once and hands every
//! matched leaf to the action selected by [`QueryOptions::mode`] or by an
//! [`Update`].

mod engine;
mod options;

pub use engine::{collect_matches, traverse, traverse_update};
pub use options::{Match, Mode, QueryOptions, QueryResult, TransformFn, Update};
