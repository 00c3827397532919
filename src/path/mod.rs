//! Path expressions.
//!
//! A path is a sequence of tokens: plain keys, `*` wildcards, `..` skips and
//! `a,b` key sets. Strings are parsed with one of two grammars:
//!
//! - [`Grammar::Simple`] for single-node access (`a.b.c`)
//! - [`Grammar::Query`] for multi-node access (`a.*.c`, `a..c`, `a.x,y`)

mod matcher;
mod parser;

pub use matcher::matches;
pub use parser::{Grammar, Path, PathInput, PathParser, Token};
