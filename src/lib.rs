//! # Dotstore
//!
//! An in-memory, hierarchical key-value datastore addressed by dot-separated
//! paths, with multi-node queries and bubbling change events.
//!
//! ## Core Concepts
//!
//! - **Nodes**: Shared, ordered maps of keys to values; a node may appear
//!   at several paths at once
//! - **Paths**: `a.b.c` for single values; `*`, `..` and `x,y` for queries
//! - **Queries**: One traversal that reads, counts, updates or deletes every
//!   matching leaf
//! - **Events**: `change`/`add`/`remove`/`access` fired at a path and
//!   bubbled to every ancestor
//!
//! ## Example
//!
//! ```ignore
//! use dotstore::{Datastore, Mode, QueryOptions, CHANGE};
//!
//! let store = Datastore::new();
//!
//! store.on("users", CHANGE, |_, event, _| {
//!     println!("changed: {}", event.target);
//! })?;
//!
//! store.set("users.alice.age", 30)?;
//! store.set("users.bob.age", 25)?;
//!
//! let ages = store.mget("users.*.age", &QueryOptions::default())?;
//! let paths = store.mget("..age", &QueryOptions::mode(Mode::Paths))?;
//! ```

pub mod error;
pub mod events;
pub mod path;
pub mod query;
pub mod store;
pub mod tree;
pub mod types;
pub mod view;

// Re-exports
pub use error::{Result, StoreError};
pub use events::{
    Event, EventBus, EventData, Handler, ListenerId, Propagation, TriggerOptions, ACCESS, ADD,
    CHANGE, REMOVE,
};
pub use path::{matches, Grammar, Path, PathInput, PathParser, Token};
pub use query::{Match, Mode, QueryOptions, QueryResult, Update};
pub use store::{Datastore, DatastoreConfig, GetOptions, SetOptions, DEFAULT_PATH_CACHE_SIZE};
pub use types::{Map, Node, Value};
pub use view::View;
