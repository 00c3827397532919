//! Path-scoped events.
//!
//! Listeners are registered for an event name at a path. Triggering an event
//! runs the listeners at that path, then bubbles up through every ancestor
//! to the root unless a handler stops it.
//!
//! Mutations fire the standard events:
//! - [`CHANGE`] on every effective change
//! - [`ADD`] when a value appears, [`REMOVE`] when one disappears
//! - [`ACCESS`] when a read finds nothing
//!
//! # Example
//!
//! ```ignore
//! let store = Datastore::new();
//!
//! store.on("users", CHANGE, |_, event, data| {
//!     println!("{} changed: {:?}", event.target, data);
//! })?;
//!
//! // Fires at users.alice.name, users.alice, users and the root.
//! store.set("users.alice.name", "Alice")?;
//! ```

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{
    Event, EventData, Handler, ListenerId, Propagation, TriggerOptions, ACCESS, ADD, CHANGE,
    REMOVE,
};
