//! Event types.

use crate::path::Path;
use crate::store::Datastore;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fired by `get` when the value read is undefined.
pub const ACCESS: &str = "access";
/// Fired by every mutation that changes a value.
pub const CHANGE: &str = "change";
/// Fired after `change` when a value appears where there was none.
pub const ADD: &str = "add";
/// Fired after `change` when a value is removed.
pub const REMOVE: &str = "remove";

/// Unique identifier for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// What a handler sees about the event being dispatched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    /// Path whose listeners are currently running. Moves up while bubbling.
    pub path: Path,
    /// Path the event was originally aimed at.
    pub target: Path,
}

/// Payload delivered alongside an [`Event`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventData {
    #[default]
    None,
    /// A value changed. `data` carries the caller's custom data, if any.
    Change {
        before: Value,
        after: Value,
        data: Value,
    },
    /// A read found nothing at `path`. A handler may populate it; the read
    /// is retried once after dispatch.
    Access { path: Path },
    Custom(Value),
}

/// Returned by handlers to continue or cancel dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    /// Stop the remaining handlers at this level and suppress bubbling.
    Stop,
}

impl From<()> for Propagation {
    fn from(_: ()) -> Self {
        Propagation::Continue
    }
}

impl From<bool> for Propagation {
    /// `false` stops propagation.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Propagation::Continue
        } else {
            Propagation::Stop
        }
    }
}

/// A registered event handler.
pub type Handler = Arc<dyn Fn(&Datastore, &Event, &EventData) -> Propagation + Send + Sync>;

/// Options for [`Datastore::trigger`](crate::Datastore::trigger).
#[derive(Clone, Debug, Default)]
pub struct TriggerOptions {
    /// Overrides the recorded target (defaults to the trigger path).
    pub target: Option<Path>,
    pub data: EventData,
}

impl TriggerOptions {
    pub fn data(data: EventData) -> Self {
        Self { target: None, data }
    }

    pub fn with_target(mut self, target: Path) -> Self {
        self.target = Some(target);
        self
    }
}
