//! Single-subscriber change notification.
//!
//! A [`NotificationChannel`] is one optional callback slot. Assigning a new
//! subscriber replaces the previous one. The engine invokes the subscriber
//! synchronously after a mutation has committed and before the mutating call
//! returns, so a subscriber that reads the state observes the new values.
//!
//! No container borrow is held while the subscriber runs; it may read,
//! write, or replace itself. A panic inside a subscriber is not caught and
//! unwinds through the mutating call, after the mutation has committed.

use crate::{Path, Value};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Caller-supplied metadata forwarded verbatim with a mutation event.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Subscriber callback handle.
///
/// Shared so that substates can capture the parent's subscriber.
pub type Subscriber = Rc<dyn Fn(&MutationEvent)>;

/// Which operation committed a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// `set` / `set_with` / `toggle`
    Set,
    /// `append` / `append_with`
    Append,
    /// `insert`
    Insert,
    /// `destroy`
    Destroy,
    /// `pop` that removed an element
    Pop,
}

impl MutationKind {
    /// The operation name.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Set => "set",
            MutationKind::Append => "append",
            MutationKind::Insert => "insert",
            MutationKind::Destroy => "destroy",
            MutationKind::Pop => "pop",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record delivered to the subscriber after each committed mutation.
///
/// For `Set` and `Append` the path is the one passed by the caller and the
/// value is the one written (for `Append`, the appended element). For
/// `Insert`, `Destroy`, and `Pop` the path is the sequence path extended by
/// the normalized element index, and the value is the inserted or removed
/// element.
///
/// Paths are relative to the root of the engine that performed the write.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MutationEvent {
    /// The committing operation.
    pub kind: MutationKind,
    /// Location of the change.
    pub path: Path,
    /// The written or removed value (aliased, not copied).
    pub value: Value,
    /// Caller-supplied metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Extra>,
}

impl MutationEvent {
    /// Create an event without extra metadata.
    pub fn new(kind: MutationKind, path: Path, value: Value) -> Self {
        Self {
            kind,
            path,
            value,
            extra: None,
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_extra(mut self, extra: Option<Extra>) -> Self {
        self.extra = extra;
        self
    }
}

/// Holder of at most one subscriber.
#[derive(Default)]
pub struct NotificationChannel {
    slot: RefCell<Option<Subscriber>>,
}

impl NotificationChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel pre-seeded with a subscriber.
    pub fn seeded(subscriber: Option<Subscriber>) -> Self {
        Self {
            slot: RefCell::new(subscriber),
        }
    }

    /// Install `subscriber`, returning the one it replaces.
    pub fn replace(&self, subscriber: Subscriber) -> Option<Subscriber> {
        self.slot.borrow_mut().replace(subscriber)
    }

    /// Empty the slot, returning the removed subscriber.
    pub fn clear(&self) -> Option<Subscriber> {
        self.slot.borrow_mut().take()
    }

    /// The current subscriber.
    pub fn current(&self) -> Option<Subscriber> {
        self.slot.borrow().clone()
    }

    /// Returns true if a subscriber is installed.
    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Deliver `event` to the current subscriber, if any.
    ///
    /// Returns whether a subscriber was invoked.
    pub fn notify(&self, event: &MutationEvent) -> bool {
        // Release the slot before calling out: the subscriber may replace itself.
        let Some(subscriber) = self.current() else {
            return false;
        };
        subscriber(event);
        true
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("subscribed", &self.is_set())
            .finish()
    }
}
