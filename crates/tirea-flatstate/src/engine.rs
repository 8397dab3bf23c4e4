//! The path-addressed state engine.
//!
//! [`FlatState`] owns a handle to a root container and a notification slot.
//! Write-style operations (`set`, `append`, `insert`, `destroy`, `toggle`,
//! `sub_state`) are strict and return [`FlatError`] on structural problems.
//! Read-style operations (`get`, `size`, `pop`) never fail and answer with
//! `None` or `0` instead.
//!
//! `FlatState` is a handle: cloning it yields another handle to the same
//! tree and the same subscriber slot. [`FlatState::sub_state`] yields a new
//! engine rooted inside the tree with its own slot, seeded once with the
//! parent's current subscriber.

use crate::error::{found_name, value_type_name};
use crate::notify::{Extra, MutationEvent, MutationKind, NotificationChannel, Subscriber};
use crate::resolve::{clamp_insert_index, normalize_index, resolve_for_read, resolve_for_write};
use crate::value::WeakContainer;
use crate::{Container, FlatError, FlatResult, Path, SeqRef, Value};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Path-addressed mutable state tree with a single change subscriber.
///
/// # Examples
///
/// ```
/// use tirea_flatstate::{path, FlatState};
/// use serde_json::json;
///
/// let state = FlatState::new();
/// state.set(&path!("todos", 0, "title"), "write docs").unwrap();
/// state.append(&path!("todos"), json!({"title": "ship"})).unwrap();
///
/// assert_eq!(state.size(&path!("todos")), 2);
/// assert_eq!(state.get(&path!("todos", -1, "title")).unwrap(), json!("ship"));
/// ```
#[derive(Clone)]
pub struct FlatState {
    root: Container,
    channel: Rc<NotificationChannel>,
}

impl FlatState {
    /// Create an engine over a new, empty mapping.
    pub fn new() -> Self {
        Self::from_parts(Container::default(), None)
    }

    /// Start building an engine.
    pub fn builder() -> FlatStateBuilder {
        FlatStateBuilder::default()
    }

    /// Create an engine over an existing root.
    ///
    /// The root is aliased, not copied. Fails with `InvalidRoot` if `root`
    /// is not a mapping or sequence.
    pub fn with_root(root: impl Into<Value>) -> FlatResult<Self> {
        Self::builder().root(root).build()
    }

    /// Create an engine over a deep copy of a JSON document.
    pub fn from_json(json: serde_json::Value) -> FlatResult<Self> {
        Self::builder().root_json(json).build()
    }

    /// Parse a JSON document and use it as the root.
    ///
    /// Fails with `Serialization` on malformed input and `InvalidRoot` when
    /// the document is not an object or array.
    pub fn from_json_str(input: &str) -> FlatResult<Self> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        Self::from_json(json)
    }

    fn from_parts(root: Container, subscriber: Option<Subscriber>) -> Self {
        Self {
            root,
            channel: Rc::new(NotificationChannel::seeded(subscriber)),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Get the value at `path`, or `None` if anything along it is missing.
    ///
    /// The empty path returns the root. Containers are returned as aliases.
    pub fn get(&self, path: &Path) -> Option<Value> {
        resolve_for_read(&self.root, path)
    }

    /// Length of the sequence at `path`, or `0` if it is missing or not a sequence.
    pub fn size(&self, path: &Path) -> usize {
        self.get(path)
            .and_then(|v| v.as_sequence().map(SeqRef::len))
            .unwrap_or(0)
    }

    /// The live root, aliased.
    pub fn snapshot(&self) -> Value {
        self.root.to_value()
    }

    /// The root container handle.
    pub fn root(&self) -> &Container {
        &self.root
    }

    /// Deep copy of the whole tree as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.snapshot().to_json()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Store `value` at `path`, creating missing intermediates.
    pub fn set(&self, path: &Path, value: impl Into<Value>) -> FlatResult<()> {
        self.set_inner(path, value.into(), None)
    }

    /// Like [`set`](Self::set), forwarding `extra` to the subscriber.
    pub fn set_with(&self, path: &Path, value: impl Into<Value>, extra: Extra) -> FlatResult<()> {
        self.set_inner(path, value.into(), Some(extra))
    }

    fn set_inner(&self, path: &Path, value: Value, extra: Option<Extra>) -> FlatResult<()> {
        self.store(MutationKind::Set, path, value.clone())?;
        self.commit(MutationEvent::new(MutationKind::Set, path.clone(), value).with_extra(extra));
        Ok(())
    }

    /// Append `value` to the sequence at `path`.
    ///
    /// A missing (or `Null`) target is initialized to an empty sequence
    /// first. The initialization is part of the append and emits no event
    /// of its own.
    pub fn append(&self, path: &Path, value: impl Into<Value>) -> FlatResult<()> {
        self.append_inner(path, value.into(), None)
    }

    /// Like [`append`](Self::append), forwarding `extra` to the subscriber.
    pub fn append_with(
        &self,
        path: &Path,
        value: impl Into<Value>,
        extra: Extra,
    ) -> FlatResult<()> {
        self.append_inner(path, value.into(), Some(extra))
    }

    fn append_inner(&self, path: &Path, value: Value, extra: Option<Extra>) -> FlatResult<()> {
        if path.is_empty() {
            return Err(self.rejected(MutationKind::Append, path, FlatError::empty_path("append")));
        }

        let seq = match self.get(path) {
            Some(Value::Sequence(seq)) => seq,
            None | Some(Value::Null) => {
                let seq = SeqRef::new();
                self.store(MutationKind::Append, path, Value::Sequence(seq.clone()))?;
                seq
            }
            Some(other) => {
                return Err(self.rejected(
                    MutationKind::Append,
                    path,
                    FlatError::type_mismatch(path.clone(), "sequence", value_type_name(&other)),
                ));
            }
        };

        seq.push(value.clone());
        self.commit(
            MutationEvent::new(MutationKind::Append, path.clone(), value).with_extra(extra),
        );
        Ok(())
    }

    /// Insert `value` into the existing sequence at `path`.
    ///
    /// Negative indexes count from the end (`-1` inserts before the last
    /// element). The normalized index is clamped into `[0, len]`.
    pub fn insert(&self, path: &Path, index: i64, value: impl Into<Value>) -> FlatResult<()> {
        let value = value.into();
        let seq = self.sequence_at(MutationKind::Insert, path)?;
        let at = clamp_insert_index(index, seq.len());
        seq.insert(at, value.clone());
        self.commit(MutationEvent::new(
            MutationKind::Insert,
            path.with_segment(at),
            value,
        ));
        Ok(())
    }

    /// Remove and return the element at `index` of the sequence at `path`.
    ///
    /// Negative indexes count from the end. Fails with `IndexOutOfBounds`
    /// when the normalized index is outside `[0, len)`.
    pub fn destroy(&self, path: &Path, index: i64) -> FlatResult<Value> {
        let seq = self.sequence_at(MutationKind::Destroy, path)?;
        let len = seq.len();
        let removed = normalize_index(index, len)
            .and_then(|at| seq.remove(at).map(|removed| (at, removed)));
        let Some((at, removed)) = removed else {
            return Err(self.rejected(
                MutationKind::Destroy,
                path,
                FlatError::index_out_of_bounds(path.with_segment(index), index, len),
            ));
        };

        self.commit(MutationEvent::new(
            MutationKind::Destroy,
            path.with_segment(at),
            removed.clone(),
        ));
        Ok(removed)
    }

    /// Remove and return the last element of the sequence at `path`.
    ///
    /// Returns `None`, without notifying, when the path is empty or missing,
    /// does not hold a sequence, or the sequence is empty.
    pub fn pop(&self, path: &Path) -> Option<Value> {
        if path.is_empty() {
            return None;
        }
        let target = self.get(path)?;
        let seq = target.as_sequence()?;
        let popped = seq.pop()?;
        self.commit(MutationEvent::new(
            MutationKind::Pop,
            path.with_segment(seq.len()),
            popped.clone(),
        ));
        Some(popped)
    }

    /// Flip the boolean at `path` and return the new value.
    ///
    /// A missing or `Null` value counts as `false`.
    pub fn toggle(&self, path: &Path) -> FlatResult<bool> {
        if path.is_empty() {
            return Err(self.rejected(MutationKind::Set, path, FlatError::empty_path("toggle")));
        }
        let current = match self.get(path) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => b,
            Some(other) => {
                return Err(self.rejected(
                    MutationKind::Set,
                    path,
                    FlatError::type_mismatch(path.clone(), "boolean", value_type_name(&other)),
                ));
            }
        };
        self.set(path, !current)?;
        Ok(!current)
    }

    // ------------------------------------------------------------------
    // Subscriber
    // ------------------------------------------------------------------

    /// Install the subscriber, replacing any previous one.
    ///
    /// Handles cloned from this engine share the slot; substates created
    /// earlier keep the subscriber they captured.
    pub fn set_subscriber(&self, subscriber: impl Fn(&MutationEvent) + 'static) {
        self.channel.replace(Rc::new(subscriber));
    }

    /// Remove the subscriber.
    pub fn clear_subscriber(&self) {
        self.channel.clear();
    }

    /// The current subscriber.
    pub fn subscriber(&self) -> Option<Subscriber> {
        self.channel.current()
    }

    // ------------------------------------------------------------------
    // Substates and handles
    // ------------------------------------------------------------------

    /// Create an engine rooted at the container stored at `path`.
    ///
    /// The container is shared, not copied, so writes through either engine
    /// are visible through both. The new engine starts with this engine's
    /// current subscriber; later changes to either slot are not propagated.
    /// If the parent later replaces the value at `path`, the substate keeps
    /// the old container.
    pub fn sub_state(&self, path: &Path) -> FlatResult<FlatState> {
        let target = if path.is_empty() {
            Err(FlatError::empty_path("sub_state"))
        } else {
            let target = self.get(path);
            match target.as_ref().and_then(Value::as_container) {
                Some(root) => Ok(root),
                None => Err(FlatError::invalid_target(
                    path.clone(),
                    found_name(target.as_ref()),
                )),
            }
        };
        let root = target.map_err(|err| {
            debug!(path = %path, error = %err, "substate rejected");
            err
        })?;

        debug!(path = %path, kind = root.kind(), "created substate");
        Ok(Self::from_parts(root, self.channel.current()))
    }

    /// Non-owning handle to this engine.
    ///
    /// A subscriber that needs to read the engine should capture this rather
    /// than a clone, which would keep the engine alive through its own slot.
    pub fn downgrade(&self) -> WeakFlatState {
        WeakFlatState {
            root: self.root.downgrade(),
            channel: Rc::downgrade(&self.channel),
        }
    }

    /// Returns true if both handles address the same root container.
    pub fn same_root(&self, other: &FlatState) -> bool {
        self.root.ptr_eq(&other.root)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolve and assign without notifying.
    fn store(&self, kind: MutationKind, path: &Path, value: Value) -> FlatResult<()> {
        if path.is_empty() {
            return Err(self.rejected(kind, path, FlatError::empty_path(kind.as_str())));
        }
        let target =
            resolve_for_write(&self.root, path).map_err(|e| self.rejected(kind, path, e))?;
        if target.created() > 0 {
            debug!(path = %path, created = target.created(), "created intermediate containers");
        }
        target.assign(value);
        Ok(())
    }

    /// The existing sequence at `path`, for operations that require one.
    fn sequence_at(&self, kind: MutationKind, path: &Path) -> FlatResult<SeqRef> {
        if path.is_empty() {
            return Err(self.rejected(kind, path, FlatError::empty_path(kind.as_str())));
        }
        match self.get(path) {
            Some(Value::Sequence(seq)) => Ok(seq),
            other => Err(self.rejected(
                kind,
                path,
                FlatError::type_mismatch(path.clone(), "sequence", found_name(other.as_ref())),
            )),
        }
    }

    fn rejected(&self, kind: MutationKind, path: &Path, err: FlatError) -> FlatError {
        debug!(op = kind.as_str(), path = %path, error = %err, "mutation rejected");
        err
    }

    fn commit(&self, event: MutationEvent) {
        trace!(op = event.kind.as_str(), path = %event.path, "committed mutation");
        self.channel.notify(&event);
    }
}

impl Default for FlatState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FlatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatState")
            .field("root", &self.root)
            .field("subscribed", &self.channel.is_set())
            .finish()
    }
}

/// Non-owning handle to a [`FlatState`].
#[derive(Clone)]
pub struct WeakFlatState {
    root: WeakContainer,
    channel: Weak<NotificationChannel>,
}

impl WeakFlatState {
    /// Recover a strong handle, if the engine is still alive.
    pub fn upgrade(&self) -> Option<FlatState> {
        Some(FlatState {
            channel: self.channel.upgrade()?,
            root: self.root.upgrade()?,
        })
    }
}

impl fmt::Debug for WeakFlatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFlatState")
            .field("alive", &(self.channel.strong_count() > 0))
            .finish()
    }
}

/// Construction-time configuration for [`FlatState`].
#[derive(Default)]
pub struct FlatStateBuilder {
    root: Option<Value>,
    subscriber: Option<Subscriber>,
}

impl FlatStateBuilder {
    /// Use `root` (aliased) as the tree root. Defaults to an empty mapping.
    #[must_use]
    pub fn root(mut self, root: impl Into<Value>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Use a deep copy of a JSON document as the tree root.
    #[must_use]
    pub fn root_json(self, json: serde_json::Value) -> Self {
        self.root(Value::from(json))
    }

    /// Install a subscriber from the start.
    #[must_use]
    pub fn subscriber(mut self, subscriber: impl Fn(&MutationEvent) + 'static) -> Self {
        self.subscriber = Some(Rc::new(subscriber));
        self
    }

    /// Build the engine. Fails with `InvalidRoot` for a non-container root.
    pub fn build(self) -> FlatResult<FlatState> {
        let root = match self.root {
            None => Container::default(),
            Some(value) => value
                .as_container()
                .ok_or_else(|| FlatError::invalid_root(value_type_name(&value)))?,
        };
        Ok(FlatState::from_parts(root, self.subscriber))
    }
}

impl fmt::Debug for FlatStateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatStateBuilder")
            .field("root", &self.root)
            .field("subscriber", &self.subscriber.is_some())
            .finish()
    }
}
