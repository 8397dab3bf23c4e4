//! Dynamic values stored in a state tree.
//!
//! Primitives are held inline. Mappings and sequences are held behind
//! reference-counted handles ([`MapRef`], [`SeqRef`]), so cloning a
//! [`Value`] that holds a container aliases the container instead of copying
//! it. Every engine, substate, or adapter holding a handle observes every
//! mutation made through any other handle to the same container.
//!
//! Trees are expected to be acyclic. Nothing prevents storing a container
//! inside itself, but structural equality, [`Value::to_json`], and
//! serialization will not terminate on such a tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Storage behind a [`MapRef`].
pub type Mapping = BTreeMap<String, Value>;

/// Storage behind a [`SeqRef`].
pub type Sequence = Vec<Value>;

/// Shared handle to a mapping container.
///
/// Clones are aliases. Use [`Value::deep_clone`] for an independent copy.
#[derive(Clone, Default)]
pub struct MapRef(Rc<RefCell<Mapping>>);

impl MapRef {
    /// Create a new, empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping.
    pub fn from_map(map: Mapping) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Remove the value under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns true if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the keys, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Borrow the underlying mapping.
    ///
    /// The guard must be dropped before anything writes to this container.
    pub fn borrow(&self) -> Ref<'_, Mapping> {
        self.0.borrow()
    }

    /// Returns true if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn downgrade(&self) -> Weak<RefCell<Mapping>> {
        Rc::downgrade(&self.0)
    }
}

impl PartialEq for MapRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => f.debug_map().entries(map.iter()).finish(),
            Err(_) => f.write_str("{<borrowed>}"),
        }
    }
}

impl Serialize for MapRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.borrow().serialize(serializer)
    }
}

/// Shared handle to a sequence container.
///
/// Clones are aliases. Use [`Value::deep_clone`] for an independent copy.
#[derive(Clone, Default)]
pub struct SeqRef(Rc<RefCell<Sequence>>);

impl SeqRef {
    /// Create a new, empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing vector.
    pub fn from_vec(items: Sequence) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Get the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the element at `index`, or append when `index == len`.
    ///
    /// Returns the replaced element. Indexes past the end are ignored and
    /// return `None`; callers bounds-check first.
    pub(crate) fn put(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        if index < items.len() {
            Some(std::mem::replace(&mut items[index], value))
        } else {
            if index == items.len() {
                items.push(value);
            }
            None
        }
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Insert an element, clamping `index` to the current length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.borrow_mut();
        let index = index.min(items.len());
        items.insert(index, value.into());
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        self.0.borrow_mut().pop()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns true if the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Shallow copy of the elements (containers stay aliased).
    pub fn to_vec(&self) -> Sequence {
        self.0.borrow().clone()
    }

    /// Borrow the underlying vector.
    ///
    /// The guard must be dropped before anything writes to this container.
    pub fn borrow(&self) -> Ref<'_, Sequence> {
        self.0.borrow()
    }

    /// Returns true if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &SeqRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn downgrade(&self) -> Weak<RefCell<Sequence>> {
        Rc::downgrade(&self.0)
    }
}

impl PartialEq for SeqRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for SeqRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => f.write_str("[<borrowed>]"),
        }
    }
}

impl Serialize for SeqRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.borrow().serialize(serializer)
    }
}

/// A value in a state tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Explicit null. Distinct from "not found".
    #[default]
    Null,
    /// Boolean primitive.
    Bool(bool),
    /// Numeric primitive.
    Number(serde_json::Number),
    /// String primitive.
    String(String),
    /// Shared mapping container.
    Mapping(MapRef),
    /// Shared sequence container.
    Sequence(SeqRef),
}

impl Value {
    /// A new, empty mapping.
    pub fn mapping() -> Self {
        Value::Mapping(MapRef::new())
    }

    /// A new, empty sequence.
    pub fn sequence() -> Self {
        Value::Sequence(SeqRef::new())
    }

    /// Build a value by deep-copying a JSON value.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Sequence(SeqRef::from_vec(
                items.iter().map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(obj) => Value::Mapping(MapRef::from_map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Deep-copy this value out as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(seq) => {
                serde_json::Value::Array(seq.borrow().iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Copy this value recursively so that no container is shared with the original.
    pub fn deep_clone(&self) -> Self {
        match self {
            Value::Mapping(map) => Value::Mapping(MapRef::from_map(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            )),
            Value::Sequence(seq) => Value::Sequence(SeqRef::from_vec(
                seq.borrow().iter().map(Value::deep_clone).collect(),
            )),
            other => other.clone(),
        }
    }

    /// Identity comparison: true when both are the same container.
    ///
    /// Primitives have no identity and compare by value.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Mapping(a), Value::Mapping(b)) => a.ptr_eq(b),
            (Value::Sequence(a), Value::Sequence(b)) => a.ptr_eq(b),
            (Value::Mapping(_) | Value::Sequence(_), _)
            | (_, Value::Mapping(_) | Value::Sequence(_)) => false,
            (a, b) => a == b,
        }
    }

    /// Returns true for `Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for mappings and sequences.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Mapping(_) | Value::Sequence(_))
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number as `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The number as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// The string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The mapping handle, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&MapRef> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The sequence handle, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&SeqRef> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// The container handle, if this is a mapping or sequence.
    pub fn as_container(&self) -> Option<Container> {
        match self {
            Value::Mapping(m) => Some(Container::Mapping(m.clone())),
            Value::Sequence(s) => Some(Container::Sequence(s.clone())),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Mapping(map) => map.serialize(serializer),
            Value::Sequence(seq) => seq.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        match (self, other) {
            (Value::Null, serde_json::Value::Null) => true,
            (Value::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (Value::Number(a), serde_json::Value::Number(b)) => a == b,
            (Value::String(a), serde_json::Value::String(b)) => a == b,
            (Value::Sequence(seq), serde_json::Value::Array(items)) => {
                let seq = seq.borrow();
                seq.len() == items.len() && seq.iter().zip(items).all(|(a, b)| a == b)
            }
            (Value::Mapping(map), serde_json::Value::Object(obj)) => {
                let map = map.borrow();
                map.len() == obj.len()
                    && obj
                        .iter()
                        .all(|(k, v)| map.get(k).is_some_and(|mine| mine == v))
            }
            _ => false,
        }
    }
}

impl PartialEq<Value> for serde_json::Value {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(serde_json::Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::from(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(SeqRef::from_vec(items.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<MapRef> for Value {
    fn from(map: MapRef) -> Self {
        Value::Mapping(map)
    }
}

impl From<SeqRef> for Value {
    fn from(seq: SeqRef) -> Self {
        Value::Sequence(seq)
    }
}

impl From<Container> for Value {
    fn from(container: Container) -> Self {
        container.to_value()
    }
}

/// A mapping or sequence handle: the only things a state tree can be rooted at.
#[derive(Clone, Debug, PartialEq)]
pub enum Container {
    /// Mapping container.
    Mapping(MapRef),
    /// Sequence container.
    Sequence(SeqRef),
}

impl Container {
    /// Wrap the value as a container handle (aliased).
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_container()
    }

    /// The container as a value (aliased).
    pub fn to_value(&self) -> Value {
        match self {
            Container::Mapping(m) => Value::Mapping(m.clone()),
            Container::Sequence(s) => Value::Sequence(s.clone()),
        }
    }

    /// `"mapping"` or `"sequence"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Container::Mapping(_) => "mapping",
            Container::Sequence(_) => "sequence",
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        match self {
            Container::Mapping(m) => m.len(),
            Container::Sequence(s) => s.len(),
        }
    }

    /// Returns true if the container has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        match (self, other) {
            (Container::Mapping(a), Container::Mapping(b)) => a.ptr_eq(b),
            (Container::Sequence(a), Container::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        match self {
            Container::Mapping(m) => WeakContainer::Mapping(m.downgrade()),
            Container::Sequence(s) => WeakContainer::Sequence(s.downgrade()),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::Mapping(MapRef::new())
    }
}

/// Non-owning container handle.
#[derive(Clone)]
pub(crate) enum WeakContainer {
    Mapping(Weak<RefCell<Mapping>>),
    Sequence(Weak<RefCell<Sequence>>),
}

impl WeakContainer {
    pub(crate) fn upgrade(&self) -> Option<Container> {
        match self {
            WeakContainer::Mapping(w) => w.upgrade().map(|rc| Container::Mapping(MapRef(rc))),
            WeakContainer::Sequence(w) => w.upgrade().map(|rc| Container::Sequence(SeqRef(rc))),
        }
    }
}
