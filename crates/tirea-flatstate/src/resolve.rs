//! Path resolution over a state tree.
//!
//! Reads are tolerant: any missing link, kind mismatch, or out-of-range
//! index ends the walk with `None`. Writes are strict: missing intermediates
//! are created (typed by the kind of the next segment) and every other
//! structural problem is an error.
//!
//! Intermediates created by a write are assembled detached from the tree and
//! attached only when the whole path has been validated, so a rejected write
//! leaves the tree untouched.

use crate::error::value_type_name;
use crate::{Container, FlatError, FlatResult, MapRef, Path, Seg, SeqRef, Value};

/// Normalize a possibly negative index against a sequence length.
///
/// Negative indexes count from the end (`len + index`). Returns `None` when
/// the result is still negative. The result is not bounds-checked against
/// `len`.
///
/// ```
/// use tirea_flatstate::normalize_index;
///
/// assert_eq!(normalize_index(-1, 3), Some(2));
/// assert_eq!(normalize_index(5, 3), Some(5));
/// assert_eq!(normalize_index(-4, 3), None);
/// ```
#[inline]
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        return usize::try_from(index).ok();
    }
    let len = i64::try_from(len).ok()?;
    usize::try_from(len.checked_add(index)?).ok()
}

/// Normalize an insertion index and clamp it into `[0, len]`.
#[inline]
pub(crate) fn clamp_insert_index(index: i64, len: usize) -> usize {
    normalize_index(index, len).map_or(0, |i| i.min(len))
}

/// Walk `path` from `root` without modifying anything.
///
/// The empty path resolves to the root itself.
pub fn resolve_for_read(root: &Container, path: &Path) -> Option<Value> {
    let mut current = root.to_value();
    for seg in path {
        current = read_child(&current, seg)?;
    }
    Some(current)
}

fn read_child(current: &Value, seg: &Seg) -> Option<Value> {
    match (current, seg) {
        (Value::Mapping(map), Seg::Key(key)) => map.get(key),
        (Value::Sequence(seq), Seg::Index(index)) => {
            let index = normalize_index(*index, seq.len())?;
            seq.get(index)
        }
        _ => None,
    }
}

/// One assignable location: a key in a mapping or an index in a sequence.
///
/// A sequence slot may sit at `index == len`, in which case assignment extends
/// the sequence by one element.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Key(MapRef, String),
    Index(SeqRef, usize),
}

impl Slot {
    pub(crate) fn get(&self) -> Option<Value> {
        match self {
            Slot::Key(map, key) => map.get(key),
            Slot::Index(seq, index) => seq.get(*index),
        }
    }

    pub(crate) fn put(&self, value: Value) -> Option<Value> {
        match self {
            Slot::Key(map, key) => map.insert(key.clone(), value),
            Slot::Index(seq, index) => seq.put(*index, value),
        }
    }
}

/// A validated write location, plus any detached intermediates to attach.
#[derive(Debug)]
pub(crate) struct WriteTarget {
    slot: Slot,
    pending: Option<(Slot, Container)>,
    created: usize,
}

impl WriteTarget {
    /// Number of intermediate containers this write creates.
    pub(crate) fn created(&self) -> usize {
        self.created
    }

    /// Store `value` at the final slot and attach created intermediates.
    pub(crate) fn assign(self, value: Value) -> Option<Value> {
        let previous = self.slot.put(value);
        if let Some((attach_at, subtree)) = self.pending {
            attach_at.put(subtree.to_value());
        }
        previous
    }
}

/// Resolve `path` for writing, creating missing intermediates.
///
/// Fails with `InvalidPath` on an empty path, `IndexOutOfBounds` when an index
/// normalizes below zero or past the end of its sequence, and `TypeMismatch`
/// when a segment's kind does not match its container or an intermediate slot
/// holds a primitive other than `Null`.
pub(crate) fn resolve_for_write(root: &Container, path: &Path) -> FlatResult<WriteTarget> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Err(FlatError::empty_path("write"));
    };

    let mut current = root.clone();
    let mut pending: Option<(Slot, Container)> = None;
    let mut created = 0;

    for (depth, seg) in parents.iter().enumerate() {
        let slot = slot_for(&current, seg, path, depth)?;

        if let Some(existing) = slot.get() {
            if let Some(container) = existing.as_container() {
                current = container;
                continue;
            }
            if !existing.is_null() {
                return Err(FlatError::type_mismatch(
                    path.slice(0, depth + 1),
                    "mapping or sequence",
                    value_type_name(&existing),
                ));
            }
        }

        // Creation is typed by the segment that will address the new container.
        let fresh = if segments[depth + 1].is_index() {
            Container::Sequence(SeqRef::new())
        } else {
            Container::Mapping(MapRef::new())
        };
        if pending.is_none() {
            pending = Some((slot, fresh.clone()));
        } else {
            slot.put(fresh.to_value());
        }
        created += 1;
        current = fresh;
    }

    let slot = slot_for(&current, last, path, parents.len())?;
    Ok(WriteTarget {
        slot,
        pending,
        created,
    })
}

/// Locate the slot `seg` addresses inside `container`.
fn slot_for(container: &Container, seg: &Seg, path: &Path, depth: usize) -> FlatResult<Slot> {
    match (container, seg) {
        (Container::Mapping(map), Seg::Key(key)) => Ok(Slot::Key(map.clone(), key.clone())),
        (Container::Sequence(seq), Seg::Index(index)) => {
            let len = seq.len();
            match normalize_index(*index, len) {
                Some(i) if i <= len => Ok(Slot::Index(seq.clone(), i)),
                _ => Err(FlatError::index_out_of_bounds(
                    path.slice(0, depth + 1),
                    *index,
                    len,
                )),
            }
        }
        (Container::Mapping(_), Seg::Index(_)) => Err(FlatError::type_mismatch(
            path.slice(0, depth),
            "sequence",
            "mapping",
        )),
        (Container::Sequence(_), Seg::Key(_)) => Err(FlatError::type_mismatch(
            path.slice(0, depth),
            "mapping",
            "sequence",
        )),
    }
}
