//! Path-addressed mutable state for reactive UIs.
//!
//! `tirea-flatstate` stores an arbitrarily nested tree of mappings,
//! sequences, and primitives, and lets callers read and write it through
//! ordered key paths instead of manual deep-nested manipulation. A single
//! subscriber is notified synchronously after every committed write.
//!
//! # Core Concepts
//!
//! - **Path**: ordered keys and (possibly negative) indexes, see [`path!`]
//! - **Value**: primitives plus shared container handles ([`MapRef`], [`SeqRef`])
//! - **FlatState**: the engine; strict writes, tolerant reads
//! - **Substate**: an engine rooted inside another engine's tree, sharing its containers
//! - **MutationEvent**: what the subscriber receives after each write
//!
//! # Quick Start
//!
//! ```
//! use tirea_flatstate::{path, FlatState, MutationKind};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let state = FlatState::from_json(json!({"items": ["p", "q", "r"]})).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! state.set_subscriber(move |event| sink.borrow_mut().push(event.kind));
//!
//! // Missing intermediates are created by the kind of the next key.
//! state.set(&path!("form", "rows", 0, "label"), "Name").unwrap();
//! assert_eq!(state.get(&path!("form")).unwrap(), json!({"rows": [{"label": "Name"}]}));
//!
//! // Negative indexes count from the end.
//! state.destroy(&path!("items"), -1).unwrap();
//! assert_eq!(state.get(&path!("items")).unwrap(), json!(["p", "q"]));
//!
//! // Substates share the parent's containers.
//! let form = state.sub_state(&path!("form")).unwrap();
//! form.append(&path!("rows"), json!({"label": "Email"})).unwrap();
//! assert_eq!(state.size(&path!("form", "rows")), 2);
//!
//! assert_eq!(
//!     *seen.borrow(),
//!     vec![MutationKind::Set, MutationKind::Destroy, MutationKind::Append]
//! );
//! ```
//!
//! # Threading
//!
//! Everything here is single-threaded: handles are `Rc`-based and neither
//! `Send` nor `Sync`. Compound read-modify-write sequences built from
//! `get` and `set` are not atomic with respect to reentrant subscribers.

mod engine;
mod error;
mod notify;
mod path;
mod resolve;
mod value;

pub use engine::{FlatState, FlatStateBuilder, WeakFlatState};
pub use error::{value_type_name, FlatError, FlatResult};
pub use notify::{Extra, MutationEvent, MutationKind, NotificationChannel, Subscriber};
pub use path::{Path, Seg};
pub use resolve::{normalize_index, resolve_for_read};
pub use value::{Container, MapRef, Mapping, SeqRef, Sequence, Value};
