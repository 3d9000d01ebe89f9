//! Cycle-safe JSON pack / unpack for record graphs.
//!
//! # Wire format
//!
//! [`pack`] walks a record graph depth-first from its root and emits a JSON
//! tree. Every record is emitted once, at its first occurrence, as an object
//! whose first key is the own-id key (default `"@id"`) holding a surrogate id
//! as a decimal string. Ids start at `base_id` (default `10000`) and grow by
//! one per distinct record, in visit order.
//!
//! Any later occurrence of an already-emitted record becomes a reference:
//!
//! - as a field: key `ref_prefix + field name` (default prefix `"&"`),
//!   value the referenced id;
//! - as an array element: the object `{ "&": "<id>" }`.
//!
//! ```text
//! parent ──children──▶ [child]          {"@id":"10000","name":"p",
//!   ▲                    │                "children":[{"@id":"10001",
//!   └──────parent────────┘                  "&parent":"10000"}]}
//! ```
//!
//! [`unpack`] reverses this. It builds a fresh [`RecordArena`], records the
//! handle of every stamped object, and resolves references in a deferred pass
//! so that restored cycles point at the very same record handle.
//!
//! Field names that start with the prefix, or equal the own-id key, cannot
//! be represented and make [`pack`] fail. Packing a packed document is not
//! supported for the same reason.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::record::{Record, RecordArena, RecordRef, Value};

// ---------------------------------------------------------------------------
// PackConfig
// ---------------------------------------------------------------------------

/// Wire-format settings shared by [`pack`] and [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    /// First surrogate id handed out by [`pack`].
    #[serde(default = "default_base_id")]
    pub base_id: u64,
    /// Key carrying a record's own surrogate id.
    #[serde(default = "default_id_key")]
    pub id_key: String,
    /// Prefix marking a key as a reference.
    #[serde(default = "default_ref_prefix")]
    pub ref_prefix: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            base_id: default_base_id(),
            id_key: default_id_key(),
            ref_prefix: default_ref_prefix(),
        }
    }
}

impl PackConfig {
    /// Check that the wire keys cannot be confused with each other.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.ref_prefix.is_empty() {
            return Err("pack.ref_prefix must not be empty".to_string());
        }
        if self.id_key.is_empty() {
            return Err("pack.id_key must not be empty".to_string());
        }
        if self.id_key.starts_with(&self.ref_prefix) {
            return Err(format!(
                "pack.id_key {:?} must not start with pack.ref_prefix {:?}",
                self.id_key, self.ref_prefix
            ));
        }
        Ok(())
    }

    fn reference_key(&self, field: &str) -> String {
        format!("{}{field}", self.ref_prefix)
    }

    fn is_reserved(&self, field: &str) -> bool {
        field == self.id_key || field.starts_with(&self.ref_prefix)
    }
}

const fn default_base_id() -> u64 {
    10_000
}

fn default_id_key() -> String {
    "@id".to_string()
}

fn default_ref_prefix() -> String {
    "&".to_string()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by [`pack`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("field {field:?} collides with a reserved key")]
    ReservedKey { field: String },

    #[error("surrogate id {base} + {offset} does not fit in 64 bits")]
    IdOverflow { base: u64, offset: u64 },

    #[error("record #{index} is not owned by the arena")]
    UnknownRecord { index: usize },
}

impl PackError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ReservedKey { .. } => ErrorCode::ReservedKey,
            Self::IdOverflow { .. } => ErrorCode::IdOverflow,
            Self::UnknownRecord { .. } => ErrorCode::UnknownRecord,
        }
    }
}

/// Errors raised by [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnpackError {
    #[error("reference {field:?} points at id {id}, which is never stamped")]
    DanglingReference { id: u64, field: String },

    #[error("id {id} is stamped on more than one record")]
    DuplicateId { id: u64 },

    #[error("{value} is not a valid surrogate id")]
    InvalidId { value: String },

    #[error("document root is not a JSON object")]
    NotAnObject,

    #[error("field {field:?} is given both inline and as a reference")]
    ConflictingField { field: String },

    #[error("reference slot for field {field:?} disappeared before resolution")]
    MissingSlot { field: String },
}

impl UnpackError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DanglingReference { .. } => ErrorCode::DanglingReference,
            Self::DuplicateId { .. } => ErrorCode::DuplicateId,
            Self::InvalidId { .. } => ErrorCode::InvalidId,
            Self::NotAnObject => ErrorCode::NotAnObject,
            Self::ConflictingField { .. } => ErrorCode::ConflictingField,
            Self::MissingSlot { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

// ---------------------------------------------------------------------------
// pack
// ---------------------------------------------------------------------------

/// Flatten the record graph reachable from `root` into a JSON tree.
///
/// The walk keeps its own frame stack, so the length of a reference chain
/// is bounded by memory only.
///
/// # Errors
///
/// See [`PackError`]. The output is complete or absent; no partial document
/// is returned.
#[instrument(skip(arena, config), fields(records = arena.len()))]
pub fn pack(
    arena: &RecordArena,
    root: RecordRef,
    config: &PackConfig,
) -> Result<serde_json::Value, PackError> {
    let mut packer = Packer {
        arena,
        config,
        ids: HashMap::new(),
    };
    let packed = packer.run(root)?;
    debug!(stamped = packer.ids.len(), "packed record graph");
    Ok(packed)
}

struct Packer<'a> {
    arena: &'a RecordArena,
    config: &'a PackConfig,
    ids: HashMap<RecordRef, u64>,
}

/// A record or array being emitted.
enum PackFrame<'a> {
    Record {
        record: &'a Record,
        cursor: usize,
        object: Map<String, serde_json::Value>,
        /// Field whose nested value is currently open above this frame.
        open_field: &'a str,
    },
    Array {
        items: &'a [Value],
        cursor: usize,
        packed: Vec<serde_json::Value>,
    },
}

impl<'a> PackFrame<'a> {
    /// The next child to emit: its field name (records only) and value.
    fn advance(&mut self) -> Option<(Option<&'a str>, &'a Value)> {
        match self {
            Self::Record { record, cursor, .. } => {
                let record: &'a Record = *record;
                let (name, value) = record.field_at(*cursor)?;
                *cursor += 1;
                Some((Some(name), value))
            }
            Self::Array { items, cursor, .. } => {
                let items: &'a [Value] = *items;
                let value = items.get(*cursor)?;
                *cursor += 1;
                Some((None, value))
            }
        }
    }

    fn open(&mut self, field: Option<&'a str>) {
        if let (Self::Record { open_field, .. }, Some(field)) = (self, field) {
            *open_field = field;
        }
    }

    /// Append `value`. Arrays ignore `key`.
    fn store(&mut self, key: String, value: serde_json::Value) {
        match self {
            Self::Record { object, .. } => {
                object.insert(key, value);
            }
            Self::Array { packed, .. } => packed.push(value),
        }
    }

    /// Append the finished value of the child opened last.
    fn close_child(&mut self, value: serde_json::Value) {
        let key = match self {
            Self::Record { open_field, .. } => (*open_field).to_string(),
            Self::Array { .. } => String::new(),
        };
        self.store(key, value);
    }

    fn into_json(self) -> serde_json::Value {
        match self {
            Self::Record { object, .. } => serde_json::Value::Object(object),
            Self::Array { packed, .. } => serde_json::Value::Array(packed),
        }
    }
}

impl<'a> Packer<'a> {
    fn assign_id(&mut self, handle: RecordRef) -> Result<u64, PackError> {
        let offset = self.ids.len() as u64;
        let id = self
            .config
            .base_id
            .checked_add(offset)
            .ok_or(PackError::IdOverflow {
                base: self.config.base_id,
                offset,
            })?;
        self.ids.insert(handle, id);
        Ok(id)
    }

    /// Stamp `handle` and start emitting its fields. The stamp goes in
    /// before any field so that a self reference already sees the record
    /// as visited.
    fn open_record(&mut self, handle: RecordRef) -> Result<PackFrame<'a>, PackError> {
        let arena: &'a RecordArena = self.arena;
        let record = arena.get(handle).ok_or(PackError::UnknownRecord {
            index: handle.index(),
        })?;
        let id = self.assign_id(handle)?;
        let mut object = Map::new();
        object.insert(
            self.config.id_key.clone(),
            serde_json::Value::String(id.to_string()),
        );
        Ok(PackFrame::Record {
            record,
            cursor: 0,
            object,
            open_field: "",
        })
    }

    fn run(&mut self, root: RecordRef) -> Result<serde_json::Value, PackError> {
        let mut packed_root = serde_json::Value::Null;
        let mut stack = vec![self.open_record(root)?];

        while let Some(frame) = stack.last_mut() {
            let Some((field, value)) = frame.advance() else {
                if let Some(done) = stack.pop() {
                    let value = done.into_json();
                    match stack.last_mut() {
                        Some(parent) => parent.close_child(value),
                        None => packed_root = value,
                    }
                }
                continue;
            };

            if let Some(name) = field.filter(|name| self.config.is_reserved(name)) {
                return Err(PackError::ReservedKey {
                    field: name.to_string(),
                });
            }
            let key = field.map_or_else(String::new, str::to_string);

            match value {
                Value::Record(child) => {
                    if let Some(&seen) = self.ids.get(child) {
                        let id = serde_json::Value::String(seen.to_string());
                        match field {
                            Some(name) => frame.store(self.config.reference_key(name), id),
                            None => {
                                let mut marker = Map::new();
                                marker.insert(self.config.reference_key(""), id);
                                frame.store(key, serde_json::Value::Object(marker));
                            }
                        }
                    } else {
                        frame.open(field);
                        let child = self.open_record(*child)?;
                        stack.push(child);
                    }
                }
                Value::Array(items) => {
                    frame.open(field);
                    stack.push(PackFrame::Array {
                        items,
                        cursor: 0,
                        packed: Vec::with_capacity(items.len()),
                    });
                }
                Value::Null => frame.store(key, serde_json::Value::Null),
                Value::Bool(b) => frame.store(key, serde_json::Value::Bool(*b)),
                Value::Number(n) => frame.store(key, serde_json::Value::Number(n.clone())),
                Value::String(s) => frame.store(key, serde_json::Value::String(s.clone())),
            }
        }

        Ok(packed_root)
    }
}

// ---------------------------------------------------------------------------
// unpack
// ---------------------------------------------------------------------------

/// The record graph rebuilt by [`unpack`].
#[derive(Debug, Clone)]
pub struct Unpacked {
    pub arena: RecordArena,
    pub root: RecordRef,
    /// Number of references resolved.
    pub references: usize,
}

/// Rebuild a record graph from a packed JSON document.
///
/// # Errors
///
/// Returns [`UnpackError::DanglingReference`] when a reference names an id
/// that no object in the document carries, and the other [`UnpackError`]
/// variants for malformed documents.
#[instrument(skip(document, config))]
pub fn unpack(document: &serde_json::Value, config: &PackConfig) -> Result<Unpacked, UnpackError> {
    let serde_json::Value::Object(object) = document else {
        return Err(UnpackError::NotAnObject);
    };

    let mut unpacker = Unpacker {
        config,
        arena: RecordArena::new(),
        ids: HashMap::new(),
        pending: Vec::new(),
    };
    let root = unpacker.run(object)?;
    let references = unpacker.resolve()?;
    debug!(
        records = unpacker.arena.len(),
        references, "unpacked record graph"
    );

    Ok(Unpacked {
        arena: unpacker.arena,
        root,
        references,
    })
}

/// A reference slot waiting for its target: field `field` of `record`,
/// descending into nested arrays along `path`.
#[derive(Debug)]
struct PendingRef {
    record: RecordRef,
    field: String,
    path: Vec<usize>,
    id: u64,
}

struct Unpacker<'a> {
    config: &'a PackConfig,
    arena: RecordArena,
    ids: HashMap<u64, RecordRef>,
    pending: Vec<PendingRef>,
}

/// A JSON object or array being rebuilt.
enum UnpackFrame<'d> {
    Object {
        handle: RecordRef,
        entries: serde_json::map::Iter<'d>,
        record: Record,
        /// Field whose nested value is currently open above this frame.
        open_field: &'d str,
    },
    Array {
        /// Record and field the array hangs off, and the element indices
        /// leading from that field down to this array.
        owner: RecordRef,
        field: &'d str,
        path: Vec<usize>,
        items: std::slice::Iter<'d, serde_json::Value>,
        unpacked: Vec<Value>,
    },
}

enum Step<'d> {
    Continue,
    Descend(UnpackFrame<'d>),
    Finished,
}

fn set_field(record: &mut Record, field: &str, value: Value) -> Result<(), UnpackError> {
    if record.contains(field) {
        return Err(UnpackError::ConflictingField {
            field: field.to_string(),
        });
    }
    record.set(field, value);
    Ok(())
}

fn scalar(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => Some(Value::Number(n.clone())),
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

impl Unpacker<'_> {
    fn run(&mut self, object: &Map<String, serde_json::Value>) -> Result<RecordRef, UnpackError> {
        let (root, frame) = self.open_object(object)?;
        let mut stack = vec![frame];

        while let Some(frame) = stack.last_mut() {
            match self.step(frame)? {
                Step::Continue => {}
                Step::Descend(child) => stack.push(child),
                Step::Finished => {
                    if let Some(done) = stack.pop() {
                        let value = self.close(done);
                        if let Some(parent) = stack.last_mut() {
                            Self::attach(parent, value)?;
                        }
                    }
                }
            }
        }

        Ok(root)
    }

    fn open_object<'d>(
        &mut self,
        object: &'d Map<String, serde_json::Value>,
    ) -> Result<(RecordRef, UnpackFrame<'d>), UnpackError> {
        let handle = self.arena.alloc();
        if let Some(stamp) = object.get(&self.config.id_key) {
            let id = parse_id(stamp)?;
            if self.ids.insert(id, handle).is_some() {
                return Err(UnpackError::DuplicateId { id });
            }
        }
        let frame = UnpackFrame::Object {
            handle,
            entries: object.iter(),
            record: Record::new(),
            open_field: "",
        };
        Ok((handle, frame))
    }

    fn step<'d>(&mut self, frame: &mut UnpackFrame<'d>) -> Result<Step<'d>, UnpackError> {
        match frame {
            UnpackFrame::Object {
                handle,
                entries,
                record,
                open_field,
            } => {
                let Some((key, value)) = entries.next() else {
                    return Ok(Step::Finished);
                };
                if *key == self.config.id_key {
                    return Ok(Step::Continue);
                }
                if let Some(field) = key.strip_prefix(self.config.ref_prefix.as_str()) {
                    self.pending.push(PendingRef {
                        record: *handle,
                        field: field.to_string(),
                        path: Vec::new(),
                        id: parse_id(value)?,
                    });
                    set_field(record, field, Value::Null)?;
                    return Ok(Step::Continue);
                }
                if let Some(value) = scalar(value) {
                    set_field(record, key, value)?;
                    return Ok(Step::Continue);
                }
                *open_field = key.as_str();
                self.descend(value, *handle, key.as_str(), Vec::new())
            }
            UnpackFrame::Array {
                owner,
                field,
                path,
                items,
                unpacked,
            } => {
                let index = unpacked.len();
                let Some(item) = items.next() else {
                    return Ok(Step::Finished);
                };
                if let Some(value) = scalar(item) {
                    unpacked.push(value);
                    return Ok(Step::Continue);
                }
                let mut item_path = path.clone();
                item_path.push(index);
                if let Some(id) = self.array_reference(item) {
                    self.pending.push(PendingRef {
                        record: *owner,
                        field: (*field).to_string(),
                        path: item_path,
                        id: id?,
                    });
                    unpacked.push(Value::Null);
                    return Ok(Step::Continue);
                }
                self.descend(item, *owner, *field, item_path)
            }
        }
    }

    /// Open a frame for a nested object or array.
    fn descend<'d>(
        &mut self,
        value: &'d serde_json::Value,
        owner: RecordRef,
        field: &'d str,
        path: Vec<usize>,
    ) -> Result<Step<'d>, UnpackError> {
        let frame = match value {
            serde_json::Value::Object(object) => self.open_object(object)?.1,
            serde_json::Value::Array(items) => UnpackFrame::Array {
                owner,
                field,
                path,
                items: items.iter(),
                unpacked: Vec::with_capacity(items.len()),
            },
            _ => return Ok(Step::Continue),
        };
        Ok(Step::Descend(frame))
    }

    /// Store a finished object in the arena, or hand back a finished array.
    fn close(&mut self, frame: UnpackFrame<'_>) -> Value {
        match frame {
            UnpackFrame::Object { handle, record, .. } => {
                if let Some(slot) = self.arena.get_mut(handle) {
                    *slot = record;
                }
                Value::Record(handle)
            }
            UnpackFrame::Array { unpacked, .. } => Value::Array(unpacked),
        }
    }

    fn attach(parent: &mut UnpackFrame<'_>, value: Value) -> Result<(), UnpackError> {
        match parent {
            UnpackFrame::Object {
                record, open_field, ..
            } => set_field(record, open_field, value),
            UnpackFrame::Array { unpacked, .. } => {
                unpacked.push(value);
                Ok(())
            }
        }
    }

    /// Recognise the `{ "<prefix>": id }` array element form.
    fn array_reference(&self, item: &serde_json::Value) -> Option<Result<u64, UnpackError>> {
        let serde_json::Value::Object(object) = item else {
            return None;
        };
        if object.len() != 1 {
            return None;
        }
        object.get(&self.config.ref_prefix).map(parse_id)
    }

    fn resolve(&mut self) -> Result<usize, UnpackError> {
        let pending = std::mem::take(&mut self.pending);
        let resolved = pending.len();
        for reference in pending {
            let Some(&target) = self.ids.get(&reference.id) else {
                return Err(UnpackError::DanglingReference {
                    id: reference.id,
                    field: reference.field,
                });
            };
            let Some(slot) = self.slot_mut(&reference) else {
                return Err(UnpackError::MissingSlot {
                    field: reference.field,
                });
            };
            *slot = Value::Record(target);
        }
        Ok(resolved)
    }

    fn slot_mut(&mut self, reference: &PendingRef) -> Option<&mut Value> {
        let mut slot = self
            .arena
            .get_mut(reference.record)?
            .get_mut(&reference.field)?;
        for &index in &reference.path {
            slot = match slot {
                Value::Array(items) => items.get_mut(index)?,
                _ => return None,
            };
        }
        Some(slot)
    }
}

fn parse_id(value: &serde_json::Value) -> Result<u64, UnpackError> {
    let parsed = match value {
        serde_json::Value::String(s) => s.parse::<u64>().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| UnpackError::InvalidId {
        value: value.to_string(),
    })
}
