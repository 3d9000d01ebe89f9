//! Arena-backed record graphs.
//!
//! Records reference each other through [`RecordRef`] handles into a
//! [`RecordArena`] instead of owning their children. Shared references and
//! cycles (including a record pointing at itself) are therefore just two
//! fields holding the same handle. The handle is the record's identity: two
//! records with equal contents are still distinct if their handles differ.

use serde_json::Number;

/// Handle to a record stored in a [`RecordArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef(usize);

impl RecordRef {
    /// Position of the record in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Record(RecordRef),
}

impl Value {
    #[must_use]
    pub const fn as_record(&self) -> Option<RecordRef> {
        match self {
            Self::Record(handle) => Some(*handle),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<RecordRef> for Value {
    fn from(handle: RecordRef) -> Self {
        Self::Record(handle)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Ordered mapping of field name to [`Value`].
///
/// Field order is insertion order. Setting an existing field replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name` to `value`, returning the previous value if any.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.get_mut(&name) {
            return Some(std::mem::replace(slot, value));
        }
        self.fields.push((name, value));
        None
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// The field at `index` in insertion order.
    #[must_use]
    pub fn field_at(&self, index: usize) -> Option<(&str, &Value)> {
        self.fields
            .get(index)
            .map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RecordArena
// ---------------------------------------------------------------------------

/// Owner of every record in one record graph.
#[derive(Debug, Clone, Default)]
pub struct RecordArena {
    records: Vec<Record>,
}

impl RecordArena {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Store `record` and return its handle.
    pub fn insert(&mut self, record: Record) -> RecordRef {
        let handle = RecordRef(self.records.len());
        self.records.push(record);
        handle
    }

    /// Store an empty record. Useful when fields must refer back to it.
    pub fn alloc(&mut self) -> RecordRef {
        self.insert(Record::new())
    }

    #[must_use]
    pub fn get(&self, handle: RecordRef) -> Option<&Record> {
        self.records.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: RecordRef) -> Option<&mut Record> {
        self.records.get_mut(handle.0)
    }

    /// Set a field on the record behind `handle`.
    ///
    /// Returns `false` if `handle` does not belong to this arena.
    pub fn set_field(
        &mut self,
        handle: RecordRef,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> bool {
        match self.get_mut(handle) {
            Some(record) => {
                record.set(name, value);
                true
            }
            None => false,
        }
    }

    /// Follow the field `name` of `handle` when it holds a record.
    #[must_use]
    pub fn follow(&self, handle: RecordRef, name: &str) -> Option<RecordRef> {
        self.get(handle)?.get(name)?.as_record()
    }

    #[must_use]
    pub fn contains(&self, handle: RecordRef) -> bool {
        handle.0 < self.records.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordRef, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (RecordRef(index), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut record = Record::new().with("a", 1i64).with("b", "x");
        let previous = record.set("a", 2i64);
        assert_eq!(previous, Some(Value::from(1i64)));
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::from(2i64)));
        assert_eq!(record.field_at(1), Some(("b", &Value::from("x"))));
        assert_eq!(record.field_at(2), None);
    }

    #[test]
    fn self_reference_is_a_handle() {
        let mut arena = RecordArena::new();
        let node = arena.alloc();
        assert!(arena.set_field(node, "self", node));
        assert_eq!(arena.follow(node, "self"), Some(node));
    }

    #[test]
    fn identity_is_the_handle_not_the_contents() {
        let mut arena = RecordArena::new();
        let a = arena.insert(Record::new().with("name", "twin"));
        let b = arena.insert(Record::new().with("name", "twin"));
        assert_eq!(arena.get(a), arena.get(b));
        assert_ne!(a, b);
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let mut big = RecordArena::new();
        big.alloc();
        let foreign = big.alloc();
        let mut small = RecordArena::new();
        small.alloc();
        assert!(!small.contains(foreign));
        assert!(!small.set_field(foreign, "x", 1i64));
    }
}
