//! Structural equivalence of two record graphs.
//!
//! Two graphs are equivalent when there is a bijection between their
//! reachable records that maps each root to the other root and every field
//! to the same name holding a corresponding value. Record references must
//! map consistently: if `a.x` and `a.y` are the same record on the left,
//! they must be the same record on the right too.

use std::collections::{HashMap, VecDeque};

use aggregraph_core::{RecordArena, RecordRef, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Divergence {
    #[error("{side} graph has no record #{index}")]
    MissingRecord { side: &'static str, index: usize },

    #[error("{path}: field names differ ({left:?} vs {right:?})")]
    FieldNames {
        path: String,
        left: Vec<String>,
        right: Vec<String>,
    },

    #[error("{path}: values differ ({left} vs {right})")]
    Value {
        path: String,
        left: String,
        right: String,
    },

    /// A record on one side corresponds to two different records on the
    /// other.
    #[error("{path}: record identity not preserved")]
    Identity { path: String },
}

/// Check that the graph under `root_a` in `a` and the graph under `root_b`
/// in `b` are equivalent with identity structure preserved.
///
/// # Errors
///
/// Returns the first [`Divergence`] found in breadth-first order.
pub fn check_roundtrip(
    a: &RecordArena,
    root_a: RecordRef,
    b: &RecordArena,
    root_b: RecordRef,
) -> Result<(), Divergence> {
    let mut walk = Walk::default();
    walk.link(root_a, root_b, "$")?;

    while let Some((left, right, path)) = walk.queue.pop_front() {
        let record_a = a.get(left).ok_or(Divergence::MissingRecord {
            side: "left",
            index: left.index(),
        })?;
        let record_b = b.get(right).ok_or(Divergence::MissingRecord {
            side: "right",
            index: right.index(),
        })?;

        let names_a: Vec<&str> = record_a.fields().map(|(name, _)| name).collect();
        let names_b: Vec<&str> = record_b.fields().map(|(name, _)| name).collect();
        if names_a != names_b {
            return Err(Divergence::FieldNames {
                path,
                left: names_a.into_iter().map(str::to_string).collect(),
                right: names_b.into_iter().map(str::to_string).collect(),
            });
        }

        for ((name, value_a), (_, value_b)) in record_a.fields().zip(record_b.fields()) {
            walk.compare(value_a, value_b, &format!("{path}.{name}"))?;
        }
    }

    tracing::trace!(records = walk.forward.len(), "record graphs match");
    Ok(())
}

#[derive(Default)]
struct Walk {
    forward: HashMap<RecordRef, RecordRef>,
    backward: HashMap<RecordRef, RecordRef>,
    queue: VecDeque<(RecordRef, RecordRef, String)>,
}

impl Walk {
    fn link(&mut self, left: RecordRef, right: RecordRef, path: &str) -> Result<(), Divergence> {
        match (self.forward.get(&left), self.backward.get(&right)) {
            (Some(&mapped), Some(_)) if mapped == right => Ok(()),
            (None, None) => {
                self.forward.insert(left, right);
                self.backward.insert(right, left);
                self.queue.push_back((left, right, path.to_string()));
                Ok(())
            }
            _ => Err(Divergence::Identity {
                path: path.to_string(),
            }),
        }
    }

    fn compare(&mut self, left: &Value, right: &Value, path: &str) -> Result<(), Divergence> {
        match (left, right) {
            (Value::Record(l), Value::Record(r)) => self.link(*l, *r, path),
            (Value::Array(l), Value::Array(r)) if l.len() == r.len() => {
                for (i, (item_l, item_r)) in l.iter().zip(r).enumerate() {
                    self.compare(item_l, item_r, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            (l, r) if !matches!(l, Value::Record(_) | Value::Array(_)) && l == r => Ok(()),
            (l, r) => Err(Divergence::Value {
                path: path.to_string(),
                left: describe(l),
                right: describe(r),
            }),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Record(handle) => format!("record #{}", handle.index()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregraph_core::Record;

    fn ring(arena: &mut RecordArena, len: usize) -> RecordRef {
        let handles: Vec<RecordRef> = (0..len).map(|_| arena.alloc()).collect();
        for (i, &handle) in handles.iter().enumerate() {
            arena.set_field(handle, "next", handles[(i + 1) % len]);
        }
        handles[0]
    }

    #[test]
    fn identical_graphs_match() {
        let mut a = RecordArena::new();
        let root_a = ring(&mut a, 3);
        let mut b = RecordArena::new();
        let root_b = ring(&mut b, 3);
        assert_eq!(check_roundtrip(&a, root_a, &b, root_b), Ok(()));
    }

    #[test]
    fn ring_length_is_detected() {
        let mut a = RecordArena::new();
        let root_a = ring(&mut a, 3);
        let mut b = RecordArena::new();
        let root_b = ring(&mut b, 2);
        assert!(matches!(
            check_roundtrip(&a, root_a, &b, root_b),
            Err(Divergence::Identity { .. })
        ));
    }

    #[test]
    fn shared_record_must_stay_shared() {
        let mut a = RecordArena::new();
        let shared = a.insert(Record::new().with("v", 1i64));
        let root_a = a.insert(Record::new().with("x", shared).with("y", shared));

        let mut b = RecordArena::new();
        let first = b.insert(Record::new().with("v", 1i64));
        let second = b.insert(Record::new().with("v", 1i64));
        let root_b = b.insert(Record::new().with("x", first).with("y", second));

        assert_eq!(
            check_roundtrip(&a, root_a, &b, root_b),
            Err(Divergence::Identity {
                path: "$.y".to_string()
            })
        );
    }

    #[test]
    fn value_difference_names_the_path() {
        let mut a = RecordArena::new();
        let root_a = a.insert(Record::new().with("tags", vec![Value::from("a"), Value::from("b")]));
        let mut b = RecordArena::new();
        let root_b = b.insert(Record::new().with("tags", vec![Value::from("a"), Value::from("c")]));

        let err = check_roundtrip(&a, root_a, &b, root_b).expect_err("differs");
        assert_eq!(err.to_string(), "$.tags[1]: values differ (\"b\" vs \"c\")");
    }
}
