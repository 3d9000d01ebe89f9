//! Synthetic record graphs.
//!
//! Every generated graph is rooted at the first allocated record and every
//! record is reachable from it through a spanning tree of `child` fields and
//! `children` arrays. On top of the tree the generator sprinkles:
//!
//! - back references from a child to its parent,
//! - shared references to arbitrary records (diamonds and long cycles),
//! - self references,
//! - primitive fields and nested arrays of primitives.

use aggregraph_core::{RecordArena, RecordRef, Value};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::rng::DeterministicRng;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Records in the graph, root included. At least one is always made.
    pub records: usize,
    /// Upper bound on primitive fields per record.
    pub max_fields: usize,
    /// Chance (percent) that a record gets a reference to a random record.
    pub share_percent: u8,
    /// Chance (percent) that a record references itself.
    pub self_percent: u8,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            records: 64,
            max_fields: 4,
            share_percent: 25,
            self_percent: 10,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordGenerator {
    config: GeneratorConfig,
    rng: DeterministicRng,
}

impl RecordGenerator {
    #[must_use]
    pub const fn new(config: GeneratorConfig) -> Self {
        let rng = DeterministicRng::new(config.seed);
        Self { config, rng }
    }

    /// Build one record graph. Returns the arena and its root.
    #[instrument(skip(self), fields(records = self.config.records, seed = self.config.seed))]
    pub fn generate(&mut self) -> (RecordArena, RecordRef) {
        let count = self.config.records.max(1);
        let mut arena = RecordArena::new();
        let handles: Vec<RecordRef> = (0..count).map(|_| arena.alloc()).collect();
        let root = handles[0];

        for (i, &handle) in handles.iter().enumerate() {
            let primitives = self.rng.next_index(self.config.max_fields + 1);
            for f in 0..primitives {
                let value = self.primitive(2);
                arena.set_field(handle, format!("f{i}_{f}"), value);
            }
        }

        let mut children: Vec<Vec<Value>> = vec![Vec::new(); count];
        for (i, &child) in handles.iter().enumerate().skip(1) {
            let parent_slot = self.rng.next_index(i);
            let parent = handles[parent_slot];
            if self.rng.hit_rate_percent(50) {
                children[parent_slot].push(Value::Record(child));
            } else {
                arena.set_field(parent, format!("child{i}"), child);
            }
            if self.rng.hit_rate_percent(60) {
                arena.set_field(child, "parent", parent);
            }
        }
        for (slot, items) in children.into_iter().enumerate() {
            if !items.is_empty() {
                arena.set_field(handles[slot], "children", items);
            }
        }

        for &handle in &handles {
            if self.rng.hit_rate_percent(self.config.share_percent) {
                let target = handles[self.rng.next_index(count)];
                if self.rng.hit_rate_percent(50) {
                    arena.set_field(handle, "link", target);
                } else {
                    let extra = Value::Record(handles[self.rng.next_index(count)]);
                    arena.set_field(handle, "links", vec![Value::Record(target), Value::Null, extra]);
                }
            }
            if self.rng.hit_rate_percent(self.config.self_percent) {
                arena.set_field(handle, "self", handle);
            }
        }

        tracing::debug!(records = arena.len(), "generated record graph");
        (arena, root)
    }

    fn primitive(&mut self, depth: u8) -> Value {
        match self.rng.next_bounded(6) {
            0 => Value::Null,
            1 => Value::Bool(self.rng.hit_rate_percent(50)),
            2 => Value::from(self.rng.next_bounded(1_000_000)),
            3 => {
                let magnitude = i64::try_from(self.rng.next_bounded(1_000)).unwrap_or(0);
                Value::from(-magnitude)
            }
            4 if depth > 0 => {
                let len = self.rng.next_index(4);
                Value::Array((0..len).map(|_| self.primitive(depth - 1)).collect())
            }
            _ => {
                let len = self.rng.next_index(10) + 1;
                Value::String(self.rng.word(len))
            }
        }
    }
}

/// Generate one record graph from `config`.
#[must_use]
pub fn generate_records(config: GeneratorConfig) -> (RecordArena, RecordRef) {
    RecordGenerator::new(config).generate()
}
