//! Synthetic type catalogs for ordering tests.

use aggregraph_graph::{PropertyDef, TypeCatalog, TypeDef};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::rng::DeterministicRng;

const PRIMITIVES: [&str; 4] = ["string", "int", "bool", "decimal"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub types: usize,
    /// Upper bound on properties per type, primitive ones included.
    pub max_properties: usize,
    /// When false, properties only point at later types, so the catalog's
    /// graph is acyclic (self references excepted when `self_percent > 0`).
    pub cyclic: bool,
    /// Chance (percent) that a type gets a property targeting itself.
    pub self_percent: u8,
    pub seed: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            types: 12,
            max_properties: 4,
            cyclic: true,
            self_percent: 10,
            seed: 0,
        }
    }
}

/// Build a random catalog. Type names are `Type0`, `Type1`, ... in
/// declaration order.
#[must_use]
#[instrument]
pub fn generate_catalog(config: CatalogConfig) -> TypeCatalog {
    let mut rng = DeterministicRng::new(config.seed);
    let mut types = Vec::with_capacity(config.types);

    for i in 0..config.types {
        let count = rng.next_index(config.max_properties + 1);
        let mut properties = Vec::with_capacity(count + 1);
        for p in 0..count {
            let target = if rng.hit_rate_percent(25) {
                PRIMITIVES[rng.next_index(PRIMITIVES.len())].to_string()
            } else if config.cyclic {
                format!("Type{}", rng.next_index(config.types))
            } else {
                let later = config.types - i - 1;
                if later == 0 {
                    PRIMITIVES[0].to_string()
                } else {
                    format!("Type{}", i + 1 + rng.next_index(later))
                }
            };
            properties.push(PropertyDef {
                name: format!("p{p}"),
                target,
                collection: rng.hit_rate_percent(30),
            });
        }
        if rng.hit_rate_percent(config.self_percent) {
            properties.push(PropertyDef {
                name: "parent".to_string(),
                target: format!("Type{i}"),
                collection: false,
            });
        }
        types.push(TypeDef {
            name: format!("Type{i}"),
            collection: rng.hit_rate_percent(20),
            properties,
        });
    }

    TypeCatalog { types }
}
