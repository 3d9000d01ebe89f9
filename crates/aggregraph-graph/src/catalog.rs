//! Type catalogs: the relationship metadata a state graph is built from.
//!
//! A catalog is a flat list of mapped types. Each type lists its
//! properties with the name of the type they point at. Properties whose
//! target is not itself a catalog type (strings, numbers, unmapped types)
//! never become edges.
//!
//! ```toml
//! [[types]]
//! name = "Order"
//!
//! [[types.properties]]
//! name = "lines"
//! target = "OrderLine"
//! collection = true
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::state::StateNode;

/// Source of "which properties of `owner` point at `target`" answers.
///
/// This is the only view of type metadata the graph builder needs.
pub trait RelationSource {
    /// Names of the properties of `owner` whose target type is `target`.
    fn properties_between(&self, owner: &StateNode, target: &StateNode) -> Vec<String>;
}

impl<F> RelationSource for F
where
    F: Fn(&StateNode, &StateNode) -> Vec<String>,
{
    fn properties_between(&self, owner: &StateNode, target: &StateNode) -> Vec<String> {
        self(owner, target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCatalog {
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    /// Whether the type is registered as a collection state.
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub collection: bool,
}

impl TypeCatalog {
    /// Load a catalog from disk. `.json` files are parsed as JSON,
    /// everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if the file cannot be read, does not
    /// parse, or declares the same type twice.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let catalog_error = |reason: String| GraphError::Catalog {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| catalog_error(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let catalog: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| catalog_error(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| catalog_error(e.to_string()))?
        };

        catalog.validate().map_err(catalog_error)?;
        tracing::debug!(path = %path.display(), types = catalog.types.len(), "loaded type catalog");
        Ok(catalog)
    }

    /// Reject catalogs that declare a type name more than once.
    ///
    /// # Errors
    ///
    /// Returns a description of the first duplicate.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for def in &self.types {
            if def.name.is_empty() {
                return Err("type with an empty name".to_string());
            }
            if !seen.insert(def.name.as_str()) {
                return Err(format!("type {:?} is declared more than once", def.name));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|def| def.name == type_name)
    }

    /// The catalog's types as graph vertices, in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = StateNode> + '_ {
        self.types.iter().map(|def| {
            if def.collection {
                StateNode::collection(def.name.clone())
            } else {
                StateNode::new(def.name.clone())
            }
        })
    }
}

impl RelationSource for TypeCatalog {
    fn properties_between(&self, owner: &StateNode, target: &StateNode) -> Vec<String> {
        self.get(owner.type_name())
            .map(|def| {
                def.properties
                    .iter()
                    .filter(|prop| prop.target == target.type_name())
                    .map(|prop| prop.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
