use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A vertex of the state graph: one mapped type.
///
/// Equality and hashing use the type name only, so registering the same
/// type once as a collection and once as a plain state yields one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateNode {
    type_name: String,
    #[serde(default)]
    collection: bool,
}

impl StateNode {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            collection: false,
        }
    }

    /// A node standing for a collection of `type_name`.
    #[must_use]
    pub fn collection(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            collection: true,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.collection
    }
}

impl PartialEq for StateNode {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for StateNode {}

impl Hash for StateNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collection {
            write!(f, "{}[]", self.type_name)
        } else {
            f.write_str(&self.type_name)
        }
    }
}

/// Edge payload: the property of the source type whose target is the
/// edge's target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateEdge {
    pub property: String,
}

impl StateEdge {
    #[must_use]
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl fmt::Display for StateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_collection_flag() {
        assert_eq!(StateNode::new("Order"), StateNode::collection("Order"));
        let set: HashSet<StateNode> = [StateNode::new("Order"), StateNode::collection("Order")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_marks_collections() {
        assert_eq!(StateNode::new("Order").to_string(), "Order");
        assert_eq!(StateNode::collection("Line").to_string(), "Line[]");
    }
}
