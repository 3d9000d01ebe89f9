//! State graph construction.
//!
//! # Overview
//!
//! A [`StateGraph`] holds one vertex per mapped type and one edge per
//! property that points from one mapped type at another. Vertices are
//! registered explicitly; edges are added one at a time or discovered by
//! asking a [`RelationSource`] about every ordered pair of vertices.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A owns a property whose target type is B".
//! Ordering puts edge sources first, so an aggregate root precedes the
//! types it reaches. [`StateGraph::dependency_order`] gives the reverse.
//!
//! ## Content Hash
//!
//! [`StateGraph::content_hash`] is a BLAKE3 digest of the vertex names and
//! the sorted edge triples. Two graphs built from the same metadata hash the
//! same regardless of registration order.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::catalog::{RelationSource, TypeCatalog};
use crate::error::{GraphError, GraphResult};
use crate::state::{StateEdge, StateNode};

/// Directed graph of mapped types.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    /// The underlying petgraph graph.
    pub graph: DiGraph<StateNode, StateEdge>,
    /// Type name to node index.
    node_map: HashMap<String, NodeIndex>,
}

impl StateGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every catalog type, then add an edge for every property
    /// whose target is another catalog type.
    #[must_use]
    #[instrument(skip(catalog), fields(types = catalog.types.len()))]
    pub fn from_catalog(catalog: &TypeCatalog) -> Self {
        let mut graph = Self::new();
        for node in catalog.nodes() {
            graph.add_vertex(node);
        }
        graph.populate_edges(catalog);
        graph
    }

    /// Register a vertex. Registering a type name twice returns the index
    /// of the first registration.
    pub fn add_vertex(&mut self, node: StateNode) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(node.type_name()) {
            return idx;
        }
        let name = node.type_name().to_string();
        let idx = self.graph.add_node(node);
        self.node_map.insert(name, idx);
        idx
    }

    /// Add the edge `source → target` labelled with `property`.
    ///
    /// An identical edge (same endpoints, same property) is added once; a
    /// repeat returns the existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint has not been
    /// registered with [`add_vertex`](Self::add_vertex).
    pub fn add_edge(
        &mut self,
        source: &StateNode,
        target: &StateNode,
        property: impl Into<String>,
    ) -> GraphResult<EdgeIndex> {
        let from = self.require(source)?;
        let to = self.require(target)?;
        let edge = StateEdge::new(property);

        if let Some(existing) = self
            .graph
            .edges_connecting(from, to)
            .find(|e| *e.weight() == edge)
        {
            return Ok(existing.id());
        }
        Ok(self.graph.add_edge(from, to, edge))
    }

    /// Ask `source` about every ordered pair of registered vertices,
    /// including each vertex paired with itself, and add one edge per
    /// returned property. Returns the number of edges added.
    #[instrument(skip(self, source), fields(nodes = self.graph.node_count()))]
    pub fn populate_edges<S: RelationSource + ?Sized>(&mut self, source: &S) -> usize {
        let before = self.graph.edge_count();
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();

        for &from in &indices {
            for &to in &indices {
                let properties =
                    source.properties_between(&self.graph[from], &self.graph[to]);
                for property in properties {
                    let edge = StateEdge::new(property);
                    let exists = self
                        .graph
                        .edges_connecting(from, to)
                        .any(|e| *e.weight() == edge);
                    if !exists {
                        self.graph.add_edge(from, to, edge);
                    }
                }
            }
        }

        let added = self.graph.edge_count() - before;
        tracing::debug!(added, edges = self.graph.edge_count(), "populated state graph edges");
        added
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a type name.
    #[must_use]
    pub fn node_index(&self, type_name: &str) -> Option<NodeIndex> {
        self.node_map.get(type_name).copied()
    }

    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&StateNode> {
        self.graph.node_weight(idx)
    }

    /// Registered vertices in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.graph.node_weights()
    }

    /// Edges as `(source, target, property)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&StateNode, &StateNode, &str)> {
        self.graph.edge_references().map(|e| {
            (
                &self.graph[e.source()],
                &self.graph[e.target()],
                e.weight().property.as_str(),
            )
        })
    }

    /// BLAKE3 digest of the sorted vertex names and edge triples.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut names: Vec<&str> = self.nodes().map(StateNode::type_name).collect();
        names.sort_unstable();
        let mut edges: Vec<(&str, &str, &str)> = self
            .edges()
            .map(|(s, t, p)| (s.type_name(), t.type_name(), p))
            .collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(b"\x00");
        }
        hasher.update(b"\x01");
        for (source, target, property) in edges {
            hasher.update(source.as_bytes());
            hasher.update(b"\x00");
            hasher.update(target.as_bytes());
            hasher.update(b"\x00");
            hasher.update(property.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    fn require(&self, node: &StateNode) -> GraphResult<NodeIndex> {
        self.node_index(node.type_name())
            .ok_or_else(|| GraphError::unknown_node(node.type_name()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
