//! Cycle reporting for state graphs.
//!
//! A cycle here is a strongly connected component with two or more types.
//! A type whose property targets the type itself is reported separately by
//! [`self_referencing_types`]; it is a legal shape (trees, linked lists) and
//! never blocks strict ordering.

#![allow(clippy::module_name_repetitions)]

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::build::StateGraph;
use crate::state::StateNode;

/// Every strongly connected component with more than one member.
///
/// Each entry lists its type names sorted; the list itself is sorted.
#[must_use]
pub fn find_all_cycles<E>(graph: &DiGraph<StateNode, E>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = kosaraju_scc(graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut names: Vec<String> = component
                .into_iter()
                .map(|idx| graph[idx].type_name().to_string())
                .collect();
            names.sort_unstable();
            names
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

/// Types with at least one property pointing back at the type itself,
/// sorted by name.
#[must_use]
pub fn self_referencing_types<E>(graph: &DiGraph<StateNode, E>) -> Vec<String> {
    let mut names: Vec<String> = graph
        .node_indices()
        .filter(|&idx| has_self_loop(graph, idx))
        .map(|idx| graph[idx].type_name().to_string())
        .collect();
    names.sort_unstable();
    names
}

fn has_self_loop<N, E>(graph: &DiGraph<N, E>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

impl StateGraph {
    /// See [`find_all_cycles`].
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        find_all_cycles(&self.graph)
    }

    /// See [`self_referencing_types`].
    #[must_use]
    pub fn self_references(&self) -> Vec<String> {
        self_referencing_types(&self.graph)
    }
}
