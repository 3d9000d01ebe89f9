//! Cycle-tolerant topological ordering.
//!
//! # Algorithm
//!
//! 1. Iterative depth-first search with an explicit frame stack. Roots are
//!    taken in node insertion order and successors in ascending node index
//!    order, so the result depends only on the graph, never on hash order.
//! 2. If the search never meets a back edge the graph is a DAG and the
//!    answer is the reversed post-order.
//! 3. Otherwise the strongly connected components are computed with
//!    Kosaraju's algorithm, whose passes run on petgraph's stack-based
//!    `DfsPostOrder` and `Dfs` walkers. The first-discovered member of a component
//!    finishes last within it, and for any edge between two components the
//!    source component's first member finishes after the target's. Sorting
//!    components by that finish time (descending) therefore orders them
//!    topologically. Members are emitted in discovery order.
//!
//! Every node is emitted exactly once. Self-loops count as back edges but
//! never change the order.

#![allow(clippy::module_name_repetitions)]

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

use crate::build::StateGraph;
use crate::cycles::find_all_cycles;
use crate::error::{GraphError, GraphResult};
use crate::state::StateNode;

const UNSEEN: usize = usize::MAX;

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn new<N, E>(graph: &DiGraph<N, E>, node: NodeIndex) -> Self {
        let mut successors: Vec<NodeIndex> = graph.neighbors(node).collect();
        successors.sort_unstable();
        successors.dedup();
        Self {
            node,
            successors,
            cursor: 0,
        }
    }
}

struct DfsRun {
    discovered: Vec<usize>,
    finished: Vec<usize>,
    postorder: Vec<NodeIndex>,
    has_back_edge: bool,
}

fn depth_first<N, E>(graph: &DiGraph<N, E>) -> DfsRun {
    let n = graph.node_count();
    let mut run = DfsRun {
        discovered: vec![UNSEEN; n],
        finished: vec![UNSEEN; n],
        postorder: Vec::with_capacity(n),
        has_back_edge: false,
    };
    let mut on_path = vec![false; n];
    let mut next_discovery = 0;

    for root in graph.node_indices() {
        if run.discovered[root.index()] != UNSEEN {
            continue;
        }
        run.discovered[root.index()] = next_discovery;
        next_discovery += 1;
        on_path[root.index()] = true;
        let mut stack = vec![Frame::new(graph, root)];

        while let Some(frame) = stack.last_mut() {
            let Some(&succ) = frame.successors.get(frame.cursor) else {
                let node = frame.node;
                stack.pop();
                on_path[node.index()] = false;
                run.finished[node.index()] = run.postorder.len();
                run.postorder.push(node);
                continue;
            };
            frame.cursor += 1;

            if run.discovered[succ.index()] == UNSEEN {
                run.discovered[succ.index()] = next_discovery;
                next_discovery += 1;
                on_path[succ.index()] = true;
                stack.push(Frame::new(graph, succ));
            } else if on_path[succ.index()] {
                run.has_back_edge = true;
            }
        }
    }

    run
}

/// Order every node of `graph` so that, for each edge `u → v` whose ends
/// lie in different strongly connected components, `u` comes before `v`.
///
/// Never fails. Members of one component are contiguous in the output.
#[must_use]
pub fn toposort<N, E>(graph: &DiGraph<N, E>) -> Vec<NodeIndex> {
    let run = depth_first(graph);

    if !run.has_back_edge {
        let mut order = run.postorder;
        order.reverse();
        return order;
    }

    let mut components: Vec<(usize, Vec<NodeIndex>)> = kosaraju_scc(graph)
        .into_iter()
        .map(|mut members| {
            members.sort_unstable_by_key(|idx| run.discovered[idx.index()]);
            let leader_finish = members
                .first()
                .map_or(0, |leader| run.finished[leader.index()]);
            (leader_finish, members)
        })
        .collect();
    components.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    tracing::trace!(components = components.len(), "grouped cyclic graph by component");
    components
        .into_iter()
        .flat_map(|(_, members)| members)
        .collect()
}

impl StateGraph {
    /// All registered types, edge sources before targets. Types caught in a
    /// cycle come out together in a stable order.
    #[must_use]
    #[instrument(skip(self), fields(nodes = self.node_count(), edges = self.edge_count()))]
    pub fn toposort(&self) -> Vec<StateNode> {
        toposort(&self.graph)
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// The exact reverse of [`toposort`](Self::toposort): referenced types
    /// before the types that reference them.
    #[must_use]
    pub fn dependency_order(&self) -> Vec<StateNode> {
        let mut order = self.toposort();
        order.reverse();
        order
    }

    /// Like [`toposort`](Self::toposort), but a cycle through two or more
    /// types is an error. A type referencing itself is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] naming the members of the first
    /// multi-type cycle (cycles sorted by member names).
    pub fn strict_toposort(&self) -> GraphResult<Vec<StateNode>> {
        if let Some(members) = find_all_cycles(&self.graph).into_iter().next() {
            return Err(GraphError::CycleDetected { members });
        }
        Ok(self.toposort())
    }
}
