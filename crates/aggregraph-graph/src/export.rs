//! Visualization exports: Graphviz DOT and a plain edge list.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use petgraph::dot::Dot;
use serde::{Deserialize, Serialize};

use crate::build::StateGraph;
use crate::error::{GraphError, GraphResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Dot,
    /// One `source -> target [property]` line per edge.
    Edges,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dot" | "graphviz" => Ok(Self::Dot),
            "edges" | "edge-list" | "txt" => Ok(Self::Edges),
            other => Err(format!("unknown export format '{other}' (expected dot or edges)")),
        }
    }
}

impl StateGraph {
    /// Graphviz DOT. Vertices are labelled with the type name (`[]` marks a
    /// collection) and edges with the property name.
    #[must_use]
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }

    /// Edge list in insertion order. Types with no edges at all are listed
    /// on a line of their own after the edges.
    #[must_use]
    pub fn to_edge_list(&self) -> String {
        let mut out = String::new();
        for (source, target, property) in self.edges() {
            let _ = writeln!(out, "{source} -> {target} [{property}]");
        }
        for idx in self.graph.node_indices() {
            if self.graph.neighbors_undirected(idx).next().is_none() {
                let _ = writeln!(out, "{}", self.graph[idx]);
            }
        }
        out
    }

    /// Render in `format` and write to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Export`] if the file cannot be written.
    pub fn export(&self, path: &Path, format: ExportFormat) -> GraphResult<()> {
        let rendered = match format {
            ExportFormat::Dot => self.to_dot(),
            ExportFormat::Edges => self.to_edge_list(),
        };
        fs::write(path, rendered).map_err(|e| GraphError::Export {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), ?format, "exported state graph");
        Ok(())
    }

    /// Number of edges leaving `type_name`, or `None` if it is not registered.
    #[must_use]
    pub fn out_degree(&self, type_name: &str) -> Option<usize> {
        self.node_index(type_name)
            .map(|idx| self.graph.edges(idx).count())
    }
}
