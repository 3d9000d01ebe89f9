pub mod completions;
pub mod cycles;
pub mod gen_cmd;
pub mod graph;
pub mod id;
pub mod repack;
pub mod toposort;
pub mod unpack;

use std::path::Path;

use aggregraph_graph::{StateGraph, TypeCatalog};
use anyhow::{Context, Result};

/// Load a catalog file and build its state graph.
pub fn load_graph(catalog: &Path) -> Result<StateGraph> {
    let catalog = TypeCatalog::load(catalog)?;
    Ok(StateGraph::from_catalog(&catalog))
}

/// Read and parse a JSON document.
pub fn read_document(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
