//! `aggr graph`: export a catalog's state graph for visualization.

use std::io::Write;
use std::path::PathBuf;

use aggregraph_graph::ExportFormat;
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, render};

/// Arguments for `aggr graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,

    /// Destination file.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// `dot` (Graphviz) or `edges` (one line per edge).
    #[arg(long = "export", value_name = "KIND", default_value = "dot", value_parser = clap::value_parser!(ExportFormat))]
    pub export: ExportFormat,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    path: String,
    format: ExportFormat,
    nodes: usize,
    edges: usize,
}

/// Execute `aggr graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(&args.catalog)?;
    graph.export(&args.out, args.export)?;

    let payload = GraphOutput {
        path: args.out.display().to_string(),
        format: args.export,
        nodes: graph.node_count(),
        edges: graph.edge_count(),
    };
    render(output, &payload, |p, w: &mut dyn Write| {
        writeln!(w, "wrote {} ({} types, {} edges)", p.path, p.nodes, p.edges)
    })
}
