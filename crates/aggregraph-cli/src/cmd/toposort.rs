//! `aggr toposort`: order the types of a catalog.

use std::io::Write;
use std::path::PathBuf;

use aggregraph_graph::StateNode;
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `aggr toposort`.
#[derive(Args, Debug)]
pub struct ToposortArgs {
    /// Type catalog (TOML, or JSON by `.json` extension).
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,

    /// Fail when two or more types reference each other in a cycle.
    #[arg(long)]
    pub strict: bool,

    /// Emit referenced types before the types that reference them.
    #[arg(long)]
    pub dependencies_first: bool,
}

#[derive(Debug, Serialize)]
struct OrderEntry {
    #[serde(rename = "type")]
    type_name: String,
    collection: bool,
}

#[derive(Debug, Serialize)]
struct ToposortOutput {
    order: Vec<OrderEntry>,
    cycles: Vec<Vec<String>>,
    content_hash: String,
}

/// Execute `aggr toposort`. `strict_default` comes from `[graph] strict`.
pub fn run_toposort(args: &ToposortArgs, strict_default: bool, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(&args.catalog)?;

    let mut order = if args.strict || strict_default {
        graph.strict_toposort()?
    } else {
        graph.toposort()
    };
    if args.dependencies_first {
        order.reverse();
    }

    let payload = ToposortOutput {
        order: order.iter().map(entry).collect(),
        cycles: graph.cycles(),
        content_hash: graph.content_hash(),
    };

    render_mode(output, &payload, render_text, render_pretty)
}

fn entry(node: &StateNode) -> OrderEntry {
    OrderEntry {
        type_name: node.type_name().to_string(),
        collection: node.is_collection(),
    }
}

fn render_text(payload: &ToposortOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &payload.order {
        writeln!(w, "{}", entry.type_name)?;
    }
    Ok(())
}

fn render_pretty(payload: &ToposortOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Type order ({} types)", payload.order.len()))?;
    for (position, entry) in payload.order.iter().enumerate() {
        let marker = if entry.collection { "[]" } else { "" };
        writeln!(w, "{:>4}. {}{marker}", position + 1, entry.type_name)?;
    }
    if !payload.cycles.is_empty() {
        writeln!(w)?;
        pretty_kv(w, "cycles", payload.cycles.len().to_string())?;
        for cycle in &payload.cycles {
            writeln!(w, "  {}", cycle.join(" <-> "))?;
        }
    }
    Ok(())
}
