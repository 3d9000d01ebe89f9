//! `aggr cycles`: list type cycles (strongly connected components).

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, render};

/// Arguments for `aggr cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<Vec<String>>,
    self_references: Vec<String>,
}

/// Execute `aggr cycles`.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(&args.catalog)?;
    let payload = CyclesOutput {
        cycles: graph.cycles(),
        self_references: graph.self_references(),
    };
    render(output, &payload, render_cycles_human)
}

fn render_cycles_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No cycles between types.")?;
    } else {
        writeln!(w, "{} cycle(s):", payload.cycles.len())?;
        for (i, cycle) in payload.cycles.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, cycle.join(" -> "))?;
        }
    }
    if !payload.self_references.is_empty() {
        writeln!(w, "Self-referencing: {}", payload.self_references.join(", "))?;
    }
    Ok(())
}
