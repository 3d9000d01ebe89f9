//! `aggr unpack`: resolve packed documents and report what they contain.

use std::io::Write;
use std::path::PathBuf;

use aggregraph_core::batch::unpack_batch;
use aggregraph_core::{ExecutionMode, PackConfig};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `aggr unpack`.
#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Packed JSON documents.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileSummary {
    file: String,
    records: usize,
    references: usize,
}

#[derive(Debug, Serialize)]
struct UnpackOutput {
    files: Vec<FileSummary>,
    records: usize,
    references: usize,
}

/// Execute `aggr unpack`. Fails on the first document that does not
/// resolve, naming the file.
pub fn run_unpack(
    args: &UnpackArgs,
    config: &PackConfig,
    mode: ExecutionMode,
    output: OutputMode,
) -> Result<()> {
    let documents = args
        .files
        .iter()
        .map(|path| super::read_document(path))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::with_capacity(documents.len());
    for (path, result) in args.files.iter().zip(unpack_batch(&documents, config, mode)) {
        let unpacked = result.with_context(|| format!("Failed to unpack {}", path.display()))?;
        files.push(FileSummary {
            file: path.display().to_string(),
            records: unpacked.arena.len(),
            references: unpacked.references,
        });
    }

    let payload = UnpackOutput {
        records: files.iter().map(|f| f.records).sum(),
        references: files.iter().map(|f| f.references).sum(),
        files,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &UnpackOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for file in &payload.files {
        writeln!(w, "{}  {}  {}", file.file, file.records, file.references)?;
    }
    Ok(())
}

fn render_pretty(payload: &UnpackOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for file in &payload.files {
        writeln!(
            w,
            "{}: {} records, {} references resolved",
            file.file, file.records, file.references
        )?;
    }
    if payload.files.len() > 1 {
        pretty_kv(w, "records", payload.records.to_string())?;
        pretty_kv(w, "references", payload.references.to_string())?;
    }
    Ok(())
}
