//! `aggr repack`: unpack documents and pack them again with this
//! project's settings (base id, key names).

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use aggregraph_core::batch::{pack_batch, unpack_batch};
use aggregraph_core::{ExecutionMode, PackConfig, Unpacked};
use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, render};

/// Arguments for `aggr repack`.
#[derive(Args, Debug)]
pub struct RepackArgs {
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// First id to stamp (overrides `pack.base_id`).
    #[arg(long)]
    pub base_id: Option<u64>,

    /// Write each result to this directory under its original file name
    /// instead of printing it.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RepackOutput {
    written: Vec<String>,
}

/// Execute `aggr repack`.
pub fn run_repack(
    args: &RepackArgs,
    config: &PackConfig,
    mode: ExecutionMode,
    output: OutputMode,
) -> Result<()> {
    let source = config;
    let mut target = config.clone();
    if let Some(base_id) = args.base_id {
        target.base_id = base_id;
    }

    let documents = args
        .files
        .iter()
        .map(|path| super::read_document(path))
        .collect::<Result<Vec<_>>>()?;

    let unpacked = args
        .files
        .iter()
        .zip(unpack_batch(&documents, source, mode))
        .map(|(path, result)| result.with_context(|| format!("Failed to unpack {}", path.display())))
        .collect::<Result<Vec<Unpacked>>>()?;

    let jobs: Vec<_> = unpacked.iter().map(|u| (&u.arena, u.root)).collect();
    let packed = args
        .files
        .iter()
        .zip(pack_batch(&jobs, &target, mode))
        .map(|(path, result)| result.with_context(|| format!("Failed to repack {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let Some(out_dir) = &args.out_dir else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match packed.as_slice() {
            [single] => serde_json::to_writer_pretty(&mut out, single)?,
            many => serde_json::to_writer_pretty(&mut out, many)?,
        }
        writeln!(out)?;
        return Ok(());
    };

    if !out_dir.is_dir() {
        bail!("output directory {} does not exist", out_dir.display());
    }
    let mut written = Vec::with_capacity(packed.len());
    for (path, document) in args.files.iter().zip(&packed) {
        let Some(name) = path.file_name() else {
            bail!("{} has no file name", path.display());
        };
        let dest = out_dir.join(name);
        let text = serde_json::to_string_pretty(document)?;
        fs::write(&dest, text + "\n").with_context(|| format!("Failed to write {}", dest.display()))?;
        written.push(dest.display().to_string());
    }

    tracing::info!(files = written.len(), "repacked documents");
    render(output, &RepackOutput { written }, |p, w: &mut dyn Write| {
        for file in &p.written {
            writeln!(w, "wrote {file}")?;
        }
        Ok(())
    })
}
