//! `aggr gen`: emit a synthetic packed document or type catalog.

use std::io::Write;

use aggregraph_core::{PackConfig, pack};
use aggregraph_sim::{CatalogConfig, GeneratorConfig, generate_catalog, generate_records};
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for `aggr gen`.
#[derive(Args, Debug)]
pub struct GenArgs {
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Records in the generated graph.
    #[arg(long, default_value_t = 64)]
    pub records: usize,

    #[arg(long, default_value_t = 4)]
    pub max_fields: usize,

    /// Percent chance of a shared reference per record.
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub share_percent: u8,

    /// Percent chance of a self reference per record (or per type with
    /// `--catalog`).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub self_percent: u8,

    /// Emit a TOML type catalog instead of a packed document.
    #[arg(long)]
    pub catalog: bool,

    /// Types in the generated catalog.
    #[arg(long, default_value_t = 12)]
    pub types: usize,

    /// Only let properties point at later types, so the catalog has no
    /// cycles between distinct types.
    #[arg(long)]
    pub acyclic: bool,
}

/// Execute `aggr gen`. Output is data, so it ignores the output mode.
pub fn run_gen(args: &GenArgs, config: &PackConfig) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.catalog {
        let catalog = generate_catalog(CatalogConfig {
            types: args.types,
            max_properties: args.max_fields,
            cyclic: !args.acyclic,
            self_percent: args.self_percent,
            seed: args.seed,
        });
        let text = toml::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
        write!(out, "{text}")?;
        return Ok(());
    }

    let (arena, root) = generate_records(GeneratorConfig {
        records: args.records,
        max_fields: args.max_fields,
        share_percent: args.share_percent,
        self_percent: args.self_percent,
        seed: args.seed,
    });
    let document = pack(&arena, root, config)?;
    serde_json::to_writer_pretty(&mut out, &document)?;
    writeln!(out)?;
    Ok(())
}
