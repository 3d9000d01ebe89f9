//! Deterministic generators and oracles for testing aggregraph.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for binaries; oracles return typed
//!   divergences.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod catalog;
pub mod generator;
pub mod oracle;
pub mod rng;

pub use catalog::{CatalogConfig, generate_catalog};
pub use generator::{GeneratorConfig, RecordGenerator, generate_records};
pub use oracle::{Divergence, check_roundtrip};
pub use rng::DeterministicRng;

use aggregraph_core::{PackConfig, pack, unpack};
use anyhow::{Context, Result};

/// Outcome of [`run_campaign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    pub seeds: u64,
    pub records: usize,
    /// First seed whose graph did not survive pack then unpack.
    pub first_failure: Option<(u64, String)>,
}

/// Pack and unpack one generated graph per seed in `seeds`, checking each
/// round trip with the oracle.
///
/// # Errors
///
/// Returns an error if a generated graph cannot be packed or its packed
/// form cannot be unpacked. Oracle mismatches are reported, not raised.
pub fn run_campaign(
    seeds: std::ops::Range<u64>,
    template: &GeneratorConfig,
    pack_config: &PackConfig,
) -> Result<CampaignReport> {
    let mut report = CampaignReport {
        seeds: 0,
        records: 0,
        first_failure: None,
    };

    for seed in seeds {
        let config = GeneratorConfig {
            seed,
            ..template.clone()
        };
        let (arena, root) = generate_records(config);
        let packed = pack(&arena, root, pack_config).with_context(|| format!("pack seed {seed}"))?;
        let unpacked = unpack(&packed, pack_config).with_context(|| format!("unpack seed {seed}"))?;

        report.seeds += 1;
        report.records += arena.len();
        if let Err(divergence) = check_roundtrip(&arena, root, &unpacked.arena, unpacked.root) {
            tracing::warn!(seed, %divergence, "round trip diverged");
            report.first_failure = Some((seed, divergence.to_string()));
            break;
        }
    }

    Ok(report)
}
