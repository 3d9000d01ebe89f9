#![forbid(unsafe_code)]

use aggregraph_core::PackConfig;
use aggregraph_sim::{GeneratorConfig, run_campaign};
use anyhow::{Result, bail};

fn main() -> Result<()> {
    let seeds = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .unwrap_or(100);

    let report = run_campaign(0..seeds, &GeneratorConfig::default(), &PackConfig::default())?;

    println!(
        "campaign complete: seeds={} records={} failed={}",
        report.seeds,
        report.records,
        report.first_failure.is_some()
    );

    if let Some((seed, divergence)) = report.first_failure {
        bail!("seed {seed} diverged: {divergence}");
    }
    Ok(())
}
