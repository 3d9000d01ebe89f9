//! `aggr id`: base-64 sequence id encoding.

use std::io::Write;

use aggregraph_core::config::IdConfig;
use aggregraph_core::id::{Base64Generator, decode, encode, encode_padded};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(subcommand)]
    pub command: IdCommand,
}

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Encode integers.
    Encode {
        #[arg(required = true)]
        values: Vec<u64>,
        /// Pad to the fixed 16-symbol width.
        #[arg(long)]
        padded: bool,
    },
    /// Decode ids back to integers.
    Decode {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Generate ids from the configured prefix and width.
    Next {
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// First sequence value.
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Overrides `ids.prefix`.
        #[arg(long)]
        prefix: Option<String>,
        /// Overrides `ids.width`.
        #[arg(long)]
        width: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct IdPair {
    value: u64,
    id: String,
}

/// Execute `aggr id`.
pub fn run_id(args: &IdArgs, id_config: &IdConfig, output: OutputMode) -> Result<()> {
    let pairs = match &args.command {
        IdCommand::Encode { values, padded } => values
            .iter()
            .map(|&value| IdPair {
                value,
                id: if *padded { encode_padded(value) } else { encode(value) },
            })
            .collect(),
        IdCommand::Decode { ids } => ids
            .iter()
            .map(|id| {
                let value = decode(id).with_context(|| format!("Cannot decode {id:?}"))?;
                Ok(IdPair {
                    value,
                    id: id.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?,
        IdCommand::Next {
            count,
            start,
            prefix,
            width,
        } => {
            let generator = Base64Generator::new(
                prefix.clone().unwrap_or_else(|| id_config.prefix.clone()),
                width.unwrap_or(id_config.width),
            )?
            .starting_at(*start);
            let mut pairs = Vec::with_capacity(*count);
            for offset in 0..*count as u64 {
                pairs.push(IdPair {
                    value: start.saturating_add(offset),
                    id: generator.next_id()?,
                });
            }
            pairs
        }
    };

    render(output, &pairs, |pairs, w: &mut dyn Write| {
        for pair in pairs {
            match &args.command {
                IdCommand::Decode { .. } => writeln!(w, "{}", pair.value)?,
                _ => writeln!(w, "{}", pair.id)?,
            }
        }
        Ok(())
    })
}
