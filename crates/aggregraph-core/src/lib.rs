#![forbid(unsafe_code)]
//! aggregraph-core library.
//!
//! Record graphs, their cycle-safe JSON form, and compact sequence ids.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern, each mapping to an
//!   [`error::ErrorCode`]; `anyhow::Result` for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!
//! # Modules
//!
//! - [`record`]: arena of records; cross references are handles.
//! - [`pack`]: [`pack::pack`] / [`pack::unpack`] with surrogate ids.
//! - [`id`]: base-64 positional ids and [`id::Base64Generator`].
//! - [`batch`]: many documents at once under an explicit [`batch::ExecutionMode`].
//! - [`config`]: `.aggregraph/config.toml` and output-mode resolution.

pub mod batch;
pub mod config;
pub mod error;
pub mod id;
pub mod pack;
pub mod record;

pub use batch::ExecutionMode;
pub use pack::{PackConfig, PackError, UnpackError, Unpacked, pack, unpack};
pub use record::{Record, RecordArena, RecordRef, Value};
