//! Batch pack/unpack with an explicit execution mode.
//!
//! Each document in a batch is independent, so the only choice is whether
//! to walk them on the calling thread or fan them out over scoped worker
//! threads. That choice is an argument, never ambient state: two callers in
//! the same process can use different modes at the same time.

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::pack::{PackConfig, PackError, UnpackError, Unpacked, pack, unpack};
use crate::record::{RecordArena, RecordRef};

/// How a batch is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// Split the batch into contiguous chunks, one per worker.
    Parallel { workers: usize },
}

impl ExecutionMode {
    /// Worker count actually used for a batch of `len` items.
    #[must_use]
    pub fn effective_workers(self, len: usize) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel { workers } => workers.clamp(1, len.max(1)),
        }
    }
}

/// Apply `f` to every item, preserving input order in the output.
pub fn run_batch<T, R, F>(items: &[T], mode: ExecutionMode, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = mode.effective_workers(items.len());
    if workers <= 1 {
        return items.iter().map(f).collect();
    }

    let chunk_len = items.len().div_ceil(workers);
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_len)
            .map(|chunk| scope.spawn(move || chunk.iter().map(f).collect::<Vec<R>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

/// Pack many record graphs.
#[instrument(skip(jobs, config), fields(jobs = jobs.len()))]
pub fn pack_batch(
    jobs: &[(&RecordArena, RecordRef)],
    config: &PackConfig,
    mode: ExecutionMode,
) -> Vec<Result<serde_json::Value, PackError>> {
    debug!(workers = mode.effective_workers(jobs.len()), "packing batch");
    run_batch(jobs, mode, |(arena, root)| pack(arena, *root, config))
}

/// Unpack many documents.
#[instrument(skip(documents, config), fields(documents = documents.len()))]
pub fn unpack_batch(
    documents: &[serde_json::Value],
    config: &PackConfig,
    mode: ExecutionMode,
) -> Vec<Result<Unpacked, UnpackError>> {
    debug!(
        workers = mode.effective_workers(documents.len()),
        "unpacking batch"
    );
    run_batch(documents, mode, |document| unpack(document, config))
}
