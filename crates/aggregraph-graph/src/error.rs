//! Error types for graph operations.

use std::path::PathBuf;

use aggregraph_core::error::ErrorCode;
use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building, ordering, or exporting a graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// An edge endpoint is not registered in the graph.
    #[error("type {type_name:?} is not registered in the graph")]
    UnknownNode {
        /// The type name that was not found.
        type_name: String,
    },

    /// Strict ordering met a strongly connected component of several types.
    #[error("dependency cycle between types: {}", members.join(", "))]
    CycleDetected {
        /// Sorted type names of the first offending component.
        members: Vec<String>,
    },

    /// A type catalog could not be read or parsed.
    #[error("failed to load type catalog {}: {reason}", path.display())]
    Catalog {
        path: PathBuf,
        reason: String,
    },

    /// Writing an export failed.
    #[error("failed to write graph export {}: {reason}", path.display())]
    Export {
        path: PathBuf,
        reason: String,
    },
}

impl GraphError {
    /// Creates an unknown node error.
    pub fn unknown_node(type_name: impl Into<String>) -> Self {
        Self::UnknownNode {
            type_name: type_name.into(),
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownNode { .. } => ErrorCode::UnknownNode,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::Catalog { .. } => ErrorCode::CatalogParseError,
            Self::Export { .. } => ErrorCode::ExportFailed,
        }
    }
}
