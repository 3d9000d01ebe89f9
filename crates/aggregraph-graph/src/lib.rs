//! State graph construction and cycle-tolerant topological ordering.
//!
//! # Edge Direction
//!
//! Edge `A → B` means "type A owns a property whose target type is B".
//! [`StateGraph::toposort`] puts sources first (aggregate roots before the
//! types they reach); [`StateGraph::dependency_order`] is its reverse.
//!
//! Cyclic metadata never makes ordering fail. Members of a cycle are kept
//! together and every edge between different components is honoured.
//! [`StateGraph::strict_toposort`] is the variant that refuses multi-type
//! cycles.

#![forbid(unsafe_code)]

pub mod build;
pub mod catalog;
pub mod cycles;
pub mod error;
pub mod export;
pub mod state;
pub mod toposort;

pub use build::StateGraph;
pub use catalog::{PropertyDef, RelationSource, TypeCatalog, TypeDef};
pub use error::{GraphError, GraphResult};
pub use export::ExportFormat;
pub use state::{StateEdge, StateNode};
