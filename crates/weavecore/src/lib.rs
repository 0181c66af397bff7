//! Core abstractions for the weave engine
//!
//! This crate provides the graph model, run records, executor contract and
//! error types that all other components depend on. It contains no
//! scheduling logic.

mod error;
mod events;
mod executor;
mod graph;
mod run;
mod value;

pub use error::{EngineError, NodeError, PortDirection, StoreError, ValidationError};
pub use events::{EventBus, ExecutionEvent};
pub use executor::{ExecutorContext, NodeExecutor};
pub use graph::{Edge, ExecutionScope, Graph, Node, NodeId, NodeType, ScopeKind, OUTPUT_HANDLE};
pub use run::{NodeResult, NodeStatus, ResultId, RunId, RunStatus, WorkflowRun};
pub use value::Value;
