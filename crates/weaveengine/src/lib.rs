//! Workflow execution core
//!
//! Validates a node/edge graph, slices it into dependency layers, resolves
//! per-node inputs, dispatches typed executors with timeout/retry, and
//! coordinates layer-by-layer concurrent execution with persisted run
//! history.

mod coordinator;
mod depgraph;
mod dispatch;
mod engine;
mod layers;
mod resolve;
mod scope;
mod store;
mod validate;

pub use coordinator::{NodeReport, RunCoordinator, RunReport};
pub use dispatch::{ExecutorRegistry, RetryPolicy};
pub use engine::{EngineConfig, WorkflowEngine};
pub use layers::layers;
pub use resolve::{resolve_inputs, IMAGES_HANDLE};
pub use scope::execution_set;
pub use store::{MemoryRunStore, RunStore};
pub use validate::validate;
