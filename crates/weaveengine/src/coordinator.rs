use crate::dispatch::ExecutorRegistry;
use crate::layers::layers;
use crate::resolve::resolve_inputs;
use crate::scope::execution_set;
use crate::store::RunStore;
use crate::validate::validate;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use weavecore::{
    EngineError, EventBus, ExecutionEvent, ExecutionScope, ExecutorContext, Graph, NodeError,
    NodeId, NodeResult, NodeStatus, RunId, RunStatus, Value, WorkflowRun,
};

/// Orchestrates one run: validation, layering, per-layer concurrent
/// dispatch, output routing, status persistence and the final verdict.
///
/// The cumulative output map is owned exclusively by the coordinator; layer
/// tasks only return messages, and all map mutations happen here after a
/// node's dispatch resolves. Sibling nodes therefore never observe each
/// other's output, only values from strictly earlier layers.
pub struct RunCoordinator {
    registry: Arc<ExecutorRegistry>,
    store: Arc<dyn RunStore>,
    events: Arc<EventBus>,
}

impl RunCoordinator {
    pub fn new(
        registry: Arc<ExecutorRegistry>,
        store: Arc<dyn RunStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            store,
            events,
        }
    }

    pub async fn execute(
        &self,
        graph: &Graph,
        scope: &ExecutionScope,
    ) -> Result<RunReport, EngineError> {
        let set = execution_set(graph, scope)?;
        validate(graph, Some(&set))?;

        for id in &set {
            let node = graph
                .node(id)
                .ok_or_else(|| EngineError::Internal(format!("node vanished from graph: {id}")))?;
            if !self.registry.has_executor(node.node_type) {
                return Err(EngineError::UnknownExecutor(node.node_type.to_string()));
            }
        }

        let execution_layers = layers(graph, &set)?;

        let run = WorkflowRun::start(scope.kind());
        let started = Instant::now();
        tracing::info!(run_id = %run.id, scope = %run.scope, nodes = set.len(), "starting run");

        if let Err(e) = self.store.create_run(&run).await {
            tracing::warn!(run_id = %run.id, error = %e, "failed to persist run record");
        }
        self.events.emit(ExecutionEvent::RunStarted {
            run_id: run.id,
            scope: run.scope,
            timestamp: Utc::now(),
        });

        // Seed prior outputs so out-of-scope predecessors feed inputs
        // without re-executing.
        let mut outputs: HashMap<NodeId, Value> = graph
            .nodes
            .iter()
            .filter_map(|n| n.last_output.clone().map(|v| (n.id.clone(), v)))
            .collect();
        let mut reports = Vec::new();

        for layer in execution_layers {
            let mut tasks = FuturesUnordered::new();

            for node_id in layer {
                let node = graph
                    .node(&node_id)
                    .ok_or_else(|| {
                        EngineError::Internal(format!("node vanished from graph: {node_id}"))
                    })?
                    .clone();

                // Inputs are resolved on the coordinator task against the
                // current map, before anything in this layer runs.
                let inputs = resolve_inputs(&node, &graph.edges, &outputs);
                let mut record = NodeResult::start(run.id, node.id.clone(), node.node_type);
                record.input = Some(Value::Object(inputs.clone()));

                self.events.emit(ExecutionEvent::NodeStarted {
                    run_id: run.id,
                    node_id: node.id.clone(),
                    node_type: node.node_type,
                    timestamp: Utc::now(),
                });

                let registry = Arc::clone(&self.registry);
                let store = Arc::clone(&self.store);
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = store.create_node_result(&record).await {
                        tracing::warn!(
                            node_id = %record.node_id,
                            error = %e,
                            "failed to persist node result"
                        );
                    }
                    let start = Instant::now();
                    let ctx = ExecutorContext::new(record.node_id.clone(), inputs);
                    let outcome = registry.dispatch(record.node_type, ctx).await;
                    let duration_ms = start.elapsed().as_millis() as u64;
                    (record, outcome, duration_ms)
                }));
            }

            // Barrier: the next layer starts only after every node in this
            // one reached a terminal state.
            while let Some(joined) = tasks.next().await {
                let (record, outcome, duration_ms) = joined
                    .map_err(|e| EngineError::Internal(format!("task join error: {e}")))?;
                self.settle_node(run.id, record, outcome, duration_ms, &mut outputs, &mut reports)
                    .await;
            }
        }

        let status = final_status(&reports);
        let duration_ms = started.elapsed().as_millis() as u64;
        if let Err(e) = self.store.update_run(run.id, status, duration_ms).await {
            tracing::warn!(run_id = %run.id, error = %e, "failed to finalize run record");
        }
        self.events.emit(ExecutionEvent::RunCompleted {
            run_id: run.id,
            status,
            duration_ms,
            timestamp: Utc::now(),
        });
        tracing::info!(run_id = %run.id, ?status, duration_ms, "run finished");

        Ok(RunReport {
            run_id: run.id,
            status,
            results: reports,
            duration_ms,
        })
    }

    /// Apply one node's outcome: route its output (or evict a stale prior
    /// value on failure), persist the terminal state, emit the event.
    async fn settle_node(
        &self,
        run_id: RunId,
        record: NodeResult,
        outcome: Result<Value, NodeError>,
        duration_ms: u64,
        outputs: &mut HashMap<NodeId, Value>,
        reports: &mut Vec<NodeReport>,
    ) {
        match outcome {
            Ok(output) => {
                tracing::debug!(node_id = %record.node_id, duration_ms, "node succeeded");
                outputs.insert(record.node_id.clone(), output.clone());

                if let Err(e) = self
                    .store
                    .update_node_result(
                        record.id,
                        NodeStatus::Success,
                        Some(output.clone()),
                        None,
                        duration_ms,
                    )
                    .await
                {
                    tracing::warn!(node_id = %record.node_id, error = %e, "failed to persist node result");
                }
                self.events.emit(ExecutionEvent::NodeCompleted {
                    run_id,
                    node_id: record.node_id.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                reports.push(NodeReport {
                    node_id: record.node_id,
                    status: NodeStatus::Success,
                    output: Some(output),
                    error: None,
                    duration_ms,
                });
            }
            Err(error) => {
                tracing::warn!(node_id = %record.node_id, %error, "node failed");
                // A failed node must not feed dependents its prior output.
                outputs.remove(&record.node_id);

                let message = error.to_string();
                if let Err(e) = self
                    .store
                    .update_node_result(
                        record.id,
                        NodeStatus::Failed,
                        None,
                        Some(message.clone()),
                        duration_ms,
                    )
                    .await
                {
                    tracing::warn!(node_id = %record.node_id, error = %e, "failed to persist node result");
                }
                self.events.emit(ExecutionEvent::NodeFailed {
                    run_id,
                    node_id: record.node_id.clone(),
                    error: message.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                reports.push(NodeReport {
                    node_id: record.node_id,
                    status: NodeStatus::Failed,
                    output: None,
                    error: Some(message),
                    duration_ms,
                });
            }
        }
    }
}

/// Final run verdict: SUCCESS when every result succeeded (or none exist),
/// FAILED when every result failed, PARTIAL for a mix.
fn final_status(results: &[NodeReport]) -> RunStatus {
    if results.is_empty() {
        return RunStatus::Success;
    }
    let failed = results
        .iter()
        .filter(|r| r.status == NodeStatus::Failed)
        .count();
    if failed == 0 {
        RunStatus::Success
    } else if failed == results.len() {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    }
}

/// Outcome of a whole run, returned to the submitter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    pub results: Vec<NodeReport>,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// One node's terminal outcome within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub node_id: NodeId,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}
