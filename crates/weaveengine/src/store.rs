use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use weavecore::{
    NodeResult, NodeStatus, ResultId, RunId, RunStatus, StoreError, Value, WorkflowRun,
};

/// Persistence collaborator for run history.
///
/// The coordinator generates all ids itself and treats every call as a
/// fire-and-forget durable write: a store failure is logged and never blocks
/// node execution.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;

    async fn create_node_result(&self, result: &NodeResult) -> Result<(), StoreError>;

    async fn update_node_result(
        &self,
        result_id: ResultId,
        status: NodeStatus,
        output: Option<Value>,
        error: Option<String>,
        duration_ms: u64,
    ) -> Result<(), StoreError>;

    async fn update_run(
        &self,
        run_id: RunId,
        status: RunStatus,
        duration_ms: u64,
    ) -> Result<(), StoreError>;
}

/// In-memory run store backing the server's history endpoints
pub struct MemoryRunStore {
    runs: RwLock<Vec<WorkflowRun>>,
    results: RwLock<HashMap<ResultId, NodeResult>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(Vec::new()),
            results: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_run(&self, run_id: RunId) -> Option<WorkflowRun> {
        self.runs
            .read()
            .await
            .iter()
            .find(|r| r.id == run_id)
            .cloned()
    }

    /// All runs, most recent first
    pub async fn list_runs(&self) -> Vec<WorkflowRun> {
        let mut runs = self.runs.read().await.clone();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }

    /// Node results for a run, ordered by start time
    pub async fn node_results(&self, run_id: RunId) -> Vec<NodeResult> {
        let mut results: Vec<_> = self
            .results
            .read()
            .await
            .values()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        results
    }
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        self.runs.write().await.push(run.clone());
        Ok(())
    }

    async fn create_node_result(&self, result: &NodeResult) -> Result<(), StoreError> {
        self.results
            .write()
            .await
            .insert(result.id, result.clone());
        Ok(())
    }

    async fn update_node_result(
        &self,
        result_id: ResultId,
        status: NodeStatus,
        output: Option<Value>,
        error: Option<String>,
        duration_ms: u64,
    ) -> Result<(), StoreError> {
        let mut results = self.results.write().await;
        let result = results
            .get_mut(&result_id)
            .ok_or_else(|| StoreError::ResultNotFound(result_id.to_string()))?;
        result.status = status;
        result.output = output;
        result.error = error;
        result.completed_at = Some(Utc::now());
        result.duration_ms = Some(duration_ms);
        Ok(())
    }

    async fn update_run(
        &self,
        run_id: RunId,
        status: RunStatus,
        duration_ms: u64,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?;
        run.status = status;
        run.completed_at = Some(Utc::now());
        run.duration_ms = Some(duration_ms);
        Ok(())
    }
}
