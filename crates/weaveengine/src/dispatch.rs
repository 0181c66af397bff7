use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use weavecore::{ExecutorContext, NodeError, NodeExecutor, NodeType, Value};

/// Per-type execution policy: bounded immediate retry plus a hard timeout
/// applied to every attempt. Retries fire only for transient upstream
/// failures; missing-input errors are never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
        }
    }

    /// Defaults observed per node type: LLM and crop get a second attempt,
    /// frame extraction does not.
    pub fn for_node_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Llm => Self::new(2, Duration::from_secs(60)),
            NodeType::CropImage => Self::new(2, Duration::from_secs(30)),
            NodeType::ExtractFrame => Self::new(1, Duration::from_secs(30)),
            _ => Self::new(1, Duration::from_secs(10)),
        }
    }
}

/// Registry mapping node types to their executors.
///
/// One executor per `NodeType` variant; lookup failures at dispatch time are
/// engine misconfiguration, caught up-front by the coordinator's coverage
/// check.
pub struct ExecutorRegistry {
    executors: HashMap<NodeType, Arc<dyn NodeExecutor>>,
    policies: HashMap<NodeType, RetryPolicy>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
            policies: HashMap::new(),
        }
    }

    pub fn register(&mut self, executor: Arc<dyn NodeExecutor>) {
        let node_type = executor.node_type();
        tracing::info!("registering executor for node type: {}", node_type);
        self.policies
            .entry(node_type)
            .or_insert_with(|| RetryPolicy::for_node_type(node_type));
        self.executors.insert(node_type, executor);
    }

    /// Override the retry/timeout policy for one node type
    pub fn set_policy(&mut self, node_type: NodeType, policy: RetryPolicy) {
        self.policies.insert(node_type, policy);
    }

    pub fn policy(&self, node_type: NodeType) -> RetryPolicy {
        self.policies
            .get(&node_type)
            .copied()
            .unwrap_or_else(|| RetryPolicy::for_node_type(node_type))
    }

    pub fn has_executor(&self, node_type: NodeType) -> bool {
        self.executors.contains_key(&node_type)
    }

    pub fn registered_types(&self) -> Vec<NodeType> {
        self.executors.keys().copied().collect()
    }

    /// Invoke the executor for a node type under its timeout/retry policy
    pub async fn dispatch(
        &self,
        node_type: NodeType,
        ctx: ExecutorContext,
    ) -> Result<Value, NodeError> {
        let executor = self.executors.get(&node_type).ok_or_else(|| {
            NodeError::ExecutionFailed(format!("no executor registered for node type {node_type}"))
        })?;
        let policy = self.policy(node_type);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match timeout(policy.timeout, executor.execute(ctx.clone())).await {
                Ok(result) => result,
                Err(_) => Err(NodeError::UpstreamTimeout {
                    seconds: policy.timeout.as_secs(),
                }),
            };

            match result {
                Ok(output) => return Ok(output),
                Err(error) if error.is_transient() && attempt < policy.max_attempts => {
                    tracing::warn!(
                        node_id = %ctx.node_id,
                        %node_type,
                        attempt,
                        %error,
                        "transient executor failure, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
