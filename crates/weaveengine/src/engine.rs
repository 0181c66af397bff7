use crate::coordinator::{RunCoordinator, RunReport};
use crate::dispatch::ExecutorRegistry;
use crate::store::RunStore;
use std::sync::Arc;
use weavecore::{EngineError, EventBus, ExecutionEvent, ExecutionScope, Graph};

/// Engine-wide configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
        }
    }
}

/// Facade owning the executor registry, run store and event bus
pub struct WorkflowEngine {
    registry: Arc<ExecutorRegistry>,
    events: Arc<EventBus>,
    coordinator: RunCoordinator,
}

impl WorkflowEngine {
    pub fn new(
        registry: Arc<ExecutorRegistry>,
        store: Arc<dyn RunStore>,
        config: EngineConfig,
    ) -> Self {
        let events = Arc::new(EventBus::new(config.event_buffer_size));
        let coordinator =
            RunCoordinator::new(Arc::clone(&registry), store, Arc::clone(&events));
        Self {
            registry,
            events,
            coordinator,
        }
    }

    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    pub async fn execute(
        &self,
        graph: &Graph,
        scope: &ExecutionScope,
    ) -> Result<RunReport, EngineError> {
        self.coordinator.execute(graph, scope).await
    }
}
