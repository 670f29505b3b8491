//! Shared setup for the engine integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use trellis_core::{EngineConfig, WorkflowEngine, WorkflowEngineBuilder};
use trellis_state_inmemory::InMemoryContextStore;
use trellis_test_utils::{RecordingApiClient, RecordingNotifier};

/// An engine with built-ins, recording collaborators and an in-memory store
pub struct Harness {
    pub engine: Arc<WorkflowEngine>,
    pub store: InMemoryContextStore,
    pub api: Arc<RecordingApiClient>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(|builder| builder).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        Self::with(move |builder| builder.with_config(config)).await
    }

    pub async fn with<F>(customize: F) -> Self
    where
        F: FnOnce(WorkflowEngineBuilder) -> WorkflowEngineBuilder,
    {
        let api = Arc::new(RecordingApiClient::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let builder = WorkflowEngine::builder()
            .with_builtins()
            .with_api_client(api.clone())
            .with_notifier(notifier.clone());
        let engine = Arc::new(customize(builder).build());

        let store = InMemoryContextStore::new();
        engine.initialize(Arc::new(store.clone())).await;

        Self {
            engine,
            store,
            api,
            notifier,
        }
    }

    pub async fn context(&self, name: &str) -> Option<serde_json::Value> {
        self.store.snapshot().await.get(name).cloned()
    }
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trellis_core=debug")
        .with_test_writer()
        .try_init();
}
