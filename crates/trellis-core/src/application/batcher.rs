//! Refresh batching
//!
//! Refresh requests that arrive within the batching window are merged into a
//! single refresh pass. Every request restarts the window.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::orchestrator::WorkflowEngine;

#[derive(Default)]
struct BatchState {
    pending: Vec<String>,
    data: Value,
    generation: u64,
}

impl BatchState {
    fn take(&mut self) -> (Vec<String>, Value) {
        self.generation += 1;
        (std::mem::take(&mut self.pending), std::mem::take(&mut self.data))
    }
}

/// Coalesces refresh requests on a shared engine
#[derive(Clone)]
pub struct RefreshBatcher {
    engine: Arc<WorkflowEngine>,
    window: Duration,
    state: Arc<Mutex<BatchState>>,
}

impl RefreshBatcher {
    /// A batcher using the engine's configured window
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let window = engine.config().refresh_batch_window();
        Self::with_window(engine, window)
    }

    /// A batcher with an explicit window
    pub fn with_window(engine: Arc<WorkflowEngine>, window: Duration) -> Self {
        Self {
            engine,
            window,
            state: Arc::new(Mutex::new(BatchState::default())),
        }
    }

    /// The batching window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Queue targets and restart the window
    ///
    /// Targets are deduplicated and keep their first-seen order; the most
    /// recent `data` is used for the whole batch.
    pub async fn request(&self, targets: &[String], data: Value) {
        let generation = {
            let mut state = self.state.lock().await;
            for target in targets {
                if !state.pending.contains(target) {
                    state.pending.push(target.clone());
                }
            }
            state.data = data;
            state.generation += 1;
            state.generation
        };

        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let (batch, data) = {
                let mut state = state.lock().await;
                if state.generation != generation {
                    return;
                }
                state.take()
            };
            if batch.is_empty() {
                return;
            }
            debug!("Refreshing batch of {} targets", batch.len());
            engine.refresh(&batch, &data).await;
        });
    }

    /// Run the pending batch now
    pub async fn flush(&self) {
        let (batch, data) = self.state.lock().await.take();
        if batch.is_empty() {
            return;
        }
        debug!("Flushing batch of {} targets", batch.len());
        self.engine.refresh(&batch, &data).await;
    }

    /// Targets waiting for the window to elapse
    pub async fn pending(&self) -> Vec<String> {
        self.state.lock().await.pending.clone()
    }
}
