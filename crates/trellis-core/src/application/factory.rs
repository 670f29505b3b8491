//! Lazy engine construction
//!
//! The engine is built on first use and then shared by `Arc`. Callers hold a
//! `LazyEngine` (or the `Arc<WorkflowEngine>` it yields) and pass it down
//! explicitly.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

use super::orchestrator::WorkflowEngine;

type EngineBuilderFn = Box<dyn Fn() -> WorkflowEngine + Send + Sync>;

/// Builds a [`WorkflowEngine`] the first time it is requested
pub struct LazyEngine {
    cell: OnceCell<Arc<WorkflowEngine>>,
    build: EngineBuilderFn,
}

impl LazyEngine {
    /// Wrap a builder closure
    pub fn new<F>(build: F) -> Self
    where
        F: Fn() -> WorkflowEngine + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            build: Box::new(build),
        }
    }

    /// The engine, building it on first call
    pub fn get(&self) -> Arc<WorkflowEngine> {
        Arc::clone(self.cell.get_or_init(|| {
            debug!("Constructing workflow engine on first use");
            Arc::new((self.build)())
        }))
    }

    /// Whether the engine has been built yet
    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for LazyEngine {
    fn default() -> Self {
        Self::new(WorkflowEngine::new)
    }
}
