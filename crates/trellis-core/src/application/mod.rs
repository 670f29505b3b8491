/// WorkflowEngine and trigger execution
pub mod orchestrator;

/// Handler trait and the built-in dispatch table
pub mod handlers;

/// Parameter resolution
pub mod params;

/// Refresh target resolution
pub mod refresh;

/// Refresh request batching
pub mod batcher;

/// Trigger run reports
pub mod report;

/// Lazy engine construction
pub mod factory;
