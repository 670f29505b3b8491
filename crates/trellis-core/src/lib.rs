//!
//! Trellis Core - Trigger/action execution engine
//!
//! Declarative EventTypes bind UI triggers (`onLoad`, `onSelect`, ...) to
//! ordered action lists. This crate runs those lists: it classifies actions,
//! substitutes `{{this.*}}` templates, parses and evaluates call expressions,
//! resolves `getVal(...)` parameter requests against a shared context store
//! and dispatches to named handlers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - actions, EventTypes and collaborator contracts
pub mod domain;

/// Application services - orchestration, handlers, refresh
pub mod application;

/// Call expression language
pub mod expression;

/// Engine configuration
pub mod config;

/// Error types
pub mod error;

pub use application::batcher::RefreshBatcher;
pub use application::factory::LazyEngine;
pub use application::handlers::{ActionHandler, HandlerCall};
pub use application::orchestrator::{WorkflowEngine, WorkflowEngineBuilder};
pub use application::params::resolve_params;
pub use application::report::{ActionOutcome, ActionReport, TriggerReport};
pub use config::EngineConfig;
pub use domain::action::{is_function_call, Action, FunctionCallAction, ObjectAction};
pub use domain::collaborators::{
    ApiClient, ComponentHandle, Notification, NotificationLevel, Notifier, TracingNotifier,
    UnconfiguredApiClient,
};
pub use domain::context_store::{ContextStore, Tuple};
pub use domain::event_type::{triggers, EventType, TriggerBinding};
pub use error::EngineError;
pub use expression::ExpressionEvaluator;
