/// Action model
pub mod action;

/// EventType definitions and trigger bindings
pub mod event_type;

/// Context store contract
pub mod context_store;

/// API client, component handle and notifier interfaces
pub mod collaborators;
