//! External collaborators the engine calls out to
//!
//! None of these are implemented here beyond trivial defaults: the data API,
//! the live UI components and the notification surface all belong to the
//! embedding application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::EngineError;

/// Backend data access used by the `exec*` and `studioApiCall` handlers
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Run a named query with parameters
    async fn exec_event(&self, event: &str, params: Value) -> Result<Value, EngineError>;

    /// Run an INSERT/UPDATE/DELETE request
    async fn exec_dml(&self, request: Value) -> Result<Value, EngineError>;

    /// List applications
    async fn exec_apps(&self) -> Result<Value, EngineError>;

    /// List the pages of one application
    async fn exec_pages(&self, app_id: &Value) -> Result<Value, EngineError>;
}

/// ApiClient used until the embedding application provides one
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredApiClient;

impl UnconfiguredApiClient {
    fn unavailable(operation: &str) -> EngineError {
        EngineError::ExternalDependencyError(format!("No API client configured for {}", operation))
    }
}

#[async_trait]
impl ApiClient for UnconfiguredApiClient {
    async fn exec_event(&self, event: &str, _params: Value) -> Result<Value, EngineError> {
        Err(Self::unavailable(&format!("execEvent({})", event)))
    }

    async fn exec_dml(&self, _request: Value) -> Result<Value, EngineError> {
        Err(Self::unavailable("execDml"))
    }

    async fn exec_apps(&self) -> Result<Value, EngineError> {
        Err(Self::unavailable("execApps"))
    }

    async fn exec_pages(&self, _app_id: &Value) -> Result<Value, EngineError> {
        Err(Self::unavailable("execPages"))
    }
}

/// A live UI component that can receive fresh data
pub trait ComponentHandle: Send + Sync {
    /// Replace the data the component displays
    fn update_data(&self, data: Value);
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Operation succeeded
    #[default]
    Success,
    /// Informational
    Info,
    /// Something needs attention
    Warning,
    /// Operation failed
    Error,
}

impl NotificationLevel {
    /// Parse a level name; anything unknown is `Success`
    pub fn from_name(name: &str) -> Self {
        match name {
            "info" => NotificationLevel::Info,
            "warning" | "warn" => NotificationLevel::Warning,
            "error" => NotificationLevel::Error,
            _ => NotificationLevel::Success,
        }
    }
}

/// User feedback message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Text shown to the user
    pub message: String,
    /// Severity
    pub level: NotificationLevel,
}

/// Surface that shows notifications to the user
pub trait Notifier: Send + Sync {
    /// Show a notification
    fn notify(&self, notification: &Notification);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => error!("Notification: {}", notification.message),
            NotificationLevel::Warning => warn!("Notification: {}", notification.message),
            _ => info!("Notification: {} ({:?})", notification.message, notification.level),
        }
    }
}
