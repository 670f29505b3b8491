//! Recording fakes
//!
//! Unlike the mocks these keep state, so a test can run a whole trigger and
//! inspect afterwards what reached each collaborator and in which order.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use trellis_core::{
    ActionHandler, ApiClient, ComponentHandle, EngineError, HandlerCall, Notification, Notifier,
    WorkflowEngine,
};

/// Ordered log shared between fakes
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// Copy of all entries so far
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// How many entries equal `entry`
    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| e.as_str() == entry).count()
    }
}

/// ApiClient that records calls and answers from canned responses
///
/// Unknown events answer `{ "event": <name>, "params": <params> }`.
#[derive(Default)]
pub struct RecordingApiClient {
    responses: Mutex<HashMap<String, Result<Value, EngineError>>>,
    calls: Mutex<Vec<(String, Value)>>,
    delay: Mutex<Option<Duration>>,
    log: Option<CallLog>,
}

impl RecordingApiClient {
    /// Create a client with no canned responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that also writes `api:<operation>` entries to `log`
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    /// Answer `operation` (an event name, `execDml`, `execApps` or `execPages`)
    pub fn respond(&self, operation: &str, response: Value) -> &Self {
        self.responses.lock().insert(operation.to_string(), Ok(response));
        self
    }

    /// Fail `operation` with `error`
    pub fn fail(&self, operation: &str, error: EngineError) -> &Self {
        self.responses.lock().insert(operation.to_string(), Err(error));
        self
    }

    /// Sleep before answering
    pub fn delay(&self, delay: Duration) -> &Self {
        *self.delay.lock() = Some(delay);
        self
    }

    /// Every call so far as `(operation, argument)`
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Calls made for one operation
    pub fn calls_to(&self, operation: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| op == operation)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    async fn answer(&self, operation: &str, argument: Value) -> Result<Value, EngineError> {
        debug!("RecordingApiClient: {} {}", operation, argument);
        self.calls.lock().push((operation.to_string(), argument.clone()));
        if let Some(log) = &self.log {
            log.push(format!("api:{}", operation));
        }

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let canned = self.responses.lock().get(operation).cloned();
        canned.unwrap_or_else(|| Ok(json!({ "event": operation, "params": argument })))
    }
}

#[async_trait]
impl ApiClient for RecordingApiClient {
    async fn exec_event(&self, event: &str, params: Value) -> Result<Value, EngineError> {
        self.answer(event, params).await
    }

    async fn exec_dml(&self, request: Value) -> Result<Value, EngineError> {
        self.answer("execDml", request).await
    }

    async fn exec_apps(&self) -> Result<Value, EngineError> {
        self.answer("execApps", Value::Null).await
    }

    async fn exec_pages(&self, app_id: &Value) -> Result<Value, EngineError> {
        self.answer("execPages", app_id.clone()).await
    }
}

/// ComponentHandle that keeps every update
#[derive(Default)]
pub struct RecordingHandle {
    updates: Mutex<Vec<Value>>,
}

impl RecordingHandle {
    /// Create a handle with no updates
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update received
    pub fn updates(&self) -> Vec<Value> {
        self.updates.lock().clone()
    }
}

impl ComponentHandle for RecordingHandle {
    fn update_data(&self, data: Value) {
        self.updates.lock().push(data);
    }
}

/// Notifier that keeps every notification
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create an empty notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification shown
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().push(notification.clone());
    }
}

/// ActionHandler that records its calls and returns a fixed outcome
pub struct RecordingHandler {
    name: String,
    outcome: Result<Option<Value>, EngineError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<HandlerCall>>,
    log: Option<CallLog>,
}

impl RecordingHandler {
    /// A handler that returns `result`
    pub fn returning(name: &str, result: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            outcome: Ok(result),
            delay: None,
            calls: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// A handler that fails with `error`
    pub fn failing(name: &str, error: EngineError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::returning(name, None)
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Write the handler name to `log` on every call
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Every call received
    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().clone()
    }

    /// Wrap in an `Arc` for registration
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn handle(&self, _engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        self.calls.lock().push(call);
        if let Some(log) = &self.log {
            log.push(self.name.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
