//! Trigger orchestration
//!
//! The [`WorkflowEngine`] owns the EventType registry, the live component
//! handles and the handler dispatch table. A trigger runs its actions strictly
//! in order; a failing action is recorded and the next one still runs.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use dashmap::DashMap;

use super::handlers::{builtin_handlers, ActionHandler, HandlerCall};
use super::params::resolve_params;
use super::report::{ActionOutcome, ActionReport, TriggerReport};
use crate::config::EngineConfig;
use crate::domain::action::Action;
use crate::domain::collaborators::{
    ApiClient, ComponentHandle, Notifier, TracingNotifier, UnconfiguredApiClient,
};
use crate::domain::context_store::ContextStore;
use crate::domain::event_type::{triggers, EventType};
use crate::expression::ExpressionEvaluator;
use crate::EngineError;

/// Runs EventType triggers
pub struct WorkflowEngine {
    pub(super) store: RwLock<Option<Arc<dyn ContextStore>>>,
    pub(super) registry: DashMap<String, EventType>,
    pub(super) component_refs: DashMap<String, Arc<dyn ComponentHandle>>,
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    api_client: Arc<dyn ApiClient>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

/// Builder for [`WorkflowEngine`]
pub struct WorkflowEngineBuilder {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    api_client: Option<Arc<dyn ApiClient>>,
    notifier: Option<Arc<dyn Notifier>>,
    config: EngineConfig,
}

impl Default for WorkflowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngineBuilder {
    /// An empty builder: no handlers, default configuration
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            api_client: None,
            notifier: None,
            config: EngineConfig::default(),
        }
    }

    /// Register the built-in handlers
    pub fn with_builtins(mut self) -> Self {
        self.handlers.extend(builtin_handlers());
        self
    }

    /// Register (or replace) a handler
    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Use this API client
    pub fn with_api_client(mut self, client: Arc<dyn ApiClient>) -> Self {
        self.api_client = Some(client);
        self
    }

    /// Use this notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use this configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine
    pub fn build(self) -> WorkflowEngine {
        info!("Building workflow engine with {} handlers", self.handlers.len());
        WorkflowEngine {
            store: RwLock::new(None),
            registry: DashMap::new(),
            component_refs: DashMap::new(),
            handlers: self.handlers,
            api_client: self.api_client.unwrap_or_else(|| Arc::new(UnconfiguredApiClient)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            config: self.config,
        }
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngine {
    /// An engine with the built-in handlers and default collaborators
    pub fn new() -> Self {
        Self::builder().with_builtins().build()
    }

    /// Start building an engine
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::new()
    }

    /// Bind the context store; the last call wins
    pub async fn initialize(&self, store: Arc<dyn ContextStore>) {
        *self.store.write().await = Some(store);
        debug!("Context store bound");
    }

    /// Whether a context store is bound
    pub async fn is_initialized(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// The bound context store
    pub async fn store(&self) -> Result<Arc<dyn ContextStore>, EngineError> {
        self.store
            .read()
            .await
            .clone()
            .ok_or_else(|| EngineError::NotInitialized("context store not bound".to_string()))
    }

    /// Upsert EventTypes by `eventType`, falling back to `name`
    ///
    /// Returns how many were registered; entries without either are skipped.
    pub fn register_event_types<I>(&self, event_types: I) -> usize
    where
        I: IntoIterator<Item = EventType>,
    {
        let mut registered = 0;
        for event_type in event_types {
            match event_type.key().map(str::to_string) {
                Some(key) => {
                    debug!("Registering EventType {}", key);
                    self.registry.insert(key, event_type);
                    registered += 1;
                }
                None => warn!("Skipping EventType without eventType or name"),
            }
        }
        registered
    }

    /// A registered EventType by key
    pub fn event_type(&self, key: &str) -> Option<EventType> {
        self.registry.get(key).map(|entry| entry.value().clone())
    }

    /// Keys of all registered EventTypes
    pub fn event_type_keys(&self) -> Vec<String> {
        self.registry.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Register the live handle of a component
    pub fn register_component(&self, name: impl Into<String>, handle: Arc<dyn ComponentHandle>) {
        self.component_refs.insert(name.into(), handle);
    }

    /// The handle registered under `name`
    pub fn component(&self, name: &str) -> Option<Arc<dyn ComponentHandle>> {
        self.component_refs.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// The handler registered under `name`
    pub fn handler(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// The API client
    pub fn api_client(&self) -> &dyn ApiClient {
        self.api_client.as_ref()
    }

    /// The notifier
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// The configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve parameters against the bound context store
    pub async fn resolve_params(&self, params: &Value) -> Result<Value, EngineError> {
        let store = self.store().await?;
        resolve_params(store.as_ref(), params).await
    }

    /// Run the actions bound to `trigger` on a registered EventType
    pub async fn fire(&self, event_type: &str, trigger: &str, data: Value) -> Result<TriggerReport, EngineError> {
        let source = self.event_type(event_type).ok_or_else(|| {
            EngineError::ValidationError(format!("EventType '{}' is not registered", event_type))
        })?;
        Ok(self.execute_trigger(&source, trigger, data).await)
    }

    /// Run the actions bound to `trigger`, in order
    ///
    /// A missing or non-array binding yields an empty report. Failures are
    /// recorded per action and never abort the run. After the trigger's own
    /// actions, `onSuccess` or `onError` runs when declared.
    pub async fn execute_trigger(&self, event_type: &EventType, trigger: &str, data: Value) -> TriggerReport {
        let mut report = TriggerReport::new(event_type.display_name(), trigger);
        let Some(actions) = event_type.trigger_actions(trigger) else {
            debug!("No {} actions on {}", trigger, event_type.display_name());
            return report;
        };

        info!("Executing {} trigger for {} ({} actions)", trigger, event_type.display_name(), actions.len());
        let outcome = self.run_actions(event_type, trigger, actions, &data, &mut report.steps).await;
        report.last_result = outcome.last_result.clone();

        if trigger == triggers::ON_SUCCESS || trigger == triggers::ON_ERROR {
            return report;
        }

        let callback = match &outcome.last_error {
            None => event_type
                .trigger_actions(triggers::ON_SUCCESS)
                .map(|actions| (triggers::ON_SUCCESS, actions, "response", outcome.last_result.unwrap_or(Value::Null))),
            Some(err) => event_type
                .trigger_actions(triggers::ON_ERROR)
                .map(|actions| (triggers::ON_ERROR, actions, "error", Value::String(err.to_string()))),
        };

        if let Some((name, actions, key, value)) = callback {
            debug!("Running {} callback for {}", name, event_type.display_name());
            let callback_data = extend_data(&data, key, value);
            self.run_actions(event_type, name, actions, &callback_data, &mut report.steps).await;
        }

        report
    }

    async fn run_actions(
        &self,
        source: &EventType,
        trigger: &str,
        actions: &[Action],
        data: &Value,
        steps: &mut Vec<ActionReport>,
    ) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        for (index, action) in actions.iter().enumerate() {
            let step_outcome = match self.timed(self.dispatch(action, data, Some(source))).await {
                Ok(result) => {
                    if result.is_some() {
                        outcome.last_result = result.clone();
                    }
                    ActionOutcome::Completed { result }
                }
                Err(EngineError::UnknownAction(name)) => {
                    warn!("Unknown workflow action: {}", name);
                    ActionOutcome::Skipped {
                        reason: EngineError::UnknownAction(name).to_string(),
                    }
                }
                Err(err) => {
                    error!("Workflow action failed: {} ({})", action, err);
                    outcome.last_error = Some(err.clone());
                    ActionOutcome::Failed { error: err }
                }
            };

            steps.push(ActionReport {
                trigger: trigger.to_string(),
                index,
                action: action.label(),
                outcome: step_outcome,
            });
        }

        outcome
    }

    async fn timed<F>(&self, action: F) -> Result<Option<Value>, EngineError>
    where
        F: Future<Output = Result<Option<Value>, EngineError>>,
    {
        match self.config.action_timeout() {
            Some(budget) => tokio::time::timeout(budget, action)
                .await
                .map_err(|_| EngineError::Timeout(self.config.action_timeout_ms))?,
            None => action.await,
        }
    }

    /// Execute one action
    ///
    /// Unknown handler names produce a warning and no result.
    pub async fn exec_action(
        &self,
        action: &Action,
        data: &Value,
        source: Option<&EventType>,
    ) -> Result<Option<Value>, EngineError> {
        match self.dispatch(action, data, source).await {
            Err(EngineError::UnknownAction(name)) => {
                warn!("Unknown workflow action: {}", name);
                Ok(None)
            }
            other => other,
        }
    }

    /// Invoke `action` with `({ targets }, context)`
    pub async fn exec_target_action(
        &self,
        action: &str,
        targets: Vec<Value>,
        context: Value,
    ) -> Result<Option<Value>, EngineError> {
        match self.dispatch_targets(action, targets, context).await {
            Err(EngineError::UnknownAction(name)) => {
                warn!("Unknown action method: {}", name);
                Ok(None)
            }
            other => other,
        }
    }

    async fn dispatch_targets(
        &self,
        action: &str,
        targets: Vec<Value>,
        context: Value,
    ) -> Result<Option<Value>, EngineError> {
        let handler = self
            .handler(action)
            .ok_or_else(|| EngineError::UnknownAction(action.to_string()))?;
        handler.handle(self, HandlerCall::Targets { targets, context }).await
    }

    async fn dispatch(
        &self,
        action: &Action,
        data: &Value,
        source: Option<&EventType>,
    ) -> Result<Option<Value>, EngineError> {
        debug!("Executing action: {}", action);

        match action {
            Action::Method(name) if data.is_array() => {
                let targets = data.as_array().cloned().unwrap_or_default();
                let context = json!({ "sourceEventType": source.and_then(EventType::key) });
                self.dispatch_targets(name, targets, context).await
            }
            Action::FunctionCall(call) => ExpressionEvaluator::new(self).execute(call, data).await,
            Action::Method(name) => {
                let handler = self
                    .handler(name)
                    .ok_or_else(|| EngineError::UnknownAction(name.clone()))?;
                let subject = source
                    .and_then(|s| s.qry.clone())
                    .unwrap_or_else(|| name.clone());
                handler
                    .handle(self, HandlerCall::Named { subject, data: data.clone() })
                    .await
            }
            Action::Object(object) => {
                let handler = self
                    .handler(&object.method)
                    .ok_or_else(|| EngineError::UnknownAction(object.method.clone()))?;
                let object = match object.params() {
                    Some(params) if params.is_array() => {
                        let resolved = self.resolve_params(params).await?;
                        debug!("Resolved params for {}: {}", object.method, resolved);
                        object.with_params(resolved)
                    }
                    _ => object.clone(),
                };
                handler
                    .handle(self, HandlerCall::Object { action: object, data: data.clone() })
                    .await
            }
            Action::Unrecognized(value) => Err(EngineError::UnknownAction(value.to_string())),
        }
    }

    /// `onSelect` with row data
    pub async fn handle_row_click(&self, event_type: &EventType, row: Value) -> TriggerReport {
        self.execute_trigger(event_type, triggers::ON_SELECT, row).await
    }

    /// `onUpdate` with form data
    pub async fn handle_form_submit(&self, event_type: &EventType, form: Value) -> TriggerReport {
        self.execute_trigger(event_type, triggers::ON_UPDATE, form).await
    }

    /// `onCreate` with form data
    pub async fn handle_create(&self, event_type: &EventType, form: Value) -> TriggerReport {
        self.execute_trigger(event_type, triggers::ON_CREATE, form).await
    }

    /// `onDelete` with the record
    pub async fn handle_delete(&self, event_type: &EventType, record: Value) -> TriggerReport {
        self.execute_trigger(event_type, triggers::ON_DELETE, record).await
    }
}

#[derive(Default)]
struct RunOutcome {
    last_result: Option<Value>,
    last_error: Option<EngineError>,
}

/// `data` with `key` set; non-object data is replaced by `{ key: value }`
pub(crate) fn extend_data(data: &Value, key: &str, value: Value) -> Value {
    let mut extended = data.as_object().cloned().unwrap_or_default();
    extended.insert(key.to_string(), value);
    Value::Object(extended)
}
