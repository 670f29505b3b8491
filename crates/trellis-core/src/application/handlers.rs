//! Named action handlers
//!
//! Every named operation an action can reach lives in the engine's dispatch
//! table as an [`ActionHandler`]. The built-in set covers the context store,
//! the data API, refresh and notifications; applications add their own with
//! `WorkflowEngineBuilder::with_handler`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::orchestrator::WorkflowEngine;
use super::refresh::target_ids;
use crate::domain::action::ObjectAction;
use crate::domain::collaborators::{Notification, NotificationLevel};
use crate::EngineError;

/// The argument shapes a handler can be invoked with
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerCall {
    /// A bare string action: the source EventType's `qry` (or the action name)
    /// and the trigger data
    Named {
        /// `qry` of the source EventType, or the action name
        subject: String,
        /// Trigger data
        data: Value,
    },
    /// An object action, `params` already resolved when it was an array
    Object {
        /// The action
        action: ObjectAction,
        /// Trigger data
        data: Value,
    },
    /// A target dispatch: `({ targets }, context)`
    Targets {
        /// Target ids
        targets: Vec<Value>,
        /// Context passed along to the targets
        context: Value,
    },
    /// A call expression's evaluated arguments
    Positional {
        /// Arguments in call order
        args: Vec<Value>,
        /// Trigger data
        data: Value,
    },
}

impl HandlerCall {
    /// Trigger data or target context
    pub fn data(&self) -> &Value {
        match self {
            HandlerCall::Named { data, .. }
            | HandlerCall::Object { data, .. }
            | HandlerCall::Positional { data, .. } => data,
            HandlerCall::Targets { context, .. } => context,
        }
    }
}

/// A named operation reachable from actions
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the operation; `Ok(None)` means "no result"
    async fn handle(
        &self,
        engine: &WorkflowEngine,
        call: HandlerCall,
    ) -> Result<Option<Value>, EngineError>;
}

/// Names of the built-in handlers
pub mod names {
    /// Store one value
    pub const SET_VAL: &str = "setVal";
    /// Store several values
    pub const SET_VALS: &str = "setVals";
    /// Read one value
    pub const GET_VAL: &str = "getVal";
    /// Remove values
    pub const CLEAR_VALS: &str = "clearVals";
    /// Store a value taken from the trigger data
    pub const SET_CONTEXT: &str = "setContext";
    /// Re-run `onRefresh` on targets
    pub const REFRESH: &str = "refresh";
    /// Run a named query
    pub const EXEC_EVENT: &str = "execEvent";
    /// Run a DML request
    pub const EXEC_DML: &str = "execDml";
    /// List applications
    pub const EXEC_APPS: &str = "execApps";
    /// List the current application's pages
    pub const EXEC_PAGES: &str = "execPages";
    /// Call a studio endpoint
    pub const STUDIO_API_CALL: &str = "studioApiCall";
    /// Save a record through a named query
    pub const SAVE_RECORD: &str = "saveRecord";
    /// Show user feedback
    pub const SHOW_NOTIFICATION: &str = "showNotification";
}

/// The built-in dispatch table
pub fn builtin_handlers() -> HashMap<String, Arc<dyn ActionHandler>> {
    let mut table: HashMap<String, Arc<dyn ActionHandler>> = HashMap::new();
    table.insert(names::SET_VAL.to_string(), Arc::new(SetVal));
    table.insert(names::SET_VALS.to_string(), Arc::new(SetVals));
    table.insert(names::GET_VAL.to_string(), Arc::new(GetVal));
    table.insert(names::CLEAR_VALS.to_string(), Arc::new(ClearVals));
    table.insert(names::SET_CONTEXT.to_string(), Arc::new(SetContext));
    table.insert(names::REFRESH.to_string(), Arc::new(Refresh));
    table.insert(names::EXEC_EVENT.to_string(), Arc::new(ExecEvent));
    table.insert(names::EXEC_DML.to_string(), Arc::new(ExecDml));
    table.insert(names::EXEC_APPS.to_string(), Arc::new(ExecApps));
    table.insert(names::EXEC_PAGES.to_string(), Arc::new(ExecPages));
    table.insert(names::STUDIO_API_CALL.to_string(), Arc::new(StudioApiCall));
    table.insert(names::SAVE_RECORD.to_string(), Arc::new(SaveRecord));
    table.insert(names::SHOW_NOTIFICATION.to_string(), Arc::new(ShowNotification));
    table
}

fn invalid(handler: &str, message: &str) -> EngineError {
    EngineError::ValidationError(format!("{} {}", handler, message))
}

fn required_str<'a>(value: Option<&'a Value>, handler: &str, what: &str) -> Result<&'a str, EngineError> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(handler, &format!("requires {}", what)))
}

/// Name field of an object action: `param`, falling back to `name`
fn object_param(action: &ObjectAction) -> Option<&Value> {
    action.field("param").or_else(|| action.field("name"))
}

struct SetVal;

#[async_trait]
impl ActionHandler for SetVal {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (name, value) = match &call {
            HandlerCall::Positional { args, .. } => (
                required_str(args.first(), names::SET_VAL, "a name")?.to_string(),
                args.get(1).cloned().unwrap_or(Value::Null),
            ),
            HandlerCall::Object { action, data } => (
                required_str(object_param(action), names::SET_VAL, "a param field")?.to_string(),
                action.field("value").cloned().unwrap_or_else(|| data.clone()),
            ),
            _ => return Err(invalid(names::SET_VAL, "requires a name and a value")),
        };

        engine.store().await?.set_val(&name, value).await?;
        debug!("setVal {}", name);
        Ok(None)
    }
}

struct SetVals;

#[async_trait]
impl ActionHandler for SetVals {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let values = match &call {
            HandlerCall::Positional { args, .. } => pairs_from_args(args)?,
            HandlerCall::Object { action, data } => action
                .field("values")
                .or_else(|| action.params())
                .unwrap_or(data)
                .as_object()
                .cloned()
                .ok_or_else(|| invalid(names::SET_VALS, "requires an object of values"))?,
            HandlerCall::Named { data, .. } => data
                .as_object()
                .cloned()
                .ok_or_else(|| invalid(names::SET_VALS, "requires object data"))?,
            HandlerCall::Targets { .. } => return Err(invalid(names::SET_VALS, "cannot target components")),
        };

        debug!("setVals {} values", values.len());
        engine.store().await?.set_vals(values).await?;
        Ok(None)
    }
}

/// `setVals({a: 1})` or `setVals('a', 1, 'b', 2)`
fn pairs_from_args(args: &[Value]) -> Result<Map<String, Value>, EngineError> {
    if let [Value::Object(values)] = args {
        return Ok(values.clone());
    }
    if args.len() % 2 != 0 {
        return Err(invalid(names::SET_VALS, "requires name/value pairs"));
    }
    args.chunks(2)
        .map(|pair| {
            let name = required_str(pair.first(), names::SET_VALS, "string names")?;
            Ok((name.to_string(), pair.get(1).cloned().unwrap_or(Value::Null)))
        })
        .collect()
}

struct GetVal;

#[async_trait]
impl ActionHandler for GetVal {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let name = match &call {
            HandlerCall::Positional { args, .. } => required_str(args.first(), names::GET_VAL, "a name")?,
            HandlerCall::Object { action, .. } => required_str(object_param(action), names::GET_VAL, "a param field")?,
            _ => return Err(invalid(names::GET_VAL, "requires a name")),
        };

        Ok(engine.store().await?.get_val(name).await?.map(|(_, value)| value))
    }
}

struct ClearVals;

#[async_trait]
impl ActionHandler for ClearVals {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let to_clear = match &call {
            HandlerCall::Positional { args, .. } => flatten_names(args),
            HandlerCall::Targets { targets, .. } => flatten_names(targets),
            HandlerCall::Object { action, .. } => action
                .field("names")
                .or_else(|| action.field("targets"))
                .map(|v| flatten_names(std::slice::from_ref(v)))
                .unwrap_or_default(),
            HandlerCall::Named { .. } => Vec::new(),
        };

        if to_clear.is_empty() {
            return Err(invalid(names::CLEAR_VALS, "requires at least one name"));
        }
        engine.store().await?.clear_vals(&to_clear).await?;
        debug!("clearVals {:?}", to_clear);
        Ok(None)
    }
}

/// Collect string names from arguments that are strings or arrays of strings
pub(crate) fn flatten_names(values: &[Value]) -> Vec<String> {
    let mut names = Vec::new();
    for value in values {
        match value {
            Value::String(name) => names.push(name.clone()),
            Value::Array(items) => names.extend(items.iter().filter_map(Value::as_str).map(str::to_string)),
            other => warn!("Ignoring non-string name: {}", other),
        }
    }
    names
}

struct SetContext;

#[async_trait]
impl ActionHandler for SetContext {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (param, value) = match &call {
            HandlerCall::Object { action, data } => (
                required_str(action.field("param"), names::SET_CONTEXT, "a param field")?.to_string(),
                data.get("value").cloned().unwrap_or_else(|| data.clone()),
            ),
            HandlerCall::Positional { args, data } => (
                required_str(args.first(), names::SET_CONTEXT, "a param")?.to_string(),
                args.get(1)
                    .cloned()
                    .unwrap_or_else(|| data.get("value").cloned().unwrap_or_else(|| data.clone())),
            ),
            _ => return Err(invalid(names::SET_CONTEXT, "requires a param field")),
        };

        info!("Setting context: {} = {}", param, value);
        engine.store().await?.set_val(&param, value).await?;
        Ok(None)
    }
}

struct Refresh;

#[async_trait]
impl ActionHandler for Refresh {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let targets = match &call {
            HandlerCall::Targets { targets, .. } => target_ids(&Value::Array(targets.clone())),
            HandlerCall::Positional { args, .. } => args.first().map(target_ids).unwrap_or_default(),
            HandlerCall::Object { action, .. } => action
                .field("targets")
                .or_else(|| action.field("target"))
                .map(target_ids)
                .unwrap_or_default(),
            HandlerCall::Named { .. } => Vec::new(),
        };

        if targets.is_empty() {
            return Err(invalid(names::REFRESH, "requires targets or target"));
        }
        engine.refresh(&targets, call.data()).await;
        Ok(None)
    }
}

struct ExecEvent;

#[async_trait]
impl ActionHandler for ExecEvent {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (event, params) = match call {
            HandlerCall::Named { subject, data } => (subject, data),
            HandlerCall::Positional { args, data } => {
                let event = required_str(args.first(), names::EXEC_EVENT, "an event name")?.to_string();
                (event, args.get(1).cloned().unwrap_or(data))
            }
            HandlerCall::Object { action, data } => {
                let event = required_str(
                    action.field("qry").or_else(|| action.field("event")),
                    names::EXEC_EVENT,
                    "a qry field",
                )?
                .to_string();
                (event, action.params().cloned().unwrap_or(data))
            }
            HandlerCall::Targets { .. } => return Err(invalid(names::EXEC_EVENT, "cannot target components")),
        };

        debug!("execEvent {} with {}", event, params);
        engine.api_client().exec_event(&event, params).await.map(Some)
    }
}

struct ExecDml;

#[async_trait]
impl ActionHandler for ExecDml {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let request = match call {
            HandlerCall::Positional { args, .. } => args
                .into_iter()
                .next()
                .ok_or_else(|| invalid(names::EXEC_DML, "requires a request"))?,
            HandlerCall::Object { action, data } => {
                let mut request = action.fields.clone();
                request.remove("action");
                request.entry("data").or_insert(data);
                Value::Object(request)
            }
            HandlerCall::Named { data, .. } => data,
            HandlerCall::Targets { .. } => return Err(invalid(names::EXEC_DML, "cannot target components")),
        };

        if !request.is_object() {
            return Err(invalid(names::EXEC_DML, "requires an object request"));
        }
        engine.api_client().exec_dml(request).await.map(Some)
    }
}

struct ExecApps;

#[async_trait]
impl ActionHandler for ExecApps {
    async fn handle(&self, engine: &WorkflowEngine, _call: HandlerCall) -> Result<Option<Value>, EngineError> {
        engine.api_client().exec_apps().await.map(Some)
    }
}

struct ExecPages;

#[async_trait]
impl ActionHandler for ExecPages {
    async fn handle(&self, engine: &WorkflowEngine, _call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let app_id = engine.store().await?.get_val("appID").await?.map(|(_, value)| value);
        match app_id {
            Some(app_id) if !app_id.is_null() => engine.api_client().exec_pages(&app_id).await.map(Some),
            _ => {
                warn!("No appID in context store for execPages");
                Ok(Some(json!({ "table": "studio_pages", "rows": [] })))
            }
        }
    }
}

struct StudioApiCall;

#[async_trait]
impl ActionHandler for StudioApiCall {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (endpoint, params) = match &call {
            HandlerCall::Object { action, .. } => (
                action.str_field("endpoint"),
                action.params().cloned().unwrap_or_else(|| json!({})),
            ),
            HandlerCall::Positional { args, .. } => (
                args.first().and_then(Value::as_str),
                args.get(1).cloned().unwrap_or_else(|| json!({})),
            ),
            _ => (None, Value::Null),
        };

        let endpoint = endpoint.ok_or_else(|| invalid(names::STUDIO_API_CALL, "is missing an endpoint"))?;
        info!("studioApiCall: {}", endpoint);
        engine.api_client().exec_event(endpoint, params).await.map(Some)
    }
}

struct SaveRecord;

#[async_trait]
impl ActionHandler for SaveRecord {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (qry, data) = match call {
            HandlerCall::Object { action, data } => (
                required_str(action.field("qry"), names::SAVE_RECORD, "a qry field")?.to_string(),
                data,
            ),
            HandlerCall::Positional { args, data } => (
                required_str(args.first(), names::SAVE_RECORD, "a qry")?.to_string(),
                args.get(1).cloned().unwrap_or(data),
            ),
            _ => return Err(invalid(names::SAVE_RECORD, "requires a qry field")),
        };

        let result = engine.api_client().exec_event(&qry, data).await?;
        info!("Saved record via {}", qry);
        Ok(Some(result))
    }
}

struct ShowNotification;

#[async_trait]
impl ActionHandler for ShowNotification {
    async fn handle(&self, engine: &WorkflowEngine, call: HandlerCall) -> Result<Option<Value>, EngineError> {
        let (message, level) = match &call {
            HandlerCall::Object { action, .. } => (action.str_field("message"), action.str_field("type")),
            HandlerCall::Positional { args, .. } => (
                args.first().and_then(Value::as_str),
                args.get(1).and_then(Value::as_str),
            ),
            _ => (None, None),
        };

        let notification = Notification {
            message: message.unwrap_or("Operation completed").to_string(),
            level: level.map(NotificationLevel::from_name).unwrap_or_default(),
        };
        engine.notifier().notify(&notification);
        Ok(None)
    }
}
