//! Call-expression execution
//!
//! `setVal` and `clearVals` go straight to the context store and
//! `studioApiCall` resolves array params first. Every other method, `refresh`
//! included, is looked up in the engine's handler table.

use serde_json::{Map, Value};
use tracing::debug;

use super::parser::parse_call;
use super::template::resolve_templates;
use crate::application::handlers::{flatten_names, names, HandlerCall};
use crate::application::orchestrator::WorkflowEngine;
use crate::domain::action::{FunctionCallAction, ObjectAction};
use crate::EngineError;

/// Executes function-call actions against an engine
pub struct ExpressionEvaluator<'a> {
    engine: &'a WorkflowEngine,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Evaluator bound to `engine`
    pub fn new(engine: &'a WorkflowEngine) -> Self {
        Self { engine }
    }

    /// Substitute templates from `data`, parse, then dispatch
    pub async fn execute(&self, action: &FunctionCallAction, data: &Value) -> Result<Option<Value>, EngineError> {
        let source = resolve_templates(&action.expression, data);
        debug!("Resolved function call: {}", source);

        let call = parse_call(&source)?;
        let args = call.evaluate_arguments()?;
        debug!("Calling {} with {} args", call.callee, args.len());

        self.execute_method(&call.callee, args, data).await
    }

    async fn execute_method(&self, method: &str, args: Vec<Value>, data: &Value) -> Result<Option<Value>, EngineError> {
        match method {
            names::SET_VAL => {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| EngineError::ValidationError("setVal requires a name".to_string()))?;
                let value = args.get(1).cloned().unwrap_or(Value::Null);
                self.engine.store().await?.set_val(name, value).await?;
                Ok(None)
            }
            names::CLEAR_VALS => {
                let to_clear = flatten_names(&args);
                self.engine.store().await?.clear_vals(&to_clear).await?;
                Ok(None)
            }
            names::STUDIO_API_CALL => {
                let mut args = args.into_iter();
                let endpoint = args.next().unwrap_or(Value::Null);
                let params = match args.next() {
                    Some(params) if params.is_array() => self.engine.resolve_params(&params).await?,
                    Some(params) => params,
                    None => Value::Object(Map::new()),
                };

                let mut fields = Map::new();
                fields.insert("action".to_string(), Value::String(names::STUDIO_API_CALL.to_string()));
                fields.insert("endpoint".to_string(), endpoint);
                fields.insert("params".to_string(), params);
                let action = ObjectAction {
                    method: names::STUDIO_API_CALL.to_string(),
                    fields,
                };

                let handler = self.engine.handler(names::STUDIO_API_CALL).ok_or_else(|| unknown(method))?;
                handler
                    .handle(self.engine, HandlerCall::Object { action, data: data.clone() })
                    .await
            }
            other => {
                let handler = self.engine.handler(other).ok_or_else(|| unknown(other))?;
                handler
                    .handle(self.engine, HandlerCall::Positional { args, data: data.clone() })
                    .await
            }
        }
    }
}

fn unknown(method: &str) -> EngineError {
    EngineError::ExpressionError(format!("Unknown method: {}", method))
}
