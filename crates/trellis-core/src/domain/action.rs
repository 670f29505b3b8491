//! Action model
//!
//! Actions arrive from EventType definitions as loosely shaped JSON. They are
//! classified once, when they are deserialized, into a closed set of variants
//! so dispatch never has to sniff shapes again.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// An action of the form `{ action: "methodName(arg, ...)" }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallAction {
    /// The call expression, possibly containing `{{this.*}}` templates
    pub expression: String,

    /// Any other fields that were present on the action object
    pub extra: Map<String, Value>,
}

/// An action of the form `{ action: methodName, params?, ...fields }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAction {
    /// Handler name
    pub method: String,

    /// The complete action object, `action` field included
    pub fields: Map<String, Value>,
}

impl ObjectAction {
    /// The raw `params` field, if any
    pub fn params(&self) -> Option<&Value> {
        self.fields.get("params")
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a string field by name
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Return a copy with `params` replaced
    pub fn with_params(&self, params: Value) -> Self {
        let mut fields = self.fields.clone();
        fields.insert("params".to_string(), params);
        Self {
            method: self.method.clone(),
            fields,
        }
    }

    /// The action as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// One step of a trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A bare handler name, e.g. `"execEvent"`
    Method(String),

    /// A textual call expression
    FunctionCall(FunctionCallAction),

    /// A structured action naming a handler
    Object(ObjectAction),

    /// Anything else; dispatching it is a no-op with a warning
    Unrecognized(Value),
}

impl Action {
    /// Classify a JSON value into an action
    pub fn from_value(value: Value) -> Self {
        let function_call = is_function_call(&value);
        match value {
            Value::String(method) => Action::Method(method),
            Value::Object(mut fields) if function_call => {
                let expression = fields
                    .remove("action")
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Action::FunctionCall(FunctionCallAction { expression, extra: fields })
            }
            Value::Object(fields) => match fields.get("action") {
                Some(Value::String(name)) => Action::Object(ObjectAction {
                    method: name.clone(),
                    fields,
                }),
                _ => Action::Unrecognized(Value::Object(fields)),
            },
            other => Action::Unrecognized(other),
        }
    }

    /// Convert back to the JSON shape it was read from
    pub fn to_value(&self) -> Value {
        match self {
            Action::Method(name) => Value::String(name.clone()),
            Action::FunctionCall(call) => {
                let mut fields = call.extra.clone();
                fields.insert("action".to_string(), Value::String(call.expression.clone()));
                Value::Object(fields)
            }
            Action::Object(object) => object.to_value(),
            Action::Unrecognized(value) => value.clone(),
        }
    }

    /// The handler name or expression this action refers to
    pub fn label(&self) -> String {
        match self {
            Action::Method(name) => name.clone(),
            Action::FunctionCall(call) => call.expression.clone(),
            Action::Object(object) => object.method.clone(),
            Action::Unrecognized(value) => value.to_string(),
        }
    }
}

/// True iff `action` is an object whose string `action` field contains `(`
pub fn is_function_call(action: &Value) -> bool {
    action
        .get("action")
        .and_then(Value::as_str)
        .is_some_and(|name| name.contains('('))
}

impl From<Value> for Action {
    fn from(value: Value) -> Self {
        Action::from_value(value)
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::Method(name.to_string())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Action::from_value)
    }
}
