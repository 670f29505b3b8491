//! Parameter resolution
//!
//! Converts declarative parameter requests into the flat `{ storageKey: value }`
//! object the backend query layer expects.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::context_store::ContextStore;
use crate::EngineError;

const GET_VAL_PREFIX: &str = "getVal('";
const GET_VAL_SUFFIX: &str = "')";
const TEMPLATE_PREFIX: &str = "{{getVal.";
const TEMPLATE_SUFFIX: &str = "}}";

/// Name requested by an exact `getVal('<name>')` string
pub fn get_val_request(param: &str) -> Option<&str> {
    param
        .strip_prefix(GET_VAL_PREFIX)
        .and_then(|rest| rest.strip_suffix(GET_VAL_SUFFIX))
}

/// Name requested by an exact `{{getVal.<name>}}` string
pub fn get_val_template(param: &str) -> Option<&str> {
    param
        .strip_prefix(TEMPLATE_PREFIX)
        .and_then(|rest| rest.strip_suffix(TEMPLATE_SUFFIX))
}

/// Resolve `params` against the context store
///
/// * array: every `getVal('<name>')` element contributes its tuple; misses and
///   other elements contribute nothing; later duplicates overwrite earlier ones
/// * object: `{{getVal.<name>}}` values are replaced by the tuple, keyed by the
///   tuple's storage key; unresolved templates are dropped; everything else is
///   kept under its own key
/// * anything else is returned unchanged
pub async fn resolve_params(store: &dyn ContextStore, params: &Value) -> Result<Value, EngineError> {
    match params {
        Value::Array(requests) => {
            let mut resolved = Map::new();
            for request in requests {
                let Some(name) = request.as_str().and_then(get_val_request) else {
                    debug!("Skipping param that is not a getVal request: {}", request);
                    continue;
                };

                match store.get_val(name).await? {
                    Some((storage_key, value)) => {
                        debug!("getVal('{}') resolved to {} = {}", name, storage_key, value);
                        resolved.insert(storage_key, value);
                    }
                    None => warn!("resolve_params: no value found for {}", name),
                }
            }
            Ok(Value::Object(resolved))
        }
        Value::Object(entries) => {
            let mut resolved = Map::new();
            for (key, value) in entries {
                match value.as_str().and_then(get_val_template) {
                    Some(name) => match store.get_val(name).await? {
                        Some((storage_key, stored)) => {
                            resolved.insert(storage_key, stored);
                        }
                        None => warn!("resolve_params: no value found for {}", name),
                    },
                    None => {
                        resolved.insert(key.clone(), value.clone());
                    }
                }
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}
