use std::collections::HashSet;

use serde_json::Value;
use trellis_core::expression::{blank_templates, parse_call};
use trellis_core::Action;

use crate::document::EventTypeDocument;
use crate::validation::{action_path, error_codes, walk, ValidationError, Validator};

const REFRESH: &str = "refresh";

/// Refresh targets must name an EventType key or a component id
///
/// Targets that are not literal strings (placeholders, for instance) cannot be
/// checked before runtime and are ignored.
pub struct RefreshTargetValidator;

fn literal_targets(value: &Value) -> Vec<&str> {
    match value {
        Value::String(id) => vec![id.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn refresh_targets(action: &Action) -> Vec<String> {
    match action {
        Action::Object(object) if object.method == REFRESH => object
            .field("targets")
            .or_else(|| object.field("target"))
            .map(|value| literal_targets(value).into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        Action::FunctionCall(call) => parse_call(&blank_templates(&call.expression))
            .ok()
            .filter(|parsed| parsed.callee == REFRESH)
            .and_then(|parsed| parsed.evaluate_arguments().ok())
            .and_then(|args| args.into_iter().next())
            .map(|first| literal_targets(&first).into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

impl Validator for RefreshTargetValidator {
    fn validate(&self, document: &EventTypeDocument) -> Vec<ValidationError> {
        let mut known: HashSet<&str> = document.keys().into_iter().collect();
        walk(document, &mut |event_type, _| {
            if let Some(id) = event_type.id.as_deref() {
                known.insert(id);
            }
        });

        let mut errors = Vec::new();
        walk(document, &mut |event_type, path| {
            for trigger in event_type.workflow_triggers.keys() {
                let Some(actions) = event_type.trigger_actions(trigger) else {
                    continue;
                };
                for (index, action) in actions.iter().enumerate() {
                    for target in refresh_targets(action) {
                        if !known.contains(target.as_str()) {
                            errors.push(ValidationError::at(
                                error_codes::INVALID_REFERENCE,
                                format!("Refresh target '{}' is not an EventType or component id", target),
                                action_path(path, trigger, index),
                            ));
                        }
                    }
                }
            }
        });

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_targets_from_both_action_shapes() {
        let object = Action::from_value(json!({"action": "refresh", "targets": ["a", "b"]}));
        let single = Action::from_value(json!({"action": "refresh", "target": "c"}));
        let call = Action::from_value(json!({"action": "refresh(['d', {{this.x}}])"}));
        let other = Action::from_value(json!({"action": "setVal('refresh', 1)"}));

        assert_eq!(refresh_targets(&object), vec!["a", "b"]);
        assert_eq!(refresh_targets(&single), vec!["c"]);
        assert_eq!(refresh_targets(&call), vec!["d"]);
        assert!(refresh_targets(&other).is_empty());
    }
}
