use trellis_core::expression::{blank_templates, parse_call};
use trellis_core::{Action, EngineError};

use crate::document::EventTypeDocument;
use crate::validation::{action_path, error_codes, walk, ValidationError, Validator};

/// Call expressions must parse once placeholders are blanked out
pub struct ExpressionValidator;

fn check(expression: &str) -> Result<(), EngineError> {
    parse_call(&blank_templates(expression))?.evaluate_arguments()?;
    Ok(())
}

impl Validator for ExpressionValidator {
    fn validate(&self, document: &EventTypeDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        walk(document, &mut |event_type, path| {
            for trigger in event_type.workflow_triggers.keys() {
                let Some(actions) = event_type.trigger_actions(trigger) else {
                    continue;
                };
                for (index, action) in actions.iter().enumerate() {
                    if let Action::FunctionCall(call) = action {
                        if let Err(err) = check(&call.expression) {
                            errors.push(ValidationError::at(
                                error_codes::INVALID_EXPRESSION,
                                format!("'{}': {}", call.expression, err),
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

    #[test]
    fn test_templates_do_not_break_parsing() {
        assert!(check("setVal('appID', {{this.selected.value}})").is_ok());
        assert!(check("studioApiCall('save', ['getVal(\\'appID\\')'])").is_ok());
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(check("setVal('a', 1").is_err());
        assert!(check("setVal(getVal('a'))").is_err());
    }
}
