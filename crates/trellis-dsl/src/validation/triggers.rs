use trellis_core::{Action, TriggerBinding};

use crate::document::EventTypeDocument;
use crate::validation::{action_path, error_codes, walk, ValidationError, Validator};

/// Trigger bindings must be action lists made of recognizable actions
pub struct TriggerValidator;

impl Validator for TriggerValidator {
    fn validate(&self, document: &EventTypeDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        walk(document, &mut |event_type, path| {
            for (trigger, binding) in &event_type.workflow_triggers {
                match binding {
                    TriggerBinding::Invalid(value) => errors.push(ValidationError::at(
                        error_codes::INVALID_TRIGGER,
                        format!("Trigger '{}' must be a list of actions, got {}", trigger, value),
                        format!("{}.workflowTriggers.{}", path, trigger),
                    )),
                    TriggerBinding::Actions(actions) => {
                        for (index, action) in actions.iter().enumerate() {
                            if let Action::Unrecognized(value) = action {
                                errors.push(ValidationError::at(
                                    error_codes::INVALID_ACTION,
                                    format!("Unrecognized action {}", value),
                                    action_path(path, trigger, index),
                                ));
                            }
                        }
                    }
                }
            }
        });

        errors
    }
}
