use std::collections::HashMap;

use crate::document::EventTypeDocument;
use crate::validation::{error_codes, ValidationError, Validator};

/// Every top-level EventType needs a key, and keys must be unique
pub struct IdentityValidator;

impl Validator for IdentityValidator {
    fn validate(&self, document: &EventTypeDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (index, event_type) in document.event_types.iter().enumerate() {
            let path = format!("event_types[{}]", index);
            match event_type.key() {
                None => errors.push(ValidationError::at(
                    error_codes::MISSING_REQUIRED_FIELD,
                    "EventType has neither 'eventType' nor 'name'",
                    path,
                )),
                Some(key) => {
                    if let Some(first) = seen.insert(key, index) {
                        errors.push(ValidationError::at(
                            error_codes::DUPLICATE_ID,
                            format!("EventType '{}' is already defined at event_types[{}]", key, first),
                            path,
                        ));
                        // Report later duplicates against the first definition
                        seen.insert(key, first);
                    }
                }
            }
        }

        errors
    }
}
