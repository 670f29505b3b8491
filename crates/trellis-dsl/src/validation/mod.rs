use std::error::Error;
use std::fmt;

use trellis_core::EventType;

use crate::document::EventTypeDocument;
use crate::error::DslError;

mod expressions;
mod identity;
mod references;
mod triggers;

pub use expressions::ExpressionValidator;
pub use identity::IdentityValidator;
pub use references::RefreshTargetValidator;
pub use triggers::TriggerValidator;

/// A problem found in a document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code (one of [`error_codes`])
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Location of the problem, e.g. `event_types[0].workflowTriggers.onLoad[2]`
    pub path: Option<String>,
}

impl ValidationError {
    pub(crate) fn at(code: &'static str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl Error for ValidationError {}

/// Validation error codes
pub mod error_codes {
    /// A refresh target names no EventType or component
    pub const INVALID_REFERENCE: &str = "ERR_DSL_VALIDATION_INVALID_REFERENCE";

    /// Two EventTypes share a key
    pub const DUPLICATE_ID: &str = "ERR_DSL_VALIDATION_DUPLICATE_ID";

    /// An EventType has neither `eventType` nor `name`
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_DSL_VALIDATION_MISSING_REQUIRED_FIELD";

    /// A trigger is bound to something other than a list
    pub const INVALID_TRIGGER: &str = "ERR_DSL_VALIDATION_INVALID_TRIGGER";

    /// An action is neither a string nor an object with a string `action`
    pub const INVALID_ACTION: &str = "ERR_DSL_VALIDATION_INVALID_ACTION";

    /// A call expression does not parse
    pub const INVALID_EXPRESSION: &str = "ERR_DSL_VALIDATION_INVALID_EXPRESSION";
}

/// A check over one aspect of a document
pub trait Validator {
    /// Validate the document and return every problem found
    fn validate(&self, document: &EventTypeDocument) -> Vec<ValidationError>;
}

/// Run every validator and collect their errors
pub fn validate_document(document: &EventTypeDocument) -> Result<(), DslError> {
    let validators: Vec<Box<dyn Validator>> = vec![
        Box::new(IdentityValidator),
        Box::new(TriggerValidator),
        Box::new(ExpressionValidator),
        Box::new(RefreshTargetValidator),
    ];

    let errors: Vec<ValidationError> = validators
        .iter()
        .flat_map(|validator| validator.validate(document))
        .collect();

    if !errors.is_empty() {
        return Err(DslError::from_validation_errors(errors));
    }
    Ok(())
}

/// Visit every EventType and nested component with its document path
pub(crate) fn walk<'a, F>(document: &'a EventTypeDocument, visit: &mut F)
where
    F: FnMut(&'a EventType, &str),
{
    for (index, event_type) in document.event_types.iter().enumerate() {
        walk_tree(event_type, &format!("event_types[{}]", index), visit);
    }
}

fn walk_tree<'a, F>(event_type: &'a EventType, path: &str, visit: &mut F)
where
    F: FnMut(&'a EventType, &str),
{
    visit(event_type, path);
    for (index, child) in event_type.components.iter().enumerate() {
        walk_tree(child, &format!("{}.components[{}]", path, index), visit);
    }
}

/// Path of one action inside a trigger
pub(crate) fn action_path(owner: &str, trigger: &str, index: usize) -> String {
    format!("{}.workflowTriggers.{}[{}]", owner, trigger, index)
}
