use tracing::debug;

use crate::document::{EventTypeDocument, SUPPORTED_DSL_VERSION};
use crate::error::DslError;

/// Parse a YAML string into an [`EventTypeDocument`].
///
/// Only the structure and the version are checked here; references and
/// expressions are checked by the validation module.
pub fn parse_dsl_document(yaml_str: &str) -> Result<EventTypeDocument, DslError> {
    let document: EventTypeDocument = serde_yaml::from_str(yaml_str)?;
    check_version(document)
}

/// Parse a JSON string into an [`EventTypeDocument`]
pub fn parse_json_document(json_str: &str) -> Result<EventTypeDocument, DslError> {
    let document: EventTypeDocument = serde_json::from_str(json_str)?;
    check_version(document)
}

fn check_version(document: EventTypeDocument) -> Result<EventTypeDocument, DslError> {
    if document.dsl_version != SUPPORTED_DSL_VERSION {
        return Err(DslError::UnsupportedVersion(document.dsl_version));
    }
    debug!("Parsed document with {} event types", document.event_types.len());
    Ok(document)
}
