//! # Trellis DSL
//!
//! EventType documents declare the UI units of an application and the actions
//! each of their triggers runs. This crate parses those documents from YAML or
//! JSON and validates them before they are registered with an engine.
//!
//! ## Checks
//!
//! * Every top-level EventType has an identity (`eventType` or `name`)
//! * Identities are unique
//! * Trigger bindings are action lists
//! * Call expressions parse
//! * Refresh targets name a known EventType or component id
//!
//! ## Example
//!
//! ```
//! use trellis_dsl::parse_and_validate_document;
//!
//! let yaml = r#"
//! dsl_version: "1.0"
//! event_types:
//!   - eventType: selectApp
//!     workflowTriggers:
//!       onSelectionChange:
//!         - action: "setVal('appID', {{this.selected.value}})"
//!         - action: "refresh(['pageList'])"
//!   - eventType: pageList
//!     qry: pageList
//!     workflowTriggers:
//!       onRefresh:
//!         - execEvent
//! "#;
//!
//! let document = parse_and_validate_document(yaml).unwrap();
//! assert_eq!(document.keys(), vec!["selectApp", "pageList"]);
//! ```

mod document;
mod error;
mod parser;

pub mod validation;

pub use document::{EventTypeDocument, SUPPORTED_DSL_VERSION};
pub use error::DslError;
pub use parser::{parse_dsl_document, parse_json_document};
pub use validation::{validate_document, ValidationError};

/// Parse and validate a YAML EventType document.
///
/// # Errors
///
/// Returns [`DslError::YamlError`] for malformed YAML,
/// [`DslError::UnsupportedVersion`] for any version other than
/// [`SUPPORTED_DSL_VERSION`], and a validation error (or several) when the
/// document does not pass validation.
pub fn parse_and_validate_document(yaml_str: &str) -> Result<EventTypeDocument, DslError> {
    let document = parse_dsl_document(yaml_str)?;
    validate_document(&document)?;
    Ok(document)
}

/// Parse and validate a JSON EventType document
pub fn parse_and_validate_json_document(json_str: &str) -> Result<EventTypeDocument, DslError> {
    let document = parse_json_document(json_str)?;
    validate_document(&document)?;
    Ok(document)
}
