//! Call expressions embedded in action strings
//!
//! `{ action: "setVal('appID', {{this.selected.value}})" }` is executed in three
//! steps: template substitution, parsing, then dispatch of the evaluated
//! arguments.

/// `{{this.*}}` substitution
pub mod template;

/// Grammar and parse tree
pub mod parser;

/// Evaluation and dispatch
pub mod evaluator;

pub use evaluator::ExpressionEvaluator;
pub use parser::{parse_call, CallExpr, Node};
pub use template::{blank_templates, resolve_templates};
