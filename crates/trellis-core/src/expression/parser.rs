//! Call expression parser
//!
//! Turns `methodName(arg, ...)` into a [`CallExpr`]. Only literals, arrays,
//! objects and bare identifiers are accepted as arguments; there are no
//! operators and no member access, so nothing here can execute arbitrary code.

use pest::iterators::Pair;
use pest::Parser;
use serde_json::{Map, Number, Value};

use self::grammar::{CallExpressionParser, Rule};
use crate::EngineError;

mod grammar {
    #![allow(missing_docs)]

    use pest_derive::Parser;

    #[derive(Parser)]
    #[grammar = "expression/grammar.pest"]
    pub(super) struct CallExpressionParser;
}

/// Identifier that evaluates to `null`
pub const UNDEFINED_IDENTIFIER: &str = "undefined";

/// Parse tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// String literal, escapes already processed
    String(String),
    /// Numeric literal
    Number(Number),
    /// `true` or `false`
    Boolean(bool),
    /// `[ ... ]`
    Array(Vec<Node>),
    /// `{ key: value, ... }` in source order
    Object(Vec<(String, Node)>),
    /// Bare identifier
    Identifier(String),
    /// A call nested inside an argument list
    Call(CallExpr),
}

/// A parsed `callee(arguments...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// Method name
    pub callee: String,
    /// Argument nodes
    pub arguments: Vec<Node>,
}

impl Node {
    /// Evaluate to a JSON value
    ///
    /// Identifiers evaluate to their own name, except `undefined` which is
    /// `null`. Nested calls are rejected.
    pub fn evaluate(&self) -> Result<Value, EngineError> {
        match self {
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::Number(n) => Ok(Value::Number(n.clone())),
            Node::Boolean(b) => Ok(Value::Bool(*b)),
            Node::Array(items) => items
                .iter()
                .map(Node::evaluate)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Node::Object(entries) => {
                let mut map = Map::new();
                for (key, node) in entries {
                    map.insert(key.clone(), node.evaluate()?);
                }
                Ok(Value::Object(map))
            }
            Node::Identifier(name) if name == UNDEFINED_IDENTIFIER => Ok(Value::Null),
            Node::Identifier(name) => Ok(Value::String(name.clone())),
            Node::Call(call) => Err(EngineError::ExpressionError(format!(
                "Nested call '{}(...)' is not supported as an argument",
                call.callee
            ))),
        }
    }
}

impl CallExpr {
    /// Evaluate every argument in order
    pub fn evaluate_arguments(&self) -> Result<Vec<Value>, EngineError> {
        self.arguments.iter().map(Node::evaluate).collect()
    }
}

/// Parse a complete call expression, optionally terminated by `;`
pub fn parse_call(source: &str) -> Result<CallExpr, EngineError> {
    let mut pairs = CallExpressionParser::parse(Rule::statement, source).map_err(|e| {
        EngineError::ExpressionError(format!("Failed to parse call expression \"{}\": {}", source, e))
    })?;

    let statement = pairs
        .next()
        .ok_or_else(|| EngineError::ExpressionError(format!("Empty call expression: {}", source)))?;

    let call = statement
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::call)
        .ok_or_else(|| {
            EngineError::ExpressionError(format!("Expected a function call, got: {}", source))
        })?;

    build_call(call)
}

fn build_call(pair: Pair<Rule>) -> Result<CallExpr, EngineError> {
    let mut inner = pair.into_inner();
    let callee = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| EngineError::ExpressionError("Call without a method name".to_string()))?;
    let arguments = inner.map(build_node).collect::<Result<Vec<_>, _>>()?;
    Ok(CallExpr { callee, arguments })
}

fn build_node(pair: Pair<Rule>) -> Result<Node, EngineError> {
    match pair.as_rule() {
        Rule::string => unquote(pair.as_str()).map(Node::String),
        Rule::number => parse_number(pair.as_str()).map(Node::Number),
        Rule::boolean => Ok(Node::Boolean(pair.as_str() == "true")),
        Rule::null => Err(EngineError::ExpressionError(format!(
            "Unsupported node type: null literal in {}",
            pair.as_str()
        ))),
        Rule::identifier => Ok(Node::Identifier(pair.as_str().to_string())),
        Rule::array => pair
            .into_inner()
            .map(build_node)
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Array),
        Rule::object => pair
            .into_inner()
            .map(build_entry)
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Object),
        Rule::call => build_call(pair).map(Node::Call),
        other => Err(EngineError::ExpressionError(format!(
            "Unexpected token {:?}: {}",
            other,
            pair.as_str()
        ))),
    }
}

fn build_entry(pair: Pair<Rule>) -> Result<(String, Node), EngineError> {
    let text = pair.as_str().to_string();
    let mut inner = pair.into_inner();
    let (key, value) = match (inner.next(), inner.next()) {
        (Some(key), Some(value)) => (key, value),
        _ => {
            return Err(EngineError::ExpressionError(format!(
                "Malformed object entry: {}",
                text
            )))
        }
    };

    let key = match key.as_rule() {
        Rule::string => unquote(key.as_str())?,
        _ => key.as_str().to_string(),
    };
    Ok((key, build_node(value)?))
}

fn parse_number(text: &str) -> Result<Number, EngineError> {
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Number::from(int));
    }
    if let Ok(unsigned) = text.parse::<u64>() {
        return Ok(Number::from(unsigned));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| EngineError::ExpressionError(format!("Invalid number literal: {}", text)))
}

/// Strip the surrounding quotes and process escape sequences
fn unquote(literal: &str) -> Result<String, EngineError> {
    let body = literal
        .get(1..literal.len().saturating_sub(1))
        .ok_or_else(|| EngineError::ExpressionError(format!("Invalid string literal: {}", literal)))?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        EngineError::ExpressionError(format!("Invalid unicode escape \\u{}", hex))
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {
                return Err(EngineError::ExpressionError(format!(
                    "Dangling escape in string literal: {}",
                    literal
                )))
            }
        }
    }
    Ok(out)
}
