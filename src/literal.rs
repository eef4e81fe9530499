//! Literal-expression parsing for configuration overrides and hyperparameter strings.
//!
//! Accepts the literal forms operators type by hand: numbers, quoted strings,
//! `True`/`False`, `None`, lists and `{'key': value}` dictionaries. Parsing goes
//! through the YAML flow grammar, which covers these forms, and the result is
//! normalized into a JSON value.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiteralError {
    #[error("malformed literal '{input}': {reason}")]
    Malformed { input: String, reason: String },
    #[error("expected a dictionary literal, got '{0}'")]
    NotAMapping(String),
}

/// Parses a literal expression into a JSON value.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LiteralError::Malformed {
            input: input.to_string(),
            reason: "empty expression".to_string(),
        });
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(trimmed).map_err(|e| LiteralError::Malformed {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

    let json = serde_json::to_value(&yaml).map_err(|e| LiteralError::Malformed {
        input: input.to_string(),
        reason: e.to_string(),
    })?;

    Ok(normalize(json))
}

/// Parses a literal that must evaluate to a dictionary.
pub fn parse_mapping(input: &str) -> Result<serde_json::Map<String, Value>, LiteralError> {
    match parse_literal(input)? {
        Value::Object(map) => Ok(map),
        _ => Err(LiteralError::NotAMapping(input.to_string())),
    }
}

/// Parses an override value, keeping unparseable text as a plain string.
pub fn parse_override(input: &str) -> Value {
    parse_literal(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) if s == "None" => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}
