//! Cypher literal rendering and parameter interpolation
//!
//! `create_with` statements carry their values inline, and debug logging
//! shows queries with `$name` placeholders replaced. Both need values turned
//! into safely escaped Cypher literals.

use serde_json::{Map, Value};

use super::{common::quote_identifier, errors::GrammarError};

/// Escape a string for a single-quoted Cypher literal
///
/// - Backslash escapes special characters
/// - Single quotes must be escaped as \'
/// - Backslashes must be escaped as \\
/// - Newlines, tabs, etc. must be escaped
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\") // Must be first!
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Format a value as a Cypher literal
pub fn format_literal(value: &Value) -> Result<String, GrammarError> {
    match value {
        Value::String(s) => Ok(format!("'{}'", escape_string(s))),

        Value::Number(n) => {
            if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                if !f.is_finite() {
                    return Err(GrammarError::UnsupportedLiteral(format!(
                        "Non-finite float: {}",
                        f
                    )));
                }
            }
            Ok(n.to_string())
        }

        Value::Bool(b) => Ok(b.to_string()),

        Value::Array(items) => {
            let items: Result<Vec<String>, _> = items.iter().map(format_literal).collect();
            Ok(format!("[{}]", items?.join(", ")))
        }

        Value::Object(map) => format_map(map),

        Value::Null => Ok("null".to_string()),
    }
}

/// Format a map as a Cypher map literal `{key: value, ..}`
pub fn format_map(map: &Map<String, Value>) -> Result<String, GrammarError> {
    let entries: Result<Vec<String>, _> = map
        .iter()
        .map(|(key, value)| Ok(format!("{}: {}", quote_identifier(key), format_literal(value)?)))
        .collect();
    Ok(format!("{{{}}}", entries?.join(", ")))
}

/// Replace every `$name` placeholder with the literal form of its binding.
///
/// # Errors
/// - `MissingParameter` if a placeholder has no binding
/// - `UnsupportedLiteral` if a value cannot be rendered
///
/// # Example
/// ```
/// use cypher_builder::cypher_grammar::interpolate;
/// use serde_json::json;
///
/// let bindings = json!({"name": "O'Brien", "age": 30}).as_object().cloned().unwrap();
/// let cypher = "MATCH (p:Person) WHERE p.name = $name AND p.age > $age RETURN p";
/// assert_eq!(
///     interpolate(cypher, &bindings).unwrap(),
///     "MATCH (p:Person) WHERE p.name = 'O\\'Brien' AND p.age > 30 RETURN p"
/// );
/// ```
pub fn interpolate(cypher: &str, bindings: &Map<String, Value>) -> Result<String, GrammarError> {
    let mut result = String::with_capacity(cypher.len() * 2);
    let mut chars = cypher.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            // Just a lone $ character
            result.push('$');
            continue;
        }

        match bindings.get(&name) {
            Some(value) => result.push_str(&format_literal(value)?),
            None => return Err(GrammarError::MissingParameter(name)),
        }
    }

    Ok(result)
}
