//! Common utilities for Cypher rendering

use std::sync::LazyLock;

use regex::Regex;

/// Plain identifiers that never need quoting
static PLAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// `fn(alias)` accessor, e.g. `id(user)`
/// Captures: (1) function, (2) alias
static ACCESSOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*$").unwrap()
});

/// Quote a Cypher identifier (property, label, relationship type) with
/// backticks unless it is a plain identifier.
///
/// # Examples
/// ```
/// use cypher_builder::cypher_grammar::common::quote_identifier;
/// assert_eq!(quote_identifier("user_id"), "user_id");
/// assert_eq!(quote_identifier("first name"), "`first name`");
/// assert_eq!(quote_identifier("odd`name"), "`odd``name`");
/// ```
pub fn quote_identifier(name: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Render a label set as `:A:B`.
pub fn render_labels(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| format!(":{}", quote_identifier(label)))
        .collect()
}

/// Split an accessor like `id(user)` into `("id", "user")`.
pub fn parse_accessor(expression: &str) -> Option<(&str, &str)> {
    let captures = ACCESSOR.captures(expression)?;
    let function = captures.get(1)?.as_str();
    let alias = captures.get(2)?.as_str();
    Some((function, alias))
}

/// Reduce arbitrary text to a parameter-safe name.
pub fn sanitize_parameter(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '`')
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Derive a node alias from the first label: lowercase, identifier-safe.
pub fn alias_from_label(label: &str) -> String {
    let alias: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    match alias.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("n{}", alias),
        _ => alias,
    }
}
