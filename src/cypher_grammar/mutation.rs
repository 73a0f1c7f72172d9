use std::collections::HashSet;

use super::{
    common::{quote_identifier, render_labels},
    errors::GrammarError,
    literal::{format_literal, format_map},
    to_cypher::{compile_reading, connect, render_column},
    CypherGrammar, Grammar,
};
use crate::{
    connection::Row,
    graph_entity::GraphEntity,
    query_builder::{strip_path, BindingName, Builder, CreateWith, Direction},
};

/// `{key: $name, ...}` pairing each property with its parameter name.
fn parameter_map(row: &Row, names: &[BindingName]) -> String {
    let entries: Vec<String> = row
        .keys()
        .zip(names)
        .map(|(key, name)| format!("{}: ${}", quote_identifier(strip_path(key)), name))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn node_with_properties(alias: &str, labels: &str, properties: &str) -> String {
    if properties == "{}" {
        format!("({}{})", alias, labels)
    } else {
        format!("({}{} {})", alias, labels, properties)
    }
}

fn target_labels(builder: &Builder) -> String {
    builder
        .from_label()
        .map(|label| render_labels(&[label.to_string()]))
        .unwrap_or_default()
}

/// `CREATE (person:Person {age: $age}), (person_2:Person {age: $age_2}) RETURN person, person_2`
pub(super) fn compile_insert(builder: &Builder, rows: &[Row]) -> Result<String, GrammarError> {
    if rows.is_empty() {
        return Err(GrammarError::EmptyInsert);
    }

    let alias = builder.model_as_node(None);
    let labels = target_labels(builder);
    let mut nodes = Vec::with_capacity(rows.len());
    let mut aliases = Vec::with_capacity(rows.len());

    let names = builder.row_binding_names(rows);
    for (index, (row, names)) in rows.iter().zip(&names).enumerate() {
        let node = BindingName::new(alias.as_str(), index + 1).to_string();
        nodes.push(node_with_properties(&node, &labels, &parameter_map(row, names)));
        aliases.push(node);
    }

    Ok(format!("CREATE {} RETURN {}", nodes.join(", "), aliases.join(", ")))
}

pub(super) fn compile_insert_get_id(
    grammar: &CypherGrammar,
    builder: &Builder,
    values: &Row,
    sequence: Option<&str>,
) -> Result<String, GrammarError> {
    let alias = builder.model_as_node(None);
    let names = builder.row_binding_names(std::slice::from_ref(values));
    let properties = parameter_map(values, names.first().map(Vec::as_slice).unwrap_or_default());
    let node = node_with_properties(&alias, &target_labels(builder), &properties);

    let returning = match sequence {
        Some(sequence) => format!(
            "{}.{} AS {}",
            alias,
            quote_identifier(sequence),
            quote_identifier(sequence)
        ),
        None => format!(
            "{} AS {}",
            grammar.identity_accessor(&alias),
            quote_identifier(&grammar.config().identity_column)
        ),
    };

    Ok(format!("CREATE {} RETURN {}", node, returning))
}

/// `MATCH ... WHERE ... SET person.name = $name_update RETURN count(person) AS updated`
pub(super) fn compile_update(grammar: &CypherGrammar, builder: &Builder, values: &Row) -> Result<String, GrammarError> {
    if values.is_empty() {
        return Err(GrammarError::EmptyUpdate);
    }

    let alias = builder.model_as_node(None);
    let assignments: Vec<String> = values
        .keys()
        .zip(builder.update_binding_names(values))
        .map(|(key, name)| format!("{} = ${}", render_column(grammar, &alias, key), name))
        .collect();

    Ok(format!(
        "{} SET {} RETURN count({}) AS updated",
        compile_reading(grammar, builder),
        assignments.join(", "),
        alias
    ))
}

/// Pick `base`, `base_2`, ... whichever is not taken yet, and take it.
fn unique_alias(base: &str, taken: &mut HashSet<String>) -> String {
    let mut occurrence = 1;
    loop {
        let candidate = BindingName::new(base, occurrence).to_string();
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        occurrence += 1;
    }
}

/// One `CREATE` for the model node and every related node, values inlined.
///
/// CREATE needs a directed relationship, so `in-out` is written outgoing.
pub(super) fn compile_create_with(
    grammar: &CypherGrammar,
    builder: &Builder,
    payload: &CreateWith,
) -> Result<String, GrammarError> {
    let alias = builder.model_as_node(None);
    let mut taken = HashSet::from([alias.clone()]);
    let mut patterns = vec![node_with_properties(
        &alias,
        &target_labels(builder),
        &format_map(&payload.model)?,
    )];
    let mut returned = vec![alias.clone()];

    for related in &payload.related {
        let base = grammar.model_as_node(&related.labels);
        let labels = render_labels(&related.labels);
        let relationship = format!(":{}", quote_identifier(&related.relationship));
        let direction = match related.direction {
            Direction::In => Direction::In,
            Direction::Out | Direction::InOut => Direction::Out,
        };

        for record in &related.records {
            let node = unique_alias(&base, &mut taken);
            let target = node_with_properties(&node, &labels, &format_map(record)?);
            patterns.push(connect(&format!("({})", alias), &relationship, &target, direction));
            returned.push(node);
        }
    }

    Ok(format!("CREATE {} RETURN {}", patterns.join(", "), returned.join(", ")))
}

fn entity_alias(builder: &Builder, entity: &dyn GraphEntity) -> String {
    entity
        .node_alias()
        .unwrap_or_else(|| builder.model_as_node(Some(entity.labels().as_slice())))
}

fn entity_key(entity: &dyn GraphEntity) -> Result<String, GrammarError> {
    match entity.key() {
        Some(key) if !key.is_null() => format_literal(&key),
        _ => Err(GrammarError::MissingEntityKey(entity.labels())),
    }
}

/// `MATCH (a:A), (b:B) WHERE id(a) = 1 AND id(b) = 2 CREATE (a)-[rel:R {..}]->(b) RETURN rel`
pub(super) fn compile_edge(
    grammar: &CypherGrammar,
    builder: &Builder,
    parent: &dyn GraphEntity,
    related: &dyn GraphEntity,
    relationship: &str,
    properties: &Row,
) -> Result<String, GrammarError> {
    let parent_key = entity_key(parent)?;
    let related_key = entity_key(related)?;

    let mut taken = HashSet::new();
    let parent_alias = unique_alias(&entity_alias(builder, parent), &mut taken);
    let related_alias = unique_alias(&entity_alias(builder, related), &mut taken);
    let edge_alias = unique_alias("rel", &mut taken);

    let names = builder.row_binding_names(std::slice::from_ref(properties));
    let edge = if properties.is_empty() {
        format!("{}:{}", edge_alias, quote_identifier(relationship))
    } else {
        format!(
            "{}:{} {}",
            edge_alias,
            quote_identifier(relationship),
            parameter_map(properties, names.first().map(Vec::as_slice).unwrap_or_default())
        )
    };

    Ok(format!(
        "MATCH ({}{}), ({}{}) WHERE {} = {} AND {} = {} CREATE {} RETURN {}",
        parent_alias,
        render_labels(&parent.labels()),
        related_alias,
        render_labels(&related.labels()),
        grammar.identity_accessor(&parent_alias),
        parent_key,
        grammar.identity_accessor(&related_alias),
        related_key,
        connect(
            &format!("({})", parent_alias),
            &edge,
            &format!("({})", related_alias),
            Direction::Out
        ),
        edge_alias
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_alias() {
        let mut taken = HashSet::from(["person".to_string()]);
        assert_eq!(unique_alias("tag", &mut taken), "tag");
        assert_eq!(unique_alias("tag", &mut taken), "tag_2");
        assert_eq!(unique_alias("person", &mut taken), "person_2");
    }

    #[test]
    fn test_node_with_properties() {
        assert_eq!(node_with_properties("p", ":Person", "{}"), "(p:Person)");
        assert_eq!(
            node_with_properties("p", ":Person", "{age: $age}"),
            "(p:Person {age: $age})"
        );
    }
}
