use std::collections::HashSet;

use super::{
    common::{quote_identifier, render_labels},
    errors::GrammarError,
    function_registry::get_aggregate_mapping,
    CypherGrammar, Grammar,
};
use crate::query_builder::{
    AggregateDescriptor, Builder, Clause, ClauseValue, Direction, Match, MatchNode, OrderDirection,
};

/// `MATCH ... [WITH ...] [WHERE ...] RETURN ... [ORDER BY] [SKIP] [LIMIT]`
pub(super) fn compile_select(grammar: &CypherGrammar, builder: &Builder) -> Result<String, GrammarError> {
    let alias = builder.model_as_node(None);
    let mut parts = vec![compile_reading(grammar, builder)];

    let projection = match builder.aggregate_descriptor() {
        Some(aggregate) => compile_aggregate(grammar, &alias, aggregate),
        None => compile_columns(grammar, &alias, builder.columns()),
    };
    parts.push(format!("RETURN {}", projection));

    if !builder.orders().is_empty() {
        let orders: Vec<String> = builder
            .orders()
            .iter()
            .map(|order| {
                let direction = match order.direction {
                    OrderDirection::Asc => "ASC",
                    OrderDirection::Desc => "DESC",
                };
                format!("{} {}", render_column(grammar, &alias, &order.column), direction)
            })
            .collect();
        parts.push(format!("ORDER BY {}", orders.join(", ")));
    }

    if let Some(offset) = builder.offset_value() {
        parts.push(format!("SKIP {}", offset));
    }
    if let Some(limit) = builder.limit_value() {
        parts.push(format!("LIMIT {}", limit));
    }

    Ok(parts.join(" "))
}

/// The reading half shared by selects and updates:
/// `MATCH patterns [WITH carried] [WHERE predicates]`.
///
/// `WITH` sits before `WHERE` so carried predicates can see its aliases.
pub(super) fn compile_reading(grammar: &CypherGrammar, builder: &Builder) -> String {
    let alias = builder.model_as_node(None);
    let mut parts = vec![format!("MATCH {}", compile_patterns(builder, &alias))];

    if !builder.withs().is_empty() {
        let mut carried: Vec<String> = bound_aliases(builder, &alias);
        carried.extend(
            builder
                .withs()
                .iter()
                .map(|(name, expression)| format!("{} AS {}", expression, quote_identifier(name))),
        );
        parts.push(format!("WITH {}", carried.join(", ")));
    }

    let predicates = compile_wheres(grammar, builder, &alias);
    if !predicates.is_empty() {
        parts.push(format!("WHERE {}", predicates));
    }

    parts.join(" ")
}

/// Node pattern for the target label plus one path per match. The target
/// node is only listed on its own when no match already binds its alias.
fn compile_patterns(builder: &Builder, alias: &str) -> String {
    let target = format!(
        "({}{})",
        alias,
        builder
            .from_label()
            .map(|label| render_labels(&[label.to_string()]))
            .unwrap_or_default()
    );

    if builder.matches().is_empty() {
        return target;
    }

    let mut patterns = Vec::new();
    let bound = match_aliases(builder.matches());
    if !bound.contains(alias) {
        patterns.push(target);
    }
    patterns.extend(builder.matches().iter().map(compile_match));
    patterns.join(", ")
}

fn compile_match(pattern: &Match) -> String {
    match pattern {
        Match::Relation {
            direction,
            relationship,
            parent,
            related,
            ..
        } => connect(
            &node_pattern(parent),
            &format!(":{}", quote_identifier(relationship)),
            &node_pattern(related),
            *direction,
        ),
        Match::MorphTo {
            direction,
            related,
            parent,
            ..
        } => connect(&node_pattern(parent), "", &format!("({})", related), *direction),
    }
}

fn node_pattern(node: &MatchNode) -> String {
    format!("({}{})", node.node, render_labels(&node.labels))
}

/// Join two node patterns with a relationship pattern in `direction`.
pub(super) fn connect(left: &str, relationship: &str, right: &str, direction: Direction) -> String {
    let relationship = if relationship.is_empty() {
        String::new()
    } else {
        format!("[{}]", relationship)
    };
    match direction {
        Direction::Out => format!("{}-{}->{}", left, relationship, right),
        Direction::In => format!("{}<-{}-{}", left, relationship, right),
        Direction::InOut => format!("{}-{}-{}", left, relationship, right),
    }
}

fn match_aliases(matches: &[Match]) -> HashSet<&str> {
    let mut aliases = HashSet::new();
    for pattern in matches {
        match pattern {
            Match::Relation { parent, related, .. } => {
                aliases.insert(parent.node.as_str());
                aliases.insert(related.node.as_str());
            }
            Match::MorphTo { parent, related, .. } => {
                aliases.insert(parent.node.as_str());
                aliases.insert(related.as_str());
            }
        }
    }
    aliases
}

/// Every node alias the reading clause binds, in first-seen order.
fn bound_aliases(builder: &Builder, alias: &str) -> Vec<String> {
    let mut seen = vec![alias.to_string()];
    for pattern in builder.matches() {
        let (parent, related) = match pattern {
            Match::Relation { parent, related, .. } => (&parent.node, &related.node),
            Match::MorphTo { parent, related, .. } => (&parent.node, related),
        };
        for node in [parent, related] {
            if !seen.contains(node) {
                seen.push(node.clone());
            }
        }
    }
    seen
}

/// Match constraints first, then the clause list. When both are present a
/// multi-clause list is parenthesized so its ORs stay inside.
fn compile_wheres(grammar: &CypherGrammar, builder: &Builder, alias: &str) -> String {
    let constraints: Vec<String> = builder
        .matches()
        .iter()
        .filter_map(|pattern| match_constraint(grammar, pattern))
        .collect();
    let clauses = compile_clauses(grammar, alias, builder.wheres());

    if constraints.is_empty() {
        return clauses;
    }

    let mut parts = constraints;
    if !clauses.is_empty() {
        if builder.wheres().len() > 1 {
            parts.push(format!("({})", clauses));
        } else {
            parts.push(clauses);
        }
    }
    parts.join(" AND ")
}

fn match_constraint(grammar: &CypherGrammar, pattern: &Match) -> Option<String> {
    match pattern {
        Match::Relation {
            property,
            parent,
            binding,
            constrained,
            ..
        } => constrained
            .then(|| format!("{} = ${}", render_column(grammar, &parent.node, property), binding)),
        Match::MorphTo {
            property,
            related,
            binding,
            constrained,
            ..
        } => constrained.then(|| format!("{} = ${}", render_column(grammar, related, property), binding)),
    }
}

/// Clauses in insertion order, each joined by its own boolean. The first
/// clause's boolean is dropped.
fn compile_clauses(grammar: &CypherGrammar, alias: &str, clauses: &[Clause]) -> String {
    let mut sql = String::new();
    for (index, clause) in clauses.iter().enumerate() {
        if index > 0 {
            sql.push(' ');
            sql.push_str(clause.boolean().as_cypher());
            sql.push(' ');
        }
        sql.push_str(&compile_clause(grammar, alias, clause));
    }
    sql
}

fn compile_clause(grammar: &CypherGrammar, alias: &str, clause: &Clause) -> String {
    match clause {
        Clause::Basic {
            column,
            operator,
            value,
            binding,
            ..
        } => {
            let value = match value {
                ClauseValue::Bound(_) => format!("${}", binding),
                ClauseValue::Raw(expression) => expression.clone(),
            };
            format!(
                "{} {} {}",
                render_column(grammar, alias, column),
                render_operator(operator),
                value
            )
        }
        Clause::In { column, binding, .. } => {
            format!("{} IN ${}", render_column(grammar, alias, column), binding)
        }
        Clause::NotIn { column, binding, .. } => {
            format!("NOT {} IN ${}", render_column(grammar, alias, column), binding)
        }
        Clause::InSub {
            column,
            query,
            negated,
            ..
        } => format!(
            "{}{} IN COLLECT {{ {} }}",
            if *negated { "NOT " } else { "" },
            render_column(grammar, alias, column),
            query
        ),
        Clause::Between {
            column,
            negated,
            binding,
            ..
        } => {
            let column = render_column(grammar, alias, column);
            let range = format!(
                "{column} >= ${binding}[0] AND {column} <= ${binding}[1]",
                column = column,
                binding = binding
            );
            if *negated {
                format!("NOT ({})", range)
            } else {
                format!("({})", range)
            }
        }
        Clause::Null { column, .. } => format!("{} IS NULL", render_column(grammar, alias, column)),
        Clause::NotNull { column, .. } => {
            format!("{} IS NOT NULL", render_column(grammar, alias, column))
        }
        Clause::Carried {
            column,
            operator,
            value,
            ..
        } => format!(
            "{} {} {}",
            render_column(grammar, alias, column),
            render_operator(operator),
            value
        ),
        Clause::Nested { clauses, .. } => format!("({})", compile_clauses(grammar, alias, clauses)),
        Clause::Sub {
            column,
            operator,
            query,
            ..
        } => format!(
            "{} {} head(COLLECT {{ {} }})",
            render_column(grammar, alias, column),
            render_operator(operator),
            query
        ),
    }
}

/// Word operators are keywords and render upper-case. `!=` becomes `<>`.
fn render_operator(operator: &str) -> String {
    if operator == "!=" {
        "<>".to_string()
    } else if operator.chars().any(|c| c.is_ascii_alphabetic()) {
        operator.to_uppercase()
    } else {
        operator.to_string()
    }
}

/// Resolve a builder column against a node alias.
///
/// - expressions (anything with a parenthesis) render as written
/// - `*` is the node itself
/// - the identity column reads through the identity accessor
/// - `node.prop` addresses another bound node
/// - anything else is a property of `alias`
pub(super) fn render_column(grammar: &CypherGrammar, alias: &str, column: &str) -> String {
    let column = column.trim();
    if column.contains('(') {
        return column.to_string();
    }
    if column == "*" {
        return alias.to_string();
    }

    let (node, property) = match column.split_once('.') {
        Some((node, property)) => (node, property),
        None => (alias, column),
    };
    if property == grammar.config().identity_column {
        grammar.identity_accessor(node)
    } else {
        format!("{}.{}", node, quote_identifier(property))
    }
}

/// Result column name for a projected column.
fn output_name(grammar: &CypherGrammar, column: &str) -> String {
    let property = column.rsplit('.').next().unwrap_or(column);
    if column.contains('(') {
        quote_identifier(&grammar.get_id_replacement(column))
    } else {
        quote_identifier(property)
    }
}

fn compile_columns(grammar: &CypherGrammar, alias: &str, columns: Option<&[String]>) -> String {
    let columns = match columns {
        None | Some([]) => return alias.to_string(),
        Some(columns) => columns,
    };
    if columns.iter().all(|column| column == "*") {
        return alias.to_string();
    }

    columns
        .iter()
        .map(|column| {
            if column == "*" {
                alias.to_string()
            } else {
                format!(
                    "{} AS {}",
                    render_column(grammar, alias, column),
                    output_name(grammar, column)
                )
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `RETURN fn(args) AS aggregate`. Functions missing from the registry are
/// passed through by name.
fn compile_aggregate(grammar: &CypherGrammar, alias: &str, aggregate: &AggregateDescriptor) -> String {
    let columns: Vec<String> = aggregate
        .columns
        .iter()
        .map(|column| render_column(grammar, alias, column))
        .collect();
    let mut arguments = if columns.is_empty() {
        alias.to_string()
    } else {
        columns.join(", ")
    };

    let function = match get_aggregate_mapping(&aggregate.function) {
        Some(mapping) => {
            if mapping.distinct {
                arguments = format!("DISTINCT {}", arguments);
            }
            if mapping.takes_percentile {
                let percentile = aggregate.percentile.unwrap_or(0.5);
                arguments = format!("{}, {}", arguments, percentile);
            }
            mapping.cypher_name.to_string()
        }
        None => {
            log::debug!("aggregate '{}' has no mapping, passing it through", aggregate.function);
            aggregate.function.clone()
        }
    };

    format!(
        "{}({}) AS {}",
        function,
        arguments,
        quote_identifier(&grammar.config().aggregate_alias)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrammarConfig;

    #[test]
    fn test_render_column() {
        let grammar = CypherGrammar::default();
        assert_eq!(render_column(&grammar, "person", "age"), "person.age");
        assert_eq!(render_column(&grammar, "person", "id"), "id(person)");
        assert_eq!(render_column(&grammar, "person", "post.title"), "post.title");
        assert_eq!(render_column(&grammar, "person", "post.id"), "id(post)");
        assert_eq!(render_column(&grammar, "person", "count(post)"), "count(post)");
        assert_eq!(render_column(&grammar, "person", "*"), "person");
        assert_eq!(render_column(&grammar, "person", "first name"), "person.`first name`");
    }

    #[test]
    fn test_render_column_custom_identity() {
        let grammar = CypherGrammar::new(GrammarConfig {
            identity_column: "uid".into(),
            identity_function: "elementId".into(),
            ..GrammarConfig::default()
        });
        assert_eq!(render_column(&grammar, "person", "uid"), "elementId(person)");
        assert_eq!(render_column(&grammar, "person", "id"), "person.id");
    }

    #[test]
    fn test_connect_directions() {
        assert_eq!(connect("(a)", ":R", "(b)", Direction::Out), "(a)-[:R]->(b)");
        assert_eq!(connect("(a)", ":R", "(b)", Direction::In), "(a)<-[:R]-(b)");
        assert_eq!(connect("(a)", ":R", "(b)", Direction::InOut), "(a)-[:R]-(b)");
        assert_eq!(connect("(a)", "", "(b)", Direction::Out), "(a)-->(b)");
    }

    #[test]
    fn test_render_operator() {
        assert_eq!(render_operator("=~"), "=~");
        assert_eq!(render_operator("xor"), "XOR");
        assert_eq!(render_operator("!="), "<>");
        assert_eq!(render_operator("<>"), "<>");
    }

    #[test]
    fn test_output_name() {
        let grammar = CypherGrammar::default();
        assert_eq!(output_name(&grammar, "post.title"), "title");
        assert_eq!(output_name(&grammar, "id(post)"), "id_post");
    }
}
