//! Clause model
//!
//! Everything a builder accumulates is plain data: predicate clauses in
//! insertion order, traversal matches, and the optional aggregate request.
//! Grammars read these records and never mutate them.

use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bindings::BindingName;

lazy_static! {
    /// Operators a predicate may use. Anything else is treated as a value.
    static ref OPERATORS: HashSet<&'static str> = [
        // Mathematical
        "+", "-", "*", "/", "%", "^",
        // Comparison
        "=", "<>", "!=", "<", ">", "<=", ">=",
        "is null", "is not null",
        // Boolean
        "and", "or", "xor", "not",
        // Collection
        "in",
        // Regular expression
        "=~",
    ]
    .into_iter()
    .collect();
}

pub fn is_known_operator(operator: &str) -> bool {
    OPERATORS.contains(operator.to_lowercase().as_str())
}

/// Operators allowed to sit next to a null value (they become null tests).
pub fn is_equality_operator(operator: &str) -> bool {
    matches!(operator, "=" | "<>" | "!=")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_cypher(&self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "out")]
    Out,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "in-out")]
    InOut,
}

impl Direction {
    /// Parse `out`, `in` or `in-out`; anything unrecognised is outgoing.
    pub fn parse(direction: &str) -> Self {
        match direction.to_lowercase().as_str() {
            "in" => Direction::In,
            "in-out" | "inout" | "both" => Direction::InOut,
            _ => Direction::Out,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Out => "out",
            Direction::In => "in",
            Direction::InOut => "in-out",
        })
    }
}

/// Right-hand side of a basic predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ClauseValue {
    Bound(Value),
    /// Literal expression rendered as-is, never bound.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Clause {
    Basic {
        column: String,
        operator: String,
        value: ClauseValue,
        boolean: Boolean,
        binding: BindingName,
    },
    In {
        column: String,
        values: Vec<Value>,
        boolean: Boolean,
        binding: BindingName,
    },
    NotIn {
        column: String,
        values: Vec<Value>,
        boolean: Boolean,
        binding: BindingName,
    },
    /// Membership against a compiled sub-query.
    InSub {
        column: String,
        query: String,
        boolean: Boolean,
        negated: bool,
    },
    Between {
        column: String,
        boolean: Boolean,
        negated: bool,
        binding: BindingName,
    },
    Null {
        column: String,
        boolean: Boolean,
        binding: BindingName,
    },
    NotNull {
        column: String,
        boolean: Boolean,
        binding: BindingName,
    },
    /// Compares against an identifier carried over from an earlier stage.
    Carried {
        column: String,
        operator: String,
        value: String,
        boolean: Boolean,
    },
    /// Parenthesized group.
    Nested {
        clauses: Vec<Clause>,
        boolean: Boolean,
    },
    /// Correlated scalar sub-select.
    Sub {
        column: String,
        operator: String,
        query: String,
        boolean: Boolean,
    },
}

impl Clause {
    pub fn boolean(&self) -> Boolean {
        match self {
            Clause::Basic { boolean, .. }
            | Clause::In { boolean, .. }
            | Clause::NotIn { boolean, .. }
            | Clause::InSub { boolean, .. }
            | Clause::Between { boolean, .. }
            | Clause::Null { boolean, .. }
            | Clause::NotNull { boolean, .. }
            | Clause::Carried { boolean, .. }
            | Clause::Nested { boolean, .. }
            | Clause::Sub { boolean, .. } => *boolean,
        }
    }

    pub fn binding(&self) -> Option<&BindingName> {
        match self {
            Clause::Basic { binding, .. }
            | Clause::In { binding, .. }
            | Clause::NotIn { binding, .. }
            | Clause::Between { binding, .. }
            | Clause::Null { binding, .. }
            | Clause::NotNull { binding, .. } => Some(binding),
            _ => None,
        }
    }

    /// Binding names of this clause and everything nested below it.
    pub fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a BindingName>) {
        match self {
            Clause::Nested { clauses, .. } => {
                for clause in clauses {
                    clause.collect_bindings(out);
                }
            }
            other => out.extend(other.binding()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchNode {
    pub node: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Match {
    Relation {
        property: String,
        direction: Direction,
        relationship: String,
        parent: MatchNode,
        related: MatchNode,
        /// Name the match value is bound under.
        binding: BindingName,
        /// False when no value was given; the property is then left free.
        constrained: bool,
    },
    /// Polymorphic target: the related side has no fixed label.
    MorphTo {
        property: String,
        direction: Direction,
        related: String,
        parent: MatchNode,
        binding: BindingName,
        constrained: bool,
    },
}

impl Match {
    pub fn binding(&self) -> &BindingName {
        match self {
            Match::Relation { binding, .. } | Match::MorphTo { binding, .. } => binding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDescriptor {
    pub label: Option<String>,
    pub function: String,
    pub columns: Vec<String>,
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub direction: OrderDirection,
}
