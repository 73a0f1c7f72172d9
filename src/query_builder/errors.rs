use thiserror::Error;

use crate::{connection::ConnectionError, cypher_grammar::GrammarError};

#[derive(Debug, Error)]
pub enum QueryBuilderError {
    #[error("Illegal operator and value combination: '{operator}' cannot be compared against null")]
    InvalidOperatorCombination { operator: String },

    #[error("Invalid binding type: {0} (expected select, where, matches, join, order or having)")]
    InvalidBindingBucket(String),

    #[error("Sub-query could not be resolved: {0}")]
    UnresolvedSubQuery(#[source] Box<QueryBuilderError>),

    #[error("Failed to compile query: {0}")]
    Grammar(#[from] GrammarError),

    /// Execution failures pass through untouched.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl QueryBuilderError {
    pub(crate) fn unresolved(source: QueryBuilderError) -> Self {
        match source {
            // Keep a single layer when sub-queries nest inside sub-queries
            already @ QueryBuilderError::UnresolvedSubQuery(_) => already,
            other => QueryBuilderError::UnresolvedSubQuery(Box::new(other)),
        }
    }
}
