//! Cypher grammar
//!
//! Renders builder state into Cypher text with `$name` parameters. The
//! [`Grammar`] trait is the seam a builder compiles through; [`CypherGrammar`]
//! is the stock implementation.

use crate::{
    config::GrammarConfig,
    connection::Row,
    graph_entity::GraphEntity,
    query_builder::{Builder, CreateWith},
};

pub mod common;
mod errors;
mod function_registry;
mod literal;
mod mutation;
mod to_cypher;

pub use errors::GrammarError;
pub use literal::{format_literal, interpolate};

use common::{alias_from_label, parse_accessor, sanitize_parameter};

/// Turns a builder into query text.
///
/// Compilation never mutates the builder: the same state always compiles to
/// the same text.
pub trait Grammar: Send + Sync {
    fn compile_select(&self, builder: &Builder) -> Result<String, GrammarError>;

    /// One node per row. Row keys are expected in sorted order.
    fn compile_insert(&self, builder: &Builder, rows: &[Row]) -> Result<String, GrammarError>;

    /// A single node, returning its identity (or `sequence` when given).
    fn compile_insert_get_id(
        &self,
        builder: &Builder,
        values: &Row,
        sequence: Option<&str>,
    ) -> Result<String, GrammarError>;

    /// `SET` on every matched node, returning the affected count.
    fn compile_update(&self, builder: &Builder, values: &Row) -> Result<String, GrammarError>;

    fn compile_create_with(&self, builder: &Builder, payload: &CreateWith) -> Result<String, GrammarError>;

    /// Relationship between two stored entities. Property parameters are
    /// named by [`Builder::row_binding_names`].
    fn compile_edge(
        &self,
        builder: &Builder,
        parent: &dyn GraphEntity,
        related: &dyn GraphEntity,
        relationship: &str,
        properties: &Row,
    ) -> Result<String, GrammarError>;

    /// Node alias for a label set.
    fn model_as_node(&self, labels: &[String]) -> String;

    /// Parameter-safe replacement for a property or accessor
    /// (`id(user)` becomes `id_user`).
    fn get_id_replacement(&self, property: &str) -> String;

    /// Expression reading a node's identity, e.g. `id(user)`.
    fn identity_accessor(&self, alias: &str) -> String;

    fn config(&self) -> &GrammarConfig;
}

#[derive(Debug, Clone, Default)]
pub struct CypherGrammar {
    config: GrammarConfig,
}

impl CypherGrammar {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }
}

impl Grammar for CypherGrammar {
    fn compile_select(&self, builder: &Builder) -> Result<String, GrammarError> {
        to_cypher::compile_select(self, builder)
    }

    fn compile_insert(&self, builder: &Builder, rows: &[Row]) -> Result<String, GrammarError> {
        mutation::compile_insert(builder, rows)
    }

    fn compile_insert_get_id(
        &self,
        builder: &Builder,
        values: &Row,
        sequence: Option<&str>,
    ) -> Result<String, GrammarError> {
        mutation::compile_insert_get_id(self, builder, values, sequence)
    }

    fn compile_update(&self, builder: &Builder, values: &Row) -> Result<String, GrammarError> {
        mutation::compile_update(self, builder, values)
    }

    fn compile_create_with(&self, builder: &Builder, payload: &CreateWith) -> Result<String, GrammarError> {
        mutation::compile_create_with(self, builder, payload)
    }

    fn compile_edge(
        &self,
        builder: &Builder,
        parent: &dyn GraphEntity,
        related: &dyn GraphEntity,
        relationship: &str,
        properties: &Row,
    ) -> Result<String, GrammarError> {
        mutation::compile_edge(self, builder, parent, related, relationship, properties)
    }

    fn model_as_node(&self, labels: &[String]) -> String {
        labels
            .first()
            .map(|label| alias_from_label(label))
            .filter(|alias| !alias.is_empty())
            .unwrap_or_else(|| self.config.fallback_node_alias.clone())
    }

    fn get_id_replacement(&self, property: &str) -> String {
        match parse_accessor(property) {
            Some((function, alias)) => format!("{}_{}", function, alias),
            None => sanitize_parameter(property),
        }
    }

    fn identity_accessor(&self, alias: &str) -> String {
        format!("{}({})", self.config.identity_function, alias)
    }

    fn config(&self) -> &GrammarConfig {
        &self.config
    }
}
