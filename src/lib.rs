//! Cypher Builder - fluent graph query construction
//!
//! This crate turns chained builder calls into Cypher text through:
//! - An ordered clause model with nested groups and sub-queries
//! - Bucketed parameter bindings with collision-free names
//! - Relationship traversal matches rendered ahead of predicates
//! - A pluggable grammar and a pluggable connection

pub mod config;
pub mod connection;
pub mod cypher_grammar;
pub mod graph_entity;
pub mod query_builder;

pub use config::{ConfigError, GrammarConfig};
pub use connection::{Bindings, Connection, ConnectionError, RecordingConnection, Row, RowSet};
pub use cypher_grammar::{CypherGrammar, Grammar, GrammarError};
pub use graph_entity::{GraphEntity, NodeRef};
pub use query_builder::{Builder, QueryBuilderError};
