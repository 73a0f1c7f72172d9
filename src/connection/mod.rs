//! Execution collaborator contract
//!
//! The builder never talks to a database directly. It compiles Cypher text and a
//! flat parameter map and hands both to a [`Connection`]. Whatever comes back is
//! wrapped in a [`RowSet`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod recording;

pub use recording::{RecordedStatement, RecordingConnection, StatementKind};

/// A single result record, keyed by projected column name.
pub type Row = Map<String, Value>;

/// Flat parameter map sent alongside query text.
pub type Bindings = Map<String, Value>;

/// Errors raised by the execution layer.
///
/// These pass through the builder untouched.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection failed: {0}")]
    Connectivity(String),

    #[error("Query rejected by server: {0}")]
    MalformedQuery(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Synchronous request/response execution surface.
///
/// Implementations are shared read-only between builders, so every method
/// takes `&self`.
pub trait Connection: Send + Sync {
    fn select(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError>;

    fn insert(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError>;

    fn update(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError>;

    /// Run an arbitrary statement. `raw_result` asks the transport to return
    /// records as-is instead of post-processing them.
    fn statement(
        &self,
        query: &str,
        bindings: &Bindings,
        raw_result: bool,
    ) -> Result<RowSet, ConnectionError>;
}

/// Ordered result records with a cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    rows: Vec<Row>,
    #[serde(skip)]
    position: usize,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, position: 0 }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// True while the cursor points at a record.
    pub fn is_valid(&self) -> bool {
        self.position < self.rows.len()
    }

    /// Raw records in result order.
    pub fn data(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_data(self) -> Vec<Row> {
        self.rows
    }

    /// Record under the cursor.
    pub fn current(&self) -> Option<&Row> {
        self.rows.get(self.position)
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Move the cursor forward. Returns whether it still points at a record.
    pub fn advance(&mut self) -> bool {
        if self.position < self.rows.len() {
            self.position += 1;
        }
        self.is_valid()
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}
