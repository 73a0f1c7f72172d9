//! Dry-run connection
//!
//! Records every statement it receives and answers with queued row sets
//! (or an empty set when nothing is queued). Useful for inspecting what a
//! builder would send without a live server.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::{Bindings, Connection, ConnectionError, Row, RowSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Statement,
}

/// One call made against the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub kind: StatementKind,
    pub query: String,
    pub bindings: Bindings,
    pub raw_result: bool,
}

#[derive(Debug, Default)]
pub struct RecordingConnection {
    statements: Mutex<Vec<RecordedStatement>>,
    responses: Mutex<VecDeque<Result<RowSet, ConnectionError>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not take the recorder down with it
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next call.
    pub fn respond_with(&self, rows: Vec<Row>) -> &Self {
        lock(&self.responses).push_back(Ok(RowSet::new(rows)));
        self
    }

    /// Queue a failure for the next call.
    pub fn fail_with(&self, error: ConnectionError) -> &Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        lock(&self.statements).last().cloned()
    }

    pub fn statement_count(&self) -> usize {
        lock(&self.statements).len()
    }

    fn record(
        &self,
        kind: StatementKind,
        query: &str,
        bindings: &Bindings,
        raw_result: bool,
    ) -> Result<RowSet, ConnectionError> {
        log::trace!("RecordingConnection: {:?} {}", kind, query);
        lock(&self.statements).push(RecordedStatement {
            kind,
            query: query.to_string(),
            bindings: bindings.clone(),
            raw_result,
        });

        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(RowSet::empty()))
    }
}

impl Connection for RecordingConnection {
    fn select(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError> {
        self.record(StatementKind::Select, query, bindings, false)
    }

    fn insert(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError> {
        self.record(StatementKind::Insert, query, bindings, false)
    }

    fn update(&self, query: &str, bindings: &Bindings) -> Result<RowSet, ConnectionError> {
        self.record(StatementKind::Update, query, bindings, false)
    }

    fn statement(
        &self,
        query: &str,
        bindings: &Bindings,
        raw_result: bool,
    ) -> Result<RowSet, ConnectionError> {
        self.record(StatementKind::Statement, query, bindings, raw_result)
    }
}
