use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    bindings::{BindingName, NameAllocator},
    clause::Direction,
    errors::QueryBuilderError,
    Builder,
};
use crate::{
    connection::{Bindings, Row, RowSet},
    graph_entity::GraphEntity,
};

/// Node plus related nodes created in one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWith {
    pub model: Row,
    pub related: Vec<RelatedCreate>,
}

/// Nodes created and attached to the parent over one relationship type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCreate {
    pub relationship: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub direction: Direction,
    pub records: Vec<Row>,
}

/// Rows with their keys in sorted order.
fn sorted(row: Row) -> Row {
    let mut entries: Vec<(String, Value)> = row.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().collect()
}

impl Builder {
    /// Parameter names for a batch of rows, in row and key order.
    ///
    /// The first use of a key binds bare and later rows get the next free
    /// suffix, so a key literally named `age_2` never meets a suffixed `age`.
    pub fn row_binding_names(&self, rows: &[Row]) -> Vec<Vec<BindingName>> {
        let mut names = NameAllocator::new();
        rows.iter()
            .map(|row| row.keys().map(|key| names.allocate(&self.binding_base(key))).collect())
            .collect()
    }

    /// Parameter names for update values: the update suffix on each key,
    /// stepped past anything the query already binds.
    pub fn update_binding_names(&self, values: &Row) -> Vec<BindingName> {
        let suffix = &self.grammar.config().update_suffix;
        let mut names = NameAllocator::new();
        for key in self.get_bindings().keys() {
            names.reserve(&BindingName::first(key.as_str()));
        }
        values
            .keys()
            .map(|key| names.allocate(&format!("{}{}", self.binding_base(key), suffix)))
            .collect()
    }

    /// Insert one node per row. Every row is treated as part of a batch; a
    /// key repeated across rows binds with the `_N` suffix.
    pub fn insert(&mut self, rows: Vec<Row>) -> Result<RowSet, QueryBuilderError> {
        let rows: Vec<Row> = rows.into_iter().map(sorted).collect();
        let cypher = self.grammar.compile_insert(self, &rows)?;

        let mut bindings = Bindings::new();
        for (row, names) in rows.iter().zip(self.row_binding_names(&rows)) {
            for (value, name) in row.values().zip(names) {
                bindings.insert(name.to_string(), value.clone());
            }
        }

        self.log_statement("insert", &cypher, &bindings);
        Ok(self.connection.insert(&cypher, &bindings)?)
    }

    pub fn insert_one(&mut self, row: Row) -> Result<RowSet, QueryBuilderError> {
        self.insert(vec![row])
    }

    /// Insert a node and return its identity, or the `sequence` property when
    /// one is named.
    pub fn insert_get_id(&mut self, values: Row, sequence: Option<&str>) -> Result<Option<Value>, QueryBuilderError> {
        let values = sorted(values);
        let cypher = self.grammar.compile_insert_get_id(self, &values, sequence)?;
        let bindings = self.bind_row(values);

        self.log_statement("insert", &cypher, &bindings);
        let result = self.connection.insert(&cypher, &bindings)?;

        let field = sequence.unwrap_or(&self.grammar.config().identity_column);
        Ok(result.current().and_then(|row| row.get(field).cloned()))
    }

    /// Update every node the query matches. Returns the affected count from
    /// the first result row, 0 when nothing came back.
    pub fn update(&mut self, values: Row) -> Result<u64, QueryBuilderError> {
        let cypher = self.grammar.compile_update(self, &values)?;
        let bindings = self.bindings_merged_with_values(&values);

        self.log_statement("update", &cypher, &bindings);
        let updated = self.connection.update(&cypher, &bindings)?;

        Ok(updated
            .current()
            .and_then(|row| row.values().next())
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Query bindings plus update values under their update names, so a
    /// value being written never clashes with one being filtered on.
    fn bindings_merged_with_values(&self, values: &Row) -> Bindings {
        let mut bindings = self.get_bindings();
        for (value, name) in values.values().zip(self.update_binding_names(values)) {
            bindings.insert(name.to_string(), value.clone());
        }
        bindings
    }

    /// One row keyed by its parameter names.
    fn bind_row(&self, row: Row) -> Bindings {
        let names = self.row_binding_names(std::slice::from_ref(&row));
        let names = names.into_iter().next().unwrap_or_default();
        row.into_iter()
            .zip(names)
            .map(|((_, value), name)| (name.to_string(), value))
            .collect()
    }

    /// Create a node and its related nodes with one statement. Values are
    /// inlined as literals and the raw result is returned.
    pub fn create_with(&mut self, model: Row, related: Vec<RelatedCreate>) -> Result<RowSet, QueryBuilderError> {
        let payload = CreateWith { model, related };
        let cypher = self.grammar.compile_create_with(self, &payload)?;
        let bindings = Bindings::new();

        self.log_statement("statement", &cypher, &bindings);
        Ok(self.connection.statement(&cypher, &bindings, true)?)
    }

    /// Connect two existing nodes with a new relationship.
    pub fn insert_relationship(
        &mut self,
        parent: &dyn GraphEntity,
        related: &dyn GraphEntity,
        relationship: &str,
        properties: Row,
    ) -> Result<RowSet, QueryBuilderError> {
        let properties = sorted(properties);
        let cypher = self
            .grammar
            .compile_edge(self, parent, related, relationship, &properties)?;
        let bindings = self.bind_row(properties);

        self.log_statement("insert", &cypher, &bindings);
        Ok(self.connection.insert(&cypher, &bindings)?)
    }
}
