//! Fluent query builder
//!
//! A [`Builder`] accumulates clauses, traversal matches and bindings through
//! chained calls, then hands itself to a [`Grammar`] for compilation and the
//! result to a [`Connection`] for execution.
//!
//! ```ignore
//! let rows = builder
//!     .from("Person")
//!     .where_("age", ">", 30)?
//!     .where_null("nickname")
//!     .get()?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    connection::{Bindings, Connection, RowSet},
    cypher_grammar::{interpolate, Grammar},
};

mod aggregate;
pub mod bindings;
pub mod clause;
pub mod errors;
pub mod input;
mod match_clause;
mod mutation;
mod where_clause;

pub use bindings::{strip_path, BindingBucket, BindingName, BindingStore, NameAllocator};
pub use clause::{
    AggregateDescriptor, Boolean, Clause, ClauseValue, Direction, Match, MatchNode, Order,
    OrderDirection,
};
pub use errors::QueryBuilderError;
pub use input::{ColumnInput, InValues, SubQuery, WhereValue};
pub use mutation::{CreateWith, RelatedCreate};

pub struct Builder {
    connection: Arc<dyn Connection>,
    grammar: Arc<dyn Grammar>,
    from: Option<String>,
    columns: Option<Vec<String>>,
    wheres: Vec<Clause>,
    matches: Vec<Match>,
    withs: Vec<(String, String)>,
    orders: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    aggregate: Option<AggregateDescriptor>,
    bindings: BindingStore,
    /// Binding names already taken by an enclosing query or spliced
    /// sub-queries. New names are never allowed to repeat them.
    reserved_bindings: Vec<BindingName>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("from", &self.from)
            .field("columns", &self.columns)
            .field("wheres", &self.wheres)
            .field("matches", &self.matches)
            .field("withs", &self.withs)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("aggregate", &self.aggregate)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl Builder {
    pub fn new(connection: Arc<dyn Connection>, grammar: Arc<dyn Grammar>) -> Self {
        Self {
            connection,
            grammar,
            from: None,
            columns: None,
            wheres: Vec::new(),
            matches: Vec::new(),
            withs: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            aggregate: None,
            bindings: BindingStore::new(),
            reserved_bindings: Vec::new(),
        }
    }

    /// Fresh builder on the same connection and grammar.
    pub fn new_query(&self) -> Builder {
        Builder::new(Arc::clone(&self.connection), Arc::clone(&self.grammar))
    }

    /// Fresh builder for a nested group or sub-select. Binding names already
    /// used here stay reserved so the child never reuses them.
    fn child_query(&self) -> Builder {
        let mut child = self.new_query();
        child.reserved_bindings = self.reserved_bindings.clone();
        child
            .reserved_bindings
            .extend(self.own_binding_names().into_iter().cloned());
        child
    }

    /// Set the node label the query targets.
    pub fn from(&mut self, label: impl Into<String>) -> &mut Self {
        self.from = Some(label.into());
        self
    }

    /// Set the projected columns.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(&mut self, value: u64) -> &mut Self {
        self.limit = Some(value);
        self
    }

    /// Alias for [`Builder::limit`].
    pub fn take(&mut self, value: u64) -> &mut Self {
        self.limit(value)
    }

    pub fn skip(&mut self, value: u64) -> &mut Self {
        self.offset = Some(value);
        self
    }

    /// Alias for [`Builder::skip`].
    pub fn offset(&mut self, value: u64) -> &mut Self {
        self.skip(value)
    }

    /// Order by a column; `direction` is `asc` unless it reads `desc`.
    pub fn order_by(&mut self, column: impl Into<String>, direction: &str) -> &mut Self {
        let direction = if direction.eq_ignore_ascii_case("desc") {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        };
        self.orders.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// Add `WITH` projections, keyed by alias. Re-using an alias replaces it.
    pub fn with<I, K, V>(&mut self, parts: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (alias, part) in parts {
            let alias = alias.into();
            let part = part.into();
            match self.withs.iter_mut().find(|(existing, _)| *existing == alias) {
                Some(entry) => entry.1 = part,
                None => self.withs.push((alias, part)),
            }
        }
        self
    }

    /// Add a binding to a named bucket.
    ///
    /// Objects merge under their path-stripped keys, anything else is appended.
    pub fn add_binding(&mut self, value: Value, bucket: &str) -> Result<&mut Self, QueryBuilderError> {
        self.bindings.add_named(value, bucket)?;
        Ok(self)
    }

    /// Append clauses and `where` bindings produced elsewhere.
    pub fn merge_wheres(&mut self, wheres: Vec<Clause>, bindings: Map<String, Value>) -> &mut Self {
        self.wheres.extend(wheres);
        self.bindings.merge(bindings, BindingBucket::Where);
        self
    }

    /// Flattened bindings for execution.
    pub fn get_bindings(&self) -> Bindings {
        self.bindings.flatten()
    }

    /// Compile the current state to Cypher.
    pub fn to_cypher(&self) -> Result<String, QueryBuilderError> {
        Ok(self.grammar.compile_select(self)?)
    }

    /// Compiled Cypher with every parameter replaced by its literal value.
    /// Meant for logs and debugging, never for execution.
    pub fn to_interpolated_cypher(&self) -> Result<String, QueryBuilderError> {
        let cypher = self.to_cypher()?;
        Ok(interpolate(&cypher, &self.get_bindings())?)
    }

    /// Node alias for a label set, defaulting to the target label.
    pub fn model_as_node(&self, labels: Option<&[String]>) -> String {
        match labels {
            Some(labels) => self.grammar.model_as_node(labels),
            None => {
                let from: Vec<String> = self.from.iter().cloned().collect();
                self.grammar.model_as_node(&from)
            }
        }
    }

    /// Escaped parameter form of a property.
    pub fn wrap(&self, property: &str) -> String {
        self.grammar.get_id_replacement(property)
    }

    /// Execute as a select with all columns.
    pub fn get(&mut self) -> Result<RowSet, QueryBuilderError> {
        self.get_columns(&["*"])
    }

    pub fn get_columns(&mut self, columns: &[&str]) -> Result<RowSet, QueryBuilderError> {
        self.get_fresh(columns)
    }

    /// Execute as a select. `columns` only apply when no projection was set.
    pub fn get_fresh(&mut self, columns: &[&str]) -> Result<RowSet, QueryBuilderError> {
        if self.columns.is_none() {
            self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        }
        self.run_select()
    }

    fn run_select(&self) -> Result<RowSet, QueryBuilderError> {
        let cypher = self.to_cypher()?;
        let bindings = self.get_bindings();
        self.log_statement("select", &cypher, &bindings);
        Ok(self.connection.select(&cypher, &bindings)?)
    }

    fn log_statement(&self, kind: &str, cypher: &str, bindings: &Bindings) {
        log::debug!("{}: {} -- bindings: {}", kind, cypher, Value::Object(bindings.clone()));
        if log::log_enabled!(log::Level::Trace) {
            match interpolate(cypher, bindings) {
                Ok(inlined) => log::trace!("{} (inlined): {}", kind, inlined),
                Err(e) => log::trace!("{}: could not inline bindings: {}", kind, e),
            }
        }
    }

    /// Pluck one column from every row.
    pub fn lists(&mut self, column: &str) -> Result<Vec<Value>, QueryBuilderError> {
        let rows = self.get_columns(&[column])?;
        let name = strip_path(column);
        Ok(rows
            .data()
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Pluck one column keyed by another.
    pub fn lists_keyed(&mut self, column: &str, key: &str) -> Result<Map<String, Value>, QueryBuilderError> {
        let rows = self.get_columns(&[column, key])?;
        let (name, key) = (strip_path(column), strip_path(key));
        Ok(rows
            .data()
            .iter()
            .map(|row| {
                let value = row.get(name).cloned().unwrap_or(Value::Null);
                let key = match row.get(key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                (key, value)
            })
            .collect())
    }

    pub fn from_label(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn wheres(&self) -> &[Clause] {
        &self.wheres
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn withs(&self) -> &[(String, String)] {
        &self.withs
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn aggregate_descriptor(&self) -> Option<&AggregateDescriptor> {
        self.aggregate.as_ref()
    }

    pub fn binding_store(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    /// Names bound by this query's clauses (nested groups included) and
    /// matches.
    fn own_binding_names(&self) -> Vec<&BindingName> {
        let mut names = Vec::new();
        for clause in &self.wheres {
            clause.collect_bindings(&mut names);
        }
        names.extend(self.matches.iter().map(Match::binding));
        names
    }

    /// Name the next binding for `base`, counting every earlier use of it in
    /// this query and in any enclosing one.
    fn next_binding_name(&self, base: &str) -> BindingName {
        let mut names = NameAllocator::new();
        for name in self.reserved_bindings.iter().chain(self.own_binding_names()) {
            names.reserve(name);
        }
        names.allocate(base)
    }

    /// Parameter base for a column: escaped, without node prefix.
    fn binding_base(&self, column: &str) -> String {
        strip_path(&self.wrap(column)).to_string()
    }
}
