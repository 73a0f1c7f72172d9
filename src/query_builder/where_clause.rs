use serde_json::{Map, Value};

use super::{
    bindings::BindingBucket,
    clause::{is_equality_operator, is_known_operator, Boolean, Clause, ClauseValue},
    errors::QueryBuilderError,
    input::{ColumnInput, InValues, WhereValue},
    Builder,
};

impl Builder {
    /// `column operator value`, joined with AND.
    pub fn where_<C, V>(&mut self, column: C, operator: &str, value: V) -> Result<&mut Self, QueryBuilderError>
    where
        C: Into<ColumnInput>,
        V: Into<WhereValue>,
    {
        self.where_clause(column.into(), Some(operator), value.into(), Boolean::And)
    }

    /// `column operator value`, joined with OR.
    pub fn or_where<C, V>(&mut self, column: C, operator: &str, value: V) -> Result<&mut Self, QueryBuilderError>
    where
        C: Into<ColumnInput>,
        V: Into<WhereValue>,
    {
        self.where_clause(column.into(), Some(operator), value.into(), Boolean::Or)
    }

    /// Two-argument form: `column = value`.
    pub fn where_eq<C, V>(&mut self, column: C, value: V) -> Result<&mut Self, QueryBuilderError>
    where
        C: Into<ColumnInput>,
        V: Into<WhereValue>,
    {
        self.where_clause(column.into(), None, value.into(), Boolean::And)
    }

    /// Equality on every entry of `mapping`, grouped in parentheses.
    pub fn where_map(&mut self, mapping: Map<String, Value>) -> Result<&mut Self, QueryBuilderError> {
        self.where_clause(ColumnInput::Mapping(mapping), None, WhereValue::Value(Value::Null), Boolean::And)
    }

    /// General predicate entry point. `operator: None` is the two-argument
    /// shorthand and means `=`.
    pub fn where_clause(
        &mut self,
        column: ColumnInput,
        operator: Option<&str>,
        value: WhereValue,
        boolean: Boolean,
    ) -> Result<&mut Self, QueryBuilderError> {
        let column = match column {
            ColumnInput::Mapping(mapping) => {
                return self.where_nested(
                    move |mut query| {
                        for (key, value) in mapping {
                            query.where_(key, "=", value)?;
                        }
                        Ok(query)
                    },
                    boolean,
                );
            }
            ColumnInput::Nested(callback) => {
                if let Some(operator) = operator {
                    check_operator_and_value(operator, &value)?;
                }
                return self.where_nested(callback, boolean);
            }
            ColumnInput::Column(column) => column,
        };

        let mut operator = match operator {
            None => "=".to_string(),
            Some(operator) => {
                check_operator_and_value(operator, &value)?;
                operator.to_string()
            }
        };
        let mut value = value;

        if !is_known_operator(&operator) {
            log::warn!(
                "where({}): '{}' is not an operator, comparing with '=' against it",
                column,
                operator
            );
            value = WhereValue::Value(Value::String(operator));
            operator = "=".to_string();
        }

        match value {
            WhereValue::SubQuery(callback) => self.where_sub(&column, &operator, callback, boolean),
            WhereValue::Value(Value::Null) => {
                let not = operator != "=";
                Ok(self.where_null_clause(&column, boolean, not))
            }
            WhereValue::Raw(expression) => {
                let binding = self.next_binding_name(&self.binding_base(&column));
                log::trace!("where {} {} {} (raw)", column, operator, expression);
                self.wheres.push(Clause::Basic {
                    column,
                    operator,
                    value: ClauseValue::Raw(expression),
                    boolean,
                    binding,
                });
                Ok(self)
            }
            WhereValue::Value(value) => {
                let binding = self.next_binding_name(&self.binding_base(&column));
                log::trace!("where {} {} ${}", column, operator, binding);
                self.bindings
                    .insert(binding.to_string(), value.clone(), BindingBucket::Where);
                self.wheres.push(Clause::Basic {
                    column,
                    operator,
                    value: ClauseValue::Bound(value),
                    boolean,
                    binding,
                });
                Ok(self)
            }
        }
    }

    /// Parenthesized group built on a fresh builder.
    pub fn where_nested<F>(&mut self, callback: F, boolean: Boolean) -> Result<&mut Self, QueryBuilderError>
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError>,
    {
        let mut nested = self.child_query();
        nested.from = self.from.clone();
        let nested = callback(nested).map_err(QueryBuilderError::unresolved)?;

        if nested.wheres.is_empty() {
            return Ok(self);
        }

        let where_bindings = nested.bindings.bucket(BindingBucket::Where).clone();
        self.bindings.merge(where_bindings, BindingBucket::Where);
        self.wheres.push(Clause::Nested {
            clauses: nested.wheres,
            boolean,
        });
        Ok(self)
    }

    /// Compare `column` against the single value returned by a sub-query.
    pub fn where_sub<F>(
        &mut self,
        column: &str,
        operator: &str,
        callback: F,
        boolean: Boolean,
    ) -> Result<&mut Self, QueryBuilderError>
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError>,
    {
        let query = self.resolve_sub_query(callback)?;
        self.wheres.push(Clause::Sub {
            column: column.to_string(),
            operator: operator.to_string(),
            query,
            boolean,
        });
        Ok(self)
    }

    pub fn where_in(&mut self, column: &str, values: impl Into<InValues>) -> Result<&mut Self, QueryBuilderError> {
        self.where_in_clause(column, values.into(), Boolean::And, false)
    }

    pub fn or_where_in(&mut self, column: &str, values: impl Into<InValues>) -> Result<&mut Self, QueryBuilderError> {
        self.where_in_clause(column, values.into(), Boolean::Or, false)
    }

    pub fn where_not_in(&mut self, column: &str, values: impl Into<InValues>) -> Result<&mut Self, QueryBuilderError> {
        self.where_in_clause(column, values.into(), Boolean::And, true)
    }

    /// Set membership. The whole value set binds under one key.
    pub fn where_in_clause(
        &mut self,
        column: &str,
        values: InValues,
        boolean: Boolean,
        not: bool,
    ) -> Result<&mut Self, QueryBuilderError> {
        let values = match values {
            InValues::SubQuery(callback) => return self.where_in_sub(column, callback, boolean, not),
            InValues::List(values) => values,
        };

        let binding = self.next_binding_name(&self.binding_base(column));
        self.bindings.insert(
            binding.to_string(),
            Value::Array(values.clone()),
            BindingBucket::Where,
        );

        let column = column.to_string();
        self.wheres.push(if not {
            Clause::NotIn {
                column,
                values,
                boolean,
                binding,
            }
        } else {
            Clause::In {
                column,
                values,
                boolean,
                binding,
            }
        });
        Ok(self)
    }

    pub fn where_in_sub<F>(
        &mut self,
        column: &str,
        callback: F,
        boolean: Boolean,
        not: bool,
    ) -> Result<&mut Self, QueryBuilderError>
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError>,
    {
        let query = self.resolve_sub_query(callback)?;
        self.wheres.push(Clause::InSub {
            column: column.to_string(),
            query,
            boolean,
            negated: not,
        });
        Ok(self)
    }

    pub fn where_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, [low.into(), high.into()], Boolean::And, false)
    }

    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.where_between_clause(column, [low.into(), high.into()], Boolean::And, true)
    }

    /// `[low, high]` binds as one pair under the column name. The identity
    /// column is stored as the grammar's identity accessor.
    pub fn where_between_clause(
        &mut self,
        column: &str,
        values: [Value; 2],
        boolean: Boolean,
        not: bool,
    ) -> &mut Self {
        let binding = self.next_binding_name(&self.binding_base(column));
        self.bindings.insert(
            binding.to_string(),
            Value::Array(values.into()),
            BindingBucket::Where,
        );

        let column = if column == self.grammar.config().identity_column {
            self.grammar.identity_accessor(&self.model_as_node(None))
        } else {
            column.to_string()
        };

        self.wheres.push(Clause::Between {
            column,
            boolean,
            negated: not,
            binding,
        });
        self
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::And, false)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::Or, false)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::And, true)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_null_clause(column, Boolean::Or, true)
    }

    /// Existence test. No value is bound, but the clause records a binding
    /// name so repeated tests on one column stay distinguishable.
    pub fn where_null_clause(&mut self, column: &str, boolean: Boolean, not: bool) -> &mut Self {
        let binding = self.next_binding_name(&self.binding_base(column));
        let column = column.to_string();
        self.wheres.push(if not {
            Clause::NotNull {
                column,
                boolean,
                binding,
            }
        } else {
            Clause::Null {
                column,
                boolean,
                binding,
            }
        });
        self
    }

    /// Compare against an identifier carried over from an earlier stage
    /// (e.g. a `WITH` alias). Nothing is bound.
    pub fn where_carried(
        &mut self,
        column: &str,
        operator: &str,
        value: &str,
        boolean: Boolean,
    ) -> &mut Self {
        self.wheres.push(Clause::Carried {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
            boolean,
        });
        self
    }

    /// Build a sub-query on a child builder, compile it and adopt its bindings.
    fn resolve_sub_query<F>(&mut self, callback: F) -> Result<String, QueryBuilderError>
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError>,
    {
        let child = self.child_query();
        let sub = callback(child).map_err(QueryBuilderError::unresolved)?;
        let query = sub.to_cypher().map_err(QueryBuilderError::unresolved)?;

        self.bindings.merge(sub.get_bindings(), BindingBucket::Where);
        self.reserved_bindings
            .extend(sub.own_binding_names().into_iter().cloned());
        Ok(query)
    }
}

fn check_operator_and_value(operator: &str, value: &WhereValue) -> Result<(), QueryBuilderError> {
    if value.is_null() && is_known_operator(operator) && !is_equality_operator(operator) {
        return Err(QueryBuilderError::InvalidOperatorCombination {
            operator: operator.to_string(),
        });
    }
    Ok(())
}
