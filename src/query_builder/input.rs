//! Argument shapes accepted by the predicate API.
//!
//! Columns, values and membership sets each come in a few forms (plain,
//! mapping, raw expression, sub-query callback). They are resolved into one
//! of these enums at the call site so the builder never inspects types at
//! runtime.

use serde_json::{Map, Value};

use super::{errors::QueryBuilderError, Builder};

/// Callback that populates a fresh builder for a nested query.
pub type SubQuery = Box<dyn FnOnce(Builder) -> Result<Builder, QueryBuilderError>>;

pub enum ColumnInput {
    Column(String),
    /// `{column: value, ..}` equality group.
    Mapping(Map<String, Value>),
    /// Parenthesized group built by a callback.
    Nested(SubQuery),
}

impl ColumnInput {
    pub fn nested<F>(callback: F) -> Self
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError> + 'static,
    {
        ColumnInput::Nested(Box::new(callback))
    }
}

impl From<&str> for ColumnInput {
    fn from(column: &str) -> Self {
        ColumnInput::Column(column.to_string())
    }
}

impl From<String> for ColumnInput {
    fn from(column: String) -> Self {
        ColumnInput::Column(column)
    }
}

impl From<Map<String, Value>> for ColumnInput {
    fn from(mapping: Map<String, Value>) -> Self {
        ColumnInput::Mapping(mapping)
    }
}

pub enum WhereValue {
    Value(Value),
    /// Expression rendered verbatim, bypassing parameter binding.
    Raw(String),
    /// Correlated sub-select.
    SubQuery(SubQuery),
}

impl WhereValue {
    pub fn raw(expression: impl Into<String>) -> Self {
        WhereValue::Raw(expression.into())
    }

    pub fn sub<F>(callback: F) -> Self
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError> + 'static,
    {
        WhereValue::SubQuery(Box::new(callback))
    }

    pub(crate) fn is_null(&self) -> bool {
        matches!(self, WhereValue::Value(Value::Null))
    }
}

macro_rules! where_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for WhereValue {
                fn from(value: $ty) -> Self {
                    WhereValue::Value(value.into())
                }
            }
        )*
    };
}

where_value_from!(Value, bool, i32, i64, u32, u64, f32, f64, &str, String);

impl<T: Into<Value>> From<Option<T>> for WhereValue {
    fn from(value: Option<T>) -> Self {
        WhereValue::Value(value.map_or(Value::Null, Into::into))
    }
}

impl<T: Into<Value>> From<Vec<T>> for WhereValue {
    fn from(values: Vec<T>) -> Self {
        WhereValue::Value(Value::Array(values.into_iter().map(Into::into).collect()))
    }
}

pub enum InValues {
    List(Vec<Value>),
    SubQuery(SubQuery),
}

impl InValues {
    pub fn sub<F>(callback: F) -> Self
    where
        F: FnOnce(Builder) -> Result<Builder, QueryBuilderError> + 'static,
    {
        InValues::SubQuery(Box::new(callback))
    }
}

impl<T: Into<Value>> From<Vec<T>> for InValues {
    fn from(values: Vec<T>) -> Self {
        InValues::List(values.into_iter().map(Into::into).collect())
    }
}
