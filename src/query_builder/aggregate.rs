use serde_json::Value;

use super::{clause::AggregateDescriptor, errors::QueryBuilderError, Builder};
use crate::connection::RowSet;

impl Builder {
    /// Run an aggregate function and return its single value.
    ///
    /// The descriptor lives only for this execution: afterwards the previous
    /// projection is restored and the descriptor cleared, whether or not the
    /// query succeeded. An empty result yields `None`.
    pub fn aggregate(
        &mut self,
        function: &str,
        columns: &[&str],
        percentile: Option<f64>,
    ) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate = Some(AggregateDescriptor {
            label: self.from.clone(),
            function: function.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            percentile,
        });

        let previous_columns = self.columns.clone();
        let results = self.get_columns(columns);

        self.aggregate = None;
        self.columns = previous_columns;

        Ok(self.aggregate_value(&results?))
    }

    fn aggregate_value(&self, results: &RowSet) -> Option<Value> {
        let row = results.current()?;
        let alias = &self.grammar.config().aggregate_alias;
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(alias))
            .or_else(|| row.iter().next())
            .map(|(_, value)| value.clone())
    }

    pub fn count(&mut self, column: &str) -> Result<Option<u64>, QueryBuilderError> {
        Ok(self.aggregate("count", &[column], None)?.and_then(as_count))
    }

    pub fn count_distinct(&mut self, column: &str) -> Result<Option<u64>, QueryBuilderError> {
        Ok(self
            .aggregate("countDistinct", &[column], None)?
            .and_then(as_count))
    }

    pub fn sum(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("sum", &[column], None)
    }

    pub fn avg(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("avg", &[column], None)
    }

    pub fn min(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("min", &[column], None)
    }

    pub fn max(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("max", &[column], None)
    }

    /// Nearest-value percentile (0.0 to 1.0).
    pub fn percentile_disc(&mut self, column: &str, percentile: f64) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("percentileDisc", &[column], Some(percentile))
    }

    /// Interpolated percentile (0.0 to 1.0).
    pub fn percentile_cont(&mut self, column: &str, percentile: f64) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("percentileCont", &[column], Some(percentile))
    }

    /// Sample standard deviation.
    pub fn stdev(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("stdev", &[column], None)
    }

    /// Population standard deviation.
    pub fn stdevp(&mut self, column: &str) -> Result<Option<Value>, QueryBuilderError> {
        self.aggregate("stdevp", &[column], None)
    }

    /// Collected values of a column, in result order.
    pub fn collect(&mut self, column: &str) -> Result<Vec<Value>, QueryBuilderError> {
        Ok(match self.aggregate("collect", &[column], None)? {
            Some(Value::Array(values)) => values,
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single],
        })
    }
}

fn as_count(value: Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|f| f.max(0.0) as u64))
}
