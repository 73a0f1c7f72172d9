use std::sync::Arc;

use cypher_builder::{Builder, CypherGrammar, GrammarConfig, RecordingConnection, Row};
use serde_json::Value;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builder targeting `label` plus the connection it records into.
pub fn builder_for(label: &str) -> (Builder, Arc<RecordingConnection>) {
    builder_with_config(label, GrammarConfig::default())
}

pub fn builder_with_config(label: &str, config: GrammarConfig) -> (Builder, Arc<RecordingConnection>) {
    init_logging();
    let connection = Arc::new(RecordingConnection::new());
    let mut builder = Builder::new(connection.clone(), Arc::new(CypherGrammar::new(config)));
    builder.from(label);
    (builder, connection)
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().expect("fixture must be an object")
}
