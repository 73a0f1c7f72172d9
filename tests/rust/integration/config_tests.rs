/// Grammar configuration flowing through compiled queries

use cypher_builder::{ConfigError, GrammarConfig};
use serde_json::json;

use crate::support::{builder_with_config, row};

fn custom_config() -> GrammarConfig {
    GrammarConfig {
        identity_column: "uid".into(),
        identity_function: "elementId".into(),
        aggregate_alias: "total".into(),
        fallback_node_alias: "node".into(),
        update_suffix: "_new".into(),
    }
}

#[test]
fn test_custom_identity_and_aggregate_alias() {
    let (mut builder, connection) = builder_with_config("Person", custom_config());
    connection.respond_with(vec![row(json!({"total": 7}))]);

    builder.where_in("uid", vec!["a", "b"]).unwrap();
    assert_eq!(builder.count("*").unwrap(), Some(7));
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) WHERE elementId(person) IN $uid RETURN count(person) AS total"
    );
}

#[test]
fn test_custom_update_suffix() {
    let (mut builder, connection) = builder_with_config("Person", custom_config());
    builder.update(row(json!({"age": 3}))).unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.query,
        "MATCH (person:Person) SET person.age = $age_new RETURN count(person) AS updated"
    );
    assert_eq!(statement.bindings, row(json!({"age_new": 3})));
}

#[test]
fn test_fallback_alias_without_label() {
    let (mut builder, _) = builder_with_config("Person", custom_config());
    let fresh = builder.new_query();
    assert_eq!(fresh.to_cypher().unwrap(), "MATCH (node) RETURN node");

    builder.where_between("uid", 1, 2);
    assert_eq!(
        builder.to_cypher().unwrap(),
        "MATCH (person:Person) WHERE (elementId(person) >= $uid[0] AND elementId(person) <= $uid[1]) RETURN person"
    );
}

#[test]
fn test_from_env_overrides_defaults() {
    std::env::set_var("CYPHER_BUILDER_AGGREGATE_ALIAS", "agg_value");
    let config = GrammarConfig::from_env();
    std::env::remove_var("CYPHER_BUILDER_AGGREGATE_ALIAS");

    let config = config.unwrap();
    assert_eq!(config.aggregate_alias, "agg_value");
    assert_eq!(config.identity_column, "id");
}

#[test]
fn test_yaml_round_trip_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grammar.yaml");

    std::fs::write(&path, serde_yaml::to_string(&custom_config()).unwrap()).unwrap();
    assert_eq!(GrammarConfig::from_yaml_file(&path).unwrap(), custom_config());

    std::fs::write(&path, "update_suffix: \"-x\"\n").unwrap();
    assert!(matches!(
        GrammarConfig::from_yaml_file(&path),
        Err(ConfigError::Validation(_))
    ));

    assert!(matches!(
        GrammarConfig::from_yaml_file(dir.path().join("missing.yaml")),
        Err(ConfigError::Parse { .. })
    ));
}
