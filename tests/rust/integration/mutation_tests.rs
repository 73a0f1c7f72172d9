/// Inserts, updates and relationship creation

use cypher_builder::{
    connection::StatementKind,
    query_builder::{Direction, RelatedCreate},
    GrammarError, NodeRef, QueryBuilderError,
};
use serde_json::json;

use crate::support::{builder_for, row};

#[test]
fn test_batch_insert_suffixes_each_row() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .insert(vec![
            row(json!({"name": "Ann", "age": 30})),
            row(json!({"name": "Bob", "age": 40})),
        ])
        .unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(statement.kind, StatementKind::Insert);
    assert_eq!(
        statement.query,
        "CREATE (person:Person {age: $age, name: $name}), \
         (person_2:Person {age: $age_2, name: $name_2}) RETURN person, person_2"
    );
    assert_eq!(
        statement.bindings,
        row(json!({"age": 30, "name": "Ann", "age_2": 40, "name_2": "Bob"}))
    );
}

#[test]
fn test_batch_insert_keeps_suffixed_keys_apart() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .insert(vec![
            row(json!({"age": 1, "age_2": 2})),
            row(json!({"age": 3, "age_2": 4})),
        ])
        .unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.query,
        "CREATE (person:Person {age: $age, age_2: $age_2}), \
         (person_2:Person {age: $age_3, age_2: $age_2_2}) RETURN person, person_2"
    );
    assert_eq!(
        statement.bindings,
        row(json!({"age": 1, "age_2": 2, "age_3": 3, "age_2_2": 4}))
    );
}

#[test]
fn test_empty_insert_is_rejected() {
    let (mut builder, connection) = builder_for("Person");
    let err = builder.insert(Vec::new()).unwrap_err();

    assert!(matches!(err, QueryBuilderError::Grammar(GrammarError::EmptyInsert)));
    assert_eq!(connection.statement_count(), 0);
}

#[test]
fn test_insert_get_id_returns_identity() {
    let (mut builder, connection) = builder_for("Person");
    connection.respond_with(vec![row(json!({"id": 42}))]);

    let id = builder
        .insert_get_id(row(json!({"name": "Ann"})), None)
        .unwrap();

    assert_eq!(id, Some(json!(42)));
    assert_eq!(
        connection.last_statement().unwrap().query,
        "CREATE (person:Person {name: $name}) RETURN id(person) AS id"
    );
}

#[test]
fn test_insert_get_id_with_sequence() {
    let (mut builder, connection) = builder_for("Invoice");
    connection.respond_with(vec![row(json!({"number": 1001}))]);

    let id = builder
        .insert_get_id(row(json!({"total": 9.5})), Some("number"))
        .unwrap();

    assert_eq!(id, Some(json!(1001)));
    assert_eq!(
        connection.last_statement().unwrap().query,
        "CREATE (invoice:Invoice {total: $total}) RETURN invoice.number AS number"
    );
}

#[test]
fn test_update_returns_affected_count() {
    let (mut builder, connection) = builder_for("Person");
    connection.respond_with(vec![row(json!({"updated": 2}))]);

    let updated = builder
        .where_("name", "=", "Ann")
        .unwrap()
        .update(row(json!({"name": "Anna", "age": 31})))
        .unwrap();

    assert_eq!(updated, 2);
    let statement = connection.last_statement().unwrap();
    assert_eq!(statement.kind, StatementKind::Update);
    assert_eq!(
        statement.query,
        "MATCH (person:Person) WHERE person.name = $name \
         SET person.name = $name_update, person.age = $age_update RETURN count(person) AS updated"
    );
    assert_eq!(
        statement.bindings,
        row(json!({"name": "Ann", "name_update": "Anna", "age_update": 31}))
    );
}

#[test]
fn test_update_steps_past_bound_update_name() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .where_("name_update", "=", "stale")
        .unwrap()
        .update(row(json!({"name": "Anna"})))
        .unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.query,
        "MATCH (person:Person) WHERE person.name_update = $name_update \
         SET person.name = $name_update_2 RETURN count(person) AS updated"
    );
    assert_eq!(
        statement.bindings,
        row(json!({"name_update": "stale", "name_update_2": "Anna"}))
    );
}

#[test]
fn test_update_without_result_counts_zero() {
    let (mut builder, _) = builder_for("Person");
    assert_eq!(builder.update(row(json!({"age": 1}))).unwrap(), 0);
}

#[test]
fn test_create_with_inlines_literals() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .create_with(
            row(json!({"name": "Ann", "tags": ["a", "b"]})),
            vec![
                RelatedCreate {
                    relationship: "LIKES".into(),
                    labels: vec!["Tag".into()],
                    direction: Direction::Out,
                    records: vec![row(json!({"name": "rust"})), row(json!({"name": "it's"}))],
                },
                RelatedCreate {
                    relationship: "KNOWS".into(),
                    labels: vec!["Person".into()],
                    direction: Direction::In,
                    records: vec![row(json!({"name": "Bob"}))],
                },
            ],
        )
        .unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(statement.kind, StatementKind::Statement);
    assert!(statement.raw_result);
    assert!(statement.bindings.is_empty());
    assert_eq!(
        statement.query,
        "CREATE (person:Person {name: 'Ann', tags: ['a', 'b']}), \
         (person)-[:LIKES]->(tag:Tag {name: 'rust'}), \
         (person)-[:LIKES]->(tag_2:Tag {name: 'it\\'s'}), \
         (person)<-[:KNOWS]-(person_2:Person {name: 'Bob'}) \
         RETURN person, tag, tag_2, person_2"
    );
}

#[test]
fn test_create_with_deserializes_related_payload() {
    let related: RelatedCreate = serde_json::from_value(json!({
        "relationship": "HAS",
        "labels": ["Address"],
        "records": [{"city": "Oslo"}]
    }))
    .unwrap();
    assert_eq!(related.direction, Direction::Out);

    let (mut builder, connection) = builder_for("Person");
    builder.create_with(row(json!({})), vec![related]).unwrap();
    assert_eq!(
        connection.last_statement().unwrap().query,
        "CREATE (person:Person), (person)-[:HAS]->(address:Address {city: 'Oslo'}) RETURN person, address"
    );
}

#[test]
fn test_insert_relationship() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .insert_relationship(
            &NodeRef::new("Person").key(1),
            &NodeRef::new("Post").key(2),
            "AUTHORED",
            row(json!({"since": 2020})),
        )
        .unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.query,
        "MATCH (person:Person), (post:Post) WHERE id(person) = 1 AND id(post) = 2 \
         CREATE (person)-[rel:AUTHORED {since: $since}]->(post) RETURN rel"
    );
    assert_eq!(statement.bindings, row(json!({"since": 2020})));
}

#[test]
fn test_insert_relationship_between_same_label() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .insert_relationship(
            &NodeRef::new("Person").key(1),
            &NodeRef::new("Person").key(2),
            "KNOWS",
            row(json!({})),
        )
        .unwrap();

    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person), (person_2:Person) WHERE id(person) = 1 AND id(person_2) = 2 \
         CREATE (person)-[rel:KNOWS]->(person_2) RETURN rel"
    );
}

#[test]
fn test_insert_relationship_requires_saved_entities() {
    let (mut builder, connection) = builder_for("Person");
    let err = builder
        .insert_relationship(
            &NodeRef::new("Person").key(1),
            &NodeRef::new("Post"),
            "AUTHORED",
            row(json!({})),
        )
        .unwrap_err();

    match err {
        QueryBuilderError::Grammar(GrammarError::MissingEntityKey(labels)) => {
            assert_eq!(labels, vec!["Post".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(connection.statement_count(), 0);
}
