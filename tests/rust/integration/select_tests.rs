/// Select compilation and execution through the public API

use cypher_builder::{
    connection::StatementKind,
    query_builder::{Boolean, ColumnInput, Direction, InValues, WhereValue},
    ConnectionError, NodeRef, QueryBuilderError,
};
use serde_json::json;

use crate::support::{builder_for, row};

#[test]
fn test_projection_order_and_paging() {
    let (mut builder, connection) = builder_for("Person");
    builder
        .select(["name", "id", "company.title"])
        .order_by("name", "desc")
        .order_by("age", "asc")
        .skip(10)
        .take(5);
    builder.get().unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(
        statement.query,
        "MATCH (person:Person) RETURN person.name AS name, id(person) AS id, company.title AS title \
         ORDER BY person.name DESC, person.age ASC SKIP 10 LIMIT 5"
    );
    assert!(statement.bindings.is_empty());
}

#[test]
fn test_get_columns_only_applies_without_projection() {
    let (mut builder, connection) = builder_for("Person");
    builder.get_columns(&["name"]).unwrap();
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN person.name AS name"
    );

    builder.get_fresh(&["age"]).unwrap();
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN person.name AS name"
    );
}

#[test]
fn test_lists_plucks_column() {
    let (mut builder, connection) = builder_for("Person");
    connection.respond_with(vec![row(json!({"name": "Ann"})), row(json!({"name": "Bob"}))]);

    let names = builder.lists("person.name").unwrap();
    assert_eq!(names, vec![json!("Ann"), json!("Bob")]);
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN person.name AS name"
    );
}

#[test]
fn test_lists_keyed() {
    let (mut builder, connection) = builder_for("Person");
    connection.respond_with(vec![
        row(json!({"name": "Ann", "id": 1})),
        row(json!({"name": "Bob", "id": 2})),
    ]);

    let names = builder.lists_keyed("name", "id").unwrap();
    assert_eq!(names["1"], json!("Ann"));
    assert_eq!(names["2"], json!("Bob"));
}

#[test]
fn test_full_traversal_query() {
    let (mut builder, connection) = builder_for("Post");
    builder
        .match_relation(
            &NodeRef::new("Person").key(1),
            &NodeRef::new("Post"),
            "post",
            "AUTHORED",
            "id",
            Some(json!(1)),
            Direction::Out,
        )
        .where_("published", "=", true)
        .unwrap()
        .where_clause(
            ColumnInput::nested(|mut query| {
                query.where_("views", ">", 100)?.or_where_null("views");
                Ok(query)
            }),
            None,
            WhereValue::from(None::<i32>),
            Boolean::And,
        )
        .unwrap()
        .where_in(
            "id",
            InValues::sub(|mut query| {
                query
                    .from("Tag")
                    .select(["post_id"])
                    .where_("name", "=", "rust")?;
                Ok(query)
            }),
        )
        .unwrap()
        .order_by("created_at", "desc")
        .limit(20);
    builder.get().unwrap();

    let statement = connection.last_statement().unwrap();
    assert_eq!(statement.kind, StatementKind::Select);
    assert_eq!(
        statement.query,
        "MATCH (person:Person)-[:AUTHORED]->(post:Post) \
         WHERE id(person) = $id AND (post.published = $published \
         AND (post.views > $views OR post.views IS NULL) \
         AND id(post) IN COLLECT { MATCH (tag:Tag) WHERE tag.name = $name RETURN tag.post_id AS post_id }) \
         RETURN post ORDER BY post.created_at DESC LIMIT 20"
    );
    assert_eq!(
        statement.bindings,
        row(json!({"published": true, "views": 100, "name": "rust", "id": 1}))
    );
}

#[test]
fn test_interpolated_cypher_inlines_values() {
    let (mut builder, _) = builder_for("Person");
    builder
        .where_("name", "=", "O'Brien")
        .unwrap()
        .where_in("id", vec![1, 2])
        .unwrap();

    assert_eq!(
        builder.to_interpolated_cypher().unwrap(),
        "MATCH (person:Person) WHERE person.name = 'O\\'Brien' AND id(person) IN [1, 2] RETURN person"
    );
}

#[test]
fn test_aggregate_wrappers() {
    let (mut builder, connection) = builder_for("Person");

    connection.respond_with(vec![row(json!({"aggregate": 4}))]);
    assert_eq!(builder.count_distinct("name").unwrap(), Some(4));
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN count(DISTINCT person.name) AS aggregate"
    );

    connection.respond_with(vec![row(json!({"aggregate": 12.5}))]);
    assert_eq!(builder.stdevp("age").unwrap(), Some(json!(12.5)));
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN stDevP(person.age) AS aggregate"
    );

    connection.respond_with(vec![row(json!({"aggregate": ["Ann", "Bob"]}))]);
    assert_eq!(builder.collect("name").unwrap(), vec![json!("Ann"), json!("Bob")]);

    connection.respond_with(vec![row(json!({"aggregate": 33}))]);
    builder.percentile_cont("age", 0.5).unwrap();
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN percentileCont(person.age, 0.5) AS aggregate"
    );
}

#[test]
fn test_unknown_aggregate_passes_through() {
    let (mut builder, connection) = builder_for("Person");
    builder.aggregate("median", &["age"], None).unwrap();
    assert_eq!(
        connection.last_statement().unwrap().query,
        "MATCH (person:Person) RETURN median(person.age) AS aggregate"
    );
}

#[test]
fn test_connection_error_passes_through() {
    let (mut builder, connection) = builder_for("Person");
    connection.fail_with(ConnectionError::Connectivity("server unreachable".into()));

    let err = builder.get().unwrap_err();
    assert_eq!(err.to_string(), "Connection failed: server unreachable");
    assert!(matches!(
        err,
        QueryBuilderError::Connection(ConnectionError::Connectivity(_))
    ));
}
