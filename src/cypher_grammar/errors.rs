use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GrammarError {
    #[error("Insert requires at least one record")]
    EmptyInsert,

    #[error("Update requires at least one value")]
    EmptyUpdate,

    #[error("Entity labelled {0:?} has no identity value; save it before relating it")]
    MissingEntityKey(Vec<String>),

    #[error("Cannot render value as a Cypher literal: {0}")]
    UnsupportedLiteral(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}
