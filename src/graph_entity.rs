//! Entity/label collaborator
//!
//! The builder only needs three things from a domain entity: the labels it is
//! stored under, an optional alias to address it by, and its identity value
//! when it already exists in the graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub trait GraphEntity {
    /// Storage labels. The first label is the primary one.
    fn labels(&self) -> Vec<String>;

    /// Preferred node alias. `None` lets the grammar derive one from labels.
    fn node_alias(&self) -> Option<String> {
        None
    }

    /// Identity of a persisted entity.
    fn key(&self) -> Option<Value> {
        None
    }
}

/// Plain label-set entity for callers without an ORM model at hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub labels: Vec<String>,
    pub alias: Option<String>,
    pub key: Option<Value>,
}

impl NodeRef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            labels: vec![label.into()],
            ..Default::default()
        }
    }

    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl GraphEntity for NodeRef {
    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn node_alias(&self) -> Option<String> {
        self.alias.clone()
    }

    fn key(&self) -> Option<Value> {
        self.key.clone()
    }
}
