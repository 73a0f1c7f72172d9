use serde_json::Value;

use super::{
    bindings::{BindingBucket, BindingName},
    clause::{Direction, Match, MatchNode},
    Builder,
};
use crate::graph_entity::GraphEntity;

impl Builder {
    /// Traverse from `parent` over `relationship` to a `related` node.
    ///
    /// `value`, when given, constrains the parent's `property` and is bound in
    /// the `matches` bucket under the escaped property name, suffixed like any
    /// other repeated binding.
    #[allow(clippy::too_many_arguments)]
    pub fn match_relation(
        &mut self,
        parent: &dyn GraphEntity,
        related: &dyn GraphEntity,
        related_node: &str,
        relationship: &str,
        property: &str,
        value: Option<Value>,
        direction: Direction,
    ) -> &mut Self {
        let parent_labels = parent.labels();
        let parent_node = parent
            .node_alias()
            .unwrap_or_else(|| self.model_as_node(Some(parent_labels.as_slice())));
        let (binding, constrained) = self.bind_match_value(property, value);

        log::trace!(
            "match ({})-[{}:{}]-({})",
            parent_node,
            direction,
            relationship,
            related_node
        );
        self.matches.push(Match::Relation {
            property: property.to_string(),
            direction,
            relationship: relationship.to_string(),
            parent: MatchNode {
                node: parent_node,
                labels: parent_labels,
            },
            related: MatchNode {
                node: related_node.to_string(),
                labels: related.labels(),
            },
            binding,
            constrained,
        });
        self
    }

    /// Like [`Builder::match_relation`] but the related node carries no label:
    /// it may be any of several entity kinds and is resolved by identity.
    pub fn match_morph_relation(
        &mut self,
        parent: &dyn GraphEntity,
        related_node: &str,
        property: &str,
        value: Option<Value>,
        direction: Direction,
    ) -> &mut Self {
        let parent_labels = parent.labels();
        let parent_node = parent
            .node_alias()
            .unwrap_or_else(|| self.model_as_node(Some(parent_labels.as_slice())));
        let (binding, constrained) = self.bind_match_value(property, value);

        log::trace!("match ({})-[{}]-({}) polymorphic", parent_node, direction, related_node);
        self.matches.push(Match::MorphTo {
            property: property.to_string(),
            direction,
            related: related_node.to_string(),
            parent: MatchNode {
                node: parent_node,
                labels: parent_labels,
            },
            binding,
            constrained,
        });
        self
    }

    /// Bind the match value (null included) under a fresh name. The flag
    /// tells the grammar whether to constrain on it.
    fn bind_match_value(&mut self, property: &str, value: Option<Value>) -> (BindingName, bool) {
        let binding = self.next_binding_name(&self.binding_base(property));
        let value = value.unwrap_or(Value::Null);
        let constrained = !value.is_null();
        self.bindings
            .insert(binding.to_string(), value, BindingBucket::Matches);
        (binding, constrained)
    }
}
