//! # Questionnaire
//!
//! One accept/reject prompt per axiom, in authored order. Regenerated from
//! the graph on every load; never authored separately.

use crate::{Graph, NodeId};
use serde::{Deserialize, Serialize};

/// A single questionnaire prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireItem {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub axiom_id: NodeId,
    pub category: String,
}

/// Build the questionnaire for every axiom of the graph.
#[must_use]
pub fn build_questionnaire(graph: &Graph) -> Vec<QuestionnaireItem> {
    graph
        .axioms()
        .map(|axiom| QuestionnaireItem {
            id: format!("q_{}", axiom.id),
            text: axiom.title.clone(),
            description: Some(axiom.description.clone()).filter(|d| !d.is_empty()),
            axiom_id: axiom.id.clone(),
            category: axiom.category.clone(),
        })
        .collect()
}
