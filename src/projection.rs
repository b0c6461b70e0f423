//! The flat JSON view of a case the editor renders.
//!
//! [project] is pure: the same case always yields the same records in the same order, sorted by
//! node kind (declaration order of [NodeKind]) and then by identifier. Nothing depends on the
//! order documents were loaded in.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    case::Case,
    error::AssuranceError,
    nodekey::NodeKey,
    properties::{Detail, Node, NodeKind, Relation, SolutionStatus},
};

/// One entry of a node's ordered details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedDetail {
    pub relation_type: Relation,
    pub child_id: NodeKey,
    /// True for an inline declaration, false for a reference.
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedNode {
    pub id: NodeKey,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SolutionStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub details: Vec<ProjectedDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solved_by: Vec<NodeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_context_of: Vec<NodeKey>,
}

/// The uuid the editor sees: the persisted one, or one derived from the identifier so that
/// repeated projections of an unchanged case agree.
pub fn display_uuid(id: &NodeKey, node: &Node) -> String {
    match node.uuid.as_ref() {
        Some(uuid) => uuid.clone(),
        None => Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_str().as_bytes()).to_string(),
    }
}

fn project_node(id: &NodeKey, node: &Node) -> ProjectedNode {
    let mut record = ProjectedNode {
        id: id.clone(),
        name: node.name.clone(),
        kind: node.kind,
        uuid: display_uuid(id, node),
        summary: node.summary.clone(),
        info: node.info.clone(),
        status: node.status,
        labels: node.labels.clone(),
        artifacts: node.artifacts.clone(),
        details: Vec::with_capacity(node.details.len()),
        solved_by: Vec::new(),
        in_context_of: Vec::new(),
    };
    for detail in node.details.iter() {
        let child_id = detail.target(id);
        match detail.relation() {
            Relation::SolvedBy => record.solved_by.push(child_id.clone()),
            Relation::InContextOf => record.in_context_of.push(child_id.clone()),
        }
        record.details.push(ProjectedDetail {
            relation_type: detail.relation(),
            child_id,
            inline: matches!(detail, Detail::Declaration(_)),
        });
    }
    record
}

/// One record per node of the case, sorted by (kind, id).
#[tracing::instrument(skip_all, fields(documents = case.documents.len()))]
pub fn project(case: &Case) -> Vec<ProjectedNode> {
    let mut records = Vec::new();
    case.visit(&mut |id, node, _| records.push(project_node(id, node)));
    records.sort_by(|a, b| (a.kind, &a.id).cmp(&(b.kind, &b.id)));
    records
}

/// Compact JSON, as returned to the editor.
pub fn to_json(records: &[ProjectedNode]) -> Result<String, AssuranceError> {
    Ok(serde_json::to_string(records)?)
}

/// Indented JSON, as written to the model file.
pub fn to_pretty_json(records: &[ProjectedNode], indent: usize) -> Result<String, AssuranceError> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| AssuranceError::Codec(format!("projection is not UTF-8: {e}")))
}
