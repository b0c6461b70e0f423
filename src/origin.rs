use serde::{Deserialize, Serialize};

use crate::{
    case::{Case, Index},
    error::AssuranceError,
};

/// Where a node is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub file_path: String,
    /// 1-based.
    pub line_number: usize,
}

/// Map a node identifier (path or uuid) to its source file and line. Nodes whose codec recorded
/// no position report the line of their closest positioned ancestor, then of their namespace
/// block, then line 1.
pub fn locate(case: &Case, index: &Index, node_id: &str) -> Result<Origin, AssuranceError> {
    let (_, entry) = index.resolve(node_id).ok_or_else(|| {
        AssuranceError::Lookup(format!("Could not find node at path : {node_id}"))
    })?;
    let mut location = Some(entry.location.clone());
    let mut line = None;
    while let Some(loc) = location {
        line = case.node(&loc).and_then(|node| node.position).map(|p| p.line);
        if line.is_some() {
            break;
        }
        location = loc.parent();
    }
    let line_number = line
        .or_else(|| {
            case.documents
                .get(entry.location.document)
                .and_then(|doc| doc.definitions.get(entry.location.definition))
                .and_then(|def| def.position)
                .map(|p| p.line)
        })
        .unwrap_or(1);
    let file_path = case
        .document_path(&entry.location)
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    Ok(Origin {
        file_path,
        line_number,
    })
}
