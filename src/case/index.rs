use std::collections::{BTreeMap, HashMap};

use crate::{
    case::{Case, NodeLocation},
    error::AssuranceError,
    nodekey::NodeKey,
    properties::NodeKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub location: NodeLocation,
    pub kind: NodeKind,
}

/// Case-wide map from node identifier to node location.
///
/// Node identifiers must be unique across the whole case: [Index::build] fails with
/// [AssuranceError::Duplicate] when two nodes share a qualified path or a persisted uuid, rather
/// than letting one silently shadow the other. Locations are positional, so the index must be
/// rebuilt after any structural mutation of the case.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: BTreeMap<NodeKey, IndexEntry>,
    uuids: HashMap<String, NodeKey>,
}

impl Index {
    #[tracing::instrument(skip_all, fields(documents = case.documents.len()))]
    pub fn build(case: &Case) -> Result<Index, AssuranceError> {
        let mut index = Index::default();
        let mut first_error: Option<AssuranceError> = None;
        case.visit(&mut |id, node, loc| {
            if first_error.is_some() {
                return;
            }
            if let Some(existing) = index.entries.get(id) {
                first_error = Some(AssuranceError::Duplicate(format!(
                    "{id} is declared in both {} and {}",
                    display_path(case, &existing.location),
                    display_path(case, loc),
                )));
                return;
            }
            if let Some(uuid) = node.uuid.as_ref() {
                if let Some(holder) = index.uuids.get(uuid) {
                    first_error = Some(AssuranceError::Duplicate(format!(
                        "uuid {uuid} is shared by {holder} and {id}"
                    )));
                    return;
                }
                index.uuids.insert(uuid.clone(), id.clone());
            }
            index.entries.insert(
                id.clone(),
                IndexEntry {
                    location: loc.clone(),
                    kind: node.kind,
                },
            );
        });
        if let Some(err) = first_error {
            return Err(err);
        }
        tracing::debug!("indexed {} nodes", index.entries.len());
        Ok(index)
    }

    pub fn get(&self, key: &NodeKey) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    /// Look a node up by qualified path, falling back to its persisted uuid.
    pub fn resolve(&self, key: &str) -> Option<(&NodeKey, &IndexEntry)> {
        let key = key.trim();
        self.entries
            .get_key_value(&NodeKey::from(key))
            .or_else(|| {
                self.uuids
                    .get(key)
                    .and_then(|path| self.entries.get_key_value(path))
            })
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.entries.keys()
    }

    /// `ancestor` and every node declared inside it.
    pub fn within<'a>(&'a self, ancestor: &'a NodeKey) -> impl Iterator<Item = &'a NodeKey> {
        self.entries
            .range(ancestor.clone()..)
            .map(|(key, _)| key)
            .take_while(move |key| key.as_str().starts_with(ancestor.as_str()))
            .filter(move |key| key.is_within(ancestor))
    }
}

fn display_path(case: &Case, loc: &NodeLocation) -> String {
    case.document_path(loc)
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
