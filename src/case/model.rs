use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    nodekey::NodeKey,
    properties::{Detail, Node, NodeKind, SourcePosition},
};

/// A namespace block inside a document (`GOALS ns { ... }`), owning its top-level nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub kind: NodeKind,
    pub name: String,
    pub nodes: Vec<Node>,
    #[serde(skip)]
    pub position: Option<SourcePosition>,
}

impl Definition {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Definition {
        Definition {
            kind,
            name: name.into(),
            nodes: Vec::new(),
            position: None,
        }
    }
}

/// One source file of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    pub definitions: Vec<Definition>,
}

impl Document {
    pub fn new(path: impl AsRef<Path>) -> Document {
        Document {
            path: path.as_ref().to_path_buf(),
            definitions: Vec::new(),
        }
    }

    /// Top-level declared nodes, in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.definitions.iter().flat_map(|d| d.nodes.iter())
    }
}

/// Where a node lives: document, definition, then the index chain through top-level nodes and
/// declaration details.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeLocation {
    pub document: usize,
    pub definition: usize,
    /// `path[0]` indexes the definition's nodes, every further entry indexes a `details` list.
    pub path: Vec<usize>,
}

impl NodeLocation {
    pub fn parent(&self) -> Option<NodeLocation> {
        if self.path.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.path.pop();
        Some(parent)
    }
}

/// Every document loaded from one model directory. Built fresh for each request and passed by
/// ownership through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Case {
    pub root: PathBuf,
    pub documents: Vec<Document>,
}

impl Case {
    pub fn new(root: impl AsRef<Path>, documents: Vec<Document>) -> Case {
        Case {
            root: root.as_ref().to_path_buf(),
            documents,
        }
    }

    pub fn node(&self, loc: &NodeLocation) -> Option<&Node> {
        let (first, rest) = loc.path.split_first()?;
        let mut node = self
            .documents
            .get(loc.document)?
            .definitions
            .get(loc.definition)?
            .nodes
            .get(*first)?;
        for idx in rest {
            node = match node.details.get(*idx)? {
                Detail::Declaration(child) => child,
                Detail::Reference(_) => return None,
            };
        }
        Some(node)
    }

    pub fn node_mut(&mut self, loc: &NodeLocation) -> Option<&mut Node> {
        let (first, rest) = loc.path.split_first()?;
        let mut node = self
            .documents
            .get_mut(loc.document)?
            .definitions
            .get_mut(loc.definition)?
            .nodes
            .get_mut(*first)?;
        for idx in rest {
            node = match node.details.get_mut(*idx)? {
                Detail::Declaration(child) => child,
                Detail::Reference(_) => return None,
            };
        }
        Some(node)
    }

    /// Detach the node at `loc` from its owner, returning it with its inline subtree.
    pub fn remove_node(&mut self, loc: &NodeLocation) -> Option<Node> {
        let (last, _) = loc.path.split_last()?;
        match loc.parent() {
            None => {
                let nodes = &mut self
                    .documents
                    .get_mut(loc.document)?
                    .definitions
                    .get_mut(loc.definition)?
                    .nodes;
                (*last < nodes.len()).then(|| nodes.remove(*last))
            }
            Some(parent_loc) => {
                let parent = self.node_mut(&parent_loc)?;
                if !matches!(parent.details.get(*last), Some(Detail::Declaration(_))) {
                    return None;
                }
                match parent.details.remove(*last) {
                    Detail::Declaration(node) => Some(node),
                    Detail::Reference(_) => None,
                }
            }
        }
    }

    pub fn document_path(&self, loc: &NodeLocation) -> Option<&Path> {
        self.documents.get(loc.document).map(|d| d.path.as_path())
    }

    /// Visit every node of the case with its identifier and location, in document order and
    /// depth first within each document.
    pub fn visit<'a>(&'a self, visit: &mut impl FnMut(&NodeKey, &'a Node, &NodeLocation)) {
        for (doc_idx, doc) in self.documents.iter().enumerate() {
            for (def_idx, def) in doc.definitions.iter().enumerate() {
                for (node_idx, node) in def.nodes.iter().enumerate() {
                    let mut loc = NodeLocation {
                        document: doc_idx,
                        definition: def_idx,
                        path: vec![node_idx],
                    };
                    visit_node(node, NodeKey::root(&def.name, &node.name), &mut loc, visit);
                }
            }
        }
    }

    /// Mutable visit over every node with its identifier, same order as [Case::visit].
    pub fn visit_mut(&mut self, visit: &mut impl FnMut(&NodeKey, &mut Node)) {
        for doc in self.documents.iter_mut() {
            for def in doc.definitions.iter_mut() {
                let namespace = def.name.clone();
                for node in def.nodes.iter_mut() {
                    let id = NodeKey::root(&namespace, &node.name);
                    node.walk_mut(id, visit);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_, _, _| count += 1);
        count
    }
}

fn visit_node<'a>(
    node: &'a Node,
    id: NodeKey,
    loc: &mut NodeLocation,
    visit: &mut impl FnMut(&NodeKey, &'a Node, &NodeLocation),
) {
    visit(&id, node, loc);
    for (idx, detail) in node.details.iter().enumerate() {
        if let Detail::Declaration(child) = detail {
            loc.path.push(idx);
            visit_node(child, id.child(&child.name), loc, visit);
            loc.path.pop();
        }
    }
}
