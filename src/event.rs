use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{
    nodekey::NodeKey,
    properties::{Attribute, NodeKind, Relation},
};

/// A mutation applied to a case by one command. Commands that succeed before a batch aborts keep
/// their events, so callers can tell what the in-memory case already contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseEvent {
    /// Parent, new node, kind
    NodeCreated(NodeKey, NodeKey, NodeKind),
    /// Deleted node, number of nodes removed with it (including itself), references swept
    NodeDeleted(NodeKey, usize, usize),
    /// From, To, references retargeted
    NodeRenamed(NodeKey, NodeKey, usize),
    /// Node, attribute
    AttributeChanged(NodeKey, Attribute),
    /// Owner, relation, target
    ReferenceAdded(NodeKey, Relation, NodeKey),
    /// Owner, removed child, whether the removed detail was an inline declaration
    DetailRemoved(NodeKey, NodeKey, bool),
    /// Node given a freshly generated uuid
    UuidAssigned(NodeKey, String),
}

impl CaseEvent {
    /// True for events that move, add or remove nodes, after which node locations are stale.
    pub fn is_structural(&self) -> bool {
        match self {
            CaseEvent::NodeCreated(..)
            | CaseEvent::NodeDeleted(..)
            | CaseEvent::NodeRenamed(..)
            | CaseEvent::DetailRemoved(..) => true,
            CaseEvent::AttributeChanged(..)
            | CaseEvent::ReferenceAdded(..)
            | CaseEvent::UuidAssigned(..) => false,
        }
    }
}

impl Display for CaseEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            CaseEvent::NodeCreated(parent, id, kind) => {
                write!(f, "NodeCreated({kind} {id} under {parent})")
            }
            CaseEvent::NodeDeleted(id, nodes, swept) => write!(
                f,
                "NodeDeleted({id}, {nodes} node(s), {swept} reference(s) swept)"
            ),
            CaseEvent::NodeRenamed(from, to, refs) => {
                write!(f, "NodeRenamed({from} -> {to}, {refs} reference(s))")
            }
            CaseEvent::AttributeChanged(id, attr) => write!(f, "AttributeChanged({id}.{attr})"),
            CaseEvent::ReferenceAdded(owner, relation, target) => {
                write!(f, "ReferenceAdded({owner} {relation} {target})")
            }
            CaseEvent::DetailRemoved(owner, child, inline) => write!(
                f,
                "DetailRemoved({owner} -/-> {child}{})",
                if *inline { ", inline" } else { "" }
            ),
            CaseEvent::UuidAssigned(id, uuid) => write!(f, "UuidAssigned({id} = {uuid})"),
        }
    }
}
