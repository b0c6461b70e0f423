/// [crate::properties] contains the basic building blocks of an assurance case: node kinds,
/// relations between nodes, and the [Node]/[Detail] tree every document is made of.
use enumset::{enum_set, EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::{error::AssuranceError, nodekey::NodeKey};

/// The six argumentation element kinds. Declaration order is the projection sort order.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(repr = "u32")]
pub enum NodeKind {
    /// A claim to be supported.
    Goal,
    /// The reasoning step that decomposes a goal into sub-goals.
    Strategy,
    /// Evidence that solves a goal.
    Solution,
    Assumption,
    Context,
    Justification,
}

impl NodeKind {
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::Goal,
            NodeKind::Strategy,
            NodeKind::Solution,
            NodeKind::Assumption,
            NodeKind::Context,
            NodeKind::Justification,
        ]
    }

    /// Keyword introducing a node of this kind in source text (`goal G1 { ... }`).
    pub fn keyword(&self) -> &'static str {
        match self {
            NodeKind::Goal => "goal",
            NodeKind::Strategy => "strategy",
            NodeKind::Solution => "solution",
            NodeKind::Assumption => "assumption",
            NodeKind::Context => "context",
            NodeKind::Justification => "justification",
        }
    }

    /// Keyword introducing a namespace whose root nodes are of this kind (`GOALS ns { ... }`).
    pub fn namespace_keyword(&self) -> &'static str {
        match self {
            NodeKind::Goal => "GOALS",
            NodeKind::Strategy => "STRATEGIES",
            NodeKind::Solution => "SOLUTIONS",
            NodeKind::Assumption => "ASSUMPTIONS",
            NodeKind::Context => "CONTEXTS",
            NodeKind::Justification => "JUSTIFICATIONS",
        }
    }

    pub fn from_keyword(word: &str) -> Option<NodeKind> {
        NodeKind::all().iter().copied().find(|k| k.keyword() == word)
    }

    pub fn from_namespace_keyword(word: &str) -> Option<NodeKind> {
        NodeKind::all()
            .iter()
            .copied()
            .find(|k| k.namespace_keyword() == word)
    }

    /// The relation an inline child of this kind has to its owner.
    pub fn default_relation(&self) -> Relation {
        match self {
            NodeKind::Goal | NodeKind::Strategy | NodeKind::Solution => Relation::SolvedBy,
            NodeKind::Assumption | NodeKind::Context | NodeKind::Justification => {
                Relation::InContextOf
            }
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for NodeKind {
    type Err = AssuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::all()
            .iter()
            .copied()
            .find(|k| k.keyword().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AssuranceError::InvalidAttribute(format!(
                    "Invalid node type \"{s}\", must be one of {}",
                    NodeKind::all()
                        .iter()
                        .map(|k| k.to_string())
                        .collect::<Vec<String>>()
                        .join(", ")
                ))
            })
    }
}

/// Relation kind tagging a [Detail].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "solvedBy", alias = "supportedBy")]
    SolvedBy,
    #[serde(rename = "inContextOf")]
    InContextOf,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::SolvedBy => "solvedBy",
            Relation::InContextOf => "inContextOf",
        }
    }

    fn owners(&self) -> EnumSet<NodeKind> {
        enum_set!(NodeKind::Goal | NodeKind::Strategy)
    }

    fn targets(&self, owner: NodeKind) -> EnumSet<NodeKind> {
        match (self, owner) {
            (Relation::SolvedBy, NodeKind::Goal) => {
                enum_set!(NodeKind::Goal | NodeKind::Strategy | NodeKind::Solution)
            }
            (Relation::SolvedBy, NodeKind::Strategy) => enum_set!(NodeKind::Goal),
            (Relation::InContextOf, _) => {
                enum_set!(NodeKind::Assumption | NodeKind::Context | NodeKind::Justification)
            }
            _ => EnumSet::empty(),
        }
    }

    /// Checks that an `owner` node may hold this relation to a `target` node.
    pub fn validate(&self, owner: NodeKind, target: NodeKind) -> Result<(), AssuranceError> {
        if !self.owners().contains(owner) {
            return Err(AssuranceError::InvalidRelation(format!(
                "a {owner} cannot own {} relations",
                self.as_str()
            )));
        }
        if !self.targets(owner).contains(target) {
            return Err(AssuranceError::InvalidRelation(format!(
                "a {owner} cannot be {} a {target}",
                self.as_str()
            )));
        }
        Ok(())
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Relation {
    type Err = AssuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "solvedBy" | "supportedBy" => Ok(Relation::SolvedBy),
            "inContextOf" => Ok(Relation::InContextOf),
            other => Err(AssuranceError::InvalidRelation(format!(
                "unknown relation type \"{other}\", must be solvedBy or inContextOf"
            ))),
        }
    }
}

/// Review status carried by Solution nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolutionStatus {
    NotReviewed,
    Approved,
    Disapproved,
}

impl Display for SolutionStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for SolutionStatus {
    type Err = AssuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NotReviewed" => Ok(SolutionStatus::NotReviewed),
            "Approved" => Ok(SolutionStatus::Approved),
            "Disapproved" => Ok(SolutionStatus::Disapproved),
            other => Err(AssuranceError::InvalidAttribute(format!(
                "unknown status \"{other}\", must be NotReviewed, Approved or Disapproved"
            ))),
        }
    }
}

/// The finite set of node attributes an editor may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Name,
    Uuid,
    Summary,
    Info,
    Labels,
    Artifacts,
    Status,
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            Attribute::Name => "name",
            Attribute::Uuid => "uuid",
            Attribute::Summary => "summary",
            Attribute::Info => "info",
            Attribute::Labels => "labels",
            Attribute::Artifacts => "artifacts",
            Attribute::Status => "status",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Attribute {
    type Err = AssuranceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Attribute::Name),
            "uuid" => Ok(Attribute::Uuid),
            "summary" => Ok(Attribute::Summary),
            "info" | "description" => Ok(Attribute::Info),
            "labels" => Ok(Attribute::Labels),
            "artifacts" => Ok(Attribute::Artifacts),
            "status" => Ok(Attribute::Status),
            other => Err(AssuranceError::InvalidAttribute(format!(
                "unknown attribute \"{other}\""
            ))),
        }
    }
}

/// Where a node was declared in its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// 1-based line of the node keyword.
    pub line: usize,
}

/// A non-owning, relation-tagged pointer to another node's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub relation: Relation,
    pub target: NodeKey,
}

/// An ordered child entry of a [Node].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Detail {
    /// Owns an inline child node.
    Declaration(Node),
    Reference(Reference),
}

impl Detail {
    pub fn relation(&self) -> Relation {
        match self {
            Detail::Declaration(child) => child.kind.default_relation(),
            Detail::Reference(reference) => reference.relation,
        }
    }

    /// The identifier this detail points at, given the identifier of the node that holds it.
    pub fn target(&self, owner: &NodeKey) -> NodeKey {
        match self {
            Detail::Declaration(child) => owner.child(&child.name),
            Detail::Reference(reference) => reference.target.clone(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self, Detail::Declaration(_))
    }
}

/// A typed argumentation element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    /// Persisted stable identifier, assigned lazily.
    pub uuid: Option<String>,
    pub summary: Option<String>,
    pub info: Option<String>,
    /// Ordered set; see [Node::set_labels].
    pub labels: Vec<String>,
    pub artifacts: Vec<String>,
    pub status: Option<SolutionStatus>,
    pub details: Vec<Detail>,
    #[serde(skip)]
    pub position: Option<SourcePosition>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Node {
        Node {
            kind,
            name: name.into(),
            uuid: None,
            summary: None,
            info: None,
            labels: Vec::new(),
            artifacts: Vec::new(),
            status: None,
            details: Vec::new(),
            position: None,
        }
    }

    /// Replace the labels, keeping the first occurrence of each.
    pub fn set_labels<I: IntoIterator<Item = String>>(&mut self, labels: I) {
        self.labels.clear();
        for label in labels {
            if !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Node> {
        self.details.iter().filter_map(|d| match d {
            Detail::Declaration(child) => Some(child),
            Detail::Reference(_) => None,
        })
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.details.iter().filter_map(|d| match d {
            Detail::Reference(reference) => Some(reference),
            Detail::Declaration(_) => None,
        })
    }

    /// Visit this node and every inline descendant, depth first, with their identifiers.
    pub fn walk<'a>(&'a self, id: NodeKey, visit: &mut impl FnMut(&NodeKey, &'a Node)) {
        visit(&id, self);
        for child in self.declarations() {
            child.walk(id.child(&child.name), visit);
        }
    }

    pub fn walk_mut(&mut self, id: NodeKey, visit: &mut impl FnMut(&NodeKey, &mut Node)) {
        visit(&id, self);
        for detail in self.details.iter_mut() {
            if let Detail::Declaration(child) = detail {
                let child_id = id.child(&child.name);
                child.walk_mut(child_id, visit);
            }
        }
    }
}
