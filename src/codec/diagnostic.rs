//! Diagnostic types for document parsing and reference resolution.
//!
//! Dangling references are diagnostics, not errors: a case whose documents point at a node that
//! no longer exists still loads, projects and saves. The resolver reports them so they can be
//! logged and surfaced without aborting the request.

use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use crate::{nodekey::NodeKey, properties::Relation};

/// A reference whose target identifier is not present in the identity index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Document holding the reference.
    pub path: PathBuf,
    /// Node whose details contain the reference.
    pub owner: NodeKey,
    pub relation: Relation,
    /// The identifier that could not be resolved.
    pub target: NodeKey,
    /// Line of the owning node in the source file, when known.
    pub line: Option<usize>,
}

impl Display for UnresolvedReference {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} does not resolve",
            self.owner, self.relation, self.target
        )?;
        match self.line {
            Some(line) => write!(f, " ({}:{line})", self.path.display()),
            None => write!(f, " ({})", self.path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    UnresolvedReference(UnresolvedReference),
    /// A per-document problem that was recovered from locally.
    Warning(PathBuf, String),
}

impl Display for ParseDiagnostic {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ParseDiagnostic::UnresolvedReference(unresolved) => write!(f, "{unresolved}"),
            ParseDiagnostic::Warning(path, msg) => write!(f, "{}: {msg}", path.display()),
        }
    }
}
