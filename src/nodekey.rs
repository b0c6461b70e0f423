//! Node identifiers.
//!
//! A [NodeKey] is the qualified path of a node: its namespace followed by the names of every
//! declaring ancestor and finally its own name, joined by `/` (`ns/G1/S1`). This is the form
//! the editor sends in commands and receives in the projection. Source text spells the same
//! identifier with dots (`ns.G1.S1`).
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::AssuranceError;

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").expect("valid name regex"));

pub const NAME_HINT: &str = "must start with a letter ('a'..'z'|'A'..'Z') or underscore '_' followed by any number of letters, underscores and numbers ('0'..'9')";

pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Node names, namespace names and labels share one lexical rule.
pub fn check_name(what: &str, name: &str) -> Result<(), AssuranceError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(AssuranceError::InvalidAttribute(format!(
            "{what} \"{name}\" {NAME_HINT}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn root(namespace: &str, name: &str) -> NodeKey {
        NodeKey(format!("{namespace}/{name}"))
    }

    pub fn child(&self, name: &str) -> NodeKey {
        NodeKey(format!("{}/{name}", self.0))
    }

    /// Parse the dotted source-text spelling.
    pub fn from_dotted(dotted: &str) -> NodeKey {
        NodeKey(dotted.trim().replace('.', "/"))
    }

    pub fn to_dotted(&self) -> String {
        self.0.replace('/', ".")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn namespace(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .filter(|parent| parent.contains('/'))
            .map(|parent| NodeKey(parent.to_string()))
    }

    /// True when `self` is `ancestor` or declared (transitively) inside it.
    pub fn is_within(&self, ancestor: &NodeKey) -> bool {
        self.0 == ancestor.0
            || (self.0.starts_with(&ancestor.0) && self.0[ancestor.0.len()..].starts_with('/'))
    }

    /// Re-root `self` from under `from` to under `to`. Returns None when `self` is not within
    /// `from`.
    pub fn rebase(&self, from: &NodeKey, to: &NodeKey) -> Option<NodeKey> {
        if !self.is_within(from) {
            return None;
        }
        Some(NodeKey(format!("{}{}", to.0, &self.0[from.0.len()..])))
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey(s.trim().to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey::from(s.as_str())
    }
}

impl AsRef<str> for NodeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_and_dotted_form() {
        let key = NodeKey::root("ns", "G1").child("S1");
        assert_eq!(key.as_str(), "ns/G1/S1");
        assert_eq!(key.to_dotted(), "ns.G1.S1");
        assert_eq!(NodeKey::from_dotted("ns.G1.S1"), key);
        assert_eq!(key.name(), "S1");
        assert_eq!(key.namespace(), "ns");
        assert_eq!(key.parent(), Some(NodeKey::from("ns/G1")));
        assert_eq!(NodeKey::from("ns/G1").parent(), None);
    }

    #[test]
    fn rebase_only_touches_descendants() {
        let from = NodeKey::from("ns/G1");
        let to = NodeKey::from("ns/Top");
        assert_eq!(
            NodeKey::from("ns/G1/S1").rebase(&from, &to),
            Some(NodeKey::from("ns/Top/S1"))
        );
        assert_eq!(NodeKey::from("ns/G10").rebase(&from, &to), None);
    }

    #[test]
    fn name_rule() {
        assert!(is_valid_name("_G1"));
        assert!(!is_valid_name("1G"));
        assert!(!is_valid_name("G-1"));
        assert!(check_name("Node name", "G 1").is_err());
    }
}
