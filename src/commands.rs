//! Editor commands and the interpreter that applies them to a [Case].
//!
//! A batch is an ordered list of command objects, applied strictly in order because later
//! commands may address nodes created by earlier ones. The first failure aborts the batch.
//! Batches are not transactional: commands applied before the failure stay applied to the
//! in-memory case, and [CommandInterpreter::applied] reports them.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

use crate::{
    case::{resolve, Case, Index, NodeLocation},
    codec::diagnostic::ParseDiagnostic,
    error::AssuranceError,
    event::CaseEvent,
    nodekey::{check_name, NodeKey},
    properties::{Attribute, Detail, Node, NodeKind, Reference, Relation, SolutionStatus},
};

/// One editor command, tagged by its `cmd` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    OnAttributeChange {
        node_id: String,
        attr: String,
        #[serde(default)]
        new_value: Value,
    },
    #[serde(rename_all = "camelCase")]
    OnNewChildNode {
        node_id: String,
        child_type: String,
        child_name: String,
        #[serde(default)]
        relation_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    OnNewChildRef {
        node_id: String,
        child_id: String,
        #[serde(default)]
        relation_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    OnRemoveChildNode { node_id: String, child_id: String },
    #[serde(rename_all = "camelCase")]
    OnRemoveChildRef { node_id: String, child_id: String },
    #[serde(rename_all = "camelCase")]
    OnDeleteNode { node_id: String },
}

const COMMAND_NAMES: [&str; 6] = [
    "onAttributeChange",
    "onNewChildNode",
    "onNewChildRef",
    "onRemoveChildNode",
    "onRemoveChildRef",
    "onDeleteNode",
];

impl Command {
    /// Decode one element of a `commandList`. An unrecognized `cmd` is an
    /// [AssuranceError::UnknownCommand]; anything else malformed is a [AssuranceError::Parse].
    pub fn from_value(value: Value) -> Result<Command, AssuranceError> {
        let cmd = value
            .get("cmd")
            .and_then(Value::as_str)
            .ok_or_else(|| AssuranceError::Parse(format!("command without a cmd field: {value}")))?;
        if !COMMAND_NAMES.contains(&cmd) {
            return Err(AssuranceError::UnknownCommand(cmd.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn node_id(&self) -> &str {
        match self {
            Command::OnAttributeChange { node_id, .. }
            | Command::OnNewChildNode { node_id, .. }
            | Command::OnNewChildRef { node_id, .. }
            | Command::OnRemoveChildNode { node_id, .. }
            | Command::OnRemoveChildRef { node_id, .. }
            | Command::OnDeleteNode { node_id } => node_id,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Command::OnAttributeChange { node_id, attr, .. } => {
                write!(f, "onAttributeChange({node_id}.{attr})")
            }
            Command::OnNewChildNode {
                node_id,
                child_type,
                child_name,
                ..
            } => write!(f, "onNewChildNode({node_id} + {child_type} {child_name})"),
            Command::OnNewChildRef {
                node_id, child_id, ..
            } => write!(f, "onNewChildRef({node_id} -> {child_id})"),
            Command::OnRemoveChildNode { node_id, child_id } => {
                write!(f, "onRemoveChildNode({node_id} -/-> {child_id})")
            }
            Command::OnRemoveChildRef { node_id, child_id } => {
                write!(f, "onRemoveChildRef({node_id} -/-> {child_id})")
            }
            Command::OnDeleteNode { node_id } => write!(f, "onDeleteNode({node_id})"),
        }
    }
}

/// A resolved node address, copied out of the index so the case can be mutated.
struct Target {
    key: NodeKey,
    location: NodeLocation,
    kind: NodeKind,
}

/// Applies commands to an owned [Case], keeping its [Index] current.
#[derive(Debug)]
pub struct CommandInterpreter {
    case: Case,
    index: Index,
    applied: Vec<CaseEvent>,
    warnings: Vec<ParseDiagnostic>,
}

impl CommandInterpreter {
    /// Fails with [AssuranceError::Duplicate] when the case violates identifier uniqueness.
    pub fn new(case: Case) -> Result<CommandInterpreter, AssuranceError> {
        let index = Index::build(&case)?;
        Ok(CommandInterpreter {
            case,
            index,
            applied: Vec::new(),
            warnings: Vec::new(),
        })
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn into_case(self) -> Case {
        self.case
    }

    /// References that did not resolve after the most recent attribute change.
    pub fn warnings(&self) -> &[ParseDiagnostic] {
        &self.warnings
    }

    /// Events for every command applied so far, in order.
    pub fn applied(&self) -> &[CaseEvent] {
        &self.applied
    }

    /// Decode and apply each command in order, stopping at the first failure.
    pub fn apply_all<I>(&mut self, commands: I) -> Result<(), AssuranceError>
    where
        I: IntoIterator<Item = Value>,
    {
        for (idx, value) in commands.into_iter().enumerate() {
            let command = Command::from_value(value)?;
            if let Err(err) = self.apply(&command) {
                tracing::warn!("command #{} {command} failed: {err}", idx + 1);
                return Err(err);
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(command = %command))]
    pub fn apply(&mut self, command: &Command) -> Result<CaseEvent, AssuranceError> {
        let node = self.target(command.node_id(), AssuranceError::node_not_found)?;
        let event = match command {
            Command::OnAttributeChange {
                attr, new_value, ..
            } => self.set_attribute(&node, attr.parse()?, new_value)?,
            Command::OnNewChildNode {
                child_type,
                child_name,
                relation_type,
                ..
            } => self.new_child_node(&node, child_type, child_name, relation_type.as_deref())?,
            Command::OnNewChildRef {
                child_id,
                relation_type,
                ..
            } => self.new_child_ref(&node, child_id, relation_type.as_deref())?,
            Command::OnRemoveChildNode { child_id, .. }
            | Command::OnRemoveChildRef { child_id, .. } => self.remove_child(&node, child_id)?,
            Command::OnDeleteNode { .. } => self.delete_node(&node)?,
        };
        if event.is_structural() {
            self.index = Index::build(&self.case)?;
        }
        self.warnings = match &event {
            CaseEvent::NodeRenamed(_, to, _) => self.refresh_references(to),
            CaseEvent::AttributeChanged(key, _) => self.refresh_references(key),
            _ => Vec::new(),
        };
        tracing::debug!("{event}");
        self.applied.push(event.clone());
        Ok(event)
    }

    fn target(
        &self,
        id: &str,
        not_found: fn(&str) -> AssuranceError,
    ) -> Result<Target, AssuranceError> {
        self.index
            .resolve(id)
            .map(|(key, entry)| Target {
                key: key.clone(),
                location: entry.location.clone(),
                kind: entry.kind,
            })
            .ok_or_else(|| not_found(id))
    }

    fn node_mut(&mut self, target: &Target) -> Result<&mut Node, AssuranceError> {
        self.case
            .node_mut(&target.location)
            .ok_or_else(|| AssuranceError::node_not_found(target.key.as_str()))
    }

    fn set_attribute(
        &mut self,
        target: &Target,
        attr: Attribute,
        value: &Value,
    ) -> Result<CaseEvent, AssuranceError> {
        match attr {
            Attribute::Name => return self.rename(target, &required_text(attr, value)?),
            Attribute::Uuid => {
                let uuid = optional_text(attr, value)?
                    .map(|raw| uuid::Uuid::parse_str(raw.trim()).map(|u| u.to_string()))
                    .transpose()?;
                if let Some(uuid) = uuid.as_ref() {
                    if let Some((holder, _)) = self.index.resolve(uuid) {
                        if holder != &target.key {
                            return Err(AssuranceError::Duplicate(format!(
                                "uuid {uuid} already belongs to {holder}"
                            )));
                        }
                    }
                }
                self.node_mut(target)?.uuid = uuid;
                self.index = Index::build(&self.case)?;
            }
            Attribute::Summary => self.node_mut(target)?.summary = block_text(attr, value)?,
            Attribute::Info => self.node_mut(target)?.info = block_text(attr, value)?,
            Attribute::Labels => {
                let labels = text_list(attr, value)?;
                for label in labels.iter() {
                    check_name("Label", label)?;
                }
                self.node_mut(target)?.set_labels(labels);
            }
            Attribute::Artifacts => {
                let artifacts = text_list(attr, value)?;
                if let Some(bad) = artifacts.iter().find(|a| a.contains('"') || a.contains('\n')) {
                    return Err(AssuranceError::InvalidAttribute(format!(
                        "artifact {bad:?} may not contain quotes or line breaks"
                    )));
                }
                self.node_mut(target)?.artifacts = artifacts;
            }
            Attribute::Status => {
                if target.kind != NodeKind::Solution {
                    return Err(AssuranceError::InvalidAttribute(format!(
                        "status can only be set on a Solution, {} is a {}",
                        target.key, target.kind
                    )));
                }
                let status = optional_text(attr, value)?
                    .map(|s| s.parse::<SolutionStatus>())
                    .transpose()?;
                self.node_mut(target)?.status = status;
            }
        }
        Ok(CaseEvent::AttributeChanged(target.key.clone(), attr))
    }

    fn rename(&mut self, target: &Target, name: &str) -> Result<CaseEvent, AssuranceError> {
        let name = name.trim();
        check_name("Node name", name)?;
        if name == target.key.name() {
            return Ok(CaseEvent::AttributeChanged(
                target.key.clone(),
                Attribute::Name,
            ));
        }
        let renamed = match target.key.parent() {
            Some(parent) => parent.child(name),
            None => NodeKey::root(target.key.namespace(), name),
        };
        if self.index.contains(&renamed) {
            return Err(AssuranceError::Duplicate(format!(
                "cannot rename {} to {name}: {renamed} already exists",
                target.key
            )));
        }
        self.node_mut(target)?.name = name.to_string();
        let retargeted = resolve::retarget(&mut self.case, &target.key, &renamed);
        Ok(CaseEvent::NodeRenamed(
            target.key.clone(),
            renamed,
            retargeted,
        ))
    }

    /// Check references reachable from the changed node and report who points at it. Nothing
    /// here fails the command.
    fn refresh_references(&self, key: &NodeKey) -> Vec<ParseDiagnostic> {
        let diagnostics = resolve::resolve_from(&self.case, &self.index, key);
        for diagnostic in diagnostics.iter() {
            tracing::warn!("{diagnostic}");
        }
        let usages = resolve::reverse_usages(&self.case, key);
        tracing::debug!("{} reference(s) target {key}", usages.len());
        diagnostics
    }

    fn new_child_node(
        &mut self,
        parent: &Target,
        child_type: &str,
        child_name: &str,
        relation_type: Option<&str>,
    ) -> Result<CaseEvent, AssuranceError> {
        let kind: NodeKind = child_type.parse()?;
        let child_name = child_name.trim();
        check_name("Node name", child_name)?;
        let relation = match relation_type {
            Some(relation) => relation.parse::<Relation>()?,
            None => kind.default_relation(),
        };
        relation.validate(parent.kind, kind)?;
        let key = parent.key.child(child_name);
        if self.index.contains(&key) {
            return Err(AssuranceError::Duplicate(format!("{key} already exists")));
        }
        self.node_mut(parent)?
            .details
            .push(Detail::Declaration(Node::new(kind, child_name)));
        Ok(CaseEvent::NodeCreated(parent.key.clone(), key, kind))
    }

    fn new_child_ref(
        &mut self,
        parent: &Target,
        child_id: &str,
        relation_type: Option<&str>,
    ) -> Result<CaseEvent, AssuranceError> {
        let child = self.target(child_id, AssuranceError::child_not_found)?;
        let relation = match relation_type {
            Some(relation) => relation.parse::<Relation>()?,
            None => child.kind.default_relation(),
        };
        relation.validate(parent.kind, child.kind)?;
        if child.key == parent.key {
            return Err(AssuranceError::InvalidRelation(format!(
                "{} cannot reference itself",
                parent.key
            )));
        }
        let owner = self.node_mut(parent)?;
        if owner
            .details
            .iter()
            .any(|d| d.relation() == relation && d.target(&parent.key) == child.key)
        {
            return Err(AssuranceError::Duplicate(format!(
                "{} is already {relation} {}",
                parent.key, child.key
            )));
        }
        owner.details.push(Detail::Reference(Reference {
            relation,
            target: child.key.clone(),
        }));
        Ok(CaseEvent::ReferenceAdded(
            parent.key.clone(),
            relation,
            child.key,
        ))
    }

    /// Shared by `onRemoveChildNode` and `onRemoveChildRef`: removes whichever detail of the
    /// parent points at the child. Removing an inline declaration removes the declared subtree
    /// and sweeps references to it.
    fn remove_child(
        &mut self,
        parent: &Target,
        child_id: &str,
    ) -> Result<CaseEvent, AssuranceError> {
        let child = self.target(child_id, AssuranceError::child_not_found)?;
        let owner = self.node_mut(parent)?;
        let position = owner
            .details
            .iter()
            .position(|d| d.target(&parent.key) == child.key)
            .ok_or_else(|| {
                AssuranceError::Lookup(format!("{} is not a child of {}", child.key, parent.key))
            })?;
        let inline = owner.details.remove(position).is_declaration();
        if inline {
            let swept = resolve::sweep(&mut self.case, &child.key);
            tracing::debug!("removed inline {}, swept {swept} reference(s)", child.key);
        }
        Ok(CaseEvent::DetailRemoved(
            parent.key.clone(),
            child.key,
            inline,
        ))
    }

    fn delete_node(&mut self, target: &Target) -> Result<CaseEvent, AssuranceError> {
        let removed = self
            .case
            .remove_node(&target.location)
            .ok_or_else(|| AssuranceError::node_not_found(target.key.as_str()))?;
        let mut count = 0;
        removed.walk(target.key.clone(), &mut |_, _| count += 1);
        let swept = resolve::sweep(&mut self.case, &target.key);
        Ok(CaseEvent::NodeDeleted(target.key.clone(), count, swept))
    }
}

fn optional_text(attr: Attribute, value: &Value) -> Result<Option<String>, AssuranceError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(AssuranceError::InvalidAttribute(format!(
            "{attr} expects a string, got {other}"
        ))),
    }
}

fn required_text(attr: Attribute, value: &Value) -> Result<String, AssuranceError> {
    optional_text(attr, value)?
        .ok_or_else(|| AssuranceError::InvalidAttribute(format!("{attr} cannot be cleared")))
}

/// Summary and info are written as `'''` text blocks, so they may not contain the delimiter.
fn block_text(attr: Attribute, value: &Value) -> Result<Option<String>, AssuranceError> {
    let text = optional_text(attr, value)?;
    if text.as_deref().is_some_and(|t| t.contains("'''")) {
        return Err(AssuranceError::InvalidAttribute(format!(
            "{attr} may not contain '''"
        )));
    }
    Ok(text)
}

fn text_list(attr: Attribute, value: &Value) -> Result<Vec<String>, AssuranceError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(AssuranceError::InvalidAttribute(format!(
                    "{attr} entries must be strings, got {other}"
                ))),
            })
            .collect(),
        other => Err(AssuranceError::InvalidAttribute(format!(
            "{attr} expects an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{case_from, init_logging};
    use serde_json::json;

    const CASE: &str = r#"
GOALS top
{
    goal G1
    {
        summary:'''top goal''';
        strategy S1
        {
            goal G2 { }
        }
        inContextOf: ctx.C1;
    }
}

CONTEXTS ctx
{
    context C1 { }
    context C2 { }
}
"#;

    fn interpreter() -> CommandInterpreter {
        init_logging();
        CommandInterpreter::new(case_from(&[("top.gsn", CASE)])).unwrap()
    }

    fn details_of(interp: &CommandInterpreter, id: &str) -> Vec<Detail> {
        let entry = interp.index().get(&NodeKey::from(id)).unwrap();
        interp.case().node(&entry.location).unwrap().details.clone()
    }

    #[test]
    fn unknown_cmd_and_missing_fields_are_distinguished() {
        assert_eq!(
            Command::from_value(json!({"cmd": "onFrobnicate", "nodeId": "top/G1"})),
            Err(AssuranceError::UnknownCommand("onFrobnicate".to_string()))
        );
        assert!(matches!(
            Command::from_value(json!({"cmd": "onNewChildRef", "nodeId": "top/G1"})),
            Err(AssuranceError::Parse(_))
        ));
        assert!(matches!(
            Command::from_value(json!({"nodeId": "top/G1"})),
            Err(AssuranceError::Parse(_))
        ));
    }

    #[test]
    fn attribute_changes_use_the_dispatch_table() {
        let mut interp = interpreter();
        interp
            .apply_all(vec![
                json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "summary", "newValue": "line one\nline two"}),
                json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "labels", "newValue": ["safety", "b", "safety"]}),
                json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "artifacts", "newValue": ["file:///a.pdf"]}),
            ])
            .unwrap();
        let entry = interp.index().get(&NodeKey::from("top/G1")).unwrap();
        let node = interp.case().node(&entry.location).unwrap();
        assert_eq!(node.summary.as_deref(), Some("line one\nline two"));
        assert_eq!(node.labels, vec!["safety".to_string(), "b".to_string()]);
        assert_eq!(node.artifacts, vec!["file:///a.pdf".to_string()]);
        assert_eq!(interp.applied().len(), 3);
    }

    #[test]
    fn unknown_attribute_and_bad_values_are_rejected() {
        let mut interp = interpreter();
        let err = interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "colour", "newValue": "red"})])
            .unwrap_err();
        assert!(matches!(err, AssuranceError::InvalidAttribute(_)));
        let err = interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "status", "newValue": "Approved"})])
            .unwrap_err();
        assert!(matches!(err, AssuranceError::InvalidAttribute(_)));
        let err = interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "labels", "newValue": ["not a label"]})])
            .unwrap_err();
        assert!(matches!(err, AssuranceError::InvalidAttribute(_)));
        assert!(interp.applied().is_empty());
    }

    #[test]
    fn new_child_node_is_inline_and_indexed() {
        let mut interp = interpreter();
        let event = interp
            .apply(&Command::OnNewChildNode {
                node_id: "top/G1".to_string(),
                child_type: "Solution".to_string(),
                child_name: "Sn1".to_string(),
                relation_type: None,
            })
            .unwrap();
        assert_eq!(
            event,
            CaseEvent::NodeCreated(
                NodeKey::from("top/G1"),
                NodeKey::from("top/G1/Sn1"),
                NodeKind::Solution
            )
        );
        assert!(interp.index().contains(&NodeKey::from("top/G1/Sn1")));
        assert!(details_of(&interp, "top/G1").last().unwrap().is_declaration());

        let duplicate = interp.apply(&Command::OnNewChildNode {
            node_id: "top/G1".to_string(),
            child_type: "Solution".to_string(),
            child_name: "Sn1".to_string(),
            relation_type: None,
        });
        assert!(matches!(duplicate, Err(AssuranceError::Duplicate(_))));

        let invalid = interp.apply(&Command::OnNewChildNode {
            node_id: "top/G1/S1".to_string(),
            child_type: "Solution".to_string(),
            child_name: "Sn2".to_string(),
            relation_type: None,
        });
        assert!(matches!(invalid, Err(AssuranceError::InvalidRelation(_))));
        assert!(matches!(
            interp.apply(&Command::OnNewChildNode {
                node_id: "top/G1".to_string(),
                child_type: "Choice".to_string(),
                child_name: "X".to_string(),
                relation_type: None,
            }),
            Err(AssuranceError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn references_are_added_once_and_removed_exactly() {
        let mut interp = interpreter();
        let before = details_of(&interp, "top/G1");
        interp
            .apply(&Command::OnNewChildRef {
                node_id: "top/G1".to_string(),
                child_id: "ctx/C2".to_string(),
                relation_type: Some("inContextOf".to_string()),
            })
            .unwrap();
        let after = details_of(&interp, "top/G1");
        assert_eq!(after.len(), before.len() + 1);
        assert!(matches!(
            interp.apply(&Command::OnNewChildRef {
                node_id: "top/G1".to_string(),
                child_id: "ctx/C2".to_string(),
                relation_type: None,
            }),
            Err(AssuranceError::Duplicate(_))
        ));
        assert!(matches!(
            interp.apply(&Command::OnNewChildRef {
                node_id: "top/G1".to_string(),
                child_id: "top/G1".to_string(),
                relation_type: Some("solvedBy".to_string()),
            }),
            Err(AssuranceError::InvalidRelation(_))
        ));

        interp
            .apply(&Command::OnRemoveChildRef {
                node_id: "top/G1".to_string(),
                child_id: "ctx/C2".to_string(),
            })
            .unwrap();
        assert_eq!(details_of(&interp, "top/G1"), before);
    }

    #[test]
    fn unknown_child_names_the_id_and_mutates_nothing() {
        let mut interp = interpreter();
        let snapshot = interp.case().clone();
        let err = interp
            .apply(&Command::OnNewChildRef {
                node_id: "top/G1".to_string(),
                child_id: "ctx/Nope".to_string(),
                relation_type: None,
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "Child Node not found ID = ctx/Nope");
        let err = interp
            .apply(&Command::OnRemoveChildNode {
                node_id: "top/G1".to_string(),
                child_id: "ctx/Nope".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "Child Node not found ID = ctx/Nope");
        let err = interp
            .apply(&Command::OnRemoveChildNode {
                node_id: "top/G1".to_string(),
                child_id: "ctx/C2".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "ctx/C2 is not a child of top/G1");
        assert_eq!(interp.case(), &snapshot);
    }

    #[test]
    fn batch_aborts_but_keeps_earlier_commands() {
        let mut interp = interpreter();
        let err = interp
            .apply_all(vec![
                json!({"cmd": "onNewChildNode", "nodeId": "top/G1", "childType": "Goal", "childName": "G3"}),
                json!({"cmd": "onDeleteNode", "nodeId": "top/Missing"}),
                json!({"cmd": "onDeleteNode", "nodeId": "top/G1/G3"}),
            ])
            .unwrap_err();
        assert_eq!(err.to_string(), "Node not found ID = top/Missing");
        assert_eq!(interp.applied().len(), 1);
        assert!(interp.index().contains(&NodeKey::from("top/G1/G3")));
    }

    #[test]
    fn delete_sweeps_references_to_the_subtree() {
        let mut interp = interpreter();
        interp
            .apply(&Command::OnDeleteNode {
                node_id: "ctx/C1".to_string(),
            })
            .unwrap();
        assert!(!interp.index().contains(&NodeKey::from("ctx/C1")));
        assert!(details_of(&interp, "top/G1")
            .iter()
            .all(|d| d.target(&NodeKey::from("top/G1")) != NodeKey::from("ctx/C1")));

        let event = interp
            .apply(&Command::OnDeleteNode {
                node_id: "top/G1/S1".to_string(),
            })
            .unwrap();
        assert_eq!(
            event,
            CaseEvent::NodeDeleted(NodeKey::from("top/G1/S1"), 2, 0)
        );
        assert!(!interp.index().contains(&NodeKey::from("top/G1/S1/G2")));
    }

    #[test]
    fn rename_rebases_descendants_and_references() {
        let mut interp = CommandInterpreter::new(case_from(&[(
            "a.gsn",
            "GOALS a { goal G1 { strategy S1 { } } goal G9 { solvedBy: a.G1.S1; } }",
        )]))
        .unwrap();
        let event = interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "a/G1", "attr": "name", "newValue": "Top"})])
            .map(|_| interp.applied().last().cloned());
        assert_eq!(
            event.unwrap(),
            Some(CaseEvent::NodeRenamed(
                NodeKey::from("a/G1"),
                NodeKey::from("a/Top"),
                1
            ))
        );
        assert!(interp.index().contains(&NodeKey::from("a/Top/S1")));
        assert_eq!(
            details_of(&interp, "a/G9")[0].target(&NodeKey::from("a/G9")),
            NodeKey::from("a/Top/S1")
        );
        assert!(matches!(
            interp.apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "a/Top", "attr": "name", "newValue": "G9"})]),
            Err(AssuranceError::Duplicate(_))
        ));
    }

    #[test]
    fn rename_checks_references_against_the_new_ids() {
        let mut interp = CommandInterpreter::new(case_from(&[(
            "a.gsn",
            "GOALS a { goal G1 { strategy S1 { } goal G2 { solvedBy: a.G1.S1; } } }",
        )]))
        .unwrap();
        interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "a/G1", "attr": "name", "newValue": "Top"})])
            .unwrap();
        assert!(interp.warnings().is_empty(), "{:?}", interp.warnings());

        interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "a/Top/G2", "attr": "summary", "newValue": "child"})])
            .unwrap();
        assert!(interp.warnings().is_empty());

        let mut dangling = CommandInterpreter::new(case_from(&[(
            "a.gsn",
            "GOALS a { goal G1 { solvedBy: a.Gone; } }",
        )]))
        .unwrap();
        dangling
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "a/G1", "attr": "name", "newValue": "Top"})])
            .unwrap();
        assert_eq!(dangling.warnings().len(), 1);
    }

    #[test]
    fn uuid_must_be_valid_and_unique() {
        let mut interp = interpreter();
        let uuid = "6b3d2154-c0a9-437b-9324-5f62adeb9a44";
        interp
            .apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "top/G1", "attr": "uuid", "newValue": uuid})])
            .unwrap();
        assert_eq!(
            interp.index().resolve(uuid).map(|(k, _)| k.clone()),
            Some(NodeKey::from("top/G1"))
        );
        assert!(matches!(
            interp.apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "ctx/C1", "attr": "uuid", "newValue": uuid})]),
            Err(AssuranceError::Duplicate(_))
        ));
        assert!(matches!(
            interp.apply_all(vec![json!({"cmd": "onAttributeChange", "nodeId": "ctx/C1", "attr": "uuid", "newValue": "xyz"})]),
            Err(AssuranceError::InvalidAttribute(_))
        ));
    }
}
