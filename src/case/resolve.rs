//! Reference resolution.
//!
//! References are stored as a relation plus the target's identifier and resolved on demand
//! against an [Index]; there is no cached target that could go stale. What remains of
//! "resolution" is therefore: checking that targets exist and are of a kind the relation allows,
//! finding every reference that points at a node (the reverse-usage scan), and keeping those
//! references consistent when the node is renamed or deleted.
//!
//! Every function here walks the whole case, so a batch of `b` attribute changes costs
//! `O(b * nodes)`. That is fine for cases of a few hundred nodes.

use crate::{
    case::{Case, Index, NodeLocation},
    codec::diagnostic::{ParseDiagnostic, UnresolvedReference},
    nodekey::NodeKey,
    properties::{Detail, Node, Reference, Relation},
};

/// A reference held by `owner` (at `details[detail]`) that targets some node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub owner: NodeKey,
    pub location: NodeLocation,
    pub detail: usize,
    pub relation: Relation,
}

/// Every reference in the case whose target is `target`.
pub fn reverse_usages(case: &Case, target: &NodeKey) -> Vec<Usage> {
    let mut usages = Vec::new();
    case.visit(&mut |id, node, loc| {
        for (idx, detail) in node.details.iter().enumerate() {
            if let Detail::Reference(reference) = detail {
                if &reference.target == target {
                    usages.push(Usage {
                        owner: id.clone(),
                        location: loc.clone(),
                        detail: idx,
                        relation: reference.relation,
                    });
                }
            }
        }
    });
    usages
}

fn check_reference(
    case: &Case,
    index: &Index,
    owner: &NodeKey,
    node: &Node,
    loc: &NodeLocation,
    reference: &Reference,
) -> Option<ParseDiagnostic> {
    let path = case
        .document_path(loc)
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    match index.get(&reference.target) {
        None => Some(ParseDiagnostic::UnresolvedReference(UnresolvedReference {
            path,
            owner: owner.clone(),
            relation: reference.relation,
            target: reference.target.clone(),
            line: node.position.map(|p| p.line),
        })),
        Some(entry) => reference
            .relation
            .validate(node.kind, entry.kind)
            .err()
            .map(|err| ParseDiagnostic::Warning(path, format!("{owner} -> {}: {err}", reference.target))),
    }
}

fn check_where(
    case: &Case,
    index: &Index,
    include: impl Fn(&NodeKey, &NodeLocation) -> bool,
) -> Vec<ParseDiagnostic> {
    let mut diagnostics = Vec::new();
    case.visit(&mut |id, node, loc| {
        if !include(id, loc) {
            return;
        }
        for reference in node.references() {
            if let Some(diagnostic) = check_reference(case, index, id, node, loc, reference) {
                diagnostics.push(diagnostic);
            }
        }
    });
    diagnostics
}

/// Check every reference reachable from `key`: those held by the node and its inline
/// descendants.
pub fn resolve_from(case: &Case, index: &Index, key: &NodeKey) -> Vec<ParseDiagnostic> {
    check_where(case, index, |id, _| id.is_within(key))
}

/// Check every reference held by one document.
pub fn resolve_document(case: &Case, index: &Index, document: usize) -> Vec<ParseDiagnostic> {
    check_where(case, index, |_, loc| loc.document == document)
}

/// Check every reference in the case.
pub fn resolve_all(case: &Case, index: &Index) -> Vec<ParseDiagnostic> {
    check_where(case, index, |_, _| true)
}

/// Point every reference that targets `from` (or a node declared inside it) at the
/// corresponding identifier under `to`. Returns the number of references rewritten.
pub fn retarget(case: &mut Case, from: &NodeKey, to: &NodeKey) -> usize {
    let mut rewritten = 0;
    case.visit_mut(&mut |_, node| {
        for detail in node.details.iter_mut() {
            if let Detail::Reference(reference) = detail {
                if let Some(rebased) = reference.target.rebase(from, to) {
                    reference.target = rebased;
                    rewritten += 1;
                }
            }
        }
    });
    rewritten
}

/// Remove every reference that targets `removed` or a node declared inside it. Returns the
/// number of references removed.
pub fn sweep(case: &mut Case, removed: &NodeKey) -> usize {
    let mut swept = 0;
    case.visit_mut(&mut |id, node| {
        let before = node.details.len();
        node.details.retain(|detail| match detail {
            Detail::Reference(reference) => !reference.target.is_within(removed),
            Detail::Declaration(_) => true,
        });
        let removed_here = before - node.details.len();
        if removed_here > 0 {
            tracing::debug!("swept {removed_here} reference(s) to {removed} from {id}");
        }
        swept += removed_here;
    });
    swept
}
