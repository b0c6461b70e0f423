use super::*;
use crate::{
    codec::ParseDiagnostic,
    error::AssuranceError,
    nodekey::NodeKey,
    properties::NodeKind,
    tests::helpers::{case_from, generated_case, init_logging},
};

const ARGUMENT: &str = r#"
GOALS arg
{
    goal G1
    {
        uuid:"0f5b4d0c-6a36-4a1e-8a4e-0c2b8a8c1d11";
        strategy S1
        {
            solvedBy: arg.G2;
        }
        inContextOf: env.C1;
    }
    goal G2 { }
}
"#;

const ENVIRONMENT: &str = r#"
CONTEXTS env
{
    context C1 { }
}
"#;

#[test_log::test]
fn index_covers_every_node_across_documents() {
    let case = case_from(&[("arg.gsn", ARGUMENT), ("env.gsn", ENVIRONMENT)]);
    let index = Index::build(&case).unwrap();
    assert_eq!(index.len(), case.node_count());
    assert_eq!(
        index.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["arg/G1", "arg/G1/S1", "arg/G2", "env/C1"]
    );
    let entry = index.get(&NodeKey::from("env/C1")).unwrap();
    assert_eq!(entry.kind, NodeKind::Context);
    assert_eq!(entry.location.document, 1);

    let (by_uuid, _) = index
        .resolve("0f5b4d0c-6a36-4a1e-8a4e-0c2b8a8c1d11")
        .unwrap();
    assert_eq!(by_uuid, &NodeKey::from("arg/G1"));
    assert_eq!(
        index
            .within(&NodeKey::from("arg/G1"))
            .map(|k| k.as_str())
            .collect::<Vec<_>>(),
        vec!["arg/G1", "arg/G1/S1"]
    );
}

#[test_log::test]
fn duplicate_identifiers_fail_the_index() {
    let case = case_from(&[
        ("a.gsn", "GOALS ns { goal G1 { } }"),
        ("b.gsn", "GOALS ns { goal G1 { } }"),
    ]);
    match Index::build(&case) {
        Err(AssuranceError::Duplicate(msg)) => {
            assert!(msg.contains("ns/G1"));
            assert!(msg.contains("a.gsn") && msg.contains("b.gsn"));
        }
        other => panic!("expected a duplicate error, got {other:?}"),
    }

    let uuid = "0f5b4d0c-6a36-4a1e-8a4e-0c2b8a8c1d11";
    let case = case_from(&[(
        "a.gsn",
        &format!("GOALS ns {{ goal G1 {{ uuid:\"{uuid}\"; }} goal G2 {{ uuid:\"{uuid}\"; }} }}"),
    )]);
    assert!(matches!(
        Index::build(&case),
        Err(AssuranceError::Duplicate(_))
    ));
}

#[test_log::test]
fn locations_address_nested_nodes() {
    let case = case_from(&[("arg.gsn", ARGUMENT)]);
    let index = Index::build(&case).unwrap();
    let loc = &index.get(&NodeKey::from("arg/G1/S1")).unwrap().location;
    assert_eq!(loc.path, vec![0, 0]);
    assert_eq!(case.node(loc).unwrap().name, "S1");
    assert_eq!(case.node(&loc.parent().unwrap()).unwrap().name, "G1");
    assert!(loc.parent().unwrap().parent().is_none());
}

#[test_log::test]
fn dangling_and_ill_typed_references_become_diagnostics() {
    init_logging();
    let case = case_from(&[(
        "arg.gsn",
        "GOALS arg { goal G1 { inContextOf: env.Gone; } strategy S1 { solvedBy: arg.Sn1; } }\nSOLUTIONS sol { }\nSOLUTIONS arg2 { solution Sn1 { } }",
    )]);
    let index = Index::build(&case).unwrap();
    let diagnostics = resolve::resolve_all(&case, &index);
    assert_eq!(diagnostics.len(), 2);
    assert!(matches!(
        &diagnostics[0],
        ParseDiagnostic::UnresolvedReference(u) if u.target == NodeKey::from("env/Gone")
    ));
    // arg.Sn1 does not exist either; arg2/Sn1 does.
    assert!(matches!(
        &diagnostics[1],
        ParseDiagnostic::UnresolvedReference(u) if u.owner == NodeKey::from("arg/S1")
    ));
    assert!(resolve::resolve_from(&case, &index, &NodeKey::from("arg/G1")).len() == 1);
    assert!(resolve::resolve_document(&case, &index, 0).len() == 2);
}

#[test_log::test]
fn kind_violations_are_warnings() {
    let case = case_from(&[(
        "arg.gsn",
        "GOALS arg { strategy S1 { solvedBy: sol.Sn1; } }\nSOLUTIONS sol { solution Sn1 { } }",
    )]);
    let index = Index::build(&case).unwrap();
    let diagnostics = resolve::resolve_all(&case, &index);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(&diagnostics[0], ParseDiagnostic::Warning(..)));
}

#[test_log::test]
fn reverse_usages_find_every_reference() {
    let case = case_from(&[
        ("arg.gsn", ARGUMENT),
        ("env.gsn", ENVIRONMENT),
        ("more.gsn", "GOALS more { goal G5 { inContextOf: env.C1; } }"),
    ]);
    let usages = resolve::reverse_usages(&case, &NodeKey::from("env/C1"));
    assert_eq!(
        usages.iter().map(|u| u.owner.as_str()).collect::<Vec<_>>(),
        vec!["arg/G1", "more/G5"]
    );
    assert_eq!(usages[1].location.document, 2);
}

#[test_log::test]
fn retarget_and_sweep_follow_subtrees() {
    let mut case = case_from(&[(
        "a.gsn",
        "GOALS a { goal G1 { strategy S1 { } } goal G2 { solvedBy: a.G1; solvedBy: a.G1.S1; solvedBy: a.G10; } goal G10 { } }",
    )]);
    assert_eq!(
        resolve::retarget(&mut case, &NodeKey::from("a/G1"), &NodeKey::from("a/Top")),
        2
    );
    let targets = |case: &Case| {
        let index = Index::build(case).unwrap();
        let loc = index.get(&NodeKey::from("a/G2")).unwrap().location.clone();
        case.node(&loc)
            .unwrap()
            .references()
            .map(|r| r.target.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(targets(&case), vec!["a/Top", "a/Top/S1", "a/G10"]);
    assert_eq!(resolve::sweep(&mut case, &NodeKey::from("a/Top")), 2);
    assert_eq!(targets(&case), vec!["a/G10"]);
}

#[test_log::test]
fn visit_order_is_document_then_depth_first() {
    let case = generated_case(2, 2);
    let mut order = Vec::new();
    case.visit(&mut |id, _, _| order.push(id.to_string()));
    assert_eq!(
        order,
        vec![
            "n0/G0", "n0/G0/S0", "n0/G0/S0/G0a", "n0/G1", "n0/G1/S1", "n0/G1/S1/G1a", "c0/C0",
            "n1/G0", "n1/G0/S0", "n1/G0/S0/G0a", "n1/G1", "n1/G1/S1", "n1/G1/S1/G1a", "c1/C0",
        ]
    );
}
