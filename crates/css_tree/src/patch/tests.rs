use super::{
    Edit, PatchErrorCode, PatchIntegrityError, PatchPlan, PatchStep, apply_patch_plan,
    compute_patch,
};
use crate::node::NodeId;
use crate::options::ParseOptions;
use crate::parse::parse;
use crate::traverse::find_all_by_type;

const CSS: &str = ".a{color:red}.b{margin:0}";

fn ids_of(css: &str, kind: &str) -> Vec<NodeId> {
    let tree = parse(css, &ParseOptions::with_spans()).expect("parse");
    find_all_by_type(&tree, kind).map(|node| node.id).collect()
}

fn plan(css: &str, edits: &[Edit]) -> PatchPlan {
    let plan = compute_patch(css, edits).expect("plan");
    let replayed = apply_patch_plan(css, &plan).expect("replay");
    assert_eq!(replayed, plan.result);
    plan
}

#[test]
fn empty_edit_list_is_identity() {
    let plan = plan(CSS, &[]);
    assert_eq!(
        plan.steps,
        vec![PatchStep::Slice {
            start: 0,
            end: CSS.len()
        }]
    );
    assert_eq!(plan.result, CSS);
}

#[test]
fn replace_declaration() {
    let decls = ids_of(CSS, "Declaration");
    let plan = plan(
        CSS,
        &[Edit::ReplaceNode {
            target: decls[0],
            css: "color:blue".to_string(),
        }],
    );
    assert_eq!(plan.result, ".a{color:blue}.b{margin:0}");
    assert_eq!(
        plan.steps,
        vec![
            PatchStep::Slice { start: 0, end: 3 },
            PatchStep::Insert {
                at: 3,
                text: "color:blue".to_string()
            },
            PatchStep::Slice {
                start: 12,
                end: CSS.len()
            },
        ]
    );
}

#[test]
fn remove_and_insert_around_rules() {
    let rules = ids_of(CSS, "Rule");
    assert_eq!(
        plan(CSS, &[Edit::RemoveNode { target: rules[1] }]).result,
        ".a{color:red}"
    );
    let plan = plan(
        CSS,
        &[
            Edit::InsertCssAfter {
                target: rules[1],
                css: ".c{}".to_string(),
            },
            Edit::InsertCssBefore {
                target: rules[0],
                css: "@import \"x.css\";".to_string(),
            },
        ],
    );
    assert_eq!(plan.result, "@import \"x.css\";.a{color:red}.b{margin:0}.c{}");
}

#[test]
fn adjacent_replacements_replay() {
    let rules = ids_of(CSS, "Rule");
    let edits = [
        Edit::ReplaceNode {
            target: rules[1],
            css: "b{}".to_string(),
        },
        Edit::ReplaceNode {
            target: rules[0],
            css: "a{}".to_string(),
        },
    ];
    let plan = plan(CSS, &edits);
    assert_eq!(plan.result, "a{}b{}");
    // Replaying the same plan twice gives the same text.
    assert_eq!(apply_patch_plan(CSS, &plan).unwrap(), "a{}b{}");
}

#[test]
fn insert_next_to_replaced_node() {
    let rules = ids_of(CSS, "Rule");
    let plan = plan(
        CSS,
        &[
            Edit::ReplaceNode {
                target: rules[0],
                css: "x{}".to_string(),
            },
            Edit::InsertCssBefore {
                target: rules[0],
                css: "/*before*/".to_string(),
            },
            Edit::InsertCssAfter {
                target: rules[0],
                css: "/*after*/".to_string(),
            },
        ],
    );
    assert_eq!(plan.result, "/*before*/x{}/*after*/.b{margin:0}");
}

#[test]
fn nested_edits_overlap() {
    let rules = ids_of(CSS, "Rule");
    let decls = ids_of(CSS, "Declaration");
    let err = compute_patch(
        CSS,
        &[
            Edit::RemoveNode { target: decls[0] },
            Edit::RemoveNode { target: rules[0] },
        ],
    )
    .unwrap_err();
    assert_eq!(err.code(), Some(PatchErrorCode::OverlappingEdits));
}

#[test]
fn same_offset_inserts_are_rejected() {
    let rules = ids_of(CSS, "Rule");
    let insert = |css: &str| Edit::InsertCssBefore {
        target: rules[1],
        css: css.to_string(),
    };
    let err = compute_patch(CSS, &[insert("x{}"), insert("y{}")]).unwrap_err();
    assert_eq!(err.code(), Some(PatchErrorCode::OverlappingEdits));

    // End of one rule and start of the next are the same offset too.
    let err = compute_patch(
        CSS,
        &[
            Edit::InsertCssAfter {
                target: rules[0],
                css: "x{}".to_string(),
            },
            insert("y{}"),
        ],
    )
    .unwrap_err();
    assert_eq!(err.code(), Some(PatchErrorCode::OverlappingEdits));
}

#[test]
fn unknown_and_invalid_targets() {
    let err = compute_patch(CSS, &[Edit::RemoveNode { target: NodeId(0) }]).unwrap_err();
    assert_eq!(err.code(), Some(PatchErrorCode::InvalidEditTarget));

    let err = compute_patch(CSS, &[Edit::RemoveNode { target: NodeId(9999) }]).unwrap_err();
    assert_eq!(err.code(), Some(PatchErrorCode::NodeNotFound));
    assert_eq!(
        err.to_string(),
        "patch planning failed: NODE_NOT_FOUND target=9999"
    );
}

#[test]
fn tampered_plans_fail_integrity_checks() {
    let out_of_range = PatchPlan {
        steps: vec![PatchStep::Slice { start: 0, end: 99 }],
        result: String::new(),
    };
    assert!(matches!(
        apply_patch_plan(CSS, &out_of_range),
        Err(PatchIntegrityError::InvalidSlice { end: 99, .. })
    ));

    let backwards = PatchPlan {
        steps: vec![
            PatchStep::Slice { start: 0, end: 5 },
            PatchStep::Slice { start: 2, end: 6 },
        ],
        result: String::new(),
    };
    assert!(matches!(
        apply_patch_plan(CSS, &backwards),
        Err(PatchIntegrityError::InvalidSlice { start: 2, .. })
    ));

    let misplaced = PatchPlan {
        steps: vec![
            PatchStep::Slice { start: 0, end: 3 },
            PatchStep::Insert {
                at: 4,
                text: "x".to_string(),
            },
        ],
        result: String::new(),
    };
    assert_eq!(
        apply_patch_plan(CSS, &misplaced),
        Err(PatchIntegrityError::MisplacedInsert { at: 4, cursor: 3 })
    );
}

#[test]
fn edits_deserialize_from_json() {
    let edits: Vec<Edit> = serde_json::from_value(serde_json::json!([
        { "kind": "removeNode", "target": 3 },
        { "kind": "insertCssAfter", "target": 2, "css": "a{}" }
    ]))
    .expect("edits");
    assert_eq!(edits[0], Edit::RemoveNode { target: NodeId(3) });
    assert_eq!(edits[1].target(), NodeId(2));
}
