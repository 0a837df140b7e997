use css_tree::{
    BudgetName, BudgetStatus, CssNode, ParseOptions, SpanProvenance, TraceKind, Budgets, parse,
    parse_bytes, parse_declaration_list, parse_error_spec_ref, parse_rule_list, serialize, walk,
};

const SHEET: &str = "@import url(a.css);\n\
    a.b > c, #d[e~=\"f\"] { color: red; margin: 0 auto !important }\n\
    @media (min-width: 10px) { .x:hover { --gap: 4px; } }\n";

fn traced() -> ParseOptions {
    ParseOptions {
        capture_spans: true,
        trace: true,
        ..ParseOptions::default()
    }
}

fn kinds(events: &[css_tree::TraceEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match &event.event {
            TraceKind::Decode { .. } => "decode",
            TraceKind::Token { .. } => "token",
            TraceKind::Parse { .. } => "parse",
            TraceKind::ParseError { .. } => "parseError",
            TraceKind::Budget { .. } => "budget",
            TraceKind::Stream { .. } => "stream",
        })
        .collect()
}

#[test]
fn parsing_is_deterministic() {
    let first = parse(SHEET, &traced()).expect("first parse");
    let second = parse(SHEET, &traced()).expect("second parse");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn ids_are_unique_and_increase_in_preorder() {
    let tree = parse(SHEET, &ParseOptions::default()).unwrap();
    let mut ids = Vec::new();
    walk(&tree, |node, _| ids.push(node.id.0));
    assert_eq!(ids.first(), Some(&1));
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn spans_nest_inside_parents() {
    let tree = parse(SHEET, &traced()).unwrap();
    let mut stack: Vec<&CssNode> = vec![&tree.root];
    let mut checked = 0;
    while let Some(node) = stack.pop() {
        assert_eq!(node.span_provenance, SpanProvenance::Input, "{:?}", node.kind);
        let span = node.span.expect("captured span");
        assert!(span.end <= SHEET.len());
        for child in &node.children {
            let child_span = child.span.expect("captured span");
            assert!(
                span.contains(child_span),
                "{:?} {:?} not inside {:?} {:?}",
                child.kind,
                child_span,
                node.kind,
                span
            );
            stack.push(child);
            checked += 1;
        }
    }
    assert!(checked > 20);
}

#[test]
fn spans_are_absent_unless_requested() {
    let tree = parse(SHEET, &ParseOptions::default()).unwrap();
    walk(&tree, |node, _| {
        assert!(node.span.is_none());
        assert_eq!(node.span_provenance, SpanProvenance::None);
    });
}

#[test]
fn serialization_round_trip_is_stable() {
    let once = serialize(&parse(SHEET, &ParseOptions::default()).unwrap());
    let twice = serialize(&parse(&once, &ParseOptions::default()).unwrap());
    assert_eq!(once, twice);
    assert!(once.contains("--gap: 4px"));
}

#[test]
fn trace_follows_pipeline_order() {
    let tree = parse("a{color red}", &traced()).unwrap();
    assert!(!tree.errors.is_empty());
    let events = tree.trace.as_deref().expect("trace");

    let seqs: Vec<u64> = events.iter().map(|event| event.seq).collect();
    assert_eq!(seqs, (1..=events.len() as u64).collect::<Vec<_>>());

    let kinds = kinds(events);
    assert_eq!(&kinds[..4], &["decode", "budget", "token", "parse"]);
    let error_events = kinds.iter().filter(|kind| **kind == "parseError").count();
    assert_eq!(error_events, tree.errors.len());
    assert_eq!(&kinds[kinds.len() - 3..], &["budget", "budget", "budget"]);

    let TraceKind::Parse {
        node_count,
        error_count,
        ..
    } = &events[3].event
    else {
        panic!("expected parse event");
    };
    assert_eq!(*error_count, tree.errors.len() as u64);
    let mut nodes = 0;
    walk(&tree, |_, _| nodes += 1);
    assert_eq!(*node_count, nodes);

    let budget_names: Vec<BudgetName> = events
        .iter()
        .filter_map(|event| match &event.event {
            TraceKind::Budget { budget, status, .. } => {
                assert_eq!(*status, BudgetStatus::Ok);
                Some(*budget)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        budget_names,
        vec![
            BudgetName::MaxInputBytes,
            BudgetName::MaxTokens,
            BudgetName::MaxNodes,
            BudgetName::MaxDepth
        ]
    );
}

#[test]
fn parse_errors_carry_ids_and_positions() {
    let tree = parse("a {\n  color red;\n}", &ParseOptions::default()).unwrap();
    let error = &tree.errors[0];
    assert_eq!(error.code, "PARSER_ERROR");
    assert_eq!(error.parse_error_id, "colon-is-expected");
    assert_eq!(error.line, Some(2));
    let span = error.span.expect("error span");
    assert_eq!(span.end, span.start + 1);
    assert_eq!(
        parse_error_spec_ref(&error.parse_error_id),
        "https://drafts.csswg.org/css-syntax/#error-handling"
    );
}

#[test]
fn trace_budgets_abort_the_call() {
    let options = ParseOptions {
        trace: true,
        budgets: Budgets {
            max_trace_events: Some(3),
            ..Budgets::default()
        },
        ..ParseOptions::default()
    };
    let err = parse("a{}", &options).unwrap_err();
    let exceeded = err.budget().expect("budget error");
    assert_eq!(exceeded.budget, BudgetName::MaxTraceEvents);
    assert_eq!((exceeded.limit, exceeded.actual), (3, 4));

    // Without tracing the same budget is never consulted.
    let quiet = ParseOptions {
        trace: false,
        ..options
    };
    assert!(parse("a{}", &quiet).is_ok());
}

#[test]
fn bytes_append_sniffed_decode_event() {
    let options = ParseOptions {
        trace: true,
        transport_encoding_label: Some("latin1".to_string()),
        ..ParseOptions::default()
    };
    let tree = parse_bytes(b"a::after{content:\"\xE9\"}", &options).unwrap();
    assert_eq!(serialize(&tree), "a::after{content:\"é\"}");
    let events = tree.trace.as_deref().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.seq, events.len() as u64);
    let json = serde_json::to_value(last).unwrap();
    assert_eq!(json["kind"], "decode");
    assert_eq!(json["source"], "sniff");
    assert_eq!(json["encoding"], "windows-1252");
    assert_eq!(json["sniffSource"], "transport");
}

#[test]
fn bytes_budget_counts_raw_bytes() {
    let options = ParseOptions {
        budgets: Budgets {
            max_input_bytes: Some(4),
            ..Budgets::default()
        },
        ..ParseOptions::default()
    };
    let err = parse_bytes(b"\xEF\xBB\xBFa{}", &options).unwrap_err();
    assert_eq!(err.budget().unwrap().actual, 6);
}

#[test]
fn convenience_contexts() {
    let rules = parse_rule_list(".x{color:red}", &ParseOptions::default()).unwrap();
    assert_eq!(rules.context.as_str(), "rule");
    assert!(rules.errors.is_empty());

    let declarations = parse_declaration_list("color:red;margin:0", &ParseOptions::default()).unwrap();
    assert_eq!(declarations.context.as_str(), "declarationList");
    assert_eq!(declarations.children().len(), 2);
}
