use super::{QueryError, QueryOptions, matches_selector, query_selector_all};
use crate::compile::compile_selector_list;
use css_tree::BudgetName;
use serde_json::{Map, Value, json};

fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<Value>) -> Value {
    let attributes: Vec<Value> = attributes
        .iter()
        .map(|(name, value)| json!({"name": name, "value": value}))
        .collect();
    // Built by hand: `json!` would re-serialize (recursively) the children.
    let mut object = Map::new();
    object.insert("kind".to_string(), json!("element"));
    object.insert("tagName".to_string(), json!(tag));
    object.insert("attributes".to_string(), Value::Array(attributes));
    object.insert("children".to_string(), Value::Array(children));
    Value::Object(object)
}

fn text(value: &str) -> Value {
    json!({"kind": "text", "value": value})
}

/// ```text
/// document
///   html
///     body
///       article#main.post.featured
///         p.note[lang=en-US]            "a"
///         section
///           p.note[data-x="Hello World"] "b"
///       p                               "c"
/// ```
fn document() -> Value {
    json!({
        "kind": "document",
        "children": [element("HTML", &[], vec![element(
            "body",
            &[],
            vec![
                element(
                    "article",
                    &[("id", "main"), ("class", "post  featured")],
                    vec![
                        element("p", &[("class", "note"), ("LANG", "en-US")], vec![text("a")]),
                        element(
                            "section",
                            &[],
                            vec![element(
                                "p",
                                &[("class", "note"), ("data-x", "Hello World")],
                                vec![text("b")],
                            )],
                        ),
                    ],
                ),
                element("p", &[], vec![text("c")]),
            ],
        )])]
    })
}

fn texts(matches: &[&Value]) -> Vec<String> {
    matches
        .iter()
        .map(|node| {
            node["children"][0]["value"]
                .as_str()
                .map_or_else(|| node["tagName"].as_str().unwrap_or("?").to_string(), str::to_string)
        })
        .collect()
}

fn query(selector: &str) -> Vec<String> {
    let doc = document();
    let found = query_selector_all(selector, &doc, &QueryOptions::default()).expect("query");
    texts(&found)
}

#[test]
fn type_class_and_id() {
    assert_eq!(query("p"), vec!["a", "b", "c"]);
    assert_eq!(query("P.note"), vec!["a", "b"]);
    assert_eq!(query("html"), vec!["HTML"]);
    assert_eq!(query("#main"), vec!["article"]);
    assert_eq!(query("#MAIN"), Vec::<String>::new());
    assert_eq!(query(".featured.post"), vec!["article"]);
    assert_eq!(query("*").len(), 7);
}

#[test]
fn combinators() {
    assert_eq!(query("article > p"), vec!["a"]);
    assert_eq!(query("article p"), vec!["a", "b"]);
    assert_eq!(query("body > p"), vec!["c"]);
    assert_eq!(query("html p.note"), vec!["a", "b"]);
    // The document node is not an element, so `html` has no element parent.
    assert_eq!(query("* > html"), Vec::<String>::new());
    assert_eq!(query("body article > section p"), vec!["b"]);
}

#[test]
fn attribute_matchers() {
    assert_eq!(query("[lang]"), vec!["a"]);
    assert_eq!(query("[lang=en-US]"), vec!["a"]);
    assert_eq!(query("[lang|=en]"), vec!["a"]);
    assert_eq!(query("[lang|=en-U]"), Vec::<String>::new());
    assert_eq!(query("[data-x~=World]"), vec!["b"]);
    assert_eq!(query("[data-x~=world]"), Vec::<String>::new());
    assert_eq!(query("[data-x~=world i]"), vec!["b"]);
    assert_eq!(query("[data-x^=\"Hello \"]"), vec!["b"]);
    assert_eq!(query("[data-x$=rld]"), vec!["b"]);
    assert_eq!(query("[data-x*=\"o W\"]"), vec!["b"]);
    assert_eq!(query("[class=note]"), vec!["a", "b"]);
}

#[test]
fn results_follow_document_order_once() {
    assert_eq!(query("p.note, article p, p"), vec!["a", "b", "c"]);
    assert_eq!(query("section, article"), vec!["article", "section"]);
}

#[test]
fn unsupported_selectors_never_match() {
    assert_eq!(query("p:first-child"), Vec::<String>::new());
    assert_eq!(query("p:first-child, body > p"), vec!["c"]);
    assert_eq!(query("article ~ p"), Vec::<String>::new());
    assert_eq!(query("p["), Vec::<String>::new());
}

#[test]
fn strict_mode_rejects_instead() {
    let doc = document();
    let strict = QueryOptions {
        strict: true,
        ..QueryOptions::default()
    };

    let err = query_selector_all("p:first-child", &doc, &strict).unwrap_err();
    assert_eq!(
        err.to_string(),
        "selector unsupported in strict mode: PseudoClassSelector unsupported simple selector"
    );

    let err = query_selector_all("p[", &doc, &strict).unwrap_err();
    match err {
        QueryError::Strict(message) => {
            assert!(message.starts_with("selector parse failed in strict mode: "), "{message}")
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(query_selector_all("p", &doc, &strict).unwrap().len(), 3);
}

#[test]
fn matches_selector_checks_one_node() {
    let doc = document();
    let options = QueryOptions::default();
    let article = &doc["children"][0]["children"][0]["children"][0];
    let inner = &article["children"][1]["children"][0];

    assert!(matches_selector("article .note", inner, &doc, &options).unwrap());
    assert!(!matches_selector("article > .note", inner, &doc, &options).unwrap());
    assert!(matches_selector("section > p", inner, article, &options).unwrap());

    // Outside the given root.
    assert!(!matches_selector("article", article, inner, &options).unwrap());
    // Not an element.
    let leaf = &inner["children"][0];
    assert!(!matches_selector("*", leaf, &doc, &options).unwrap());
    // An equal but distinct value is not part of the tree.
    let copy = inner.clone();
    assert!(!matches_selector("p", &copy, &doc, &options).unwrap());
}

#[test]
fn compiled_lists_are_reusable() {
    let doc = document();
    let compiled = compile_selector_list("section p, #main");
    let options = QueryOptions::default();
    let first = query_selector_all(&compiled, &doc, &options).unwrap();
    let second = query_selector_all(&compiled, &doc, &options).unwrap();
    assert_eq!(texts(&first), vec!["article", "b"]);
    assert_eq!(first, second);
}

#[test]
fn visited_node_budget() {
    let doc = document();
    // document, html, body, article, p, "a", section, p, "b", p, "c"
    let exact = QueryOptions {
        max_visited_nodes: Some(11),
        ..QueryOptions::default()
    };
    assert!(query_selector_all("p", &doc, &exact).is_ok());

    let tight = QueryOptions {
        max_visited_nodes: Some(10),
        ..QueryOptions::default()
    };
    let err = query_selector_all("p", &doc, &tight).unwrap_err();
    let QueryError::Budget(exceeded) = err else {
        panic!("expected budget error");
    };
    assert_eq!(exceeded.budget, BudgetName::MaxNodes);
    assert_eq!((exceeded.limit, exceeded.actual), (10, 11));
}

#[test]
fn deep_trees_do_not_recurse() {
    let mut node = element("b", &[], Vec::new());
    for _ in 0..20_000 {
        node = element("a", &[], vec![node]);
    }
    let found = query_selector_all("a > a b", &node, &QueryOptions::default()).unwrap();
    assert_eq!(found.len(), 1);
    // serde_json drops nested values recursively; unwind by hand.
    let mut stack = vec![node];
    while let Some(mut value) = stack.pop() {
        if let Some(children) = value.get_mut("children").and_then(Value::as_array_mut) {
            stack.append(children);
        }
    }
}

#[test]
fn failing_descendant_chains_stay_linear() {
    // Every `a` matches the right part but no ancestor is a `b`, so each
    // candidate explores all (compound, ancestor) pairs before failing.
    let mut node = element("a", &[], Vec::new());
    for _ in 0..400 {
        node = element("a", &[], vec![node]);
    }
    let options = QueryOptions {
        max_visited_nodes: Some(500),
        ..QueryOptions::default()
    };
    let started = std::time::Instant::now();
    let found = query_selector_all("b a a a a a a", &node, &options).unwrap();
    assert!(found.is_empty());
    assert!(started.elapsed() < std::time::Duration::from_secs(10));

    let found = query_selector_all("a a a a a a a", &node, &options).unwrap();
    assert_eq!(found.len(), 401 - 6);
    let mut stack = vec![node];
    while let Some(mut value) = stack.pop() {
        if let Some(children) = value.get_mut("children").and_then(Value::as_array_mut) {
            stack.append(children);
        }
    }
}

#[test]
fn options_deserialize() {
    let options: QueryOptions =
        serde_json::from_str(r#"{"strict": true, "maxVisitedNodes": 5}"#).unwrap();
    assert!(options.strict);
    assert_eq!(options.max_visited_nodes, Some(5));
}
