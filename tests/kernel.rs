use csskernel::tree::{NodeType, find_all_by_type, walk};
use csskernel::{
    Edit, ParseOptions, QueryOptions, apply_patch_plan, compute_patch, parse, parse_stream,
    query_selector_all, serialize,
};
use futures::executor::block_on;
use futures::stream;
use serde_json::json;

#[test]
fn edit_a_streamed_sheet() {
    let css = "\u{FEFF}.card { color: red; padding: 0 }\n.title { font-weight: bold }\n";
    let chunks: Vec<Result<Vec<u8>, String>> =
        css.as_bytes().chunks(5).map(|chunk| Ok(chunk.to_vec())).collect();
    let tree = block_on(parse_stream(stream::iter(chunks), &ParseOptions::with_spans()))
        .expect("stream parse");

    // The decoded text the spans refer to.
    let text = css.trim_start_matches('\u{FEFF}');
    let color = find_all_by_type(&tree, "Declaration")
        .find(|node| node.property() == Some("color"))
        .expect("color declaration");
    let plan = compute_patch(
        text,
        &[Edit::ReplaceNode {
            target: color.id,
            css: "color: blue".to_string(),
        }],
    )
    .expect("plan");
    let patched = apply_patch_plan(text, &plan).expect("apply");
    assert_eq!(
        patched,
        ".card { color: blue; padding: 0 }\n.title { font-weight: bold }\n"
    );

    let reparsed = parse(&patched, &ParseOptions::default()).expect("reparse");
    assert_eq!(serialize(&reparsed), ".card{color:blue;padding:0}.title{font-weight:bold}");
    let mut rules = 0;
    walk(&reparsed, |node, _| rules += usize::from(node.is(NodeType::Rule)));
    assert_eq!(rules, 2);
}

#[test]
fn query_a_json_document() {
    let doc = json!({
        "kind": "element",
        "tagName": "main",
        "attributes": [],
        "children": [
            {"kind": "element", "tagName": "h1", "attributes": [{"name": "class", "value": "title"}]},
            {"kind": "element", "tagName": "div", "attributes": [], "children": [
                {"kind": "element", "tagName": "h1", "attributes": []}
            ]}
        ]
    });
    let options = QueryOptions::default();
    assert_eq!(query_selector_all("main > h1", &doc, &options).unwrap().len(), 1);
    assert_eq!(query_selector_all("main h1", &doc, &options).unwrap().len(), 2);
    assert_eq!(query_selector_all(".title, div", &doc, &options).unwrap().len(), 2);
}
