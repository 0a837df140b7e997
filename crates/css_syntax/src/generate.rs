//! Canonical text generation for raw syntax trees.
//!
//! Output contains no optional whitespace: `.x { color: red; }` generates as
//! `.x{color:red}`. Semicolons appear only between block items that follow a
//! declaration, strings are re-quoted with `"`, and urls are written
//! unquoted with escapes. Generating a freshly parsed generation is a fixed
//! point.

use crate::ast::{AttributeValue, NodeDetail, NodeType, RawNode};
use std::fmt::Write as _;

pub fn generate(node: &RawNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &RawNode, out: &mut String) {
    match node.kind {
        NodeType::StyleSheet => write_children(node, out),
        NodeType::DeclarationList => write_items(node, out),
        NodeType::Block => {
            out.push('{');
            write_items(node, out);
            out.push('}');
        }
        NodeType::Rule => write_children(node, out),
        NodeType::Atrule => {
            out.push('@');
            out.push_str(name_of(node));
            let mut has_block = false;
            for child in &node.children {
                if child.kind == NodeType::Block {
                    has_block = true;
                } else {
                    out.push(' ');
                }
                write_node(child, out);
            }
            if !has_block {
                out.push(';');
            }
        }
        NodeType::SelectorList | NodeType::MediaQueryList => write_joined(node, ",", out),
        NodeType::AtrulePrelude
        | NodeType::Selector
        | NodeType::MediaQuery
        | NodeType::Condition
        | NodeType::Value => write_children(node, out),
        NodeType::TypeSelector | NodeType::Identifier => out.push_str(name_of(node)),
        NodeType::IdSelector => {
            out.push('#');
            out.push_str(name_of(node));
        }
        NodeType::ClassSelector => {
            out.push('.');
            out.push_str(name_of(node));
        }
        NodeType::AttributeSelector => write_attribute(node, out),
        NodeType::PseudoClassSelector | NodeType::PseudoElementSelector => {
            out.push_str(if node.kind == NodeType::PseudoElementSelector {
                "::"
            } else {
                ":"
            });
            out.push_str(name_of(node));
            if !node.children.is_empty() {
                out.push('(');
                write_children(node, out);
                out.push(')');
            }
        }
        NodeType::NestingSelector => out.push('&'),
        NodeType::Combinator => out.push_str(name_of(node)),
        NodeType::Declaration => {
            if let NodeDetail::Declaration {
                property,
                important,
            } = &node.detail
            {
                out.push_str(property);
                out.push(':');
                write_children(node, out);
                if *important {
                    out.push_str("!important");
                }
            }
        }
        NodeType::Number | NodeType::Operator | NodeType::Raw => out.push_str(value_of(node)),
        NodeType::WhiteSpace => out.push(' '),
        NodeType::Percentage => {
            out.push_str(value_of(node));
            out.push('%');
        }
        NodeType::Dimension => {
            if let NodeDetail::Dimension { value, unit } = &node.detail {
                out.push_str(value);
                out.push_str(unit);
            }
        }
        NodeType::Hash => {
            out.push('#');
            out.push_str(value_of(node));
        }
        NodeType::String => write_string(value_of(node), out),
        NodeType::Url => write_url(value_of(node), out),
        NodeType::Function => {
            out.push_str(name_of(node));
            out.push('(');
            write_children(node, out);
            out.push(')');
        }
        NodeType::Parentheses => {
            out.push('(');
            write_children(node, out);
            out.push(')');
        }
        NodeType::Brackets => {
            out.push('[');
            write_children(node, out);
            out.push(']');
        }
    }
}

fn name_of(node: &RawNode) -> &str {
    node.detail.name_str().unwrap_or_default()
}

fn value_of(node: &RawNode) -> &str {
    node.detail.value_str().unwrap_or_default()
}

fn write_children(node: &RawNode, out: &mut String) {
    for child in &node.children {
        write_node(child, out);
    }
}

fn write_joined(node: &RawNode, separator: &str, out: &mut String) {
    for (i, child) in node.children.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        write_node(child, out);
    }
}

/// Block items, with `;` after each declaration that is followed by more.
fn write_items(node: &RawNode, out: &mut String) {
    let mut prev_declaration = false;
    for child in &node.children {
        if prev_declaration {
            out.push(';');
        }
        write_node(child, out);
        prev_declaration = child.kind == NodeType::Declaration;
    }
}

fn write_attribute(node: &RawNode, out: &mut String) {
    let NodeDetail::Attribute {
        name,
        matcher,
        value,
        flags,
    } = &node.detail
    else {
        return;
    };
    out.push('[');
    out.push_str(name);
    if let (Some(matcher), Some(value)) = (matcher, value) {
        out.push_str(matcher);
        match value {
            AttributeValue::Identifier(ident) => out.push_str(ident),
            AttributeValue::String(text) => write_string(text, out),
        }
        if let Some(flags) = flags {
            out.push(' ');
            out.push_str(flags);
        }
    }
    out.push(']');
}

fn write_string(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_url(value: &str, out: &mut String) {
    out.push_str("url(");
    for ch in value.chars() {
        match ch {
            '(' | ')' | '"' | '\'' | '\\' | ' ' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_control() || c.is_whitespace() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(')');
}
