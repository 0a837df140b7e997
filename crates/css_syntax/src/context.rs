use serde::Serialize;
use std::fmt;

/// Grammar entry point for a parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseContext {
    Stylesheet,
    Atrule,
    AtrulePrelude,
    MediaQueryList,
    MediaQuery,
    Condition,
    Rule,
    SelectorList,
    Selector,
    Block,
    DeclarationList,
    Declaration,
    Value,
}

impl ParseContext {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseContext::Stylesheet => "stylesheet",
            ParseContext::Atrule => "atrule",
            ParseContext::AtrulePrelude => "atrulePrelude",
            ParseContext::MediaQueryList => "mediaQueryList",
            ParseContext::MediaQuery => "mediaQuery",
            ParseContext::Condition => "condition",
            ParseContext::Rule => "rule",
            ParseContext::SelectorList => "selectorList",
            ParseContext::Selector => "selector",
            ParseContext::Block => "block",
            ParseContext::DeclarationList => "declarationList",
            ParseContext::Declaration => "declaration",
            ParseContext::Value => "value",
        }
    }

    /// Resolve a caller-supplied context name.
    ///
    /// Names are trimmed and matched ASCII case-insensitively; dashed aliases
    /// (`at-rule`, `media-query-list`, `declaration-list`, ...) are accepted,
    /// and `rulelist`/`rule-list` resolve to `rule`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let context = match normalized.as_str() {
            "stylesheet" => ParseContext::Stylesheet,
            "atrule" | "at-rule" => ParseContext::Atrule,
            "atruleprelude" | "at-rule-prelude" => ParseContext::AtrulePrelude,
            "mediaquerylist" | "media-query-list" => ParseContext::MediaQueryList,
            "mediaquery" | "media-query" => ParseContext::MediaQuery,
            "condition" => ParseContext::Condition,
            "rule" | "rulelist" | "rule-list" => ParseContext::Rule,
            "selectorlist" | "selector-list" => ParseContext::SelectorList,
            "selector" => ParseContext::Selector,
            "block" => ParseContext::Block,
            "declarationlist" | "declaration-list" => ParseContext::DeclarationList,
            "declaration" => ParseContext::Declaration,
            "value" => ParseContext::Value,
            _ => return None,
        };
        Some(context)
    }
}

impl fmt::Display for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
