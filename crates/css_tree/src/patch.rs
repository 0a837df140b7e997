//! Span-based patch planning.
//!
//! A plan is computed from one parse of the original text and replays as a
//! sequence of copy and insert steps over that same text.
//!
//! Invariants:
//! - Slice steps are monotonically non-decreasing and never overlap; together
//!   with the replaced ranges they cover `[0, len)` exactly once.
//! - Every insert sits at the replay cursor, i.e. the end of the previous
//!   slice.
//! - Resolved edit ranges never overlap. Two zero-width inserts at the same
//!   offset are rejected as overlapping, since their relative order would be
//!   a guess.

use crate::error::Error;
use crate::node::{CssNode, NodeId};
use crate::options::ParseOptions;
use crate::parse::parse;
use crate::span::{Span, SpanProvenance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A node-targeted edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Edit {
    RemoveNode { target: NodeId },
    ReplaceNode { target: NodeId, css: String },
    InsertCssBefore { target: NodeId, css: String },
    InsertCssAfter { target: NodeId, css: String },
}

impl Edit {
    pub fn target(&self) -> NodeId {
        match self {
            Edit::RemoveNode { target }
            | Edit::ReplaceNode { target, .. }
            | Edit::InsertCssBefore { target, .. }
            | Edit::InsertCssAfter { target, .. } => *target,
        }
    }

    fn replacement_text(&self) -> &str {
        match self {
            Edit::RemoveNode { .. } => "",
            Edit::ReplaceNode { css, .. }
            | Edit::InsertCssBefore { css, .. }
            | Edit::InsertCssAfter { css, .. } => css,
        }
    }

    /// Range of the original text this edit replaces.
    fn range(&self, span: Span) -> (usize, usize) {
        match self {
            Edit::RemoveNode { .. } | Edit::ReplaceNode { .. } => (span.start, span.end),
            Edit::InsertCssBefore { .. } => (span.start, span.start),
            Edit::InsertCssAfter { .. } => (span.end, span.end),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PatchStep {
    /// Copy `original[start..end]`.
    Slice { start: usize, end: usize },
    /// Emit literal text at the replay cursor.
    Insert { at: usize, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPlan {
    pub steps: Vec<PatchStep>,
    /// Text obtained by replaying `steps` over the original.
    pub result: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatchErrorCode {
    NodeNotFound,
    MissingNodeSpan,
    NonInputSpanProvenance,
    OverlappingEdits,
    InvalidEditTarget,
}

impl PatchErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchErrorCode::NodeNotFound => "NODE_NOT_FOUND",
            PatchErrorCode::MissingNodeSpan => "MISSING_NODE_SPAN",
            PatchErrorCode::NonInputSpanProvenance => "NON_INPUT_SPAN_PROVENANCE",
            PatchErrorCode::OverlappingEdits => "OVERLAPPING_EDITS",
            PatchErrorCode::InvalidEditTarget => "INVALID_EDIT_TARGET",
        }
    }
}

impl fmt::Display for PatchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The edit set is inconsistent with the parsed document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchPlanningError {
    pub code: PatchErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PatchPlanningError {
    fn new(code: PatchErrorCode, target: NodeId) -> Self {
        Self {
            code,
            target: Some(target),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for PatchPlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch planning failed: {}", self.code)?;
        if let Some(target) = self.target {
            write!(f, " target={target}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for PatchPlanningError {}

/// A plan does not fit the text it is replayed against.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatchIntegrityError {
    #[error("invalid patch slice {start}..{end} (cursor {cursor}, text length {len})")]
    InvalidSlice {
        start: usize,
        end: usize,
        cursor: usize,
        len: usize,
    },
    #[error("invalid patch insertion at {at} (cursor {cursor})")]
    MisplacedInsert { at: usize, cursor: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error(transparent)]
    Planning(#[from] PatchPlanningError),
    #[error(transparent)]
    Parse(#[from] Error),
    #[error(transparent)]
    Integrity(#[from] PatchIntegrityError),
}

impl PatchError {
    pub fn code(&self) -> Option<PatchErrorCode> {
        match self {
            PatchError::Planning(err) => Some(err.code),
            _ => None,
        }
    }
}

struct Replacement<'e> {
    order: usize,
    target: NodeId,
    start: usize,
    end: usize,
    text: &'e str,
}

/// Plan `edits` against `original`.
pub fn compute_patch(original: &str, edits: &[Edit]) -> Result<PatchPlan, PatchError> {
    if edits.is_empty() {
        return Ok(PatchPlan {
            steps: vec![PatchStep::Slice {
                start: 0,
                end: original.len(),
            }],
            result: original.to_string(),
        });
    }

    let tree = parse(original, &ParseOptions::with_spans())?;
    let index = index_nodes(&tree.root);

    let mut replacements = edits
        .iter()
        .enumerate()
        .map(|(order, edit)| resolve(&index, order, edit))
        .collect::<Result<Vec<_>, _>>()?;
    replacements.sort_by_key(|replacement| (replacement.start, replacement.end, replacement.order));
    check_ranges(&replacements, original.len())?;

    let steps = plan_steps(&replacements, original.len());
    let result = apply_steps(original, &steps)?;
    log::debug!(
        target: "css.patch",
        "planned {} edits into {} steps",
        edits.len(),
        steps.len()
    );
    Ok(PatchPlan { steps, result })
}

/// Replay `plan` over `original`.
pub fn apply_patch_plan(original: &str, plan: &PatchPlan) -> Result<String, PatchIntegrityError> {
    apply_steps(original, &plan.steps)
}

fn index_nodes(root: &CssNode) -> HashMap<NodeId, &CssNode> {
    let mut index = HashMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        index.insert(node.id, node);
        stack.extend(node.children.iter().rev());
    }
    index
}

fn resolve<'e>(
    index: &HashMap<NodeId, &CssNode>,
    order: usize,
    edit: &'e Edit,
) -> Result<Replacement<'e>, PatchPlanningError> {
    let target = edit.target();
    if target == NodeId::INVALID {
        return Err(PatchPlanningError::new(PatchErrorCode::InvalidEditTarget, target));
    }
    let node = index
        .get(&target)
        .ok_or_else(|| PatchPlanningError::new(PatchErrorCode::NodeNotFound, target))?;
    if node.span_provenance != SpanProvenance::Input {
        return Err(
            PatchPlanningError::new(PatchErrorCode::NonInputSpanProvenance, target).with_detail("none"),
        );
    }
    let span = node
        .span
        .ok_or_else(|| PatchPlanningError::new(PatchErrorCode::MissingNodeSpan, target))?;
    let (start, end) = edit.range(span);
    Ok(Replacement {
        order,
        target,
        start,
        end,
        text: edit.replacement_text(),
    })
}

/// `replacements` must be sorted by `(start, end, order)`.
fn check_ranges(replacements: &[Replacement<'_>], len: usize) -> Result<(), PatchPlanningError> {
    let mut previous_end = 0;
    let mut previous_insert: Option<usize> = None;
    for replacement in replacements {
        let overlapping = || PatchPlanningError::new(PatchErrorCode::OverlappingEdits, replacement.target);
        if replacement.end < replacement.start || replacement.end > len {
            return Err(overlapping().with_detail("invalid replacement bounds"));
        }
        if replacement.start < previous_end {
            return Err(overlapping());
        }
        let zero_width = replacement.start == replacement.end;
        if zero_width && previous_insert == Some(replacement.start) {
            return Err(overlapping().with_detail("multiple insertions at one offset"));
        }
        previous_insert = zero_width.then_some(replacement.start);
        previous_end = previous_end.max(replacement.end);
    }
    Ok(())
}

fn plan_steps(replacements: &[Replacement<'_>], len: usize) -> Vec<PatchStep> {
    let mut steps = Vec::with_capacity(replacements.len() * 2 + 1);
    let mut cursor = 0;
    let mut slice_end = 0;
    for replacement in replacements {
        // A replacement starting where the previous one ended still needs an
        // (empty) slice so the insert lands on the replay cursor.
        if cursor < replacement.start || slice_end != replacement.start {
            steps.push(PatchStep::Slice {
                start: cursor,
                end: replacement.start,
            });
            slice_end = replacement.start;
        }
        steps.push(PatchStep::Insert {
            at: replacement.start,
            text: replacement.text.to_string(),
        });
        cursor = replacement.end;
    }
    if cursor < len {
        steps.push(PatchStep::Slice { start: cursor, end: len });
    }
    steps
}

fn apply_steps(original: &str, steps: &[PatchStep]) -> Result<String, PatchIntegrityError> {
    let len = original.len();
    let mut cursor = 0;
    let mut output = String::with_capacity(len);
    for step in steps {
        match step {
            PatchStep::Slice { start, end } => {
                let (start, end) = (*start, *end);
                let invalid = PatchIntegrityError::InvalidSlice {
                    start,
                    end,
                    cursor,
                    len,
                };
                if start < cursor || end < start || end > len {
                    log::warn!(target: "css.patch", "{invalid}");
                    return Err(invalid);
                }
                let Some(copied) = original.get(start..end) else {
                    log::warn!(target: "css.patch", "{invalid}");
                    return Err(invalid);
                };
                output.push_str(copied);
                cursor = end;
            }
            PatchStep::Insert { at, text } => {
                if *at != cursor || *at > len {
                    let invalid = PatchIntegrityError::MisplacedInsert { at: *at, cursor };
                    log::warn!(target: "css.patch", "{invalid}");
                    return Err(invalid);
                }
                output.push_str(text);
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests;
