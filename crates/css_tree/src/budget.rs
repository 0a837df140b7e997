//! Resource budgets.
//!
//! Every limit is optional; an absent limit is unbounded. Checks are plain
//! functions over per-call values, so concurrent calls never share counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budgets {
    pub max_input_bytes: Option<u64>,
    pub max_buffered_bytes: Option<u64>,
    pub max_tokens: Option<u64>,
    pub max_nodes: Option<u64>,
    pub max_depth: Option<u64>,
    pub max_trace_events: Option<u64>,
    pub max_trace_bytes: Option<u64>,
    pub max_time_ms: Option<u64>,
}

impl Budgets {
    pub fn limit(&self, name: BudgetName) -> Option<u64> {
        match name {
            BudgetName::MaxInputBytes => self.max_input_bytes,
            BudgetName::MaxBufferedBytes => self.max_buffered_bytes,
            BudgetName::MaxTokens => self.max_tokens,
            BudgetName::MaxNodes => self.max_nodes,
            BudgetName::MaxDepth => self.max_depth,
            BudgetName::MaxTraceEvents => self.max_trace_events,
            BudgetName::MaxTraceBytes => self.max_trace_bytes,
            BudgetName::MaxTimeMs => self.max_time_ms,
        }
    }

    /// Check `actual` against the named limit.
    pub fn check(&self, name: BudgetName, actual: u64) -> Result<(), BudgetExceeded> {
        enforce(name, self.limit(name), actual)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetName {
    MaxInputBytes,
    MaxBufferedBytes,
    MaxTokens,
    MaxNodes,
    MaxDepth,
    MaxTraceEvents,
    MaxTraceBytes,
    MaxTimeMs,
}

impl BudgetName {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetName::MaxInputBytes => "maxInputBytes",
            BudgetName::MaxBufferedBytes => "maxBufferedBytes",
            BudgetName::MaxTokens => "maxTokens",
            BudgetName::MaxNodes => "maxNodes",
            BudgetName::MaxDepth => "maxDepth",
            BudgetName::MaxTraceEvents => "maxTraceEvents",
            BudgetName::MaxTraceBytes => "maxTraceBytes",
            BudgetName::MaxTimeMs => "maxTimeMs",
        }
    }
}

impl fmt::Display for BudgetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("budget {budget} exceeded: limit {limit}, actual {actual}")]
pub struct BudgetExceeded {
    pub budget: BudgetName,
    pub limit: u64,
    pub actual: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetStatus {
    Ok,
    Exceeded,
}

/// Fail when `actual` is strictly greater than `limit`.
pub fn enforce(budget: BudgetName, limit: Option<u64>, actual: u64) -> Result<(), BudgetExceeded> {
    match limit {
        Some(limit) if actual > limit => Err(BudgetExceeded {
            budget,
            limit,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Wall-clock budget for one call, started when the call begins.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Deadline {
    started: Instant,
    limit_ms: Option<u64>,
}

impl Deadline {
    pub(crate) fn start(budgets: &Budgets) -> Self {
        Self {
            started: Instant::now(),
            limit_ms: budgets.max_time_ms,
        }
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        duration_ms(self.started.elapsed())
    }

    pub(crate) fn check(&self) -> Result<(), BudgetExceeded> {
        if self.limit_ms.is_none() {
            return Ok(());
        }
        enforce(BudgetName::MaxTimeMs, self.limit_ms, self.elapsed_ms())
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Widen a length for budget accounting, saturating on exotic targets.
pub fn as_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
