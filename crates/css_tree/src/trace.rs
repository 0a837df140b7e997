//! Structured execution trace.
//!
//! A recorder is owned by one call. Events are appended in order, `seq`
//! starts at 1, and the event and byte budgets are checked after each
//! append so the event that crosses a limit is the last one recorded.

use crate::budget::{BudgetExceeded, BudgetName, BudgetStatus, Budgets, as_u64, enforce};
use css_syntax::ParseContext;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: TraceKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecodeSource {
    /// Text handed in directly; nothing was decoded.
    Input,
    /// Bytes decoded after encoding detection.
    Sniff,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TraceKind {
    #[serde(rename_all = "camelCase")]
    Decode {
        source: DecodeSource,
        encoding: String,
        sniff_source: crate::encoding::SniffSource,
    },
    Token {
        count: u64,
    },
    #[serde(rename_all = "camelCase")]
    Parse {
        context: ParseContext,
        node_count: u64,
        error_count: u64,
    },
    #[serde(rename_all = "camelCase")]
    ParseError {
        parse_error_id: String,
        start_offset: Option<usize>,
        end_offset: Option<usize>,
    },
    Budget {
        budget: BudgetName,
        limit: Option<u64>,
        actual: u64,
        status: BudgetStatus,
    },
    #[serde(rename_all = "camelCase")]
    Stream {
        bytes_read: u64,
    },
}

pub(crate) struct TraceRecorder {
    events: Option<Vec<TraceEvent>>,
    bytes: u64,
    max_events: Option<u64>,
    max_bytes: Option<u64>,
}

impl TraceRecorder {
    pub(crate) fn new(enabled: bool, budgets: &Budgets) -> Self {
        Self {
            events: enabled.then(Vec::new),
            bytes: 0,
            max_events: budgets.max_trace_events,
            max_bytes: budgets.max_trace_bytes,
        }
    }

    /// Continue a trace produced by an earlier stage of the same call.
    pub(crate) fn resume(events: Option<Vec<TraceEvent>>, budgets: &Budgets) -> Self {
        let bytes = events
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(event_size)
            .sum();
        Self {
            events,
            bytes,
            max_events: budgets.max_trace_events,
            max_bytes: budgets.max_trace_bytes,
        }
    }

    pub(crate) fn record(&mut self, event: TraceKind) -> Result<(), BudgetExceeded> {
        let Some(events) = self.events.as_mut() else {
            return Ok(());
        };
        let event = TraceEvent {
            seq: as_u64(events.len()) + 1,
            event,
        };
        self.bytes = self.bytes.saturating_add(event_size(&event));
        log::trace!(target: "css.parse", "trace event {event:?}");
        events.push(event);
        enforce(BudgetName::MaxTraceEvents, self.max_events, as_u64(events.len()))?;
        enforce(BudgetName::MaxTraceBytes, self.max_bytes, self.bytes)
    }

    /// Record the outcome of a measurement that already passed `enforce`.
    pub(crate) fn record_budget(
        &mut self,
        budget: BudgetName,
        limit: Option<u64>,
        actual: u64,
    ) -> Result<(), BudgetExceeded> {
        let status = match limit {
            Some(limit) if actual > limit => BudgetStatus::Exceeded,
            _ => BudgetStatus::Ok,
        };
        self.record(TraceKind::Budget {
            budget,
            limit,
            actual,
            status,
        })
    }

    pub(crate) fn finish(self) -> Option<Vec<TraceEvent>> {
        self.events
    }
}

fn event_size(event: &TraceEvent) -> u64 {
    serde_json::to_vec(event)
        .map(|bytes| as_u64(bytes.len()))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{DecodeSource, TraceKind, TraceRecorder};
    use crate::budget::{BudgetName, Budgets};
    use crate::encoding::SniffSource;

    fn decode() -> TraceKind {
        TraceKind::Decode {
            source: DecodeSource::Input,
            encoding: "utf-8".to_string(),
            sniff_source: SniffSource::Input,
        }
    }

    #[test]
    fn disabled_recorder_keeps_nothing() {
        let budgets = Budgets {
            max_trace_events: Some(0),
            ..Budgets::default()
        };
        let mut trace = TraceRecorder::new(false, &budgets);
        trace.record(decode()).unwrap();
        assert!(trace.finish().is_none());
    }

    #[test]
    fn seq_is_dense_from_one() {
        let mut trace = TraceRecorder::new(true, &Budgets::default());
        trace.record(decode()).unwrap();
        trace.record(TraceKind::Token { count: 3 }).unwrap();
        let events = trace.finish().unwrap();
        let seqs: Vec<u64> = events.iter().map(|event| event.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn event_budget_fails_on_crossing_event() {
        let budgets = Budgets {
            max_trace_events: Some(1),
            ..Budgets::default()
        };
        let mut trace = TraceRecorder::new(true, &budgets);
        trace.record(decode()).unwrap();
        let err = trace.record(TraceKind::Token { count: 1 }).unwrap_err();
        assert_eq!(err.budget, BudgetName::MaxTraceEvents);
        assert_eq!((err.limit, err.actual), (1, 2));
    }

    #[test]
    fn byte_budget_counts_serialized_size() {
        let budgets = Budgets {
            max_trace_bytes: Some(10),
            ..Budgets::default()
        };
        let mut trace = TraceRecorder::new(true, &budgets);
        let err = trace.record(decode()).unwrap_err();
        assert_eq!(err.budget, BudgetName::MaxTraceBytes);
        assert!(err.actual > 10);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let mut trace = TraceRecorder::new(true, &Budgets::default());
        trace.record(decode()).unwrap();
        trace
            .record_budget(BudgetName::MaxTokens, None, 4)
            .unwrap();
        let events = trace.finish().unwrap();
        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(
            json[0],
            serde_json::json!({
                "seq": 1,
                "kind": "decode",
                "source": "input",
                "encoding": "utf-8",
                "sniffSource": "input"
            })
        );
        assert_eq!(
            json[1],
            serde_json::json!({
                "seq": 2,
                "kind": "budget",
                "budget": "maxTokens",
                "limit": null,
                "actual": 4,
                "status": "ok"
            })
        );
    }
}
