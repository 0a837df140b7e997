//! CSS document kernel: identity- and span-stable trees, budgets, tracing,
//! streaming decode, patch planning and traversal.
//!
//! Every entry point is a pure function of its inputs. Node ids, trace
//! sequence numbers and budget accumulators live in the call that produced
//! them; nothing is shared between calls.

pub mod budget;
mod builder;
pub mod encoding;
pub mod error;
pub mod node;
pub mod options;
pub mod outline;
pub mod parse;
pub mod patch;
pub mod serialize;
pub mod span;
pub mod stream;
pub mod trace;
pub mod traverse;

pub use budget::{BudgetExceeded, BudgetName, BudgetStatus, Budgets};
pub use css_syntax::{AttributeValue, NodeDetail, NodeType, ParseContext};
pub use encoding::{
    EncodingSniff, SniffOptions, SniffSource, StreamDecoder, decode_css_bytes, sniff_css_encoding,
};
pub use error::{Error, ParseError, parse_error_id};
pub use node::{CssNode, NodeId};
pub use options::{ParseOptions, TokenizeOptions};
pub use outline::{Chunk, ChunkOptions, Outline, OutlineEntry, chunk, outline};
pub use parse::{
    ParsedTree, Token, TreeKind, parse, parse_bytes, parse_declaration_list, parse_error_spec_ref,
    parse_fragment, parse_rule_list, tokenize,
};
pub use patch::{
    Edit, PatchError, PatchErrorCode, PatchIntegrityError, PatchPlan, PatchPlanningError, PatchStep,
    apply_patch_plan, compute_patch,
};
pub use serialize::serialize;
pub use span::{Span, SpanProvenance};
pub use stream::{TokenStream, parse_stream, tokenize_stream};
pub use trace::{DecodeSource, TraceEvent, TraceKind};
pub use traverse::{PreOrder, find_all_by_type, find_by_id, walk, walk_by_type};
