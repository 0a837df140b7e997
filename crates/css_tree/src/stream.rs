//! Chunked input: incremental decode under budgets, then parse or tokenize.
//!
//! Budgets on received totals are checked as each chunk arrives, before the
//! next read is issued, so an oversized stream is abandoned without being
//! drained.

use crate::budget::{BudgetName, Budgets, Deadline, as_u64};
use crate::encoding::{EncodingSniff, PRESCAN_BYTES, SniffOptions, StreamDecoder, sniff_css_encoding};
use crate::error::Error;
use crate::options::{ParseOptions, TokenizeOptions};
use crate::parse::{ParsedTree, Token, parse, sniffed, tokenize};
use crate::trace::TraceKind;
use futures::{Stream, StreamExt};
use std::fmt;

/// Tokens of a decoded stream, yielded in source order.
pub type TokenStream = futures::stream::Iter<std::vec::IntoIter<Token>>;

#[derive(Debug)]
struct DecodedStream {
    text: String,
    sniff: EncodingSniff,
    bytes_read: u64,
    max_buffered: u64,
}

/// Decode a byte stream and parse it as a stylesheet.
///
/// With tracing enabled the trace continues with the sniffed `decode`
/// event, a `stream` event and a `maxBufferedBytes` budget event.
pub async fn parse_stream<S, B, E>(stream: S, options: &ParseOptions) -> Result<ParsedTree, Error>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let decoded = decode_stream(
        stream,
        options.transport_encoding_label.as_deref(),
        &options.budgets,
    )
    .await?;
    let mut tree = parse(&decoded.text, options)?;
    tree.extend_trace(options, |trace| {
        trace.record(sniffed(&decoded.sniff))?;
        trace.record(TraceKind::Stream {
            bytes_read: decoded.bytes_read,
        })?;
        trace.record_budget(
            BudgetName::MaxBufferedBytes,
            options.budgets.max_buffered_bytes,
            decoded.max_buffered,
        )
    })?;
    Ok(tree)
}

/// Decode a byte stream completely, then yield its tokens.
pub async fn tokenize_stream<S, B, E>(stream: S, options: &TokenizeOptions) -> Result<TokenStream, Error>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let decoded = decode_stream(
        stream,
        options.transport_encoding_label.as_deref(),
        &options.budgets,
    )
    .await?;
    let tokens = tokenize(&decoded.text, options)?;
    Ok(futures::stream::iter(tokens))
}

async fn decode_stream<S, B, E>(
    mut stream: S,
    transport_label: Option<&str>,
    budgets: &Budgets,
) -> Result<DecodedStream, Error>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let deadline = Deadline::start(budgets);
    let sniff_options = SniffOptions {
        transport_encoding_label: transport_label.map(str::to_string),
        max_prescan_bytes: Some(PRESCAN_BYTES),
        default_encoding: None,
    };

    let mut text = String::new();
    let mut total = 0u64;
    let mut max_buffered = 0u64;
    let mut pending: Vec<u8> = Vec::new();
    let mut decoder: Option<(StreamDecoder, EncodingSniff)> = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| Error::StreamReadFailed(err.to_string()))?;
        let bytes = chunk.as_ref();
        total = total.saturating_add(as_u64(bytes.len()));
        log::trace!(target: "css.stream", "chunk len={} total={total}", bytes.len());
        budgets.check(BudgetName::MaxInputBytes, total)?;
        deadline.check()?;

        if let Some((decoder, _)) = decoder.as_mut() {
            let chunk_len = as_u64(bytes.len());
            max_buffered = max_buffered.max(chunk_len);
            budgets.check(BudgetName::MaxBufferedBytes, chunk_len)?;
            decoder.push_chunk(&mut text, bytes);
            continue;
        }

        pending.extend_from_slice(bytes);
        let buffered = as_u64(pending.len());
        max_buffered = max_buffered.max(buffered);
        budgets.check(BudgetName::MaxBufferedBytes, buffered)?;
        if transport_label.is_some() || pending.len() >= PRESCAN_BYTES {
            decoder = Some(start_decoding(&pending, &sniff_options, &mut text)?);
            pending = Vec::new();
        }
    }

    let (decoder, sniff) = match decoder {
        Some(started) => started,
        None => start_decoding(&pending, &sniff_options, &mut text)?,
    };
    decoder.finish(&mut text);
    log::debug!(
        target: "css.stream",
        "stream decoded: encoding={} source={:?} bytes={total} max_buffered={max_buffered}",
        sniff.name(),
        sniff.source
    );

    Ok(DecodedStream {
        text,
        sniff,
        bytes_read: total,
        max_buffered,
    })
}

/// Sniff the buffered prefix and push it through a fresh decoder.
fn start_decoding(
    pending: &[u8],
    options: &SniffOptions,
    text: &mut String,
) -> Result<(StreamDecoder, EncodingSniff), Error> {
    let sniff = sniff_css_encoding(pending, options)?;
    let mut decoder = StreamDecoder::new(sniff.encoding);
    decoder.push_chunk(text, pending);
    Ok((decoder, sniff))
}
