//! Stylesheet encoding detection.
//!
//! Order: byte order mark, transport label, `@charset` rule at the very start
//! of a bounded prefix, then the default.

use crate::error::Error;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use serde::Serialize;

/// Bytes examined for a `@charset` rule, and bytes buffered by the stream
/// decoder before it commits to an encoding.
pub(crate) const PRESCAN_BYTES: usize = 1024;

const WINDOWS_1252_ALIASES: [&str; 5] = ["iso-8859-1", "iso8859-1", "latin1", "latin-1", "us-ascii"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SniffOptions {
    /// Label from the transport layer (e.g. a `Content-Type` charset).
    pub transport_encoding_label: Option<String>,
    /// Prefix length scanned for `@charset`; defaults to 1024.
    pub max_prescan_bytes: Option<usize>,
    /// Encoding used when nothing else applies; defaults to UTF-8.
    pub default_encoding: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SniffSource {
    /// Text input; no detection happened.
    Input,
    Bom,
    Transport,
    Charset,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingSniff {
    pub encoding: &'static Encoding,
    pub source: SniffSource,
}

impl EncodingSniff {
    /// Lowercase WHATWG encoding name, e.g. `utf-8` or `windows-1252`.
    pub fn name(&self) -> String {
        self.encoding.name().to_ascii_lowercase()
    }
}

pub fn sniff_css_encoding(bytes: &[u8], options: &SniffOptions) -> Result<EncodingSniff, Error> {
    let default = match options.default_encoding.as_deref() {
        Some(label) => resolve_label(label).ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?,
        None => UTF_8,
    };

    if let Some(encoding) = detect_bom(bytes) {
        return Ok(EncodingSniff {
            encoding,
            source: SniffSource::Bom,
        });
    }

    if let Some(encoding) = options
        .transport_encoding_label
        .as_deref()
        .and_then(resolve_label)
    {
        return Ok(EncodingSniff {
            encoding,
            source: SniffSource::Transport,
        });
    }

    let prescan = options.max_prescan_bytes.unwrap_or(PRESCAN_BYTES);
    if let Some(encoding) = charset_rule(bytes, prescan) {
        return Ok(EncodingSniff {
            encoding,
            source: SniffSource::Charset,
        });
    }

    Ok(EncodingSniff {
        encoding: default,
        source: SniffSource::Default,
    })
}

fn detect_bom(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(UTF_8)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some(UTF_16BE)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some(UTF_16LE)
    } else {
        None
    }
}

fn strip_quotes(label: &str) -> &str {
    let trimmed = label.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if quoted {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Resolve a label through the WHATWG table. The replacement encoding is
/// treated as unresolvable.
fn resolve_label(label: &str) -> Option<&'static Encoding> {
    let label = strip_quotes(label).to_ascii_lowercase();
    if label.is_empty() {
        return None;
    }
    if WINDOWS_1252_ALIASES.contains(&label.as_str()) {
        return Some(WINDOWS_1252);
    }
    Encoding::for_label(label.as_bytes()).filter(|encoding| *encoding != REPLACEMENT)
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|byte| byte.is_ascii_whitespace())
        .count();
    &bytes[skip..]
}

/// Match `@charset "<label>";` (either quote) at the start of the prefix.
fn charset_rule(bytes: &[u8], prescan: usize) -> Option<&'static Encoding> {
    let scan = &bytes[..bytes.len().min(prescan)];
    let scan = scan.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(scan);
    let scan = skip_whitespace(scan);

    const KEYWORD: &[u8] = b"@charset";
    if scan.len() < KEYWORD.len() || !scan[..KEYWORD.len()].eq_ignore_ascii_case(KEYWORD) {
        return None;
    }
    let rest = &scan[KEYWORD.len()..];
    let after_space = skip_whitespace(rest);
    if after_space.len() == rest.len() {
        return None;
    }

    let (&quote, body) = after_space.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = memchr::memchr(quote, body)?;
    if close == 0 {
        return None;
    }
    if skip_whitespace(&body[close + 1..]).first() != Some(&b';') {
        return None;
    }

    let label = std::str::from_utf8(&body[..close]).ok()?;
    let encoding = resolve_label(label)?;
    // A stylesheet that declares UTF-16 in ASCII-compatible bytes is UTF-8.
    if encoding == UTF_16BE || encoding == UTF_16LE {
        Some(UTF_8)
    } else {
        Some(encoding)
    }
}
