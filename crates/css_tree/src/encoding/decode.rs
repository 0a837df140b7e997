use super::sniff::{EncodingSniff, SniffOptions, sniff_css_encoding};
use crate::error::Error;
use encoding_rs::{CoderResult, Decoder, Encoding};

/// Sniff and decode a complete byte buffer. Malformed sequences become
/// U+FFFD; a byte order mark matching the encoding is removed.
pub fn decode_css_bytes(bytes: &[u8], options: &SniffOptions) -> Result<(String, EncodingSniff), Error> {
    let sniff = sniff_css_encoding(bytes, options)?;
    let (text, _) = sniff.encoding.decode_with_bom_removal(bytes);
    log::debug!(
        target: "css.stream",
        "decoded {} bytes as {} ({:?})",
        bytes.len(),
        sniff.name(),
        sniff.source
    );
    Ok((text.into_owned(), sniff))
}

/// Incremental decoder for chunked input.
///
/// Sequences split across chunk boundaries are carried inside the decoder;
/// `finish` flushes an incomplete tail as U+FFFD so the text is never
/// silently truncated.
pub struct StreamDecoder {
    decoder: Decoder,
}

impl StreamDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
        }
    }

    pub fn push_chunk(&mut self, text: &mut String, bytes: &[u8]) {
        self.decode(text, bytes, false);
    }

    pub fn finish(mut self, text: &mut String) {
        self.decode(text, &[], true);
    }

    fn decode(&mut self, text: &mut String, mut bytes: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len().saturating_add(16));
            text.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(bytes, text, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => return,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StreamDecoder, decode_css_bytes};
    use crate::encoding::{SniffOptions, SniffSource};
    use encoding_rs::{UTF_8, UTF_16LE, WINDOWS_1252};

    #[test]
    fn whole_buffer_drops_bom() {
        let (text, sniff) = decode_css_bytes(b"\xEF\xBB\xBFa{}", &SniffOptions::default()).unwrap();
        assert_eq!(text, "a{}");
        assert_eq!(sniff.source, SniffSource::Bom);
    }

    #[test]
    fn whole_buffer_uses_charset() {
        let (text, sniff) =
            decode_css_bytes(b"@charset \"latin1\"; a::after{content:\"\xE9\"}", &SniffOptions::default())
                .unwrap();
        assert_eq!(sniff.name(), "windows-1252");
        assert!(text.ends_with("content:\"é\"}"));
    }

    #[test]
    fn split_multibyte_across_chunks() {
        let mut text = String::new();
        let mut decoder = StreamDecoder::new(UTF_8);
        decoder.push_chunk(&mut text, &[b'a', 0xC3]);
        assert_eq!(text, "a");
        decoder.push_chunk(&mut text, &[0xA9, b'b']);
        decoder.finish(&mut text);
        assert_eq!(text, "aéb");
    }

    #[test]
    fn incomplete_tail_is_flushed() {
        let mut text = String::new();
        let mut decoder = StreamDecoder::new(UTF_8);
        decoder.push_chunk(&mut text, &[b'x', 0xE2, 0x82]);
        decoder.finish(&mut text);
        assert_eq!(text, "x\u{FFFD}");
    }

    #[test]
    fn utf16_units_split_across_chunks() {
        let mut text = String::new();
        let mut decoder = StreamDecoder::new(UTF_16LE);
        decoder.push_chunk(&mut text, &[0xFF, 0xFE, b'a']);
        decoder.push_chunk(&mut text, &[0x00, b'{', 0x00, b'}']);
        decoder.push_chunk(&mut text, &[0x00]);
        decoder.finish(&mut text);
        assert_eq!(text, "a{}");
    }

    #[test]
    fn single_byte_encoding() {
        let mut text = String::new();
        let mut decoder = StreamDecoder::new(WINDOWS_1252);
        decoder.push_chunk(&mut text, &[0x80]);
        decoder.finish(&mut text);
        assert_eq!(text, "€");
    }
}
