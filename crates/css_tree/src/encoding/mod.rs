//! Byte-level input handling: encoding detection and decoding.

mod decode;
mod sniff;

pub use decode::{StreamDecoder, decode_css_bytes};
pub(crate) use sniff::PRESCAN_BYTES;
pub use sniff::{EncodingSniff, SniffOptions, SniffSource, sniff_css_encoding};
