//! Turns the bytes after a text chunk's keyword into a text candidate.
//!
//! `tEXt` carries the text as-is. `zTXt` prefixes a compression-method byte and
//! stores a zlib stream. `iTXt` has a compression flag, a method byte, a language
//! tag and a translated keyword before the (optionally compressed) text.

use std::fmt;

use flate2::{Decompress, FlushDecompress, Status};
use memchr::memchr;

use crate::character::png_text::TextChunkKind;

#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload was not a valid zlib stream.
    Decompress(String),
    /// The chunk ended before a required header field.
    Truncated(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Decompress(msg) => write!(f, "decompression failed: {}", msg),
            DecodeError::Truncated(field) => write!(f, "text chunk ends before {}", field),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Inflate a zlib stream, failing on anything that is not one.
///
/// A stream that runs out of input before its end marker is an error too, so
/// empty or cut-off payloads never come back as empty text.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decompress = Decompress::new(true);
    let mut output = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        if output.len() == output.capacity() {
            output.reserve(output.capacity());
        }
        let (in_before, out_before) = (decompress.total_in(), decompress.total_out());
        let remaining = &data[(in_before as usize).min(data.len())..];

        let status = decompress
            .decompress_vec(remaining, &mut output, FlushDecompress::Finish)
            .map_err(|e| DecodeError::Decompress(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(output),
            _ if decompress.total_in() == in_before && decompress.total_out() == out_before => {
                return Err(DecodeError::Decompress(
                    "unexpected end of zlib stream".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Decode `body` (the bytes after the keyword's null) for the given chunk kind.
pub fn decode_payload(kind: TextChunkKind, body: &[u8]) -> Result<String, DecodeError> {
    let bytes = match kind {
        TextChunkKind::Text => body.to_vec(),
        TextChunkKind::Compressed => {
            // The method byte is always 0 (zlib) in practice, so it is not checked.
            let compressed = body
                .get(1..)
                .ok_or(DecodeError::Truncated("compression method"))?;
            inflate(compressed)?
        }
        TextChunkKind::International => {
            let compressed = body.first() == Some(&1);
            let lang_end = skip_null_terminated(body, 2);
            let text_start = skip_null_terminated(body, lang_end);
            let text = &body[text_start.min(body.len())..];
            if compressed {
                inflate(text)?
            } else {
                text.to_vec()
            }
        }
    };

    Ok(bytes_to_text(&bytes))
}

/// Index just past the next null at or after `from`, or the end of `body`.
///
/// Empty fields (a null right at `from`) advance by exactly one byte.
fn skip_null_terminated(body: &[u8], from: usize) -> usize {
    match body.get(from..).and_then(|rest| memchr(0, rest)) {
        Some(idx) => from + idx + 1,
        None => body.len(),
    }
}

/// Lossy UTF-8 decoding without a leading byte order mark.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
