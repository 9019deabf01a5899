//! Lenient card parsing: plain JSON or base64-wrapped JSON, in either schema.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;

use crate::character::card::CharacterMetadata;

/// Fewest base64 characters worth decoding.
pub const MIN_BASE64_CHARS: usize = 20;

/// Base64 characters decoded up front to see whether a payload can open with `{`.
const HEAD_CHARS: usize = 64;

/// Standard alphabet that tolerates missing padding and stray trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Try to read a character card out of `text`.
///
/// The text is tried first as JSON (when it starts with `{`) and then as base64
/// after dropping every character outside the base64 alphabet. Returns `None`
/// when neither yields an object in a known card shape.
pub fn parse_flexible(text: &str) -> Option<CharacterMetadata> {
    let trimmed = trim_text(text);
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('{') {
        if let Some(card) = parse_card_json(trimmed) {
            return Some(card);
        }
    }

    let decoded = decode_base64_candidate(trimmed)?;
    let decoded = trim_text(&decoded);
    if !decoded.starts_with('{') {
        return None;
    }
    parse_card_json(decoded)
}

fn parse_card_json(json: &str) -> Option<CharacterMetadata> {
    let value: Value = serde_json::from_str(json).ok()?;
    CharacterMetadata::from_card_value(&value)
}

fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn is_base64_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/' | b'=')
}

fn decode_base64_candidate(text: &str) -> Option<String> {
    if !base64_prefix_may_open_object(text) {
        return None;
    }

    let filtered: Vec<u8> = text.bytes().filter(|&b| is_base64_byte(b)).collect();
    if filtered.len() < MIN_BASE64_CHARS {
        return None;
    }

    let decoded = LENIENT_BASE64.decode(&filtered).ok()?;
    Some(String::from_utf8_lossy(&decoded).into_owned())
}

/// Decode only the first [`HEAD_CHARS`] base64 characters and reject payloads
/// that cannot start a JSON object with a key.
///
/// The full path keeps a payload only if its text, trimmed, opens with `{` and
/// parses as an object. Checking that on a short head lets the brute-force
/// scanner skip filtering and decoding whole windows of binary data.
fn base64_prefix_may_open_object(text: &str) -> bool {
    let mut head = [0u8; HEAD_CHARS];
    let mut len = 0;
    for byte in text.bytes().filter(|&b| is_base64_byte(b)).take(HEAD_CHARS) {
        head[len] = byte;
        len += 1;
    }
    if len < HEAD_CHARS {
        return true;
    }

    // Padding inside the first 64 characters means the full decode fails too.
    let Ok(decoded) = LENIENT_BASE64.decode(head) else {
        return false;
    };

    let lossy;
    let head_text = match std::str::from_utf8(&decoded) {
        Ok(text) => text,
        // A character cut at the end of the head is left to the full decode.
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&decoded[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => {
            lossy = String::from_utf8_lossy(&decoded);
            &*lossy
        }
    };
    head_may_open_object(head_text)
}

/// Whether `head` can be the start of the trimmed text of a card object.
fn head_may_open_object(head: &str) -> bool {
    let head = head.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    let Some(rest) = head.strip_prefix('{') else {
        return head.is_empty();
    };
    // JSON allows only these four between `{` and the first key.
    let rest = rest.trim_start_matches([' ', '\t', '\n', '\r']);
    rest.is_empty() || rest.starts_with('"')
}
