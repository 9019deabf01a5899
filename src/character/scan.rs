//! Last-resort search for a card anywhere in the file.
//!
//! Some tools append the card JSON after `IEND`, stash it in private chunks, or
//! write chunk lengths that do not add up. When the chunk walk finds nothing,
//! every `{` byte becomes a candidate start, tried from the end of the file
//! backward since that is where appended metadata usually sits. For each start
//! the candidate end is the last `}` inside a fixed-size window, then earlier
//! `}` bytes, until the candidate end drifts too far from the window end.

use memchr::memchr2_iter;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::character::card::CharacterMetadata;
use crate::character::flexible::parse_flexible;

/// Bytes examined after each candidate `{`.
pub const SCAN_WINDOW_BYTES: usize = 512_000;

/// How far the candidate `}` may retreat from the window end before the start is abandoned.
pub const MAX_RETRY_GAP: usize = 10_000;

/// Bounds on the brute-force scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLimits {
    pub window_bytes: usize,
    pub max_retry_gap: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            window_bytes: SCAN_WINDOW_BYTES,
            max_retry_gap: MAX_RETRY_GAP,
        }
    }
}

/// A brace byte, at its offset in the raw buffer and in the decoded text.
#[derive(Debug, Clone, Copy)]
struct Brace {
    byte: usize,
    text: usize,
}

/// A card found by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHit {
    pub metadata: CharacterMetadata,
    /// Byte offset of the opening brace.
    pub start: usize,
    /// Byte offset one past the closing brace.
    pub end: usize,
}

/// Scan the whole buffer for an embedded card, ignoring chunk structure.
pub fn scan_for_card(data: &[u8], limits: &ScanLimits) -> Option<ScanHit> {
    // Decoding once is equivalent to decoding each window: braces are ASCII, so a
    // slice from one brace to another never splits a character or an invalid run.
    let text = String::from_utf8_lossy(data);
    let (opens, closes) = index_braces(data, text.as_bytes());
    debug!(
        candidates = opens.len(),
        closing = closes.len(),
        "Starting brute-force scan"
    );

    for open in opens.iter().rev() {
        let window_end = open
            .byte
            .saturating_add(limits.window_bytes)
            .min(data.len());
        let first = closes.partition_point(|c| c.byte <= open.byte);
        let last = closes.partition_point(|c| c.byte < window_end);
        let Some(candidates) = closes.get(first..last) else {
            continue;
        };

        for (attempt, close) in candidates.iter().rev().enumerate() {
            if attempt > 0 && window_end - close.byte > limits.max_retry_gap {
                trace!(start = open.byte, attempt, "Retry gap exceeded; next start");
                break;
            }
            if let Some(metadata) = parse_flexible(&text[open.text..=close.text]) {
                debug!(
                    start = open.byte,
                    end = close.byte + 1,
                    "Brute-force scan found a character card"
                );
                return Some(ScanHit {
                    metadata,
                    start: open.byte,
                    end: close.byte + 1,
                });
            }
        }
    }

    debug!("Brute-force scan found nothing");
    None
}

/// Pair every `{`/`}` in the raw bytes with its position in the lossy text.
///
/// Replacement characters never absorb ASCII bytes, so both sides contain the
/// same braces in the same order.
fn index_braces(data: &[u8], text: &[u8]) -> (Vec<Brace>, Vec<Brace>) {
    let mut opens = Vec::new();
    let mut closes = Vec::new();

    for (byte, text) in memchr2_iter(b'{', b'}', data).zip(memchr2_iter(b'{', b'}', text)) {
        let brace = Brace { byte, text };
        if data[byte] == b'{' {
            opens.push(brace);
        } else {
            closes.push(brace);
        }
    }

    (opens, closes)
}
