//! Character card extraction service.
//!
//! This module provides the [`CardExtractor`], which runs the three extraction
//! stages in order: the PNG signature check, the walk over text chunks, and (only
//! when the walk finds nothing) the brute-force scan over the raw bytes.
//!
//! The signature check is the only stage that can fail. Everything after it
//! reports "no card here" as `Ok(None)`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::character::card::CharacterMetadata;
use crate::character::png_text::{
    find_card_in_chunks, has_png_signature, list_text_chunks, TextChunkInfo, TextChunkKind,
};
use crate::character::scan::{scan_for_card, ScanLimits};

/// Keywords that mark a text chunk as a card carrier, compared case-insensitively.
pub const DEFAULT_KEYWORDS: [&str; 2] = ["chara", "character"];

pub const NOT_A_PNG_MESSAGE: &str =
    "This file is not a PNG. Please make sure you are using the original PNG image.";

/// Errors that can occur while extracting a card.
#[derive(Debug)]
pub enum ExtractError {
    /// The input does not start with the PNG magic number.
    InvalidFormat(String),

    /// The input file could not be read.
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::InvalidFormat(msg) => write!(f, "{msg}"),
            ExtractError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::InvalidFormat(_) => None,
            ExtractError::Io { source, .. } => Some(source),
        }
    }
}

/// Where a card was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CardSource {
    /// A keyword-matching text chunk starting at `offset`.
    Chunk { kind: TextChunkKind, offset: usize },
    /// Raw bytes `start..end` located by the brute-force scan.
    Scan { start: usize, end: usize },
}

impl fmt::Display for CardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardSource::Chunk { kind, offset } => write!(f, "{kind} chunk at byte {offset}"),
            CardSource::Scan { start, end } => write!(f, "raw bytes {start}..{end} (brute-force scan)"),
        }
    }
}

/// A card together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub metadata: CharacterMetadata,
    pub source: CardSource,
}

/// Knobs for a single extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub keywords: Vec<String>,
    /// Whether to fall back to the brute-force scan.
    pub brute_force: bool,
    pub limits: ScanLimits,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            brute_force: true,
            limits: ScanLimits::default(),
        }
    }
}

/// Extracts character cards from PNG bytes.
///
/// The extractor holds no state between calls, so one instance can serve any
/// number of files (and threads, since it is `Sync`).
#[derive(Debug, Clone, Default)]
pub struct CardExtractor {
    options: ExtractOptions,
}

impl CardExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the card from an in-memory PNG.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidFormat`] when the bytes do not start with the
    /// PNG magic number, even if they contain card JSON.
    pub fn extract(&self, data: &[u8]) -> Result<Option<Extraction>, ExtractError> {
        ensure_png(data)?;

        if let Some((metadata, hit)) = find_card_in_chunks(data, &self.options.keywords) {
            return Ok(Some(Extraction {
                metadata,
                source: CardSource::Chunk {
                    kind: hit.kind,
                    offset: hit.offset,
                },
            }));
        }

        if !self.options.brute_force {
            debug!("No card in text chunks; brute-force scan disabled");
            return Ok(None);
        }

        debug!(bytes = data.len(), "No card in text chunks; scanning raw bytes");
        Ok(scan_for_card(data, &self.options.limits).map(|hit| Extraction {
            metadata: hit.metadata,
            source: CardSource::Scan {
                start: hit.start,
                end: hit.end,
            },
        }))
    }

    /// Read `path` into memory and extract its card.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Option<Extraction>, ExtractError> {
        let data = read_file(path.as_ref())?;
        let extraction = self.extract(&data)?;
        match &extraction {
            Some(found) => info!(
                path = %path.as_ref().display(),
                name = %found.metadata.name,
                source = %found.source,
                "Extracted character card"
            ),
            None => info!(path = %path.as_ref().display(), "No character card found"),
        }
        Ok(extraction)
    }

    /// List the text chunks of an in-memory PNG without interpreting them.
    pub fn text_chunks(&self, data: &[u8]) -> Result<Vec<TextChunkInfo>, ExtractError> {
        ensure_png(data)?;
        Ok(list_text_chunks(data))
    }
}

/// Extract a card with default options.
pub fn extract_character(data: &[u8]) -> Result<Option<CharacterMetadata>, ExtractError> {
    Ok(CardExtractor::default()
        .extract(data)?
        .map(|extraction| extraction.metadata))
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, ExtractError> {
    fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_png(data: &[u8]) -> Result<(), ExtractError> {
    if has_png_signature(data) {
        Ok(())
    } else {
        Err(ExtractError::InvalidFormat(NOT_A_PNG_MESSAGE.to_string()))
    }
}
