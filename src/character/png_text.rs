use std::fmt;

use crc32fast::Hasher;
use memchr::memchr;
use serde::Serialize;
use tracing::{debug, trace};

use crate::character::card::CharacterMetadata;
use crate::character::decode::decode_payload;
use crate::character::flexible::parse_flexible;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Length, type and CRC fields around every chunk's data.
const CHUNK_OVERHEAD: usize = 12;

/// Only the magic number is compared; the line-ending bytes after it are not.
pub fn has_png_signature(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == PNG_SIGNATURE[..4]
}

/// The three PNG chunk types that can carry keyword/text pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextChunkKind {
    #[serde(rename = "tEXt")]
    Text,
    #[serde(rename = "zTXt")]
    Compressed,
    #[serde(rename = "iTXt")]
    International,
}

impl TextChunkKind {
    pub fn from_chunk_type(chunk_type: &[u8; 4]) -> Option<Self> {
        match chunk_type {
            b"tEXt" => Some(TextChunkKind::Text),
            b"zTXt" => Some(TextChunkKind::Compressed),
            b"iTXt" => Some(TextChunkKind::International),
            _ => None,
        }
    }

    pub fn chunk_type(&self) -> &'static str {
        match self {
            TextChunkKind::Text => "tEXt",
            TextChunkKind::Compressed => "zTXt",
            TextChunkKind::International => "iTXt",
        }
    }
}

impl fmt::Display for TextChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chunk_type())
    }
}

/// One length-prefixed block of the PNG body, borrowed from the file buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'b> {
    /// Byte offset of the chunk's length field.
    pub offset: usize,
    pub chunk_type: [u8; 4],
    pub data: &'b [u8],
    /// `None` when the file ends before the CRC field.
    pub declared_crc: Option<u32>,
}

impl Chunk<'_> {
    pub fn is_end(&self) -> bool {
        &self.chunk_type == b"IEND"
    }

    /// CRC is informational only; a mismatch never stops the walk.
    pub fn crc_matches(&self) -> bool {
        let Some(declared) = self.declared_crc else {
            return false;
        };
        let mut hasher = Hasher::new();
        hasher.update(&self.chunk_type);
        hasher.update(self.data);
        hasher.finalize() == declared
    }

    pub fn type_name(&self) -> String {
        display_chunk_type(&self.chunk_type)
    }
}

/// Forward cursor over the chunk stream.
///
/// Starts right after the 8-byte signature and advances by `12 + length` per
/// chunk. The walk ends after `IEND` or when fewer than 12 bytes remain. A chunk
/// whose declared length runs past the end of the buffer is still yielded, with
/// its data clipped to the buffer, and ends the walk.
#[derive(Debug, Clone)]
pub struct ChunkCursor<'b> {
    bytes: &'b [u8],
    offset: usize,
    finished: bool,
}

impl<'b> ChunkCursor<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Self {
            bytes,
            offset: PNG_SIGNATURE.len(),
            finished: false,
        }
    }

    fn read_u32(&self, at: usize) -> Option<u32> {
        let field: [u8; 4] = self.bytes.get(at..at.checked_add(4)?)?.try_into().ok()?;
        Some(u32::from_be_bytes(field))
    }
}

impl<'b> Iterator for ChunkCursor<'b> {
    type Item = Chunk<'b>;

    fn next(&mut self) -> Option<Chunk<'b>> {
        if self.finished {
            return None;
        }
        // Any early return below ends the walk for good.
        self.finished = true;

        let offset = self.offset;
        if offset.checked_add(CHUNK_OVERHEAD)? > self.bytes.len() {
            return None;
        }

        let length = self.read_u32(offset)? as usize;
        let chunk_type: [u8; 4] = self.bytes[offset + 4..offset + 8].try_into().ok()?;

        let data_start = offset + 8;
        let Some(next_offset) = CHUNK_OVERHEAD
            .checked_add(length)
            .and_then(|extent| offset.checked_add(extent))
            .filter(|&end| end <= self.bytes.len())
        else {
            // Keep whatever data is there; the walk ends with this chunk.
            let data_end = data_start.saturating_add(length).min(self.bytes.len());
            debug!(
                offset,
                length,
                available = data_end - data_start,
                chunk_type = %display_chunk_type(&chunk_type),
                "Chunk runs past end of file; reading clipped data and stopping walk"
            );
            return Some(Chunk {
                offset,
                chunk_type,
                data: &self.bytes[data_start..data_end],
                declared_crc: None,
            });
        };

        let data = &self.bytes[data_start..data_start + length];
        let declared_crc = self.read_u32(data_start + length);

        let chunk = Chunk {
            offset,
            chunk_type,
            data,
            declared_crc,
        };
        self.offset = next_offset;
        self.finished = chunk.is_end();
        Some(chunk)
    }
}

/// A text chunk split into its keyword and the bytes that follow the keyword's null.
#[derive(Debug, Clone)]
pub struct TextChunk<'b> {
    pub kind: TextChunkKind,
    pub offset: usize,
    pub keyword: String,
    pub body: &'b [u8],
}

impl<'b> TextChunk<'b> {
    /// Returns `None` for non-text chunks, empty chunks, and chunks with no
    /// keyword terminator.
    pub fn from_chunk(chunk: &Chunk<'b>) -> Option<Self> {
        let kind = TextChunkKind::from_chunk_type(&chunk.chunk_type)?;
        if chunk.data.is_empty() {
            return None;
        }
        let null_pos = memchr(0, chunk.data)?;
        Some(Self {
            kind,
            offset: chunk.offset,
            keyword: String::from_utf8_lossy(&chunk.data[..null_pos]).into_owned(),
            body: &chunk.data[null_pos + 1..],
        })
    }

    pub fn keyword_matches(&self, keywords: &[String]) -> bool {
        let keyword = self.keyword.to_lowercase();
        keywords.iter().any(|candidate| candidate.to_lowercase() == keyword)
    }
}

/// Where inside the chunk stream a card was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkHit {
    pub kind: TextChunkKind,
    pub offset: usize,
}

/// Walk the chunk stream and return the first keyword-matching text chunk that
/// holds a character card.
///
/// Chunks whose payload fails to decompress or parse are logged and skipped. The
/// caller is expected to have checked the PNG signature already.
pub fn find_card_in_chunks(
    data: &[u8],
    keywords: &[String],
) -> Option<(CharacterMetadata, ChunkHit)> {
    for chunk in ChunkCursor::new(data) {
        let Some(text_chunk) = TextChunk::from_chunk(&chunk) else {
            continue;
        };
        if !text_chunk.keyword_matches(keywords) {
            trace!(
                keyword = %text_chunk.keyword,
                chunk_type = %text_chunk.kind,
                "Skipping text chunk with unrelated keyword"
            );
            continue;
        }
        if !chunk.crc_matches() {
            debug!(offset = chunk.offset, "Card chunk has a bad CRC; reading it anyway");
        }

        let text = match decode_payload(text_chunk.kind, text_chunk.body) {
            Ok(text) => text,
            Err(err) => {
                debug!(
                    offset = chunk.offset,
                    chunk_type = %text_chunk.kind,
                    error = %err,
                    "Failed to decode card chunk"
                );
                continue;
            }
        };

        match parse_flexible(&text) {
            Some(metadata) => {
                debug!(
                    offset = chunk.offset,
                    chunk_type = %text_chunk.kind,
                    keyword = %text_chunk.keyword,
                    "Found character card in text chunk"
                );
                let hit = ChunkHit {
                    kind: text_chunk.kind,
                    offset: chunk.offset,
                };
                return Some((metadata, hit));
            }
            None => {
                debug!(
                    offset = chunk.offset,
                    chunk_type = %text_chunk.kind,
                    "Keyword matched but payload is not a character card"
                );
            }
        }
    }

    None
}

/// Summary of one text chunk, for listing what a file carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunkInfo {
    pub kind: TextChunkKind,
    pub offset: usize,
    pub length: usize,
    pub keyword: String,
    pub crc_ok: bool,
}

pub fn list_text_chunks(data: &[u8]) -> Vec<TextChunkInfo> {
    ChunkCursor::new(data)
        .filter_map(|chunk| {
            let text_chunk = TextChunk::from_chunk(&chunk)?;
            Some(TextChunkInfo {
                kind: text_chunk.kind,
                offset: chunk.offset,
                length: chunk.data.len(),
                keyword: text_chunk.keyword,
                crc_ok: chunk.crc_matches(),
            })
        })
        .collect()
}

fn display_chunk_type(chunk_type: &[u8; 4]) -> String {
    chunk_type
        .iter()
        .map(|&b| {
            if (32..=126).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
