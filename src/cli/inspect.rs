use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;

use crate::character::png_text::TextChunkInfo;
use crate::character::service::{read_file, CardExtractor, ExtractError};
use crate::core::config::Config;

/// List the text chunks of `file` as a table; `None` when it is not a PNG.
pub fn inspect_file(
    file: &Path,
    config: &Config,
) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
    let data = read_file(file)?;
    let extractor = CardExtractor::new(config.extract_options());
    match extractor.text_chunks(&data) {
        Ok(chunks) => Ok(Some(format_chunk_table(&chunks, extractor.options().keywords.as_slice()))),
        Err(ExtractError::InvalidFormat(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn format_chunk_table(chunks: &[TextChunkInfo], keywords: &[String]) -> String {
    if chunks.is_empty() {
        return "No text chunks found.\n".to_string();
    }

    let keyword_width = chunks
        .iter()
        .map(|c| c.keyword.chars().count())
        .max()
        .unwrap_or(0)
        .max("KEYWORD".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4}  {:>10}  {:>10}  {:<keyword_width$}  CRC",
        "TYPE", "OFFSET", "LENGTH", "KEYWORD"
    );
    for chunk in chunks {
        let keyword = chunk.keyword.to_lowercase();
        let marker = if keywords.iter().any(|k| k.to_lowercase() == keyword) {
            "  <- card keyword"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:<4}  {:>10}  {:>10}  {:<keyword_width$}  {}{}",
            chunk.kind.chunk_type(),
            chunk.offset,
            chunk.length,
            chunk.keyword,
            if chunk.crc_ok { "ok" } else { "BAD" },
            marker
        );
    }
    out
}
