use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::character::{CardExtractor, ExtractError, Extraction};
use crate::core::config::Config;
use crate::render::{sanitize_filename, Formatter, JsonFormatter, MarkdownFormatter};

/// What `cardpeek extract` was asked to do.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    pub file: &'a Path,
    pub json: bool,
    pub save: bool,
    pub output: Option<&'a Path>,
    pub no_scan: bool,
}

#[derive(Debug)]
pub enum ExtractOutcome {
    /// The document is ready for stdout.
    Printed {
        extraction: Extraction,
        document: String,
    },
    /// The document was written to `path`.
    Saved { extraction: Extraction, path: PathBuf },
    NotPng(String),
    NoCard,
}

pub fn extract_card(
    request: &ExtractRequest<'_>,
    config: &Config,
) -> Result<ExtractOutcome, Box<dyn Error + Send + Sync>> {
    let mut options = config.extract_options();
    if request.no_scan {
        options.brute_force = false;
    }

    let extraction = match CardExtractor::new(options).extract_file(request.file) {
        Ok(Some(extraction)) => extraction,
        Ok(None) => return Ok(ExtractOutcome::NoCard),
        Err(ExtractError::InvalidFormat(message)) => return Ok(ExtractOutcome::NotPng(message)),
        Err(e) => return Err(e.into()),
    };

    let formatter: Box<dyn Formatter> = if request.json {
        Box::new(JsonFormatter)
    } else {
        Box::new(MarkdownFormatter)
    };
    let document = formatter.format(&extraction.metadata)?;

    let path = match (request.output, request.save) {
        (Some(path), _) => path.to_path_buf(),
        (None, true) => config.output_dir().join(format!(
            "{}.{}",
            sanitize_filename(&extraction.metadata.name),
            formatter.extension()
        )),
        (None, false) => {
            return Ok(ExtractOutcome::Printed {
                extraction,
                document,
            })
        }
    };

    write_document(&path, &document)?;
    debug!(path = %path.display(), "Wrote card document");
    Ok(ExtractOutcome::Saved { extraction, path })
}

/// Write through a temporary file in the target directory, then rename into place.
fn write_document(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new_in("."),
    }?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
