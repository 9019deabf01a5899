//! Turning an extracted card into documents and file names.

pub mod filename;
pub mod markdown;

pub use filename::sanitize_filename;
pub use markdown::{Formatter, JsonFormatter, MarkdownFormatter};
