pub mod card;
pub mod decode;
pub mod flexible;
pub mod png_text;
pub mod scan;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;
#[cfg(test)]
mod tests_integration;

// Re-exports for the common entry points
pub use card::CharacterMetadata;
pub use service::{extract_character, CardExtractor, CardSource, ExtractError, ExtractOptions, Extraction};
