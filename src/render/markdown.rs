use std::error::Error;

use crate::character::CharacterMetadata;

/// Turns a card into a document.
///
/// [`MarkdownFormatter`] is the built-in readable rendering. Other formatters (for
/// example one that asks a language model to rewrite the card as prose) can be
/// plugged in by implementing this trait.
pub trait Formatter {
    fn format(&self, card: &CharacterMetadata) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// File extension for saved documents, without the dot.
    fn extension(&self) -> &'static str;
}

const NONE_PLACEHOLDER: &str = "(None)";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format(&self, card: &CharacterMetadata) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(render_markdown(card))
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, card: &CharacterMetadata) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut json = serde_json::to_string_pretty(card)?;
        json.push('\n');
        Ok(json)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        NONE_PLACEHOLDER
    } else {
        text
    }
}

/// A code fence longer than any backtick run inside `body`.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

pub fn render_markdown(card: &CharacterMetadata) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", card.name));
    out.push_str("> **Note**: This document was extracted from a Tavern character card.\n");

    let sections = [
        ("Personality", card.personality.as_str()),
        ("Description", card.description.as_str()),
        ("Scenario", card.scenario.as_str()),
        ("First Message", card.first_mes.as_str()),
    ];
    for (title, body) in sections {
        out.push_str(&format!("\n## {}\n{}\n", title, or_placeholder(body).trim_end()));
    }

    let examples = or_placeholder(&card.mes_example).trim_end();
    let fence = fence_for(examples);
    out.push_str(&format!("\n## Examples\n{fence}\n{examples}\n{fence}\n"));

    if let Some(system_prompt) = card.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("\n## System Prompt\n{}\n", system_prompt.trim_end()));
    }
    if let Some(notes) = card.creator_notes.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("\n## Creator Notes\n{}\n", notes.trim_end()));
    }
    if let Some(tags) = card.tags.as_ref().filter(|tags| !tags.is_empty()) {
        let tags: Vec<String> = tags.iter().map(|tag| format!("`{tag}`")).collect();
        out.push_str(&format!("\n## Tags\n{}\n", tags.join(", ")));
    }

    out
}
