/// Characters that are unsafe in file names on at least one common platform.
const UNSAFE_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

const FALLBACK_NAME: &str = "character";

/// Make a character name usable as a file stem.
///
/// Each unsafe character becomes `-` and surrounding whitespace is trimmed. A
/// name with nothing left becomes `character`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '-' } else { c })
        .collect();
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
