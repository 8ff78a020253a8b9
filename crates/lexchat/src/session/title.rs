//! Thread title derivation
//!
//! Pure functions, testable without any session state.

/// Maximum length of a title derived from message text, before the ellipsis
pub const TITLE_MAX_CHARS: usize = 30;

/// Number of leading words kept when a message is long
const TITLE_WORDS: usize = 4;

const ELLIPSIS: &str = "...";

/// Derive a thread title from the first user message.
///
/// Text of three words or fewer is used as-is. Longer text keeps its first
/// four words joined by single spaces, cut to [`TITLE_MAX_CHARS`] characters
/// with a trailing `...` when the join is longer than that.
pub fn title_from_text(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < TITLE_WORDS {
        return text.to_string();
    }

    let joined = words[..TITLE_WORDS].join(" ");
    if joined.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = joined.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(ELLIPSIS);
        title
    } else {
        joined
    }
}

/// Derive a thread title from an uploaded file's display name.
///
/// Strips one trailing extension (`contract.pdf` -> `contract`). A name with
/// nothing before its only dot, like `.env`, is kept whole.
pub fn title_from_file_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}
