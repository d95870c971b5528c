use lazy_static::lazy_static;
use regex::Regex;

const VENUE_MARKER: &str = " at ";

lazy_static! {
    static ref LEADING_ARTICLE: Regex = Regex::new(r"^(?:the )+").unwrap();
    static ref NON_VENUE_CHARS: Regex = Regex::new(r"[^a-z0-9\s&/-]+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    /// What may follow a venue name on the same line
    static ref VENUE_TERMINATOR: Regex = Regex::new(
        r"\ba/a\b|(?:^|\s)(?:18|21)\+|\b\d{1,2}(?::\d{2})?\s*[ap]m\b|\$\d|\bfree\b|\bdonation\b|\bsliding scale\b"
    )
    .unwrap();
}

/// Canonical venue name; `None` when nothing usable is left.
///
/// The article is stripped last so that `the!! fillmore` and `the the
/// fillmore` come out the same on the first pass.
pub fn normalize_venue(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    let cleaned = NON_VENUE_CHARS.replace_all(&lowered, "");
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    let normalized = LEADING_ARTICLE.replace(collapsed.trim(), "");
    let normalized = normalized.trim();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Lowercases and collapses every whitespace run (newlines included)
pub fn normalize_text(text: &str) -> String {
    WHITESPACE
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Venue name written after the last ` at ` of a block, without the age,
/// price and time details that usually follow it.
pub fn venue_text(block_text: &str) -> Option<String> {
    let text = normalize_text(block_text);
    let at = text.rfind(VENUE_MARKER)?;
    let rest = &text[at + VENUE_MARKER.len()..];

    let venue = match VENUE_TERMINATOR.find(rest) {
        Some(terminator) => &rest[..terminator.start()],
        None => rest,
    };

    Some(venue.trim().to_string())
}

pub fn venue_norm_of(block_text: &str) -> Option<String> {
    venue_text(block_text).and_then(|venue| normalize_venue(&venue))
}
