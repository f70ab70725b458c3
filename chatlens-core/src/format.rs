//! Formatting helpers shared across UIs.

const HIGHLIGHT_ON: &str = "\u{1b}[43m";
const HIGHLIGHT_OFF: &str = "\u{1b}[0m";

/// Icon marking message direction: 💬 sent by me, 📢 received.
pub fn direction_icon(is_from_me: bool) -> &'static str {
    if is_from_me {
        "💬"
    } else {
        "📢"
    }
}

/// Wrap every occurrence of `query` in a terminal background highlight.
///
/// Case folding here is ASCII-only; a row matched via full Unicode folding
/// can come back unhighlighted.
pub fn highlight(text: &str, query: &str, case_insensitive: bool) -> String {
    if query.is_empty() {
        return text.to_string();
    }
    let haystack = if case_insensitive {
        text.to_ascii_lowercase()
    } else {
        text.to_string()
    };
    let needle = if case_insensitive {
        query.to_ascii_lowercase()
    } else {
        query.to_string()
    };

    let mut out = String::with_capacity(text.len());
    let mut at = 0;
    while let Some(found) = haystack[at..].find(&needle) {
        let start = at + found;
        let end = start + needle.len();
        out.push_str(&text[at..start]);
        out.push_str(HIGHLIGHT_ON);
        out.push_str(&text[start..end]);
        out.push_str(HIGHLIGHT_OFF);
        at = end;
    }
    out.push_str(&text[at..]);
    out
}

/// Clock label for an hour of day: "12am", "1am", ... "12pm", ... "11pm".
pub fn hour_label(hour: u8) -> String {
    match hour {
        0 => "12am".to_string(),
        1..=11 => format!("{}am", hour),
        12 => "12pm".to_string(),
        _ => format!("{}pm", hour - 12),
    }
}
