//! Static per-chat HTML previews
//!
//! One self-contained HTML file per chat, written next to the snapshot so a
//! conversation can be skimmed in a browser without loading anything. Times
//! are UTC; previews exist before any timezone or identity mapping does.

use crate::error::Result;
use crate::types::Record;
use std::collections::BTreeMap;
use std::path::Path;

/// Title and participant handles for one chat, keyed externally by chat id.
#[derive(Debug, Clone)]
pub struct ChatMeta {
    pub title: String,
    pub participants: Vec<String>,
}

const STYLE: &str = "\
body { font-family: -apple-system, Helvetica, sans-serif; max-width: 48rem; margin: 2rem auto; }
h1 { font-size: 1.2rem; }
.participants { color: #666; font-size: 0.85rem; }
.line { margin: 0.25rem 0; }
.when { color: #999; font-size: 0.75rem; margin-right: 0.5rem; }
.me .text { color: #0a52bd; }
.them .text { color: #222; }
";

/// Write one `chat_<id>.html` per chat that has at least one message.
///
/// `records` must already be in send order; per-chat order falls out of it.
/// Returns the number of files written.
pub fn write_previews(
    dir: &Path,
    records: &[Record],
    chats: &BTreeMap<String, ChatMeta>,
) -> Result<usize> {
    std::fs::create_dir_all(dir)?;

    let mut by_chat: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        by_chat.entry(record.chat_id.as_str()).or_default().push(record);
    }

    let mut written = 0;
    for (chat_id, messages) in &by_chat {
        let meta = chats.get(*chat_id);
        let title = meta
            .map(|m| m.title.clone())
            .unwrap_or_else(|| format!("chat {}", chat_id));
        let participants = meta.map(|m| m.participants.as_slice()).unwrap_or(&[]);

        let path = dir.join(format!("chat_{}.html", chat_id));
        let html = render_chat(&title, participants, messages);
        std::fs::write(&path, html)?;
        tracing::debug!(path = %path.display(), messages = messages.len(), "Wrote chat preview");
        written += 1;
    }

    Ok(written)
}

fn render_chat(title: &str, participants: &[String], messages: &[&Record]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));

    if !participants.is_empty() {
        html.push_str(&format!(
            "<p class=\"participants\">{}</p>\n",
            escape_html(&participants.join(", "))
        ));
    }

    for message in messages {
        let class = if message.is_from_me { "me" } else { "them" };
        html.push_str(&format!(
            "<p class=\"line {}\"><span class=\"when\">{}</span><span class=\"text\">{}</span></p>\n",
            class,
            message.sent_at.format("%Y-%m-%d %H:%M:%S"),
            escape_html(&message.text),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Service;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(rowid: i64, chat_id: &str, text: &str, from_me: bool) -> Record {
        Record {
            rowid,
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            sent_at: Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap(),
            is_from_me: from_me,
            service: Service::IMessage,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("\"quoted\" 'single'"), "&quot;quoted&quot; &#39;single&#39;");
        assert_eq!(escape_html("plain ünïcode 🎉"), "plain ünïcode 🎉");
    }

    #[test]
    fn test_render_direction_classes() {
        let a = record(1, "7", "hello", false);
        let b = record(2, "7", "hi there", true);
        let html = render_chat("Book Club", &[], &[&a, &b]);
        assert!(html.contains("class=\"line them\""));
        assert!(html.contains("class=\"line me\""));
        assert!(html.contains("<h1>Book Club</h1>"));
    }

    #[test]
    fn test_render_escapes_message_text() {
        let a = record(1, "7", "<script>alert(1)</script>", false);
        let html = render_chat("x", &[], &[&a]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_participants_header() {
        let a = record(1, "7", "hi", false);
        let participants = vec!["+15550001111".to_string(), "koala@example.com".to_string()];
        let html = render_chat("x", &participants, &[&a]);
        assert!(html.contains("+15550001111, koala@example.com"));

        let bare = render_chat("x", &[], &[&a]);
        assert!(!bare.contains("<p class=\"participants\">"));
    }

    #[test]
    fn test_write_previews_one_file_per_chat() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            record(1, "7", "hi", false),
            record(2, "7", "hello", true),
            record(3, "9", "other chat", false),
        ];
        let mut chats = BTreeMap::new();
        chats.insert(
            "7".to_string(),
            ChatMeta {
                title: "Book Club".to_string(),
                participants: vec!["+15550001111".to_string()],
            },
        );

        let written = write_previews(dir.path(), &records, &chats).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("chat_7.html").is_file());
        assert!(dir.path().join("chat_9.html").is_file());

        let seven = std::fs::read_to_string(dir.path().join("chat_7.html")).unwrap();
        assert!(seven.contains("Book Club"));
        // No metadata for chat 9: falls back to a generic title.
        let nine = std::fs::read_to_string(dir.path().join("chat_9.html")).unwrap();
        assert!(nine.contains("chat 9"));
    }
}
