use serde::{Deserialize, Serialize};

use doorkeep_common::StoredRecord;

const HEADER: &str = "*New Alert!*:\n";

/// Slack Block Kit message: `{"blocks": [{"type", "text": {"type", "text"}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Block {
    fn mrkdwn_section(text: String) -> Self {
        Self {
            kind: "section".to_string(),
            text: Text {
                kind: "mrkdwn".to_string(),
                text,
            },
        }
    }
}

/// Render one stored record as a two-block alert: a fixed header, then the
/// linked title followed by the snippet. Pure.
pub fn format_alert(record: &StoredRecord) -> AlertMessage {
    let result = &record.result;
    let body = format!(
        "<{}|{}>\n{}",
        escape_link(&result.link),
        escape_text(&result.title),
        escape_text(&result.snippet),
    );

    AlertMessage {
        blocks: vec![
            Block::mrkdwn_section(HEADER.to_string()),
            Block::mrkdwn_section(body),
        ],
    }
}

/// Slack treats `&`, `<` and `>` as control characters in mrkdwn.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `|` and `>` would end the URL part of `<url|label>` early.
fn escape_link(s: &str) -> String {
    s.replace('<', "%3C").replace('>', "%3E").replace('|', "%7C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doorkeep_common::SearchResult;
    use serde_json::json;

    fn record(title: &str, link: &str, snippet: &str) -> StoredRecord {
        StoredRecord::new(SearchResult::new(title, link).with_snippet(snippet), Utc::now())
    }

    #[test]
    fn renders_header_and_linked_body() {
        let msg = format_alert(&record(
            "Export from FloQast",
            "https://stackoverflow.com/q/1",
            "How do I export...",
        ));

        assert_eq!(msg.blocks.len(), 2);
        assert_eq!(msg.blocks[0].text.text, "*New Alert!*:\n");
        assert_eq!(
            msg.blocks[1].text.text,
            "<https://stackoverflow.com/q/1|Export from FloQast>\nHow do I export..."
        );
    }

    #[test]
    fn serializes_to_block_kit_shape() {
        let msg = format_alert(&record("T", "https://t.example", "s"));
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(
            value,
            json!({
                "blocks": [
                    {"type": "section", "text": {"type": "mrkdwn", "text": "*New Alert!*:\n"}},
                    {"type": "section", "text": {"type": "mrkdwn", "text": "<https://t.example|T>\ns"}}
                ]
            })
        );
    }

    #[test]
    fn escapes_control_characters_in_title_and_snippet() {
        let msg = format_alert(&record(
            "Vec<T> & friends",
            "https://x.example/a?b=1&c=2",
            "use <T> here",
        ));
        assert_eq!(
            msg.blocks[1].text.text,
            "<https://x.example/a?b=1&c=2|Vec&lt;T&gt; &amp; friends>\nuse &lt;T&gt; here"
        );
    }

    #[test]
    fn pipe_in_link_cannot_split_the_label() {
        let msg = format_alert(&record("T", "https://x.example/a|b", ""));
        assert!(msg.blocks[1].text.text.starts_with("<https://x.example/a%7Cb|T>"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let rec = record("T", "https://t.example", "s");
        assert_eq!(format_alert(&rec), format_alert(&rec));
    }
}
