// Builds the data context prepended to a user's question

use crate::analysis::describe_table;
use crate::config::ContextConfig;
use crate::ingest::LoadedData;

pub const TRUNCATION_MARKER: &str = "...";

/// Render the context block for `data`, or an empty string when nothing is loaded.
///
/// Text documents are cut to `text_char_limit` characters and always end with
/// [`TRUNCATION_MARKER`]. Table summaries are only cut when `table_char_limit` is set.
pub fn format_context(data: Option<&LoadedData>, limits: &ContextConfig) -> String {
    match data {
        None => String::new(),
        Some(LoadedData::Table(table)) => {
            let summary = describe_table(table).to_text();
            let summary = match limits.table_char_limit {
                Some(limit) => truncate_chars(&summary, limit),
                None => summary.as_str(),
            };
            format!("Data summary:\n{}\n\n", summary)
        }
        Some(LoadedData::Text(doc)) => format!(
            "PDF content summary:\n{}{}\n\n",
            truncate_chars(&doc.text, limits.text_char_limit),
            TRUNCATION_MARKER
        ),
    }
}

/// The user message sent to the model: context block followed by the question
pub fn build_user_message(context: &str, question: &str) -> String {
    format!("{}User question: {}", context, question)
}

/// Longest prefix of `s` with at most `max_chars` characters
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{read_csv, TextDocument};

    fn text_doc(text: &str) -> LoadedData {
        LoadedData::Text(TextDocument {
            text: text.to_string(),
            page_count: 1,
        })
    }

    fn body<'a>(context: &'a str, header: &str) -> &'a str {
        context
            .strip_prefix(header)
            .and_then(|s| s.strip_suffix("\n\n"))
            .expect("context framing")
    }

    #[test]
    fn test_no_data_gives_empty_context() {
        assert_eq!(format_context(None, &ContextConfig::default()), "");
    }

    #[test]
    fn test_long_text_is_truncated_with_marker() {
        let data = text_doc(&"x".repeat(5000));
        let context = format_context(Some(&data), &ContextConfig::default());
        let content = body(&context, "PDF content summary:\n");

        assert!(content.ends_with(TRUNCATION_MARKER));
        assert_eq!(content.chars().count(), 1000 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_short_text_is_kept_whole() {
        let data = text_doc("short document");
        let context = format_context(Some(&data), &ContextConfig::default());
        assert_eq!(context, "PDF content summary:\nshort document...\n\n");
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let data = text_doc(&"é".repeat(1500));
        let context = format_context(Some(&data), &ContextConfig::default());
        let content = body(&context, "PDF content summary:\n");
        assert_eq!(content.chars().filter(|c| *c == 'é').count(), 1000);
    }

    #[test]
    fn test_table_summary_is_never_truncated_by_default() {
        let mut csv = String::from("c0");
        for i in 1..60 {
            csv.push_str(&format!(",c{}", i));
        }
        csv.push('\n');
        for row in 0..5 {
            let values: Vec<String> = (0..60).map(|c| (row * c).to_string()).collect();
            csv.push_str(&values.join(","));
            csv.push('\n');
        }
        let data = LoadedData::Table(read_csv(csv.as_bytes()).unwrap());

        let context = format_context(Some(&data), &ContextConfig::default());
        let content = body(&context, "Data summary:\n");
        assert!(content.chars().count() > 1000);
        assert_eq!(content, describe_table(data.as_table().unwrap()).to_text());
    }

    #[test]
    fn test_table_limit_applies_when_configured() {
        let data = LoadedData::Table(read_csv(b"a,b\n1,2\n3,4\n").unwrap());
        let limits = ContextConfig {
            text_char_limit: 1000,
            table_char_limit: Some(10),
        };
        let context = format_context(Some(&data), &limits);
        assert_eq!(body(&context, "Data summary:\n").chars().count(), 10);
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            build_user_message("", "What insights?"),
            "User question: What insights?"
        );
        assert_eq!(
            build_user_message("Data summary:\nx\n\n", "Why?"),
            "Data summary:\nx\n\nUser question: Why?"
        );
    }
}
