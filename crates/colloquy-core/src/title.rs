const MAX_TITLE_CHARS: usize = 50;
const FALLBACK_TITLE: &str = "New Conversation";

/// Conversation title from its first message: whitespace collapsed to
/// single spaces, at most 50 characters (47 plus `...` when cut).
pub fn derive_title(first_message: &str) -> String {
    let collapsed = first_message.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    if collapsed.chars().count() > MAX_TITLE_CHARS {
        let mut title: String = collapsed.chars().take(MAX_TITLE_CHARS - 3).collect();
        title.push_str("...");
        title
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_kept() {
        assert_eq!(derive_title("Plan a trip to Lisbon"), "Plan a trip to Lisbon");
    }

    #[test]
    fn test_newlines_and_runs_collapsed() {
        assert_eq!(derive_title("  line one\r\nline   two\t\n"), "line one line two");
    }

    #[test]
    fn test_long_message_truncated() {
        let title = derive_title(&"word ".repeat(30));
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_exactly_fifty_chars_untouched() {
        let text = "x".repeat(50);
        assert_eq!(derive_title(&text), text);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(60);
        let title = derive_title(&text);
        assert_eq!(title, format!("{}...", "é".repeat(47)));
    }

    #[test]
    fn test_blank_message_falls_back() {
        assert_eq!(derive_title(" \n\r "), "New Conversation");
    }
}
