//! Splitting an LLM answer around its fenced options block.

use crate::types::LlmResponse;

const FENCE: &str = "```";

/// Split `text` into reasoning before the first fenced block, the block
/// itself, and the reasoning after it.
///
/// A language tag on the opening fence (```` ```ini ````) is dropped.
/// Returns `None` when there is no complete fenced block.
pub fn split_fenced(text: &str) -> Option<LlmResponse> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];

    let body_start = match after_open.find('\n') {
        Some(nl) if is_language_tag(&after_open[..nl]) => nl + 1,
        _ => 0,
    };
    let body = &after_open[body_start..];
    let close = body.find(FENCE)?;

    Some(LlmResponse {
        reasoning_before: text[..open].to_string(),
        options_block: body[..close].to_string(),
        reasoning_after: body[close + FENCE.len()..].to_string(),
    })
}

fn is_language_tag(s: &str) -> bool {
    s.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_language_tag() {
        let text = "Raise the write buffer.\n```ini\n[DBOptions]\n  max_background_jobs=8\n```\nThis should help.";
        let response = split_fenced(text).unwrap();
        assert_eq!(response.reasoning_before, "Raise the write buffer.\n");
        assert_eq!(response.options_block, "[DBOptions]\n  max_background_jobs=8\n");
        assert_eq!(response.reasoning_after, "\nThis should help.");
    }

    #[test]
    fn test_split_plain_fence() {
        let response = split_fenced("```\na = 1\n```").unwrap();
        assert_eq!(response.reasoning_before, "");
        assert_eq!(response.options_block, "a = 1\n");
        assert_eq!(response.reasoning_after, "");
    }

    #[test]
    fn test_only_first_block_is_used() {
        let response = split_fenced("x\n```\na = 1\n```\ny\n```\nb = 2\n```").unwrap();
        assert_eq!(response.options_block, "a = 1\n");
        assert!(response.reasoning_after.contains("b = 2"));
    }

    #[test]
    fn test_missing_or_unterminated_fence_fails() {
        assert!(split_fenced("no options here").is_none());
        assert!(split_fenced("```ini\na = 1\n").is_none());
    }
}
