//! Clean-up of raw LLM output before it is stored as feedback text.
//!
//! Models tend to wrap the sentence in quotes or code fences, and some emit
//! escape sequences literally. The steps run in a fixed order: fences,
//! escapes, trim, then the outer characters.

/// Remove Markdown code fences (and any language tag on the opening fence).
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace literal `\n` and `\t` with a space and `\"` with `"`.
#[must_use]
pub fn unescape(text: &str) -> String {
    text.replace("\\n", " ")
        .replace("\\t", " ")
        .replace("\\\"", "\"")
}

/// Drop the first and last character, whatever they are.
///
/// Fewer than two characters leaves nothing.
#[must_use]
pub fn strip_outer_chars(text: &str) -> String {
    let mut chars = text.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return String::new();
    }
    chars.as_str().to_string()
}

/// Full sanitization pipeline for a generated feedback sentence.
#[must_use]
pub fn sanitize_feedback(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = unescape(&text);
    strip_outer_chars(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_sentence_loses_its_quotes() {
        assert_eq!(
            sanitize_feedback("  \"I ate the apple and feel great.\"\n"),
            "I ate the apple and feel great."
        );
    }

    #[test]
    fn outer_chars_are_removed_even_without_quotes() {
        assert_eq!(sanitize_feedback("Hello there"), "ello ther");
    }

    #[test]
    fn short_input_becomes_empty() {
        assert_eq!(sanitize_feedback(""), "");
        assert_eq!(sanitize_feedback("  x "), "");
        assert_eq!(sanitize_feedback("ab"), "");
    }

    #[test]
    fn fences_and_escapes_are_handled() {
        let raw = "```text\n\"I slept\\nwell \\\"finally\\\"\"\n```";
        assert_eq!(sanitize_feedback(raw), "I slept well \"finally\"");
    }

    #[test]
    fn multibyte_edges() {
        assert_eq!(strip_outer_chars("«ça va»"), "ça va");
    }
}
