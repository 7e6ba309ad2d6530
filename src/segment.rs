//! Splitting text into tokens and sentences, and joining them back.
//!
//! These are deliberately simple: whitespace runs separate tokens, and a
//! terminator (`.`, `!` or `?`) followed by whitespace separates sentences.

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Separator used by [`unsentencise`].
pub const SENTENCE_JOIN: &str = ". ";

/// Split text on maximal runs of whitespace.
///
/// Leading and trailing whitespace produce no empty tokens, so an empty or
/// blank string has no tokens at all.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

/// Join tokens with a single space.
///
/// Not an exact inverse of [`tokenize`]: irregular whitespace collapses.
pub fn untokenize<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(token.as_ref());
    }
    out
}

/// Split text into sentences.
///
/// The boundary (terminator plus the whitespace after it) is dropped. A
/// terminator at the very end of the text has no whitespace after it and is
/// kept. The empty string is a single empty sentence.
pub fn sentencize(text: &str) -> Vec<String> {
    SENTENCE_END.split(text).map(str::to_owned).collect()
}

/// Join sentences with `". "`.
pub fn unsentencise<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SENTENCE_JOIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_whitespace_runs() {
        assert_eq!(tokenize("the  cat\tsat\n"), vec!["the", "cat", "sat"]);
        assert_eq!(tokenize("  leading"), vec!["leading"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \n\t ").is_empty());
    }

    #[test]
    fn test_untokenize_is_lossy() {
        let tokens = tokenize("a   b\nc");
        assert_eq!(untokenize(&tokens), "a b c");
        assert_eq!(untokenize::<&str>(&[]), "");
    }

    #[test]
    fn test_sentencize_drops_boundary() {
        assert_eq!(
            sentencize("Pt stable. BP 120/80! Plan?  Discharge."),
            vec!["Pt stable", "BP 120/80", "Plan", "Discharge."]
        );
    }

    #[test]
    fn test_sentencize_without_trailing_space() {
        assert_eq!(sentencize("No change.Still stable."), vec!["No change.Still stable."]);
        assert_eq!(sentencize("Ends here. "), vec!["Ends here", ""]);
    }

    #[test]
    fn test_sentencize_empty_is_one_sentence() {
        assert_eq!(sentencize(""), vec![""]);
    }

    #[test]
    fn test_unsentencise() {
        let sentences = sentencize("One. Two. Three");
        assert_eq!(unsentencise(&sentences), "One. Two. Three");
    }
}
