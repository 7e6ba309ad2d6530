//! HTML rendering of highlighted diffs.
//!
//! The texts are escaped before they are split, so the highlight markers
//! added afterwards are the only markup in the output.

use crate::markup::{highlight_diff, Highlight};
use crate::metrics::{aligned_sentences, slot_tokens};
use crate::models::DiffParams;
use crate::segment::untokenize;

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap text in a red span.
pub fn mark_text(text: &str) -> String {
    format!(r#"<span style="color: red;">{}</span>"#, text)
}

/// One paragraph per sentence.
pub fn html_unsentencise<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .iter()
        .map(|s| format!("<p>{}</p>", s.as_ref()))
        .collect()
}

/// Two columns of pre-rendered cells, row by row. The shorter column is
/// padded with empty cells.
pub fn html_sidebyside<L: AsRef<str>, R: AsRef<str>>(left: &[L], right: &[R]) -> String {
    let rows = left.len().max(right.len());
    let mut out = String::from("<div>");
    for row in 0..rows {
        let l = left.get(row).map_or("", |s| s.as_ref());
        let r = right.get(row).map_or("", |s| s.as_ref());
        out.push_str(&format!(
            r#"<div style="display: inline-block; width: calc(50% - 10px)">{}</div>"#,
            l
        ));
        out.push_str(r#"<div style="width: 20px; display: inline-block"></div>"#);
        out.push_str(&format!(
            r#"<div style="display: inline-block; width: calc(50% - 10px)">{}</div>"#,
            r
        ));
    }
    out.push_str("</div>");
    out
}

/// Side-by-side rendering of two drafts with changed token spans
/// highlighted, sentence by sentence.
pub fn html_diffs(text_a: &str, text_b: &str, params: &DiffParams) -> String {
    let escaped_a = html_escape(text_a);
    let escaped_b = html_escape(text_b);
    let highlight = Highlight::from_params(params);
    let junk = params.junk.predicate();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (sentence_a, sentence_b) in aligned_sentences(&escaped_a, &escaped_b) {
        let (marked_a, marked_b) = highlight_diff(
            &slot_tokens(sentence_a.as_deref()),
            &slot_tokens(sentence_b.as_deref()),
            &highlight,
            junk.as_deref(),
        );
        left.push(untokenize(&marked_a));
        right.push(untokenize(&marked_b));
    }

    html_sidebyside(&left, &right)
}

/// Standalone HTML document around a rendered diff.
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = html_escape(title),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_mark_text() {
        assert_eq!(mark_text("x"), r#"<span style="color: red;">x</span>"#);
    }

    #[test]
    fn test_html_unsentencise() {
        assert_eq!(html_unsentencise(&["One", "Two"]), "<p>One</p><p>Two</p>");
        assert_eq!(html_unsentencise::<&str>(&[]), "");
    }

    #[test]
    fn test_sidebyside_pads_short_column() {
        let html = html_sidebyside(&["l1", "l2"], &["r1"]);
        assert!(html.starts_with("<div>") && html.ends_with("</div>"));
        assert_eq!(html.matches("calc(50% - 10px)").count(), 4);
        assert!(html.contains(">l2</div>"));
        assert!(html.contains("calc(50% - 10px)\"></div>"));
    }

    #[test]
    fn test_html_diffs_highlights_changes() {
        let params = DiffParams {
            highlight_open: "<b>".to_string(),
            highlight_close: "</b>".to_string(),
            ..Default::default()
        };
        let html = html_diffs("BP < 120. Stable", "BP > 140. Stable", &params);

        assert!(html.contains("BP <b>&lt; 120</b>"));
        assert!(html.contains("BP <b>&gt; 140</b>"));
        assert_eq!(html.matches(">Stable</div>").count(), 2);
    }

    #[test]
    fn test_html_diffs_leaves_filler_cells_empty() {
        let params = DiffParams {
            highlight_open: "<b>".to_string(),
            highlight_close: "</b>".to_string(),
            ..Default::default()
        };
        let html = html_diffs("Pt admitted. Started abx", "Pt admitted. none. Started abx", &params);

        assert_eq!(html.matches(">Pt admitted</div>").count(), 2);
        assert!(html.contains("><b>none</b></div>"));
        assert_eq!(html.matches("calc(50% - 10px)\"></div>").count(), 1);
    }

    #[test]
    fn test_html_page_escapes_title() {
        let page = html_page("a < b", "<p>x</p>");
        assert!(page.contains("<title>a &lt; b</title>"));
        assert!(page.contains("<p>x</p>"));
    }
}
