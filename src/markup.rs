//! Applying transforms to the changed and unchanged spans of a diff.
//!
//! Markup never changes how many tokens each side has, so the output can be
//! joined back with the same function that split the input.

use std::hash::Hash;

use crate::matcher::{JunkFn, SequenceMatcher};
use crate::models::{DiffParams, OpTag, DEFAULT_HIGHLIGHT_CLOSE, DEFAULT_HIGHLIGHT_OPEN};

/// A rewrite of one contiguous span of tokens.
///
/// Implementations must return as many tokens as they receive.
pub trait SpanTransform<T> {
    fn transform(&self, span: Vec<T>) -> Vec<T>;
}

impl<T, F> SpanTransform<T> for F
where
    F: Fn(Vec<T>) -> Vec<T>,
{
    fn transform(&self, span: Vec<T>) -> Vec<T> {
        self(span)
    }
}

/// Leaves spans untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> SpanTransform<T> for Identity {
    fn transform(&self, span: Vec<T>) -> Vec<T> {
        span
    }
}

/// Wraps a span as one highlighted unit: the first token gets the opening
/// marker, the last token the closing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub open: String,
    pub close: String,
}

impl Highlight {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn from_params(params: &DiffParams) -> Self {
        Self::new(&params.highlight_open, &params.highlight_close)
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT_OPEN, DEFAULT_HIGHLIGHT_CLOSE)
    }
}

impl SpanTransform<String> for Highlight {
    fn transform(&self, mut span: Vec<String>) -> Vec<String> {
        if let Some(first) = span.first_mut() {
            first.insert_str(0, &self.open);
        }
        if let Some(last) = span.last_mut() {
            last.push_str(&self.close);
        }
        span
    }
}

/// Return `a` and `b` with every non-equal span passed through `mark` and
/// every equal span through `default`.
pub fn markup_diff<T, M, D>(
    a: &[T],
    b: &[T],
    mark: &M,
    default: &D,
    is_junk: Option<JunkFn<'_, T>>,
) -> (Vec<T>, Vec<T>)
where
    T: Clone + Eq + Hash,
    M: SpanTransform<T> + ?Sized,
    D: SpanTransform<T> + ?Sized,
{
    let matcher = SequenceMatcher::new(a, b, is_junk);
    let mut out_a = Vec::with_capacity(a.len());
    let mut out_b = Vec::with_capacity(b.len());

    for op in matcher.opcodes() {
        let span_a = a[op.a_range()].to_vec();
        let span_b = b[op.b_range()].to_vec();
        if op.tag == OpTag::Equal {
            out_a.extend(default.transform(span_a));
            out_b.extend(default.transform(span_b));
        } else {
            out_a.extend(mark.transform(span_a));
            out_b.extend(mark.transform(span_b));
        }
    }

    assert_eq!(out_a.len(), a.len(), "markup changed the token count of a");
    assert_eq!(out_b.len(), b.len(), "markup changed the token count of b");
    (out_a, out_b)
}

/// [`markup_diff`] with the default highlight on changes and equal spans
/// left alone.
pub fn highlight_diff(
    a: &[String],
    b: &[String],
    highlight: &Highlight,
    is_junk: Option<JunkFn<'_, String>>,
) -> (Vec<String>, Vec<String>) {
    markup_diff(a, b, highlight, &Identity, is_junk)
}
