//! Padded alignment of two sequences.
//!
//! Both outputs have the same length, so position `i` of one lines up with
//! position `i` of the other. This is how sentence `i` of one draft is paired
//! with sentence `i` of the next even when sentence counts differ.

use std::hash::Hash;

use crate::matcher::SequenceMatcher;

/// Align `a` and `b`, padding the shorter side of every non-equal span with
/// `fill`.
///
/// Both results have the same length, at least `max(len(a), len(b))`.
pub fn align<T: Clone + Eq + Hash>(a: &[T], b: &[T], fill: T) -> (Vec<T>, Vec<T>) {
    let opcodes = SequenceMatcher::new(a, b, None).opcodes();

    let capacity = a.len().max(b.len());
    let mut out_a = Vec::with_capacity(capacity);
    let mut out_b = Vec::with_capacity(capacity);

    for op in opcodes {
        let (a_len, b_len) = (op.a_len(), op.b_len());
        out_a.extend_from_slice(&a[op.a_range()]);
        out_b.extend_from_slice(&b[op.b_range()]);
        if a_len < b_len {
            out_a.extend(std::iter::repeat(fill.clone()).take(b_len - a_len));
        } else if b_len < a_len {
            out_b.extend(std::iter::repeat(fill.clone()).take(a_len - b_len));
        }
    }

    assert_eq!(
        out_a.len(),
        out_b.len(),
        "aligned sequences must have equal length"
    );
    (out_a, out_b)
}

/// [`align`] zipped into position pairs.
pub fn align_pairs<T: Clone + Eq + Hash>(a: &[T], b: &[T], fill: T) -> Vec<(T, T)> {
    let (out_a, out_b) = align(a, b, fill);
    out_a.into_iter().zip(out_b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::sentencize;
    use proptest::prelude::*;

    #[test]
    fn test_identical_sequences_unchanged() {
        let seq = vec!["a", "b", "c"];
        let (a, b) = align(&seq, &seq, "");
        assert_eq!(a, seq);
        assert_eq!(b, seq);
    }

    #[test]
    fn test_insert_pads_left() {
        let (a, b) = align(&["x", "z"], &["x", "y", "z"], "_");
        assert_eq!(a, vec!["x", "_", "z"]);
        assert_eq!(b, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_delete_pads_right() {
        let (a, b) = align(&[1, 2, 3, 4], &[1, 4], 0);
        assert_eq!(a, vec![1, 2, 3, 4]);
        assert_eq!(b, vec![1, 0, 0, 4]);
    }

    #[test]
    fn test_uneven_replace_pads_shorter_side() {
        let (a, b) = align(&["p", "q", "r", "s"], &["p", "x", "s"], "-");
        assert_eq!(a, vec!["p", "q", "r", "s"]);
        assert_eq!(b, vec!["p", "x", "-", "s"]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty: [&str; 0] = [];
        let (a, b) = align(&empty, &["only"], "");
        assert_eq!(a, vec![""]);
        assert_eq!(b, vec!["only"]);

        let (a, b) = align(&empty, &empty, "");
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn test_sentence_counts_reconciled() {
        let a = sentencize("Pt admitted. Started abx");
        let b = sentencize("Pt admitted. Fever overnight. Started abx");
        let pairs = align_pairs(&a, &b, String::new());

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1], (String::new(), "Fever overnight".to_string()));
        assert_eq!(pairs[2].0, pairs[2].1);
    }

    proptest! {
        #[test]
        fn aligned_lengths_match(
            a in prop::collection::vec(0u8..5, 0..30),
            b in prop::collection::vec(0u8..5, 0..30),
        ) {
            let (out_a, out_b) = align(&a, &b, u8::MAX);
            prop_assert_eq!(out_a.len(), out_b.len());
            prop_assert!(out_a.len() >= a.len().max(b.len()));

            let kept_a: Vec<u8> = out_a.into_iter().filter(|&v| v != u8::MAX).collect();
            let kept_b: Vec<u8> = out_b.into_iter().filter(|&v| v != u8::MAX).collect();
            prop_assert_eq!(kept_a, a);
            prop_assert_eq!(kept_b, b);
        }
    }
}
