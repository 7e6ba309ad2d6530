//! Longest-matching-block sequence matcher.
//!
//! This is the core of the diff engine. The matcher finds the longest
//! contiguous run shared by the two sequences, then repeats the search on the
//! unmatched regions on either side of it until no region has anything in
//! common. The resulting blocks are the backbone for opcodes, alignment,
//! markup and ratios.
//!
//! Junk is decided by the caller only. Junk tokens never anchor a run while
//! any non-junk run exists in a region; they are used to widen runs at their
//! edges and, as a fallback, to anchor a run when nothing else matches.

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{MatchBlock, Opcode};
use crate::opcodes::opcodes_from_blocks;

/// Caller-supplied junk predicate.
pub type JunkFn<'a, T> = &'a (dyn Fn(&T) -> bool + Sync);

/// Positions in `b` for every distinct value, ascending.
type PositionIndex<'a, T> = HashMap<&'a T, Vec<usize>>;

/// Matcher over one pair of sequences.
///
/// Built once per comparison; all derived views (blocks, opcodes, ratios)
/// come from the same block list.
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b2j: PositionIndex<'a, T>,
    junk_b2j: PositionIndex<'a, T>,
    junk_b: Vec<bool>,
    blocks: Vec<MatchBlock>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T], is_junk: Option<JunkFn<'_, T>>) -> Self {
        let mut b2j: PositionIndex<'a, T> = HashMap::new();
        let mut junk_b2j: PositionIndex<'a, T> = HashMap::new();
        let mut junk_b = Vec::with_capacity(b.len());

        for (j, value) in b.iter().enumerate() {
            let junk = is_junk.map_or(false, |f| f(value));
            junk_b.push(junk);
            let index = if junk { &mut junk_b2j } else { &mut b2j };
            index.entry(value).or_default().push(j);
        }

        let mut matcher = Self {
            a,
            b,
            b2j,
            junk_b2j,
            junk_b,
            blocks: Vec::new(),
        };
        matcher.blocks = matcher.compute_blocks();
        matcher
    }

    /// Longest matching block in `a[alo..ahi] x b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    /// Returns a zero-size block at `(alo, blo)` when the region shares nothing.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let mut best = self.longest_run(&self.b2j, alo, ahi, blo, bhi);
        if best.size == 0 && !self.junk_b2j.is_empty() {
            best = self.longest_run(&self.junk_b2j, alo, ahi, blo, bhi);
        }

        // Widen through equal junk on both sides
        while best.a > alo
            && best.b > blo
            && self.junk_b[best.b - 1]
            && self.a[best.a - 1] == self.b[best.b - 1]
        {
            best = MatchBlock::new(best.a - 1, best.b - 1, best.size + 1);
        }
        while best.a_end() < ahi
            && best.b_end() < bhi
            && self.junk_b[best.b_end()]
            && self.a[best.a_end()] == self.b[best.b_end()]
        {
            best.size += 1;
        }

        best
    }

    /// Scan `a` left to right, extending the runs that ended on the previous
    /// row. `run_len[j]` is the length of the run ending at `(i, j)`.
    fn longest_run(
        &self,
        index: &PositionIndex<'a, T>,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> MatchBlock {
        let mut best = MatchBlock::new(alo, blo, 0);
        let mut run_len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run_len = HashMap::new();
            if let Some(positions) = index.get(&self.a[i]) {
                let start = positions.partition_point(|&j| j < blo);
                for &j in positions[start..].iter().take_while(|&&j| j < bhi) {
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_len.insert(j, k);
                    if k > best.size {
                        best = MatchBlock::new(i + 1 - k, j + 1 - k, k);
                    }
                }
            }
            run_len = next_run_len;
        }

        best
    }

    /// Work-list driven block search, sorted, merged and terminated by the
    /// sentinel.
    fn compute_blocks(&self) -> Vec<MatchBlock> {
        let (len_a, len_b) = (self.a.len(), self.b.len());
        let mut pending = vec![(0, len_a, 0, len_b)];
        let mut found = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            if alo < block.a && blo < block.b {
                pending.push((alo, block.a, blo, block.b));
            }
            if block.a_end() < ahi && block.b_end() < bhi {
                pending.push((block.a_end(), ahi, block.b_end(), bhi));
            }
            found.push(block);
        }

        found.sort_unstable();

        let mut merged: Vec<MatchBlock> = Vec::with_capacity(found.len() + 1);
        for block in found {
            match merged.last_mut() {
                Some(last) if last.a_end() == block.a && last.b_end() == block.b => {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged.push(MatchBlock::new(len_a, len_b, 0));

        tracing::trace!(
            len_a,
            len_b,
            blocks = merged.len() - 1,
            "computed matching blocks"
        );
        merged
    }

    /// Matching blocks, ending with the `(len(a), len(b), 0)` sentinel.
    pub fn matching_blocks(&self) -> &[MatchBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<MatchBlock> {
        self.blocks
    }

    /// Edit script turning `a` into `b`.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let opcodes = opcodes_from_blocks(&self.blocks, self.a.len(), self.b.len());
        debug_assert!(
            crate::opcodes::verify_tiling(&opcodes, self.a.len(), self.b.len()).is_ok(),
            "opcodes do not tile the inputs"
        );
        opcodes
    }

    /// Total number of matched elements.
    pub fn matched_len(&self) -> usize {
        self.blocks.iter().map(|block| block.size).sum()
    }

    /// `2 * M / (len(a) + len(b))`, 1.0 when both are empty.
    pub fn ratio(&self) -> f64 {
        calculate_ratio(self.matched_len(), self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from the multiset intersection,
    /// ignoring order.
    pub fn quick_ratio(&self) -> f64 {
        let mut available: HashMap<&T, usize> = HashMap::new();
        for value in self.b {
            *available.entry(value).or_insert(0) += 1;
        }

        let mut matches = 0;
        for value in self.a {
            if let Some(count) = available.get_mut(value) {
                if *count > 0 {
                    *count -= 1;
                    matches += 1;
                }
            }
        }

        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`quick_ratio`](Self::quick_ratio) from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        calculate_ratio(la.min(lb), la + lb)
    }
}

/// Matching blocks for `a` and `b`, ending with the sentinel block.
pub fn find_matches<T: Eq + Hash>(
    a: &[T],
    b: &[T],
    is_junk: Option<JunkFn<'_, T>>,
) -> Vec<MatchBlock> {
    SequenceMatcher::new(a, b, is_junk).into_blocks()
}

/// Similarity from a match count and the combined length of both sequences.
#[inline]
pub fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        1.0
    } else {
        2.0 * matches as f64 / length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(text: &str) -> Vec<&str> {
        text.split(' ').filter(|w| !w.is_empty()).collect()
    }

    fn blocks(list: &[(usize, usize, usize)]) -> Vec<MatchBlock> {
        list.iter().copied().map(MatchBlock::from).collect()
    }

    #[test]
    fn test_single_substitution() {
        let a = ["the", "cat", "sat"];
        let b = ["the", "dog", "sat"];

        let result = find_matches(&a, &b, None);
        assert_eq!(result, blocks(&[(0, 0, 1), (2, 2, 1), (3, 3, 0)]));
    }

    #[test]
    fn test_empty_sequences() {
        let empty: [&str; 0] = [];
        assert_eq!(find_matches(&empty, &["hello"], None), blocks(&[(0, 1, 0)]));
        assert_eq!(find_matches(&["hello"], &empty, None), blocks(&[(1, 0, 0)]));
        assert_eq!(find_matches(&empty, &empty, None), blocks(&[(0, 0, 0)]));
    }

    #[test]
    fn test_identical_sequences() {
        let seq: Vec<u32> = (0..50).collect();
        let result = find_matches(&seq, &seq, None);
        assert_eq!(result, blocks(&[(0, 0, 50), (50, 50, 0)]));
    }

    #[test]
    fn test_no_common_elements() {
        let a: Vec<u32> = (0..10).collect();
        let b: Vec<u32> = (100..110).collect();
        assert_eq!(find_matches(&a, &b, None), blocks(&[(10, 10, 0)]));
    }

    #[test]
    fn test_leftmost_match_wins_ties() {
        // "x y" occurs twice in a; the first occurrence is chosen
        let a = words("x y q x y");
        let b = words("x y");
        let matcher = SequenceMatcher::new(&a, &b, None);
        assert_eq!(matcher.find_longest_match(0, a.len(), 0, b.len()), MatchBlock::new(0, 0, 2));
    }

    #[test]
    fn test_longest_run_preferred_over_earlier_shorter() {
        let a = words("a b c d e f");
        let b = words("a z c d e y");
        let result = find_matches(&a, &b, None);
        assert_eq!(result, blocks(&[(0, 0, 1), (2, 2, 3), (6, 6, 0)]));
    }

    #[test]
    fn test_region_bounds_respected() {
        let a = words("p q r s");
        let b = words("p q r s");
        let matcher = SequenceMatcher::new(&a, &b, None);
        assert_eq!(matcher.find_longest_match(1, 3, 2, 4), MatchBlock::new(2, 2, 1));
        assert_eq!(matcher.find_longest_match(0, 1, 1, 4).size, 0);
    }

    #[test]
    fn test_junk_does_not_suppress_longer_match() {
        // Without a junk policy the run of blanks would win; with one, the
        // real words anchor the match
        let a = vec![" ", " ", " ", "alpha", "beta"];
        let b = vec!["alpha", "beta", " ", " ", " "];
        let is_junk = |t: &&str| t.trim().is_empty();

        let plain = find_matches(&a, &b, None);
        assert_eq!(plain[0], MatchBlock::new(0, 2, 3));

        let result = find_matches(&a, &b, Some(&is_junk));
        assert_eq!(result[0], MatchBlock::new(3, 0, 2));
    }

    #[test]
    fn test_junk_used_as_fallback() {
        let a = vec!["x", " ", "y"];
        let b = vec!["z", " ", "w"];
        let is_junk = |t: &&str| t.trim().is_empty();

        let result = find_matches(&a, &b, Some(&is_junk));
        assert_eq!(result, blocks(&[(1, 1, 1), (3, 3, 0)]));
    }

    #[test]
    fn test_junk_extension_merges_blocks() {
        let a = vec!["x", " ", "y", "q"];
        let b = vec!["x", " ", "y", "r"];
        let is_junk = |t: &&str| t.trim().is_empty();

        let result = find_matches(&a, &b, Some(&is_junk));
        assert_eq!(result, blocks(&[(0, 0, 3), (4, 4, 0)]));
    }

    #[test]
    fn test_ratios() {
        let a = words("the cat sat");
        let b = words("the dog sat");
        let matcher = SequenceMatcher::new(&a, &b, None);

        assert!((matcher.ratio() - 4.0 / 6.0).abs() < 1e-12);
        assert!(matcher.quick_ratio() >= matcher.ratio());
        assert!(matcher.real_quick_ratio() >= matcher.quick_ratio());
        assert_eq!(matcher.matched_len(), 2);
    }

    #[test]
    fn test_quick_ratio_ignores_order() {
        let a = words("a b c");
        let b = words("c b a");
        let matcher = SequenceMatcher::new(&a, &b, None);
        assert_eq!(matcher.quick_ratio(), 1.0);
        assert!(matcher.ratio() < 1.0);
    }

    #[test]
    fn test_ratio_of_empty_pair() {
        let empty: [&str; 0] = [];
        let matcher = SequenceMatcher::new(&empty, &empty, None);
        assert_eq!(matcher.ratio(), 1.0);
        assert_eq!(calculate_ratio(0, 1), 0.0);
    }

    #[test]
    fn test_long_unmatched_input_does_not_recurse() {
        // Alternating single matches produce many regions; the work-list
        // handles them without deep recursion
        let a: Vec<u32> = (0..2_000).map(|i| if i % 2 == 0 { i } else { 1_000_000 + i }).collect();
        let b: Vec<u32> = (0..2_000).map(|i| if i % 2 == 0 { i } else { 2_000_000 + i }).collect();
        let result = find_matches(&a, &b, None);
        assert_eq!(result.len(), 1_001);
        assert_eq!(result.iter().map(|m| m.size).sum::<usize>(), 1_000);
    }

    #[test]
    fn test_matched_length_depends_on_argument_order() {
        // Greedy leftmost choice in `a` differs from leftmost in `b` here
        let a = [2, 10, 4, 9, 3];
        let b = [0, 9, 2, 6, 8, 7, 5, 4, 10];
        let forward: usize = find_matches(&a, &b, None).iter().map(|m| m.size).sum();
        let backward: usize = find_matches(&b, &a, None).iter().map(|m| m.size).sum();
        assert_eq!((forward, backward), (2, 1));
    }

    fn assert_well_formed(result: &[MatchBlock], len_a: usize, len_b: usize) {
        let (last, real) = result.split_last().expect("sentinel is always present");
        assert_eq!(*last, MatchBlock::new(len_a, len_b, 0));
        let mut prev_end = (0, 0);
        for block in real {
            assert!(block.size > 0);
            assert!(block.a >= prev_end.0 && block.b >= prev_end.1);
            assert!(block.a_end() <= len_a && block.b_end() <= len_b);
            prev_end = (block.a_end(), block.b_end());
        }
    }

    proptest! {
        #[test]
        fn blocks_are_ordered_and_equal(
            a in prop::collection::vec(0u8..6, 0..40),
            b in prop::collection::vec(0u8..6, 0..40),
        ) {
            let result = find_matches(&a, &b, None);
            assert_well_formed(&result, a.len(), b.len());
            for block in &result {
                prop_assert_eq!(&a[block.a..block.a_end()], &b[block.b..block.b_end()]);
            }
        }

        #[test]
        fn matched_length_is_symmetric_for_order_consistent_edits(
            keep in prop::collection::vec((any::<bool>(), any::<bool>()), 0..25),
            inserts_a in prop::collection::vec(0usize..30, 0..5),
            inserts_b in prop::collection::vec(0usize..30, 0..5),
        ) {
            // Both sides are edits of one base with distinct tokens
            let mut a: Vec<u32> = (0..keep.len() as u32).filter(|&i| keep[i as usize].0).collect();
            let mut b: Vec<u32> = (0..keep.len() as u32).filter(|&i| keep[i as usize].1).collect();
            for (k, pos) in inserts_a.iter().enumerate() {
                let at = pos % (a.len() + 1);
                a.insert(at, 1_000 + k as u32);
            }
            for (k, pos) in inserts_b.iter().enumerate() {
                let at = pos % (b.len() + 1);
                b.insert(at, 2_000 + k as u32);
            }

            let forward: usize = find_matches(&a, &b, None).iter().map(|m| m.size).sum();
            let backward: usize = find_matches(&b, &a, None).iter().map(|m| m.size).sum();
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn junk_blocks_stay_well_formed(
            a in prop::collection::vec(0u8..6, 0..40),
            b in prop::collection::vec(0u8..6, 0..40),
        ) {
            let is_junk = |v: &u8| *v == 0;
            let result = find_matches(&a, &b, Some(&is_junk));
            assert_well_formed(&result, a.len(), b.len());
            for block in &result {
                prop_assert_eq!(&a[block.a..block.a_end()], &b[block.b..block.b_end()]);
            }
        }
    }
}
