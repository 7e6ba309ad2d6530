//! Sentence-level similarity metrics between two drafts.
//!
//! Both texts are split into sentences and the sentence lists are aligned,
//! so every sentence of one draft is paired with its counterpart (or an
//! empty filler slot) in the other. Each pair is then tokenized and matched
//! on its own, and the per-pair ratios are aggregated into [`RatioStats`].

use rayon::prelude::*;

use crate::align::align_pairs;
use crate::matcher::{JunkFn, SequenceMatcher};
use crate::models::{DiffParams, DiffReport, Opcode, RatioStats, SentenceScore};
use crate::segment::{sentencize, tokenize};

/// Pair up the sentences of both texts. `None` marks a slot with no
/// counterpart on that side.
pub fn aligned_sentences(text_a: &str, text_b: &str) -> Vec<(Option<String>, Option<String>)> {
    let slots = |text: &str| sentencize(text).into_iter().map(Some).collect::<Vec<_>>();
    align_pairs(&slots(text_a), &slots(text_b), None)
}

/// Tokens of one alignment slot; a filler slot has none.
pub fn slot_tokens(sentence: Option<&str>) -> Vec<String> {
    sentence.map(tokenize).unwrap_or_default()
}

/// Score one aligned sentence pair. Only the two sentences themselves are
/// tokenized.
pub fn score_sentence(
    index: usize,
    sentence_a: Option<&str>,
    sentence_b: Option<&str>,
    is_junk: Option<JunkFn<'_, String>>,
) -> SentenceScore {
    let tokens_a = slot_tokens(sentence_a);
    let tokens_b = slot_tokens(sentence_b);
    let matcher = SequenceMatcher::new(&tokens_a, &tokens_b, is_junk);

    SentenceScore {
        index,
        ratio: matcher.ratio(),
        matched: matcher.matched_len(),
        len_a: tokens_a.len(),
        len_b: tokens_b.len(),
    }
}

/// Per-sentence scores for two texts.
pub fn score_sentences(
    text_a: &str,
    text_b: &str,
    is_junk: Option<JunkFn<'_, String>>,
) -> Vec<SentenceScore> {
    aligned_sentences(text_a, text_b)
        .iter()
        .enumerate()
        .map(|(index, (sa, sb))| score_sentence(index, sa.as_deref(), sb.as_deref(), is_junk))
        .collect()
}

/// Same as [`score_sentences`], scoring the sentence pairs in parallel.
pub fn score_sentences_par(
    text_a: &str,
    text_b: &str,
    is_junk: Option<JunkFn<'_, String>>,
) -> Vec<SentenceScore> {
    aligned_sentences(text_a, text_b)
        .par_iter()
        .enumerate()
        .map(|(index, (sa, sb))| score_sentence(index, sa.as_deref(), sb.as_deref(), is_junk))
        .collect()
}

/// Aggregate sentence similarity between two texts.
pub fn diff_ratio(text_a: &str, text_b: &str, is_junk: Option<JunkFn<'_, String>>) -> RatioStats {
    RatioStats::from_scores(&score_sentences(text_a, text_b, is_junk))
}

/// [`diff_ratio`] using the order-insensitive quick ratio for each sentence
/// pair. Every unit is an upper bound on the corresponding `diff_ratio` unit.
pub fn diff_quick_ratio(
    text_a: &str,
    text_b: &str,
    is_junk: Option<JunkFn<'_, String>>,
) -> RatioStats {
    let scores: Vec<SentenceScore> = aligned_sentences(text_a, text_b)
        .iter()
        .enumerate()
        .map(|(index, (sa, sb))| {
            let tokens_a = slot_tokens(sa.as_deref());
            let tokens_b = slot_tokens(sb.as_deref());
            let matcher = SequenceMatcher::new(&tokens_a, &tokens_b, is_junk);
            let ratio = matcher.quick_ratio();
            SentenceScore {
                index,
                ratio,
                matched: (ratio * (tokens_a.len() + tokens_b.len()) as f64 / 2.0).round() as usize,
                len_a: tokens_a.len(),
                len_b: tokens_b.len(),
            }
        })
        .collect();

    RatioStats::from_scores(&scores)
}

/// Full report for two texts under the given parameters.
pub fn diff_report(text_a: &str, text_b: &str, params: &DiffParams) -> DiffReport {
    let junk = params.junk.predicate();
    let sentences = if params.parallel_sentences {
        score_sentences_par(text_a, text_b, junk.as_deref())
    } else {
        score_sentences(text_a, text_b, junk.as_deref())
    };

    DiffReport {
        stats: RatioStats::from_scores(&sentences),
        sentences,
    }
}

/// Token-level edit script for every aligned sentence pair.
pub fn sentence_opcodes(
    text_a: &str,
    text_b: &str,
    is_junk: Option<JunkFn<'_, String>>,
) -> Vec<Vec<Opcode>> {
    aligned_sentences(text_a, text_b)
        .iter()
        .map(|(sa, sb)| {
            let tokens_a = slot_tokens(sa.as_deref());
            let tokens_b = slot_tokens(sb.as_deref());
            SequenceMatcher::new(&tokens_a, &tokens_b, is_junk).opcodes()
        })
        .collect()
}
