//! Data structures for the notediff engine and batch pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Default marker opening a highlighted span.
pub const DEFAULT_HIGHLIGHT_OPEN: &str = r#"<span style="background: #69E2FB;">"#;

/// Default marker closing a highlighted span.
pub const DEFAULT_HIGHLIGHT_CLOSE: &str = "</span>";

/// Number of note groups per persisted batch block.
pub const DEFAULT_BLOCK_SIZE: usize = 500;

/// A run shared by both sequences: `a[a..a + size] == b[b..b + size]`.
///
/// Matchers always finish their block list with a sentinel of size zero at
/// `(len(a), len(b))`; it marks the end and is not a real match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

impl MatchBlock {
    pub fn new(a: usize, b: usize, size: usize) -> Self {
        Self { a, b, size }
    }

    /// One past the last matched position in `a`.
    pub fn a_end(&self) -> usize {
        self.a + self.size
    }

    /// One past the last matched position in `b`.
    pub fn b_end(&self) -> usize {
        self.b + self.size
    }
}

impl From<(usize, usize, usize)> for MatchBlock {
    fn from((a, b, size): (usize, usize, usize)) -> Self {
        Self::new(a, b, size)
    }
}

/// Kind of edit an [`Opcode`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

impl OpTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpTag::Equal => "equal",
            OpTag::Replace => "replace",
            OpTag::Delete => "delete",
            OpTag::Insert => "insert",
        }
    }

    /// Tag for an unmatched gap of the given lengths, `None` for an empty gap.
    pub fn for_gap(a_len: usize, b_len: usize) -> Option<Self> {
        match (a_len > 0, b_len > 0) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        }
    }
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of an edit script: `a[a0..a1]` becomes `b[b0..b1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opcode {
    pub tag: OpTag,
    pub a0: usize,
    pub a1: usize,
    pub b0: usize,
    pub b1: usize,
}

impl Opcode {
    pub fn new(tag: OpTag, a0: usize, a1: usize, b0: usize, b1: usize) -> Self {
        Self { tag, a0, a1, b0, b1 }
    }

    pub fn a_range(&self) -> Range<usize> {
        self.a0..self.a1
    }

    pub fn b_range(&self) -> Range<usize> {
        self.b0..self.b1
    }

    pub fn a_len(&self) -> usize {
        self.a1 - self.a0
    }

    pub fn b_len(&self) -> usize {
        self.b1 - self.b0
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}/{}-{}",
            self.tag, self.a0, self.a1, self.b0, self.b1
        )
    }
}

/// Similarity of one aligned sentence pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceScore {
    pub index: usize,
    pub ratio: f64,
    pub matched: usize, // Sum of matching block sizes
    pub len_a: usize,
    pub len_b: usize,
}

/// Aggregate of per-sentence similarity ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioStats {
    pub mean: f64,
    pub stddev: f64, // Population standard deviation
    pub max: f64,
    pub min: f64,
    pub redundant_tokens: usize, // Matched tokens summed over sentences
    pub total_tokens: usize,     // Tokens on the `a` side summed over sentences
}

impl RatioStats {
    /// Aggregate sentence scores. An empty slice counts as a single
    /// identical unit with no tokens.
    pub fn from_scores(scores: &[SentenceScore]) -> Self {
        if scores.is_empty() {
            return Self {
                mean: 1.0,
                stddev: 0.0,
                max: 1.0,
                min: 1.0,
                redundant_tokens: 0,
                total_tokens: 0,
            };
        }

        let count = scores.len() as f64;
        let mean = scores.iter().map(|s| s.ratio).sum::<f64>() / count;
        let variance = scores
            .iter()
            .map(|s| (s.ratio - mean).powi(2))
            .sum::<f64>()
            / count;

        Self {
            mean,
            stddev: variance.sqrt(),
            max: scores.iter().map(|s| s.ratio).fold(f64::MIN, f64::max),
            min: scores.iter().map(|s| s.ratio).fold(f64::MAX, f64::min),
            redundant_tokens: scores.iter().map(|s| s.matched).sum(),
            total_tokens: scores.iter().map(|s| s.len_a).sum(),
        }
    }
}

/// Per-sentence scores together with their aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub stats: RatioStats,
    pub sentences: Vec<SentenceScore>,
}

/// Which tokens the matcher treats as junk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunkPolicy {
    /// Every token may anchor a match
    #[default]
    None,
    /// Empty or whitespace-only tokens. [`tokenize`](crate::segment::tokenize)
    /// never produces these, so this only affects token streams built by
    /// other means, e.g. a plain `split(' ')` handed to the matcher.
    Whitespace,
    /// Tokens made entirely of ASCII punctuation
    Punctuation,
    /// Tokens equal to one of the listed words (exact comparison)
    Stopwords(Vec<String>),
}

impl JunkPolicy {
    pub fn is_junk(&self, token: &str) -> bool {
        match self {
            JunkPolicy::None => false,
            JunkPolicy::Whitespace => token.trim().is_empty(),
            JunkPolicy::Punctuation => {
                !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation())
            }
            JunkPolicy::Stopwords(words) => words.iter().any(|w| w == token),
        }
    }

    /// Predicate to hand to the matcher, `None` when nothing is junk.
    ///
    /// Borrow it with `as_deref()` where a [`JunkFn`](crate::matcher::JunkFn) is expected.
    #[allow(clippy::type_complexity)]
    pub fn predicate(&self) -> Option<Box<dyn Fn(&String) -> bool + Sync + '_>> {
        match self {
            JunkPolicy::None => None,
            _ => Some(Box::new(move |token: &String| self.is_junk(token))),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("block size must be at least 1")]
    ZeroBlockSize,
    #[error("stopword junk policy needs at least one word")]
    EmptyStopwords,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parameter error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Diff and batch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffParams {
    pub junk: JunkPolicy,
    pub highlight_open: String,
    pub highlight_close: String,
    pub block_size: usize, // Groups per persisted batch block
    pub parallel_sentences: bool,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            junk: JunkPolicy::None,
            highlight_open: DEFAULT_HIGHLIGHT_OPEN.to_string(),
            highlight_close: DEFAULT_HIGHLIGHT_CLOSE.to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
            parallel_sentences: false,
        }
    }
}

impl DiffParams {
    /// Load a full parameter set from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ParamsError> {
        let data = std::fs::read_to_string(path)?;
        let params: DiffParams = serde_json::from_str(&data)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.block_size == 0 {
            return Err(ParamsError::ZeroBlockSize);
        }
        if matches!(&self.junk, JunkPolicy::Stopwords(words) if words.is_empty()) {
            return Err(ParamsError::EmptyStopwords);
        }
        Ok(())
    }
}

/// One draft of a note, as stored in the input corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(deserialize_with = "group_id_text")]
    pub group_id: String, // e.g. the admission the drafts belong to
    pub seq: i64,         // Ordering of drafts inside a group
    pub text: String,
}

/// Group ids arrive as strings or as integer keys; both are kept as text.
fn group_id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GroupId {
        Text(String),
        Integer(i64),
    }

    Ok(match GroupId::deserialize(deserializer)? {
        GroupId::Text(text) => text,
        GroupId::Integer(n) => n.to_string(),
    })
}

/// All drafts of one group, ordered by `seq`.
#[derive(Debug, Clone)]
pub struct NoteGroup {
    pub group_id: String,
    pub notes: Vec<NoteRecord>,
}

impl NoteGroup {
    /// Number of successive draft pairs in this group.
    pub fn pair_count(&self) -> usize {
        self.notes.len().saturating_sub(1)
    }
}

/// Metrics for one successive pair of drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMetrics {
    pub group_id: String,
    pub prev_seq: i64,
    pub seq: i64,
    pub sentence_count: usize,
    pub stats: RatioStats,
    pub quick_mean: f64, // Mean of the quick-ratio upper bounds
}

/// Everything persisted for one block of groups.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResult {
    pub version: String,
    pub block_index: usize,
    pub group_count: usize,
    pub pairs: Vec<PairMetrics>,
}

/// Size of a note corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_notes: u64,
    pub total_groups: u64,
    pub total_pairs: u64, // Successive draft pairs across all groups
    pub largest_group: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub version: String,
    pub parameters: DiffParams,
    pub group_count: usize,
    pub blocks_total: usize,
    pub blocks_written: usize,
    pub blocks_skipped: usize,
    pub pairs_compared: usize,
    pub mean_ratio: f64, // Over pairs compared in this run
}
