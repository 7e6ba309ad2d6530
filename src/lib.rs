//! Notediff: sentence-aligned diffing of successive note drafts
//!
//! Measures how much of each new draft of a clinical note was carried over
//! from the previous one. Drafts are split into sentences, the sentence lists
//! are aligned, and every aligned pair is compared token by token with a
//! longest-matching-block matcher.
//!
//! # Example
//!
//! ```no_run
//! use notediff::prelude::*;
//!
//! let before = "Pt admitted with cough. Started antibiotics";
//! let after = "Pt admitted with cough. Fever overnight. Started antibiotics";
//!
//! let stats = diff_ratio(before, after, None);
//! println!("mean ratio {:.2}, {} of {} tokens carried over",
//!     stats.mean, stats.redundant_tokens, stats.total_tokens);
//! ```
//!
//! # Batch Example
//!
//! ```no_run
//! use notediff::prelude::*;
//! use std::path::Path;
//!
//! let notes = load_notes(Path::new("notes.db")).unwrap();
//! let params = DiffParams::default();
//! let options = BatchOptions { show_progress: true, ..Default::default() };
//!
//! let summary = run_batch(notes, Path::new("diffs"), &params, &options).unwrap();
//! println!("Compared {} draft pairs", summary.pairs_compared);
//! ```

pub mod align;
pub mod batch;
pub mod db;
pub mod markup;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod opcodes;
pub mod output;
pub mod render;
pub mod segment;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::align::{align, align_pairs};
    pub use crate::batch::{
        compare_block, compare_group, compare_pair, group_notes, load_notes, load_notes_jsonl,
        partition, run_batch, BatchError, BatchOptions,
    };
    pub use crate::db::{
        insert_notes, load_corpus_stats, load_group_notes, store_pair_metrics, DbError,
    };
    pub use crate::markup::{highlight_diff, markup_diff, Highlight, Identity, SpanTransform};
    pub use crate::matcher::{calculate_ratio, find_matches, JunkFn, SequenceMatcher};
    pub use crate::metrics::{
        aligned_sentences, diff_quick_ratio, diff_ratio, diff_report, score_sentences,
        score_sentences_par, sentence_opcodes,
    };
    pub use crate::models::{
        BatchSummary, BlockResult, CorpusStats, DiffParams, DiffReport, JunkPolicy, MatchBlock,
        NoteGroup, NoteRecord, OpTag, Opcode, PairMetrics, ParamsError, RatioStats,
        SentenceScore,
    };
    pub use crate::opcodes::{build_opcodes, verify_tiling, InvalidBlocks};
    pub use crate::output::{
        format_pair, print_batch_summary, print_pairs, print_report, write_html_file,
        write_json, write_json_file, write_pairs_csv, write_pairs_csv_file, OutputError,
    };
    pub use crate::render::{html_diffs, html_escape, html_page, html_sidebyside};
    pub use crate::segment::{sentencize, tokenize, unsentencise, untokenize};
}

// Re-export commonly used types at the crate root
pub use models::{DiffParams, DiffReport, MatchBlock, OpTag, Opcode, RatioStats};
