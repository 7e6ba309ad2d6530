//! Batch comparison of successive note drafts.
//!
//! Notes are grouped by `group_id`, the groups are split into fixed-size
//! blocks, and every block is written to `block_{i}_diffs.json` in the output
//! directory. Blocks whose file already exists are skipped, so an interrupted
//! run picks up where it stopped.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{self, DbError};
use crate::metrics::{diff_quick_ratio, diff_report};
use crate::models::*;
use crate::output::{write_json_file, OutputError};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
    #[error("Parameter error: {0}")]
    Params(#[from] ParamsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid note on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Read notes from a JSON Lines file, one `{group_id, seq, text}` object per
/// line. Blank lines are ignored.
pub fn load_notes_jsonl(path: &Path) -> Result<Vec<NoteRecord>, BatchError> {
    let reader = BufReader::new(File::open(path)?);
    let mut notes = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let note: NoteRecord =
            serde_json::from_str(&line).map_err(|source| BatchError::Json {
                line: idx + 1,
                source,
            })?;
        notes.push(note);
    }

    Ok(notes)
}

/// Load notes from a SQLite database (`.db`, `.sqlite`, `.sqlite3`) or a
/// JSON Lines file (anything else).
pub fn load_notes(path: &Path) -> Result<Vec<NoteRecord>, BatchError> {
    let is_sqlite = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("db" | "sqlite" | "sqlite3")
    );
    if is_sqlite {
        Ok(db::load_notes(path)?)
    } else {
        load_notes_jsonl(path)
    }
}

/// Group notes by `group_id`, keeping groups in first-seen order and sorting
/// each group by `seq`.
pub fn group_notes(notes: Vec<NoteRecord>) -> Vec<NoteGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<NoteGroup> = Vec::new();

    for note in notes {
        match index.get(&note.group_id) {
            Some(&i) => groups[i].notes.push(note),
            None => {
                index.insert(note.group_id.clone(), groups.len());
                groups.push(NoteGroup {
                    group_id: note.group_id.clone(),
                    notes: vec![note],
                });
            }
        }
    }

    for group in &mut groups {
        // Stable, so drafts sharing a seq keep their input order
        group.notes.sort_by_key(|n| n.seq);
        let duplicates = group.notes.windows(2).filter(|w| w[0].seq == w[1].seq).count();
        if duplicates > 0 {
            warn!(
                group_id = %group.group_id,
                duplicates,
                "group has drafts sharing a sequence number"
            );
        }
    }

    groups
}

/// Split groups into blocks of at most `block_size`.
pub fn partition(groups: &[NoteGroup], block_size: usize) -> Vec<&[NoteGroup]> {
    groups.chunks(block_size.max(1)).collect()
}

/// Compare one pair of successive drafts.
pub fn compare_pair(prev: &NoteRecord, next: &NoteRecord, params: &DiffParams) -> PairMetrics {
    let report = diff_report(&prev.text, &next.text, params);
    let junk = params.junk.predicate();
    let quick = diff_quick_ratio(&prev.text, &next.text, junk.as_deref());

    debug!(
        group_id = %prev.group_id,
        prev_seq = prev.seq,
        seq = next.seq,
        mean = report.stats.mean,
        "compared drafts"
    );

    PairMetrics {
        group_id: prev.group_id.clone(),
        prev_seq: prev.seq,
        seq: next.seq,
        sentence_count: report.sentences.len(),
        stats: report.stats,
        quick_mean: quick.mean,
    }
}

/// Compare every successive pair of drafts in a group.
pub fn compare_group(group: &NoteGroup, params: &DiffParams) -> Vec<PairMetrics> {
    group
        .notes
        .windows(2)
        .map(|w| compare_pair(&w[0], &w[1], params))
        .collect()
}

/// Compare all pairs of a block, in parallel across pairs.
pub fn compare_block(
    block_index: usize,
    groups: &[NoteGroup],
    params: &DiffParams,
    progress: Option<&ProgressBar>,
) -> BlockResult {
    let pairs: Vec<(&NoteRecord, &NoteRecord)> = groups
        .iter()
        .flat_map(|g| g.notes.windows(2).map(|w| (&w[0], &w[1])))
        .collect();

    let metrics: Vec<PairMetrics> = pairs
        .par_iter()
        .map(|&(prev, next)| {
            let m = compare_pair(prev, next, params);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            m
        })
        .collect();

    BlockResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        block_index,
        group_count: groups.len(),
        pairs: metrics,
    }
}

/// Path of the persisted file for a block.
pub fn block_path(out_dir: &Path, block_index: usize) -> PathBuf {
    out_dir.join(format!("block_{}_diffs.json", block_index))
}

/// Options for [`run_batch`] beyond the diff parameters.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub show_progress: bool,
    /// Also write pair metrics into this SQLite database
    pub metrics_db: Option<PathBuf>,
}

/// Run the full batch over `notes`, writing one file per block to `out_dir`.
pub fn run_batch(
    notes: Vec<NoteRecord>,
    out_dir: &Path,
    params: &DiffParams,
    options: &BatchOptions,
) -> Result<BatchSummary, BatchError> {
    params.validate()?;
    std::fs::create_dir_all(out_dir)?;

    let groups = group_notes(notes);
    let blocks = partition(&groups, params.block_size);
    info!(
        groups = groups.len(),
        blocks = blocks.len(),
        block_size = params.block_size,
        "starting batch"
    );

    if options.show_progress {
        eprintln!(
            "{} groups in {} blocks of up to {}",
            groups.len(),
            blocks.len(),
            params.block_size
        );
    }

    let mut blocks_written = 0;
    let mut blocks_skipped = 0;
    let mut pairs_compared = 0;
    let mut ratio_sum = 0.0;

    for (block_index, block) in blocks.iter().enumerate() {
        let path = block_path(out_dir, block_index);
        if path.exists() {
            info!(block_index, path = %path.display(), "block already written, skipping");
            if options.show_progress {
                eprintln!("Block {}: already done, skipping", block_index);
            }
            blocks_skipped += 1;
            continue;
        }

        let pair_total: usize = block.iter().map(|g| g.pair_count()).sum();
        let progress = if options.show_progress {
            eprintln!("Block {}: {} pairs", block_index, pair_total);
            let pb = ProgressBar::new(pair_total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let result = compare_block(block_index, block, params, progress.as_ref());

        if let Some(pb) = progress {
            pb.finish_with_message("Done");
        }

        if let Some(db_path) = &options.metrics_db {
            db::store_pair_metrics(db_path, &result.pairs)?;
        }
        write_json_file(&result, &path)?;
        debug!(block_index, pairs = result.pairs.len(), "block written");

        pairs_compared += result.pairs.len();
        ratio_sum += result.pairs.iter().map(|p| p.stats.mean).sum::<f64>();
        blocks_written += 1;
    }

    let summary = BatchSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        parameters: params.clone(),
        group_count: groups.len(),
        blocks_total: blocks.len(),
        blocks_written,
        blocks_skipped,
        pairs_compared,
        mean_ratio: if pairs_compared > 0 {
            ratio_sum / pairs_compared as f64
        } else {
            0.0
        },
    };
    info!(
        written = summary.blocks_written,
        skipped = summary.blocks_skipped,
        pairs = summary.pairs_compared,
        "batch finished"
    );

    Ok(summary)
}
