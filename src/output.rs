//! Output formatting for diff reports and batch results (JSON, CSV, HTML).

use crate::models::{BatchSummary, CorpusStats, DiffReport, PairMetrics, RatioStats};
use crate::render::html_page;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write any result as pretty JSON.
pub fn write_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write any result as pretty JSON to a file.
///
/// The file is first written under a temporary name and renamed into place,
/// so a crash never leaves a truncated result that would be taken as done.
pub fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<(), OutputError> {
    let tmp = path.with_extension("json.partial");
    {
        let mut file = io::BufWriter::new(std::fs::File::create(&tmp)?);
        write_json(value, &mut file)?;
        file.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Write pair metrics as CSV.
pub fn write_pairs_csv<W: Write>(pairs: &[PairMetrics], writer: &mut W) -> Result<(), OutputError> {
    writeln!(
        writer,
        "group_id,prev_seq,seq,sentence_count,mean,stddev,max,min,\
         redundant_tokens,total_tokens,quick_mean"
    )?;

    for pair in pairs {
        writeln!(
            writer,
            "{:?},{},{},{},{},{},{},{},{},{},{}",
            pair.group_id,
            pair.prev_seq,
            pair.seq,
            pair.sentence_count,
            pair.stats.mean,
            pair.stats.stddev,
            pair.stats.max,
            pair.stats.min,
            pair.stats.redundant_tokens,
            pair.stats.total_tokens,
            pair.quick_mean
        )?;
    }

    Ok(())
}

/// Write pair metrics as CSV to a file.
pub fn write_pairs_csv_file(pairs: &[PairMetrics], path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_pairs_csv(pairs, &mut file)
}

/// Write a rendered diff as a standalone HTML page.
pub fn write_html_file(title: &str, body: &str, path: &Path) -> Result<(), OutputError> {
    std::fs::write(path, html_page(title, body))?;
    Ok(())
}

pub fn format_stats(stats: &RatioStats) -> String {
    format!(
        "  Mean ratio: {:.1}%\n\
         \x20 Std dev: {:.3}\n\
         \x20 Max: {:.1}%  Min: {:.1}%\n\
         \x20 Redundant tokens: {} of {}",
        stats.mean * 100.0,
        stats.stddev,
        stats.max * 100.0,
        stats.min * 100.0,
        stats.redundant_tokens,
        stats.total_tokens,
    )
}

/// Print a diff report to stdout, one line per sentence when `detailed`.
pub fn print_report(report: &DiffReport, detailed: bool) {
    println!("\n=== Diff Summary ===");
    println!("Sentences: {}", report.sentences.len());
    println!("{}", format_stats(&report.stats));

    if detailed {
        println!();
        for s in &report.sentences {
            println!(
                "  [{}] {:.1}% ({} matched, {} -> {} tokens)",
                s.index,
                s.ratio * 100.0,
                s.matched,
                s.len_a,
                s.len_b
            );
        }
    }
}

/// Format a pair as a human-readable line.
pub fn format_pair(pair: &PairMetrics) -> String {
    format!(
        "Group {} [{} -> {}]: mean={:.1}% min={:.1}% quick={:.1}% redundant={}/{}",
        pair.group_id,
        pair.prev_seq,
        pair.seq,
        pair.stats.mean * 100.0,
        pair.stats.min * 100.0,
        pair.quick_mean * 100.0,
        pair.stats.redundant_tokens,
        pair.stats.total_tokens,
    )
}

/// Print pairs in a human-readable format.
pub fn print_pairs(pairs: &[PairMetrics], limit: Option<usize>) {
    let to_print = match limit {
        Some(n) => &pairs[..n.min(pairs.len())],
        None => pairs,
    };

    for pair in to_print {
        println!("{}", format_pair(pair));
    }

    if let Some(n) = limit {
        if pairs.len() > n {
            println!("... and {} more pairs", pairs.len() - n);
        }
    }
}

/// Write a batch summary report to stdout.
pub fn print_batch_summary(summary: &BatchSummary) {
    println!("\n=== Batch Summary ===");
    println!("Version: {}", summary.version);
    println!();
    println!("Parameters:");
    println!("  Block size: {}", summary.parameters.block_size);
    println!("  Junk policy: {:?}", summary.parameters.junk);
    println!("  Parallel sentences: {}", summary.parameters.parallel_sentences);
    println!();
    println!("Results:");
    println!("  Groups: {}", summary.group_count);
    println!(
        "  Blocks: {} total, {} written, {} skipped",
        summary.blocks_total, summary.blocks_written, summary.blocks_skipped
    );
    println!("  Pairs compared: {}", summary.pairs_compared);
    println!("  Mean ratio: {:.1}%", summary.mean_ratio * 100.0);
}

pub fn print_corpus_stats(stats: &CorpusStats) {
    println!("\n=== Corpus Statistics ===");
    println!("Notes: {}", stats.total_notes);
    println!("Groups: {}", stats.total_groups);
    println!("Draft pairs: {}", stats.total_pairs);
    println!("Largest group: {} drafts", stats.largest_group);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_pair() -> PairMetrics {
        PairMetrics {
            group_id: "100234".to_string(),
            prev_seq: 1,
            seq: 2,
            sentence_count: 2,
            stats: RatioStats {
                mean: 0.75,
                stddev: 0.25,
                max: 1.0,
                min: 0.5,
                redundant_tokens: 4,
                total_tokens: 5,
            },
            quick_mean: 0.8,
        }
    }

    #[test]
    fn test_format_pair() {
        let formatted = format_pair(&create_test_pair());

        assert!(formatted.contains("Group 100234"));
        assert!(formatted.contains("[1 -> 2]"));
        assert!(formatted.contains("mean=75.0%"));
        assert!(formatted.contains("min=50.0%"));
        assert!(formatted.contains("quick=80.0%"));
        assert!(formatted.contains("redundant=4/5"));
    }

    #[test]
    fn test_format_stats() {
        let formatted = format_stats(&create_test_pair().stats);
        assert!(formatted.contains("Mean ratio: 75.0%"));
        assert!(formatted.contains("Redundant tokens: 4 of 5"));
    }

    #[test]
    fn test_write_pairs_csv() {
        let mut output = Vec::new();
        write_pairs_csv(&[create_test_pair()], &mut output).unwrap();

        let csv = String::from_utf8(output).unwrap();
        assert!(csv.starts_with("group_id,prev_seq,seq"));
        assert!(csv.contains("\"100234\",1,2,2,0.75,0.25,1,0.5,4,5,0.8"));
    }

    #[test]
    fn test_write_pairs_csv_empty() {
        let mut output = Vec::new();
        write_pairs_csv(&[], &mut output).unwrap();

        let csv = String::from_utf8(output).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_write_json_file_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block_0_diffs.json");
        write_json_file(&vec![create_test_pair()], &path).unwrap();

        let back: Vec<PairMetrics> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![create_test_pair()]);
        assert!(!path.with_extension("json.partial").exists());
    }

    #[test]
    fn test_write_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff.html");
        write_html_file("Drafts", "<div>x</div>", &path).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div>x</div>"));
    }
}
