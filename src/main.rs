//! Notediff command line
//!
//! Compares successive drafts of notes: a single pair of files, one group
//! from a database, or a whole corpus in resumable blocks.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notediff::batch::{compare_group, load_notes, run_batch, BatchOptions};
use notediff::db::{load_corpus_stats, load_group_notes};
use notediff::matcher::find_matches;
use notediff::metrics::{diff_quick_ratio, diff_report};
use notediff::models::{DiffParams, JunkPolicy, NoteGroup};
use notediff::output::{
    print_batch_summary, print_corpus_stats, print_pairs, print_report, write_html_file,
    write_json, write_json_file, write_pairs_csv_file,
};
use notediff::render::html_diffs;

#[derive(Parser)]
#[command(name = "notediff")]
#[command(about = "Sentence-aligned diffing of successive note drafts")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for a single comparison
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full report as JSON on stdout
    Json,
}

/// Junk policy (CLI version, mirrors models::JunkPolicy).
/// Whitespace junk is left out: tokenized drafts never hold blank tokens.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliJunk {
    None,
    Punctuation,
}

/// Parameters that inherit from DiffParams::default() (or from --params).
/// All use Option<T> so we can detect "user didn't specify" vs "user set explicitly".
#[derive(Args, Debug)]
struct ParamArgs {
    /// JSON file with a full parameter set; flags below override it
    #[arg(long)]
    params: Option<PathBuf>,

    /// Tokens the matcher treats as junk [default: none]
    #[arg(long, value_enum)]
    junk: Option<CliJunk>,

    /// Comma-separated stopwords treated as junk (overrides --junk)
    #[arg(long, value_delimiter = ',')]
    stopwords: Option<Vec<String>>,

    /// Marker opening a highlighted span
    #[arg(long)]
    highlight_open: Option<String>,

    /// Marker closing a highlighted span
    #[arg(long)]
    highlight_close: Option<String>,

    /// Groups per persisted block [default: 500]
    #[arg(long)]
    block_size: Option<usize>,

    /// Score the sentence pairs of each comparison in parallel
    #[arg(long, action = clap::ArgAction::Set)]
    parallel_sentences: Option<bool>,
}

impl ParamArgs {
    /// Overlay user-specified values onto the defaults.
    fn resolve(self) -> Result<DiffParams, Box<dyn std::error::Error>> {
        let defaults = match &self.params {
            Some(path) => DiffParams::from_json_file(path)?,
            None => DiffParams::default(),
        };

        let junk = match (self.stopwords, self.junk) {
            (Some(words), _) => JunkPolicy::Stopwords(words),
            (None, Some(CliJunk::None)) => JunkPolicy::None,
            (None, Some(CliJunk::Punctuation)) => JunkPolicy::Punctuation,
            (None, None) => defaults.junk.clone(),
        };

        let params = DiffParams {
            junk,
            highlight_open: self.highlight_open.unwrap_or(defaults.highlight_open),
            highlight_close: self.highlight_close.unwrap_or(defaults.highlight_close),
            block_size: self.block_size.unwrap_or(defaults.block_size),
            parallel_sentences: self.parallel_sentences.unwrap_or(defaults.parallel_sentences),
        };
        params.validate()?;
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two drafts stored in text files
    Compare {
        /// Earlier draft
        #[arg(long)]
        a: PathBuf,

        /// Later draft
        #[arg(long)]
        b: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write a side-by-side HTML rendering
        #[arg(long)]
        html: Option<PathBuf>,

        /// Also report the quick-ratio upper bound
        #[arg(long)]
        quick: bool,

        /// Print one line per aligned sentence
        #[arg(long)]
        detailed: bool,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Compare successive drafts of every group in a corpus
    Batch {
        /// Notes database (.db/.sqlite) or JSON Lines file
        #[arg(long)]
        input: PathBuf,

        /// Directory for block_{i}_diffs.json files
        #[arg(long)]
        output_dir: PathBuf,

        /// Also store pair metrics in this SQLite database
        #[arg(long)]
        metrics_db: Option<PathBuf>,

        /// Write the summary as JSON to this file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Compare the drafts of one group in a notes database
    Group {
        /// Path to the notes database
        #[arg(long)]
        corpus_db: PathBuf,

        /// Group ID
        #[arg(long)]
        group_id: String,

        /// Write pair metrics as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print first N pairs to console
        #[arg(long)]
        show_pairs: Option<usize>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Show corpus statistics
    Stats {
        /// Path to the notes database
        #[arg(long)]
        corpus_db: PathBuf,
    },

    /// Benchmark matcher performance
    Benchmark {
        /// Number of match iterations
        #[arg(long, default_value = "1000")]
        iterations: usize,

        /// Sequence size
        #[arg(long, default_value = "300")]
        size: usize,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compare {
            a,
            b,
            format,
            html,
            quick,
            detailed,
            params,
        } => {
            let params = params.resolve()?;
            let text_a = std::fs::read_to_string(&a)?;
            let text_b = std::fs::read_to_string(&b)?;

            let report = diff_report(&text_a, &text_b, &params);

            match format {
                OutputFormat::Json => {
                    write_json(&report, &mut std::io::stdout())?;
                    println!();
                }
                OutputFormat::Text => {
                    print_report(&report, detailed);
                }
            }

            if quick {
                let junk = params.junk.predicate();
                let bound = diff_quick_ratio(&text_a, &text_b, junk.as_deref());
                eprintln!("Quick ratio (upper bound): {:.1}%", bound.mean * 100.0);
            }

            if let Some(path) = html {
                let title = format!("{} vs {}", a.display(), b.display());
                write_html_file(&title, &html_diffs(&text_a, &text_b, &params), &path)?;
                eprintln!("HTML output: {}", path.display());
            }
        }

        Commands::Batch {
            input,
            output_dir,
            metrics_db,
            summary,
            quiet,
            params,
        } => {
            let params = params.resolve()?;

            if !quiet {
                eprintln!("Loading notes from {}...", input.display());
            }
            let notes = load_notes(&input)?;
            if !quiet {
                eprintln!("  {} notes", notes.len());
            }

            let options = BatchOptions {
                show_progress: !quiet,
                metrics_db,
            };
            let result = run_batch(notes, &output_dir, &params, &options)?;

            if let Some(path) = summary {
                write_json_file(&result, &path)?;
            }
            if !quiet {
                print_batch_summary(&result);
                eprintln!("\nOutput: {}", output_dir.display());
            }
        }

        Commands::Group {
            corpus_db,
            group_id,
            csv,
            show_pairs,
            params,
        } => {
            let params = params.resolve()?;
            let notes = load_group_notes(&corpus_db, &group_id)?;
            let group = NoteGroup { group_id, notes };
            let pairs = compare_group(&group, &params);

            println!(
                "=== Group {} ({} drafts, {} pairs) ===",
                group.group_id,
                group.notes.len(),
                pairs.len()
            );
            print_pairs(&pairs, show_pairs);

            if let Some(path) = csv {
                write_pairs_csv_file(&pairs, &path)?;
                eprintln!("CSV output: {}", path.display());
            }
        }

        Commands::Stats { corpus_db } => {
            let stats = load_corpus_stats(&corpus_db)?;
            print_corpus_stats(&stats);
        }

        Commands::Benchmark { iterations, size } => {
            run_benchmark(iterations, size);
        }
    }

    Ok(())
}

/// Run matcher benchmark to measure performance.
fn run_benchmark(iterations: usize, size: usize) {
    use std::time::Instant;

    println!("=== Matcher Benchmark ===");
    println!("Iterations: {}", iterations);
    println!("Sequence size: {}", size);

    let seq_identical: Vec<u32> = (0..size as u32).collect();
    let seq_partial: Vec<u32> = (0..size as u32)
        .map(|i| if i % 10 < 7 { i } else { i + 10000 })
        .collect();
    let seq_no_match: Vec<u32> = (10000..10000 + size as u32).collect();

    let cases: [(&str, &[u32]); 3] = [
        ("Identical sequences", &seq_identical),
        ("70% match sequences", &seq_partial),
        ("No match sequences", &seq_no_match),
    ];

    for (label, other) in cases {
        println!("\n{}:", label);
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = find_matches(&seq_identical, other, None);
        }
        let elapsed = start.elapsed();
        let per_match = elapsed.as_secs_f64() / iterations.max(1) as f64;
        println!("  Total time: {:.3}s", elapsed.as_secs_f64());
        println!("  Per comparison: {:.3}ms", per_match * 1000.0);
        if per_match > 0.0 {
            println!("  Comparisons/sec: {:.0}", 1.0 / per_match);
        }
    }
}
