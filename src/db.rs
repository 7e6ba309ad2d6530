//! SQLite access for note corpora and stored pair metrics.
//!
//! Notes live in a `notes(group_id, seq, text)` table. `group_id` may be
//! stored as an integer (e.g. an admission id) or as text; it is always read
//! back as text.

use crate::models::{CorpusStats, NoteRecord, PairMetrics};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Invalid note record (rowid {rowid}): {reason}")]
    InvalidRecord { rowid: i64, reason: String },
}

const CREATE_NOTES: &str = "CREATE TABLE IF NOT EXISTS notes (
    group_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    text TEXT NOT NULL
)";

const CREATE_PAIR_METRICS: &str = "CREATE TABLE IF NOT EXISTS pair_metrics (
    group_id TEXT NOT NULL,
    prev_seq INTEGER NOT NULL,
    seq INTEGER NOT NULL,
    sentence_count INTEGER NOT NULL,
    mean REAL NOT NULL,
    stddev REAL NOT NULL,
    max REAL NOT NULL,
    min REAL NOT NULL,
    redundant_tokens INTEGER NOT NULL,
    total_tokens INTEGER NOT NULL,
    quick_mean REAL NOT NULL,
    stats_json TEXT NOT NULL,
    PRIMARY KEY (group_id, prev_seq, seq)
)";

/// Read a group id that may be stored as integer or text.
fn group_id_from_value(rowid: i64, value: Value) -> Result<String, DbError> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Integer(n) => Ok(n.to_string()),
        other => Err(DbError::InvalidRecord {
            rowid,
            reason: format!("group_id has unsupported type {:?}", other.data_type()),
        }),
    }
}

/// Load every note, ordered by group then sequence.
pub fn load_notes(db_path: &Path) -> Result<Vec<NoteRecord>, DbError> {
    let conn = Connection::open(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT rowid, group_id, seq, text
         FROM notes
         ORDER BY group_id, seq, rowid",
    )?;
    let mut rows = stmt.query([])?;

    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let rowid: i64 = row.get(0)?;
        let group_id = group_id_from_value(rowid, row.get(1)?)?;
        // NULL text is treated as an empty draft
        let text: Option<String> = row.get(3)?;
        notes.push(NoteRecord {
            group_id,
            seq: row.get(2)?,
            text: text.unwrap_or_default(),
        });
    }

    Ok(notes)
}

/// Load the notes of a single group, ordered by sequence.
pub fn load_group_notes(db_path: &Path, group_id: &str) -> Result<Vec<NoteRecord>, DbError> {
    let conn = Connection::open(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT seq, text
         FROM notes
         WHERE CAST(group_id AS TEXT) = ?
         ORDER BY seq, rowid",
    )?;
    let mut rows = stmt.query([group_id])?;

    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let text: Option<String> = row.get(1)?;
        notes.push(NoteRecord {
            group_id: group_id.to_string(),
            seq: row.get(0)?,
            text: text.unwrap_or_default(),
        });
    }

    if notes.is_empty() {
        return Err(DbError::GroupNotFound(group_id.to_string()));
    }

    Ok(notes)
}

/// Insert notes, creating the table if needed.
pub fn insert_notes(db_path: &Path, notes: &[NoteRecord]) -> Result<usize, DbError> {
    let mut conn = Connection::open(db_path)?;
    conn.execute(CREATE_NOTES, [])?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO notes (group_id, seq, text) VALUES (?1, ?2, ?3)")?;
        for note in notes {
            stmt.execute(params![note.group_id, note.seq, note.text])?;
        }
    }
    tx.commit()?;

    Ok(notes.len())
}

/// Write pair metrics into the `pair_metrics` table, replacing earlier
/// results for the same pairs.
pub fn store_pair_metrics(db_path: &Path, pairs: &[PairMetrics]) -> Result<usize, DbError> {
    let mut conn = Connection::open(db_path)?;
    conn.execute(CREATE_PAIR_METRICS, [])?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO pair_metrics
             (group_id, prev_seq, seq, sentence_count, mean, stddev, max, min,
              redundant_tokens, total_tokens, quick_mean, stats_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for pair in pairs {
            let stats_json = serde_json::to_string(&pair.stats)?;
            stmt.execute(params![
                pair.group_id,
                pair.prev_seq,
                pair.seq,
                pair.sentence_count as i64,
                pair.stats.mean,
                pair.stats.stddev,
                pair.stats.max,
                pair.stats.min,
                pair.stats.redundant_tokens as i64,
                pair.stats.total_tokens as i64,
                pair.quick_mean,
                stats_json,
            ])?;
        }
    }
    tx.commit()?;

    Ok(pairs.len())
}

/// Count notes, groups and comparable pairs.
pub fn load_corpus_stats(db_path: &Path) -> Result<CorpusStats, DbError> {
    let conn = Connection::open(db_path)?;

    let total_notes: u64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;

    let total_groups: u64 = conn.query_row(
        "SELECT COUNT(DISTINCT CAST(group_id AS TEXT)) FROM notes",
        [],
        |row| row.get(0),
    )?;

    let largest_group: Option<u64> = conn.query_row(
        "SELECT MAX(n) FROM (SELECT COUNT(*) AS n FROM notes GROUP BY CAST(group_id AS TEXT))",
        [],
        |row| row.get(0),
    )?;

    Ok(CorpusStats {
        total_notes,
        total_groups,
        total_pairs: total_notes.saturating_sub(total_groups),
        largest_group: largest_group.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatioStats;

    fn note(group: &str, seq: i64, text: &str) -> NoteRecord {
        NoteRecord {
            group_id: group.to_string(),
            seq,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_insert_and_load_notes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let notes = vec![note("b", 2, "second"), note("a", 1, "x"), note("b", 1, "first")];
        assert_eq!(insert_notes(&path, &notes).unwrap(), 3);

        let loaded = load_notes(&path).unwrap();
        assert_eq!(
            loaded,
            vec![note("a", 1, "x"), note("b", 1, "first"), note("b", 2, "second")]
        );

        let group = load_group_notes(&path, "b").unwrap();
        assert_eq!(group.len(), 2);
        assert!(matches!(
            load_group_notes(&path, "zzz"),
            Err(DbError::GroupNotFound(_))
        ));
    }

    #[test]
    fn test_integer_group_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE notes (group_id INTEGER, seq INTEGER, text TEXT)", [])
            .unwrap();
        conn.execute("INSERT INTO notes VALUES (100234, 1, 'a b'), (100234, 2, NULL)", [])
            .unwrap();
        drop(conn);

        let loaded = load_notes(&path).unwrap();
        assert_eq!(loaded[0].group_id, "100234");
        assert_eq!(loaded[1].text, "");
        assert_eq!(load_group_notes(&path, "100234").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_group_id_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE notes (group_id, seq INTEGER, text TEXT)", [])
            .unwrap();
        conn.execute("INSERT INTO notes VALUES (NULL, 1, 'a')", []).unwrap();
        drop(conn);

        let err = load_notes(&path).unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { .. }));
    }

    #[test]
    fn test_store_pair_metrics_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.db");
        let mut pair = PairMetrics {
            group_id: "g".to_string(),
            prev_seq: 1,
            seq: 2,
            sentence_count: 1,
            stats: RatioStats::from_scores(&[]),
            quick_mean: 1.0,
        };

        store_pair_metrics(&path, &[pair.clone()]).unwrap();
        pair.quick_mean = 0.5;
        store_pair_metrics(&path, &[pair]).unwrap();

        let conn = Connection::open(&path).unwrap();
        let (count, quick): (i64, f64) = conn
            .query_row("SELECT COUNT(*), MAX(quick_mean) FROM pair_metrics", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(quick, 0.5);
    }

    #[test]
    fn test_corpus_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let notes = vec![note("a", 1, "x"), note("a", 2, "y"), note("a", 3, "z"), note("b", 1, "w")];
        insert_notes(&path, &notes).unwrap();

        let stats = load_corpus_stats(&path).unwrap();
        assert_eq!(stats.total_notes, 4);
        assert_eq!(stats.total_groups, 2);
        assert_eq!(stats.total_pairs, 2);
        assert_eq!(stats.largest_group, 3);
    }
}
