use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DataError;

use super::models::{RawRecord, SeasonRecord};
use super::source::{DatasetSource, SourceFingerprint};

/// Table the historical records are read from.
pub const TABLE: &str = "season_records";

const REQUIRED_COLUMNS: [&str; 8] = [
    "team",
    "season",
    "position",
    "points",
    "win_pct",
    "gd_per_game",
    "ga_per_game",
    "champion",
];

/// SQLite file holding a `season_records` table. Opened read-only per load.
pub struct SqliteSource {
    path: PathBuf,
    name: String,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("sqlite:{}", path.display());
        SqliteSource { path, name }
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open SQLite database: {}", self.path.display()))?;
        Ok(conn)
    }
}

impl DatasetSource for SqliteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> Result<SourceFingerprint> {
        SourceFingerprint::of_file(&self.path)
            .with_context(|| format!("Failed to stat {}", self.path.display()))
    }

    fn load(&self) -> Result<Vec<SeasonRecord>> {
        let conn = self.open()?;
        read_records(&conn, &self.name)
    }
}

/// Read and validate every row of the records table.
pub fn read_records(conn: &Connection, source_name: &str) -> Result<Vec<SeasonRecord>> {
    check_columns(conn, source_name)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT team, season, position, points, win_pct, gd_per_game, ga_per_game, champion
         FROM {TABLE} ORDER BY rowid"
    ))?;
    let raws = stmt
        .query_map([], map_raw_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let records = raws
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i + 1))
        .collect::<Result<Vec<_>, DataError>>()?;

    debug!("{}: read {} rows", source_name, records.len());
    Ok(records)
}

fn check_columns(conn: &Connection, source_name: &str) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for column in REQUIRED_COLUMNS {
        if !present.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            return Err(DataError::MissingColumn {
                source_name: source_name.to_string(),
                column,
            }
            .into());
        }
    }
    Ok(())
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

/// Columns are read as text so SQLite's loose typing goes through the same
/// validation as CSV input.
fn map_raw_record(row: &rusqlite::Row) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        team: text(row, 0)?,
        season: text(row, 1)?,
        position: text(row, 2)?,
        points: text(row, 3)?,
        win_pct: text(row, 4)?,
        gd_per_game: text(row, 5)?,
        ga_per_game: text(row, 6)?,
        champion: text(row, 7)?,
    })
}

fn text(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<String> {
    use rusqlite::types::ValueRef;
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    })
}

/// Whether a path looks like a SQLite database file.
pub fn is_sqlite(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "db" | "sqlite" | "sqlite3"))
}
