use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DataError;

use super::models::{RawRecord, SeasonRecord};
use super::source::{DatasetSource, SourceFingerprint};

/// Accepted header spellings per required column, compared lowercase and
/// trimmed. The first entry is the canonical name used in error messages.
const COLUMNS: [(&str, &[&str]); 8] = [
    ("team", &["team", "squad", "club"]),
    ("season", &["season", "year"]),
    ("position", &["position", "pos", "rank"]),
    ("points", &["points", "p", "pts"]),
    ("win_pct", &["win_pct", "win%", "win pct"]),
    ("gd_per_game", &["gd_per_game", "gd per game", "gd/g"]),
    ("ga_per_game", &["ga_per_game", "ga per game", "ga/g"]),
    ("champion", &["champion", "champ", "is_champion"]),
];

/// Spreadsheet export (CSV with a header row) of league-season records.
pub struct CsvSource {
    path: PathBuf,
    name: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        CsvSource { path, name }
    }
}

impl DatasetSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> Result<SourceFingerprint> {
        SourceFingerprint::of_file(&self.path)
            .with_context(|| format!("Failed to stat {}", self.path.display()))
    }

    fn load(&self) -> Result<Vec<SeasonRecord>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;
        parse_records(file, &self.name)
    }
}

/// Parse CSV content into season records.
pub fn parse_records(input: impl std::io::Read, source_name: &str) -> Result<Vec<SeasonRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let index = column_index(&headers, source_name)?;

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.with_context(|| format!("Malformed CSV row {}", row))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let field = |col: usize| record.get(index[col]).unwrap_or("").to_string();
        let raw = RawRecord {
            team: field(0),
            season: field(1),
            position: field(2),
            points: field(3),
            win_pct: field(4),
            gd_per_game: field(5),
            ga_per_game: field(6),
            champion: field(7),
        };
        records.push(raw.into_record(row)?);
    }

    debug!("{}: parsed {} rows", source_name, records.len());
    Ok(records)
}

/// Position of each required column in the header row, in `COLUMNS` order.
fn column_index(headers: &csv::StringRecord, source_name: &str) -> Result<[usize; 8], DataError> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut index = [0usize; 8];
    for (slot, (canonical, aliases)) in COLUMNS.iter().enumerate() {
        index[slot] = normalized
            .iter()
            .position(|h| aliases.contains(&h.as_str()))
            .ok_or_else(|| DataError::MissingColumn {
                source_name: source_name.to_string(),
                column: *canonical,
            })?;
    }
    Ok(index)
}

/// Whether a path looks like a CSV export.
pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const SERIE_A: &str = "\
Team,YEAR,POS,P,WIN%,GD PER GAME,GA PER GAME,CHAMPION
Inter,2023-24,1,94,76.3,1.79,0.58,1
Milan,2023-24,2,75,57.9,0.53,1.29,0
Napoli,2022-23,1,90,73.7,1.18,0.74,1
";

    #[test]
    fn parses_spreadsheet_headers() {
        let records = parse_records(SERIE_A.as_bytes(), "mem").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].team, "Inter");
        assert_eq!(records[0].season.start_year, 2023);
        assert!(records[0].champion);
        assert!(!records[1].champion);
        assert_relative_eq!(records[2].metrics.points, 90.0);
        assert_relative_eq!(records[2].metrics.ga_per_game, 0.74);
    }

    #[test]
    fn accepts_snake_case_headers_in_any_order() {
        let csv = "\
champion,points,team,season,position,ga_per_game,gd_per_game,win_pct
0,61,Roma,2021-22,6,1.13,0.47,47.4
";
        let records = parse_records(csv.as_bytes(), "mem").unwrap();
        assert_eq!(records[0].team, "Roma");
        assert_eq!(records[0].position, 6);
        assert_relative_eq!(records[0].metrics.gd_per_game, 0.47);
        assert_relative_eq!(records[0].metrics.win_pct, 47.4);
    }

    #[test]
    fn missing_column_is_a_data_error() {
        let csv = "Team,YEAR,POS,P,WIN%,GD PER GAME,CHAMPION\nInter,2023-24,1,94,76.3,1.79,1\n";
        let err = parse_records(csv.as_bytes(), "mem").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn {
                source_name: "mem".into(),
                column: "ga_per_game"
            })
        );
    }

    #[test]
    fn bad_number_reports_row_and_column() {
        let csv = "\
Team,YEAR,POS,P,WIN%,GD PER GAME,GA PER GAME,CHAMPION
Inter,2023-24,1,94,76.3,1.79,0.58,1
Milan,2023-24,2,lots,57.9,0.53,1.29,0
";
        let err = parse_records(csv.as_bytes(), "mem").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::InvalidValue {
                row: 2,
                column: "points",
                value: "lots".into()
            })
        );
    }

    #[test]
    fn row_cut_short_before_champion_is_rejected() {
        let csv = "\
Team,YEAR,POS,P,WIN%,GD PER GAME,GA PER GAME,CHAMPION
Inter,2023-24,1,94,76.3,1.79,0.58,1
Milan,2023-24,2,75,57.9,0.53,1.29
";
        let err = parse_records(csv.as_bytes(), "mem").unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::InvalidValue {
                row: 2,
                column: "champion",
                value: String::new()
            })
        );
    }

    #[test]
    fn loads_from_disk_and_fingerprints() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SERIE_A.as_bytes()).unwrap();
        file.flush().unwrap();

        let source = CsvSource::new(file.path());
        assert!(is_csv(file.path()));
        assert_eq!(source.load().unwrap().len(), 3);
        let fp = source.fingerprint().unwrap();
        assert_eq!(fp.len, SERIE_A.len() as u64);
    }
}
