use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DataError;

/// The four performance metrics the model compares teams on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    WinPct,
    GoalDiffPerGame,
    GoalsAgainstPerGame,
    Points,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::WinPct,
        Metric::GoalDiffPerGame,
        Metric::GoalsAgainstPerGame,
        Metric::Points,
    ];

    /// Short column heading used in rendered tables.
    pub fn heading(self) -> &'static str {
        match self {
            Metric::WinPct => "WIN%",
            Metric::GoalDiffPerGame => "GD/G",
            Metric::GoalsAgainstPerGame => "GA/G",
            Metric::Points => "P",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::WinPct => "win_pct",
            Metric::GoalDiffPerGame => "gd_per_game",
            Metric::GoalsAgainstPerGame => "ga_per_game",
            Metric::Points => "points",
        };
        f.write_str(name)
    }
}

/// One value per tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricValues {
    /// Win percentage (0–100)
    pub win_pct: f64,
    /// Goal difference per game (signed)
    pub gd_per_game: f64,
    /// Goals conceded per game
    pub ga_per_game: f64,
    /// League points
    pub points: f64,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::WinPct => self.win_pct,
            Metric::GoalDiffPerGame => self.gd_per_game,
            Metric::GoalsAgainstPerGame => self.ga_per_game,
            Metric::Points => self.points,
        }
    }

    /// Build a value set by evaluating `f` once per metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> f64) -> Self {
        MetricValues {
            win_pct: f(Metric::WinPct),
            gd_per_game: f(Metric::GoalDiffPerGame),
            ga_per_game: f(Metric::GoalsAgainstPerGame),
            points: f(Metric::Points),
        }
    }

    /// Unweighted mean over a set of rows. `None` when the set is empty.
    pub fn mean<'a>(rows: impl IntoIterator<Item = &'a MetricValues>) -> Option<MetricValues> {
        let mut sum = MetricValues::default();
        let mut n = 0usize;
        for row in rows {
            sum.win_pct += row.win_pct;
            sum.gd_per_game += row.gd_per_game;
            sum.ga_per_game += row.ga_per_game;
            sum.points += row.points;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let n = n as f64;
        Some(MetricValues::from_fn(|m| sum.get(m) / n))
    }
}

/// A season label such as "2023-24" together with its parsed start year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonLabel {
    pub label: String,
    pub start_year: i32,
}

impl SeasonLabel {
    /// Parse the leading 4-digit year ("2023-24", "2023/24", "2023").
    pub fn parse(raw: &str) -> Result<Self, DataError> {
        let label = raw.trim();
        let digits: String = label.chars().take(4).collect();
        let bad = || DataError::BadSeasonLabel {
            label: label.to_string(),
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        // "20234" is not a season
        if label.chars().nth(4).is_some_and(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        let start_year = digits.parse().map_err(|_| bad())?;
        Ok(SeasonLabel {
            label: label.to_string(),
            start_year,
        })
    }
}

impl fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// One team's final standing and performance in one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub team: String,
    pub season: SeasonLabel,
    /// Final table position (1 = top)
    pub position: u32,
    pub metrics: MetricValues,
    pub champion: bool,
}

/// Loosely typed row as read from a source, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub team: String,
    pub season: String,
    pub position: String,
    pub points: String,
    pub win_pct: String,
    pub gd_per_game: String,
    pub ga_per_game: String,
    pub champion: String,
}

impl RawRecord {
    /// Validate and convert. `row` is 1-based and only used for error messages.
    pub fn into_record(self, row: usize) -> Result<SeasonRecord, DataError> {
        let team = self.team.trim().to_string();
        if team.is_empty() {
            return Err(invalid(row, "team", &self.team));
        }
        let season = SeasonLabel::parse(&self.season)?;

        let position: u32 = self
            .position
            .trim()
            .parse()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| invalid(row, "position", &self.position))?;

        let win_pct = parse_metric(row, "win_pct", &self.win_pct)?;
        if !(0.0..=100.0).contains(&win_pct) {
            return Err(invalid(row, "win_pct", &self.win_pct));
        }
        let gd_per_game = parse_metric(row, "gd_per_game", &self.gd_per_game)?;
        let ga_per_game = parse_metric(row, "ga_per_game", &self.ga_per_game)?;
        if ga_per_game < 0.0 {
            return Err(invalid(row, "ga_per_game", &self.ga_per_game));
        }
        let points = parse_metric(row, "points", &self.points)?;

        let champion = parse_flag(&self.champion).ok_or_else(|| invalid(row, "champion", &self.champion))?;

        Ok(SeasonRecord {
            team,
            season,
            position,
            metrics: MetricValues {
                win_pct,
                gd_per_game,
                ga_per_game,
                points,
            },
            champion,
        })
    }
}

fn parse_metric(row: usize, column: &'static str, raw: &str) -> Result<f64, DataError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(row, column, raw))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Some(true),
        "0" | "0.0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn invalid(row: usize, column: &'static str, value: &str) -> DataError {
    DataError::InvalidValue {
        row,
        column,
        value: value.to_string(),
    }
}
