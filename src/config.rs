use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::model::params::DEFAULT_BASELINE_POOL;
use crate::model::{MetricWeights, ScoringParams, TierThresholds, ZeroDistancePolicy};

/// League champion probability estimator
#[derive(Parser, Debug, Clone)]
#[command(name = "champion-predictor", version, about)]
pub struct Config {
    /// Historical season table (.csv, or a SQLite file with a `season_records` table)
    #[arg(long, global = true, env = "CHAMPION_DATA", default_value = "data/league.csv")]
    pub data: PathBuf,

    /// Debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List seasons in the dataset with their champion
    Seasons,
    /// Show the recency-weighted champion profile
    Profile {
        /// Recency decay exponent p
        #[arg(long, env = "DECAY_EXPONENT", default_value = "1.0")]
        decay: f64,
    },
    /// Rank teams by similarity to the champion profile
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Season to score (defaults to the latest in the dataset)
    #[arg(long, env = "SEASON")]
    pub season: Option<String>,

    /// Teams to project, comma separated. Enables tier labels.
    #[arg(long, value_delimiter = ',', conflicts_with = "roster_file")]
    pub roster: Option<Vec<String>>,

    /// File with one roster team per line (`#` starts a comment)
    #[arg(long, env = "ROSTER_FILE")]
    pub roster_file: Option<PathBuf>,

    /// Recency decay exponent p
    #[arg(long, env = "DECAY_EXPONENT", default_value = "1.0")]
    pub decay: f64,

    /// Weight of win percentage
    #[arg(long, env = "W_WIN", default_value = "1.0")]
    pub w_win: f64,

    /// Weight of goal difference per game
    #[arg(long, env = "W_GD", default_value = "1.0")]
    pub w_gd: f64,

    /// Weight of goals against per game
    #[arg(long, env = "W_GA", default_value = "1.0")]
    pub w_ga: f64,

    /// Weight of points
    #[arg(long, env = "W_PTS", default_value = "1.0")]
    pub w_pts: f64,

    /// Behaviour when a team matches the profile exactly
    #[arg(long, value_enum, env = "ZERO_DISTANCE", default_value = "fail")]
    pub zero_distance: ZeroDistancePolicy,

    /// Bottom-N historical rows averaged for teams with no history
    #[arg(long, env = "BASELINE_SIZE", default_value_t = DEFAULT_BASELINE_POOL)]
    pub baseline_size: usize,

    #[arg(long, default_value = "4")]
    pub ucl_spots: u32,

    #[arg(long, default_value = "1")]
    pub europa_spots: u32,

    #[arg(long, default_value = "1")]
    pub conference_spots: u32,

    /// First rank labelled as relegation tier
    #[arg(long, default_value = "18")]
    pub relegation_from: u32,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Append a probability bar chart (table format only)
    #[arg(long)]
    pub chart: bool,

    /// Poll the dataset every N seconds and re-run when it changes
    #[arg(long, env = "WATCH_SECS")]
    pub watch: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Seasons => {}
            Command::Profile { decay } => check_decay(*decay)?,
            Command::Predict(args) => args.validate()?,
        }
        Ok(())
    }
}

impl PredictArgs {
    fn validate(&self) -> anyhow::Result<()> {
        check_decay(self.decay)?;
        for (name, w) in [
            ("w_win", self.w_win),
            ("w_gd", self.w_gd),
            ("w_ga", self.w_ga),
            ("w_pts", self.w_pts),
        ] {
            if !w.is_finite() || w < 0.0 {
                anyhow::bail!("{} must be a non-negative number", name);
            }
        }
        if self.relegation_from == 0 {
            anyhow::bail!("relegation_from must be at least 1");
        }
        if self.watch == Some(0) {
            anyhow::bail!("watch interval must be at least 1 second");
        }
        if let Some(season) = &self.season {
            if season.trim().is_empty() {
                anyhow::bail!("season must not be empty");
            }
        }
        Ok(())
    }

    pub fn scoring_params(&self) -> ScoringParams {
        ScoringParams {
            decay_exponent: self.decay,
            weights: MetricWeights {
                win_pct: self.w_win,
                gd_per_game: self.w_gd,
                ga_per_game: self.w_ga,
                points: self.w_pts,
            },
            zero_distance: self.zero_distance,
            baseline_pool: self.baseline_size,
            tiers: TierThresholds {
                ucl_spots: self.ucl_spots,
                europa_spots: self.europa_spots,
                conference_spots: self.conference_spots,
                relegation_from: self.relegation_from,
            },
        }
    }

    /// Roster from `--roster` or `--roster-file`; `None` means single-season mode.
    pub fn load_roster(&self) -> anyhow::Result<Option<Vec<String>>> {
        if let Some(path) = &self.roster_file {
            return read_roster_file(path).map(Some);
        }
        Ok(self.roster.as_ref().map(|teams| {
            teams
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        }))
    }
}

fn check_decay(decay: f64) -> anyhow::Result<()> {
    if !decay.is_finite() || decay < 0.0 {
        anyhow::bail!("decay exponent must be a non-negative number");
    }
    Ok(())
}

fn read_roster_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    let teams: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    if teams.is_empty() {
        anyhow::bail!("roster file {} lists no teams", path.display());
    }
    Ok(teams)
}
