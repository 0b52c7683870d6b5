//! Error types for the prediction pipeline.
//!
//! Every variant aborts the current run. Nothing here is retried or
//! defaulted; the only sanctioned substitution is the candidate fallback,
//! which is reported through `Provenance` rather than an error.

use thiserror::Error;

use crate::data::models::Metric;

/// Problems with the input table or with what was asked of it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("dataset {source_name} is missing required column '{column}'")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("season label '{label}' does not start with a 4-digit year")]
    BadSeasonLabel { label: String },

    #[error("team '{team}' appears more than once in season {season}")]
    DuplicateRecord { team: String, season: String },

    #[error("season {season} has more than one champion ('{first}' and '{second}')")]
    MultipleChampions {
        season: String,
        first: String,
        second: String,
    },

    #[error("dataset contains no champion records")]
    NoChampions,

    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("metric {metric} has zero variance across the dataset")]
    DegenerateScale { metric: Metric },

    #[error("season '{season}' is not present in the dataset")]
    UnknownSeason { season: String },

    #[error("team '{team}' has no history and the baseline pool is empty")]
    EmptyFallbackPool { team: String },

    #[error("team '{team}' is listed more than once in the roster")]
    DuplicateRosterTeam { team: String },
}

/// Problems turning distances into a probability table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("team '{team}' matches the champion profile exactly; its score is undefined")]
    DegenerateScore { team: String },

    #[error("every metric weight is zero")]
    AllWeightsZero,

    #[error("no candidate teams to score")]
    NoCandidates,

    #[error("scores cannot be normalized into probabilities (total {total})")]
    Unnormalizable { total: f64 },

    #[error("parameter {name} must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Score(#[from] ScoreError),
}
