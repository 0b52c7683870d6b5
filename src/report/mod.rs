//! Terminal and JSON rendering of prediction results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};

use crate::data::models::Metric;
use crate::data::Dataset;
use crate::model::{ChampionProfile, MetricScale, Prediction, RankedTeam};

/// Width of the longest bar in `render_chart`.
pub const CHART_WIDTH: usize = 40;

#[derive(Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    prediction: &'a Prediction,
    predicted_champion: Option<ChampionSummary<'a>>,
}

#[derive(Serialize)]
struct ChampionSummary<'a> {
    team: &'a str,
    win_probability: f64,
}

/// Pretty JSON report of a run.
pub fn render_json(prediction: &Prediction, generated_at: DateTime<Utc>) -> serde_json::Result<String> {
    let report = Report {
        generated_at,
        prediction,
        predicted_champion: prediction.champion().map(|c| ChampionSummary {
            team: &c.team,
            win_probability: c.win_probability,
        }),
    };
    serde_json::to_string_pretty(&report)
}

/// Ranked probability table followed by the predicted champion line.
pub fn render_table(prediction: &Prediction) -> Result<String, fmt::Error> {
    let team_width = column_width(prediction.ranking.iter().map(|r| r.team.as_str()), "Team");
    let sources: Vec<String> = prediction.ranking.iter().map(|r| r.provenance.tag()).collect();
    let source_width = column_width(sources.iter().map(String::as_str), "Source");

    let mut out = String::new();
    writeln!(out, "Season {} ({:?})", prediction.season, prediction.mode)?;
    write!(out, "{:>4}  {:<team_width$}", "#", "Team")?;
    for metric in Metric::ALL {
        write!(out, "  {:>7}", metric.heading())?;
    }
    writeln!(
        out,
        "  {:<source_width$}  {:>8}  {:>9}  Tier",
        "Source", "Distance", "Win prob"
    )?;

    for (row, source) in prediction.ranking.iter().zip(&sources) {
        write!(out, "{:>4}  {:<team_width$}", row.rank, row.team)?;
        for metric in Metric::ALL {
            write!(out, "  {:>7.2}", row.metrics.get(metric))?;
        }
        writeln!(
            out,
            "  {:<source_width$}  {:>8.4}  {:>8.2}%  {}",
            source,
            row.distance,
            row.win_probability,
            row.tier.map(|t| t.label()).unwrap_or("")
        )?;
    }

    if let Some(champion) = prediction.champion() {
        writeln!(out)?;
        writeln!(out, "Predicted champion: {}", champion.team)?;
        writeln!(out, "Win probability: {:.2}%", champion.win_probability)?;
    }
    Ok(out)
}

/// Horizontal bar chart, longest bar = top probability.
pub fn render_chart(ranking: &[RankedTeam], width: usize) -> Result<String, fmt::Error> {
    let team_width = column_width(ranking.iter().map(|r| r.team.as_str()), "");
    let top = ranking
        .iter()
        .map(|r| r.win_probability)
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    for row in ranking {
        let len = if top > 0.0 {
            ((row.win_probability / top) * width as f64).round() as usize
        } else {
            0
        };
        writeln!(
            out,
            "{:<team_width$} │{} {:.2}%",
            row.team,
            "█".repeat(len),
            row.win_probability
        )?;
    }
    Ok(out)
}

/// Champion profile, each champion's recency weight, and the metric scale.
pub fn render_profile(
    profile: &ChampionProfile,
    scale: Option<&MetricScale>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Recency-weighted champion profile (decay exponent {})",
        profile.decay_exponent
    )?;
    writeln!(out, "{:<8}  {:>9}  {:>9}", "Metric", "Value", "Std dev")?;
    for metric in Metric::ALL {
        let sd = scale
            .map(|s| format!("{:.4}", s.get(metric)))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<8}  {:>9.4}  {:>9}",
            metric.heading(),
            profile.get(metric),
            sd
        )?;
    }

    let total: f64 = profile.champions.iter().map(|c| c.weight).sum();
    writeln!(out)?;
    writeln!(out, "{:<9}  {:<20}  {:>8}  {:>7}", "Season", "Champion", "Weight", "Share")?;
    for c in &profile.champions {
        writeln!(
            out,
            "{:<9}  {:<20}  {:>8.4}  {:>6.2}%",
            c.season,
            c.team,
            c.weight,
            100.0 * c.weight / total
        )?;
    }
    Ok(out)
}

/// Season labels with their champion, oldest first.
pub fn render_seasons(dataset: &Dataset) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for season in dataset.seasons() {
        let teams = dataset.season_records(&season.label).count();
        let champion = dataset
            .champion_of(&season.label)
            .map(|r| r.team.as_str())
            .unwrap_or("-");
        writeln!(out, "{:<9}  {:>3} teams  champion: {}", season.label, teams, champion)?;
    }
    Ok(out)
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, heading: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(heading.len()))
        .max()
        .unwrap_or(0)
}
