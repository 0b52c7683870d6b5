//! Distance to the champion profile and the resulting probability table.
//!
//!   distance = sqrt( Σ w_m · ((x_m − profile_m) / σ_m)² )
//!   score    = 1 / distance
//!   P_i      = 100 · score_i / Σ score_j
//!
//! A zero distance has no finite score; `ZeroDistancePolicy` decides whether
//! that aborts the run or hands the exact match(es) the whole 100%.

use serde::Serialize;
use tracing::debug;

use crate::data::models::{Metric, MetricValues};
use crate::error::ScoreError;

use super::params::{MetricWeights, Tier, TierThresholds, ZeroDistancePolicy};
use super::profile::ChampionProfile;
use super::resolver::{CandidateTeam, Provenance};
use super::scale::MetricScale;

/// A candidate with its derived per-run fields. Rows are in final rank order
/// once returned by `rank`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTeam {
    /// 1-based
    pub rank: u32,
    pub team: String,
    pub metrics: MetricValues,
    pub provenance: Provenance,
    pub distance: f64,
    /// `+inf` for a zero-distance team under the `certain` policy
    /// (serialized as null).
    pub score: f64,
    /// Percentage, 0–100
    pub win_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

/// Weighted normalized Euclidean distance from `metrics` to the profile.
pub fn distance(
    metrics: &MetricValues,
    profile: &ChampionProfile,
    scale: &MetricScale,
    weights: &MetricWeights,
) -> f64 {
    Metric::ALL
        .iter()
        .map(|&m| {
            let z = (metrics.get(m) - profile.get(m)) / scale.get(m);
            weights.get(m) * z * z
        })
        .sum::<f64>()
        .sqrt()
}

/// Score every candidate and rank by closeness to the profile (stable, so
/// equal distances keep input order). Tier labels are attached only when
/// `tiers` is given.
pub fn rank(
    candidates: Vec<CandidateTeam>,
    profile: &ChampionProfile,
    scale: &MetricScale,
    weights: &MetricWeights,
    policy: ZeroDistancePolicy,
    tiers: Option<&TierThresholds>,
) -> Result<Vec<RankedTeam>, ScoreError> {
    if candidates.is_empty() {
        return Err(ScoreError::NoCandidates);
    }
    let heaviest = weights.max();
    if heaviest == 0.0 {
        return Err(ScoreError::AllWeightsZero);
    }

    // Largest weight becomes 1; distances shrink by sqrt(heaviest) and
    // probabilities are unaffected.
    let unit = weights.scaled(1.0 / heaviest);
    let closeness: Vec<f64> = candidates
        .iter()
        .map(|c| distance(&c.metrics, profile, scale, &unit))
        .collect();
    let stretch = heaviest.sqrt();

    let exact = closeness.iter().filter(|d| **d == 0.0).count();
    let probabilities: Vec<f64> = if exact == 0 {
        let total: f64 = closeness.iter().map(|d| 1.0 / d).sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ScoreError::Unnormalizable { total });
        }
        closeness.iter().map(|d| 100.0 / d / total).collect()
    } else {
        match policy {
            ZeroDistancePolicy::Fail => {
                let i = closeness.iter().position(|d| *d == 0.0).unwrap_or(0);
                return Err(ScoreError::DegenerateScore {
                    team: candidates[i].team.clone(),
                });
            }
            ZeroDistancePolicy::Certain => {
                debug!("{} candidate(s) match the profile exactly", exact);
                let share = 100.0 / exact as f64;
                closeness
                    .iter()
                    .map(|d| if *d == 0.0 { share } else { 0.0 })
                    .collect()
            }
        }
    };

    let mut rows: Vec<(f64, RankedTeam)> = candidates
        .into_iter()
        .zip(closeness)
        .zip(probabilities)
        .map(|((c, d), win_probability)| {
            let distance = d * stretch;
            let row = RankedTeam {
                rank: 0,
                team: c.team,
                metrics: c.metrics,
                provenance: c.provenance,
                distance,
                score: 1.0 / distance,
                win_probability,
                tier: None,
            };
            (d, row)
        })
        .collect();

    // Closest first, exact matches ahead of everyone
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut ranked: Vec<RankedTeam> = rows.into_iter().map(|(_, row)| row).collect();
    for (i, row) in ranked.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
        row.tier = tiers.and_then(|t| t.tier_for(row.rank));
    }
    Ok(ranked)
}
