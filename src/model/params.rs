use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::models::Metric;
use crate::error::ScoreError;

/// Recommended range for the recency decay exponent.
pub const DECAY_RECOMMENDED: (f64, f64) = (0.5, 3.0);
/// Recommended range for each metric weight.
pub const WEIGHT_RECOMMENDED: (f64, f64) = (0.0, 3.0);
/// Rows averaged for the newcomer baseline.
pub const DEFAULT_BASELINE_POOL: usize = 60;

/// Multiplier applied to each metric's squared normalized gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub win_pct: f64,
    pub gd_per_game: f64,
    pub ga_per_game: f64,
    pub points: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        MetricWeights {
            win_pct: 1.0,
            gd_per_game: 1.0,
            ga_per_game: 1.0,
            points: 1.0,
        }
    }
}

impl MetricWeights {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::WinPct => self.win_pct,
            Metric::GoalDiffPerGame => self.gd_per_game,
            Metric::GoalsAgainstPerGame => self.ga_per_game,
            Metric::Points => self.points,
        }
    }

    /// Largest single weight; zero means no metric counts.
    pub fn max(&self) -> f64 {
        Metric::ALL.iter().map(|m| self.get(*m)).fold(0.0, f64::max)
    }

    /// Every weight multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> MetricWeights {
        MetricWeights {
            win_pct: self.win_pct * factor,
            gd_per_game: self.gd_per_game * factor,
            ga_per_game: self.ga_per_game * factor,
            points: self.points * factor,
        }
    }
}

/// What to do when a candidate sits exactly on the champion profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDistancePolicy {
    /// Abort the run with a degenerate-score error.
    #[default]
    Fail,
    /// Exact matches split 100% between them; everyone else gets 0%.
    Certain,
}

/// Competition tier derived from final rank in a projected table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ChampionsLeague,
    EuropaLeague,
    ConferenceLeague,
    Relegation,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::ChampionsLeague => "UCL tier",
            Tier::EuropaLeague => "Europa tier",
            Tier::ConferenceLeague => "Conference tier",
            Tier::Relegation => "Relegation tier",
        }
    }
}

/// Rank cut-offs for tier labels. Defaults fit a 20-team league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Ranks 1..=ucl_spots
    pub ucl_spots: u32,
    /// The next `europa_spots` ranks
    pub europa_spots: u32,
    /// The next `conference_spots` ranks
    pub conference_spots: u32,
    /// This rank and below are relegation tier
    pub relegation_from: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        TierThresholds {
            ucl_spots: 4,
            europa_spots: 1,
            conference_spots: 1,
            relegation_from: 18,
        }
    }
}

impl TierThresholds {
    /// Tier for a 1-based rank. European places take precedence when the
    /// ranges overlap (tiny leagues).
    pub fn tier_for(&self, rank: u32) -> Option<Tier> {
        let ucl = self.ucl_spots;
        let europa = ucl + self.europa_spots;
        let conference = europa + self.conference_spots;
        if rank == 0 {
            None
        } else if rank <= ucl {
            Some(Tier::ChampionsLeague)
        } else if rank <= europa {
            Some(Tier::EuropaLeague)
        } else if rank <= conference {
            Some(Tier::ConferenceLeague)
        } else if rank >= self.relegation_from {
            Some(Tier::Relegation)
        } else {
            None
        }
    }
}

/// Every tunable knob of a prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Recency decay exponent `p` (0 = unweighted history)
    pub decay_exponent: f64,
    pub weights: MetricWeights,
    pub zero_distance: ZeroDistancePolicy,
    /// Bottom-N rows by table position averaged for unknown teams
    pub baseline_pool: usize,
    pub tiers: TierThresholds,
}

impl Default for ScoringParams {
    fn default() -> Self {
        ScoringParams {
            decay_exponent: 1.0,
            weights: MetricWeights::default(),
            zero_distance: ZeroDistancePolicy::default(),
            baseline_pool: DEFAULT_BASELINE_POOL,
            tiers: TierThresholds::default(),
        }
    }
}

impl ScoringParams {
    /// Reject values the formulas cannot use; warn on values outside the
    /// recommended ranges.
    pub fn validate(&self) -> Result<(), ScoreError> {
        check_non_negative("decay_exponent", self.decay_exponent)?;
        for metric in Metric::ALL {
            check_non_negative(weight_name(metric), self.weights.get(metric))?;
        }
        if self.weights.max() == 0.0 {
            return Err(ScoreError::AllWeightsZero);
        }

        let (lo, hi) = DECAY_RECOMMENDED;
        if !(lo..=hi).contains(&self.decay_exponent) {
            warn!(
                "decay exponent {} is outside the recommended range {}–{}",
                self.decay_exponent, lo, hi
            );
        }
        let (lo, hi) = WEIGHT_RECOMMENDED;
        for metric in Metric::ALL {
            let w = self.weights.get(metric);
            if !(lo..=hi).contains(&w) {
                warn!("weight for {} ({}) is outside the recommended range {}–{}", metric, w, lo, hi);
            }
        }
        Ok(())
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ScoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScoreError::InvalidParameter { name, value })
    }
}

fn weight_name(metric: Metric) -> &'static str {
    match metric {
        Metric::WinPct => "w_win",
        Metric::GoalDiffPerGame => "w_gd",
        Metric::GoalsAgainstPerGame => "w_ga",
        Metric::Points => "w_pts",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers_for_twenty_teams() {
        let t = TierThresholds::default();
        let labels: Vec<Option<Tier>> = (1..=20).map(|r| t.tier_for(r)).collect();
        assert_eq!(labels[0..4], [Some(Tier::ChampionsLeague); 4]);
        assert_eq!(labels[4], Some(Tier::EuropaLeague));
        assert_eq!(labels[5], Some(Tier::ConferenceLeague));
        assert!(labels[6..17].iter().all(|l| l.is_none()));
        assert_eq!(labels[17..20], [Some(Tier::Relegation); 3]);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(Tier::ChampionsLeague.label(), "UCL tier");
        assert_eq!(Tier::Relegation.label(), "Relegation tier");
    }

    #[test]
    fn european_places_win_over_relegation_in_small_leagues() {
        let t = TierThresholds {
            relegation_from: 3,
            ..TierThresholds::default()
        };
        assert_eq!(t.tier_for(3), Some(Tier::ChampionsLeague));
        assert_eq!(t.tier_for(7), Some(Tier::Relegation));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite() {
        let mut p = ScoringParams::default();
        assert!(p.validate().is_ok());

        p.decay_exponent = -0.5;
        assert_eq!(
            p.validate(),
            Err(ScoreError::InvalidParameter { name: "decay_exponent", value: -0.5 })
        );

        p.decay_exponent = 1.0;
        p.weights.points = f64::INFINITY;
        assert!(matches!(
            p.validate(),
            Err(ScoreError::InvalidParameter { name: "w_pts", .. })
        ));
    }

    #[test]
    fn validate_rejects_all_zero_weights() {
        let p = ScoringParams {
            weights: MetricWeights {
                win_pct: 0.0,
                gd_per_game: 0.0,
                ga_per_game: 0.0,
                points: 0.0,
            },
            ..ScoringParams::default()
        };
        assert_eq!(p.validate(), Err(ScoreError::AllWeightsZero));
    }
}
