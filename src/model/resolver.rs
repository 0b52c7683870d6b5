//! Candidate resolution.
//!
//! Every team to be scored gets exactly one set of metrics, chosen by the
//! first rule that applies:
//!
//! 1. its record in the target season,
//! 2. its most recent record from an earlier season,
//! 3. the newcomer baseline: the mean of the bottom-N rows by table position
//!    across all of history.
//!
//! The rule used is kept as `Provenance` so substituted rows never look like
//! observed ones.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::data::models::{MetricValues, SeasonLabel};
use crate::data::Dataset;
use crate::error::DataError;

/// Where a candidate's metrics came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Observed in the target season.
    ExactMatch,
    /// Last known form from an earlier season.
    HistoricalFallback { season: String },
    /// No usable history; bottom-of-table baseline.
    BaselineFallback,
}

impl Provenance {
    /// Short tag for table output.
    pub fn tag(&self) -> String {
        match self {
            Provenance::ExactMatch => "observed".to_string(),
            Provenance::HistoricalFallback { season } => format!("last {}", season),
            Provenance::BaselineFallback => "baseline".to_string(),
        }
    }
}

/// A team entered into a prediction run.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTeam {
    pub team: String,
    pub metrics: MetricValues,
    pub provenance: Provenance,
}

/// Candidates for single-season mode: every team with a record in `target`,
/// in dataset order. All are exact matches.
pub fn season_candidates(dataset: &Dataset, target: &SeasonLabel) -> Vec<CandidateTeam> {
    dataset
        .season_records(&target.label)
        .map(|r| CandidateTeam {
            team: r.team.clone(),
            metrics: r.metrics,
            provenance: Provenance::ExactMatch,
        })
        .collect()
}

/// Candidates for full-projection mode: one per roster entry, in roster order.
pub fn roster_candidates(
    dataset: &Dataset,
    target: &SeasonLabel,
    roster: &[String],
    baseline_pool: usize,
) -> Result<Vec<CandidateTeam>, DataError> {
    let mut seen = HashSet::new();
    let mut baseline: Option<MetricValues> = None;
    let mut candidates = Vec::with_capacity(roster.len());

    for entry in roster {
        let team = entry.trim();
        if !seen.insert(team) {
            return Err(DataError::DuplicateRosterTeam {
                team: team.to_string(),
            });
        }

        let (metrics, provenance) = if let Some(rec) = dataset.record_for(team, &target.label) {
            (rec.metrics, Provenance::ExactMatch)
        } else if let Some(rec) = dataset.latest_record_before(team, target.start_year) {
            info!("{}: not in {}, using {} form", team, target, rec.season);
            (
                rec.metrics,
                Provenance::HistoricalFallback {
                    season: rec.season.label.clone(),
                },
            )
        } else {
            let metrics = match baseline {
                Some(m) => m,
                None => {
                    let m = baseline_metrics(dataset, baseline_pool).ok_or_else(|| {
                        DataError::EmptyFallbackPool {
                            team: team.to_string(),
                        }
                    })?;
                    baseline = Some(m);
                    m
                }
            };
            warn!("{}: no usable history, using newcomer baseline", team);
            (metrics, Provenance::BaselineFallback)
        };

        candidates.push(CandidateTeam {
            team: team.to_string(),
            metrics,
            provenance,
        });
    }
    Ok(candidates)
}

/// Mean metrics of the `pool` lowest-finishing rows across all seasons.
/// Rows with equal position keep dataset order. `None` when there is nothing
/// to average.
pub fn baseline_metrics(dataset: &Dataset, pool: usize) -> Option<MetricValues> {
    let mut rows: Vec<_> = dataset.records().iter().collect();
    rows.sort_by(|a, b| b.position.cmp(&a.position));
    MetricValues::mean(rows.into_iter().take(pool).map(|r| &r.metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::make_record;
    use approx::assert_relative_eq;

    fn league() -> Dataset {
        Dataset::new(vec![
            make_record("Inter", "2021-22", 2, [63.0, 1.3, 0.8, 84.0], false),
            make_record("Milan", "2021-22", 1, [68.0, 1.1, 0.8, 86.0], true),
            make_record("Venezia", "2021-22", 20, [15.0, -1.4, 2.0, 27.0], false),
            make_record("Genoa", "2021-22", 19, [10.0, -1.2, 1.8, 28.0], false),
            make_record("Napoli", "2022-23", 1, [73.7, 1.2, 0.7, 90.0], true),
            make_record("Inter", "2022-23", 3, [60.5, 1.0, 1.0, 72.0], false),
            make_record("Sampdoria", "2022-23", 20, [7.9, -1.4, 2.1, 19.0], false),
            make_record("Cremonese", "2022-23", 19, [5.3, -0.9, 1.8, 27.0], false),
            make_record("Spezia", "2022-23", 18, [15.8, -0.9, 1.7, 31.0], false),
        ])
        .unwrap()
    }

    fn roster(teams: &[&str]) -> Vec<String> {
        teams.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn single_season_mode_lists_target_teams_in_order() {
        let ds = league();
        let target = ds.season("2021-22").unwrap();
        let teams: Vec<String> = season_candidates(&ds, target).into_iter().map(|c| c.team).collect();
        assert_eq!(teams, ["Inter", "Milan", "Venezia", "Genoa"]);
    }

    #[test]
    fn each_roster_team_resolves_to_exactly_one_tier() {
        let ds = league();
        let target = ds.season("2022-23").unwrap();
        let cands = roster_candidates(&ds, target, &roster(&["Napoli", "Milan", "Pisa"]), 60).unwrap();

        assert_eq!(cands[0].provenance, Provenance::ExactMatch);
        assert_relative_eq!(cands[0].metrics.points, 90.0);

        assert_eq!(
            cands[1].provenance,
            Provenance::HistoricalFallback {
                season: "2021-22".into()
            }
        );
        assert_relative_eq!(cands[1].metrics.points, 86.0);

        assert_eq!(cands[2].provenance, Provenance::BaselineFallback);
    }

    #[test]
    fn historical_fallback_ignores_later_seasons() {
        let ds = league();
        let target = ds.season("2021-22").unwrap();
        // Napoli only appears in 2022-23, after the target
        let cands = roster_candidates(&ds, target, &roster(&["Napoli"]), 60).unwrap();
        assert_eq!(cands[0].provenance, Provenance::BaselineFallback);
    }

    #[test]
    fn baseline_is_mean_of_bottom_rows_by_position() {
        let ds = league();
        // Bottom 3 by position: the two 20ths then the first 19th in dataset order
        // (Venezia 20, Sampdoria 20, Genoa 19)
        let m = baseline_metrics(&ds, 3).unwrap();
        assert_relative_eq!(m.win_pct, (15.0 + 7.9 + 10.0) / 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.gd_per_game, (-1.4 - 1.4 - 1.2) / 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.ga_per_game, (2.0 + 2.1 + 1.8) / 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.points, (27.0 + 19.0 + 28.0) / 3.0, epsilon = 1e-9);

        let target = ds.season("2022-23").unwrap();
        let cands = roster_candidates(&ds, target, &roster(&["Pisa", "Sassuolo"]), 3).unwrap();
        assert_eq!(cands[0].metrics, m);
        assert_eq!(cands[1].metrics, m);
    }

    #[test]
    fn baseline_pool_larger_than_dataset_uses_every_row() {
        let ds = league();
        let all = MetricValues::mean(ds.records().iter().map(|r| &r.metrics)).unwrap();
        let pooled = baseline_metrics(&ds, 60).unwrap();
        assert_relative_eq!(pooled.win_pct, all.win_pct, epsilon = 1e-9);
        assert_relative_eq!(pooled.points, all.points, epsilon = 1e-9);
    }

    #[test]
    fn empty_baseline_pool_is_an_error_only_when_needed() {
        let ds = league();
        let target = ds.season("2022-23").unwrap();
        assert!(roster_candidates(&ds, target, &roster(&["Napoli"]), 0).is_ok());
        assert_eq!(
            roster_candidates(&ds, target, &roster(&["Napoli", "Pisa"]), 0),
            Err(DataError::EmptyFallbackPool { team: "Pisa".into() })
        );
    }

    #[test]
    fn duplicate_roster_entry_is_rejected() {
        let ds = league();
        let target = ds.season("2022-23").unwrap();
        assert_eq!(
            roster_candidates(&ds, target, &roster(&["Inter", " Inter"]), 60),
            Err(DataError::DuplicateRosterTeam { team: "Inter".into() })
        );
    }
}
