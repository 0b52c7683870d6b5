pub mod params;
pub mod profile;
pub mod resolver;
pub mod scale;
pub mod scoring;

pub use params::{MetricWeights, ScoringParams, Tier, TierThresholds, ZeroDistancePolicy};
pub use profile::ChampionProfile;
pub use resolver::Provenance;
pub use scale::MetricScale;
pub use scoring::RankedTeam;

use serde::Serialize;
use tracing::info;

use crate::data::Dataset;
use crate::error::{DataError, PredictError};

/// What to predict.
#[derive(Debug, Clone, Default)]
pub struct PredictionRequest {
    /// Season whose records are the candidates' primary source. Defaults to
    /// the latest season in the dataset.
    pub season: Option<String>,
    /// Full-projection mode: score exactly these teams, with fallback.
    pub roster: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    SingleSeason,
    FullProjection,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub season: String,
    pub mode: Mode,
    pub params: ScoringParams,
    pub profile: ChampionProfile,
    pub scale: MetricScale,
    /// Best first
    pub ranking: Vec<RankedTeam>,
}

impl Prediction {
    /// The top-ranked team.
    pub fn champion(&self) -> Option<&RankedTeam> {
        self.ranking.first()
    }
}

/// Run the whole pipeline from scratch: profile, candidates, ranking.
pub fn predict(
    dataset: &Dataset,
    scale: &MetricScale,
    request: &PredictionRequest,
    params: &ScoringParams,
) -> Result<Prediction, PredictError> {
    params.validate()?;

    let target = match &request.season {
        Some(label) => dataset.season(label).ok_or_else(|| DataError::UnknownSeason {
            season: label.clone(),
        })?,
        None => dataset.latest_season().ok_or(DataError::EmptyDataset)?,
    };

    let profile = ChampionProfile::build(dataset, params.decay_exponent)?;

    let (mode, candidates) = match &request.roster {
        Some(roster) => (
            Mode::FullProjection,
            resolver::roster_candidates(dataset, target, roster, params.baseline_pool)?,
        ),
        None => (Mode::SingleSeason, resolver::season_candidates(dataset, target)),
    };

    let tiers = match mode {
        Mode::FullProjection => Some(&params.tiers),
        Mode::SingleSeason => None,
    };
    let ranking = scoring::rank(
        candidates,
        &profile,
        scale,
        &params.weights,
        params.zero_distance,
        tiers,
    )?;

    if let Some(top) = ranking.first() {
        info!(
            "{}: predicted champion {} ({:.2}%) from {} candidates",
            target,
            top.team,
            top.win_probability,
            ranking.len()
        );
    }

    Ok(Prediction {
        season: target.label.clone(),
        mode,
        params: params.clone(),
        profile,
        scale: scale.clone(),
        ranking,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::make_record;
    use crate::error::ScoreError;
    use approx::assert_relative_eq;

    fn serie_a() -> Dataset {
        Dataset::new(vec![
            make_record("Juventus", "2019-20", 1, [68.4, 1.18, 1.13, 83.0], true),
            make_record("Inter", "2019-20", 2, [63.2, 1.18, 0.95, 82.0], false),
            make_record("Lecce", "2019-20", 18, [23.7, -0.66, 2.24, 35.0], false),
            make_record("Inter", "2020-21", 1, [73.7, 1.26, 0.92, 91.0], true),
            make_record("Milan", "2020-21", 2, [63.2, 0.87, 1.08, 79.0], false),
            make_record("Crotone", "2020-21", 19, [15.8, -1.45, 2.42, 23.0], false),
            make_record("Milan", "2021-22", 1, [68.4, 0.95, 0.82, 86.0], true),
            make_record("Inter", "2021-22", 2, [65.8, 1.26, 0.84, 84.0], false),
            make_record("Venezia", "2021-22", 20, [15.8, -1.32, 2.26, 27.0], false),
            make_record("Napoli", "2022-23", 1, [73.7, 1.26, 0.74, 90.0], true),
            make_record("Lazio", "2022-23", 2, [57.9, 0.66, 0.79, 74.0], false),
            make_record("Sampdoria", "2022-23", 20, [7.9, -1.47, 2.08, 19.0], false),
            make_record("Inter", "2023-24", 1, [76.3, 1.68, 0.58, 94.0], true),
            make_record("Milan", "2023-24", 2, [57.9, 0.53, 1.29, 75.0], false),
            make_record("Salernitana", "2023-24", 20, [5.3, -1.63, 2.13, 17.0], false),
        ])
        .unwrap()
    }

    fn run(request: PredictionRequest, params: ScoringParams) -> Result<Prediction, PredictError> {
        let ds = serie_a();
        let scale = MetricScale::from_dataset(&ds).unwrap();
        predict(&ds, &scale, &request, &params)
    }

    #[test]
    fn defaults_to_latest_season_single_mode() {
        let pred = run(PredictionRequest::default(), ScoringParams::default()).unwrap();
        assert_eq!(pred.season, "2023-24");
        assert_eq!(pred.mode, Mode::SingleSeason);
        assert_eq!(pred.ranking.len(), 3);
        assert_eq!(pred.champion().unwrap().team, "Inter");
        assert!(pred.ranking.iter().all(|r| r.tier.is_none()));
        let total: f64 = pred.ranking.iter().map(|r| r.win_probability).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn roster_projection_mixes_provenance_and_labels_tiers() {
        let request = PredictionRequest {
            season: Some("2023-24".into()),
            roster: Some(vec!["Inter".into(), "Napoli".into(), "Pisa".into(), "Milan".into()]),
        };
        let pred = run(request, ScoringParams::default()).unwrap();
        assert_eq!(pred.mode, Mode::FullProjection);
        assert_eq!(pred.ranking.len(), 4);

        let find = |team: &str| pred.ranking.iter().find(|r| r.team == team).unwrap();
        assert_eq!(find("Inter").provenance, Provenance::ExactMatch);
        assert_eq!(
            find("Napoli").provenance,
            Provenance::HistoricalFallback { season: "2022-23".into() }
        );
        assert_eq!(find("Pisa").provenance, Provenance::BaselineFallback);
        assert_eq!(pred.ranking[0].tier, Some(Tier::ChampionsLeague));
        assert_eq!(pred.ranking.last().unwrap().team, "Pisa");
    }

    #[test]
    fn unknown_season_is_rejected() {
        let request = PredictionRequest {
            season: Some("2030-31".into()),
            roster: None,
        };
        let err = run(request, ScoringParams::default()).unwrap_err();
        assert_eq!(
            err,
            PredictError::Data(DataError::UnknownSeason { season: "2030-31".into() })
        );
    }

    #[test]
    fn empty_dataset_is_reported_as_such() {
        let ds = Dataset::new(vec![]).unwrap();
        let scale = MetricScale {
            values: crate::data::models::MetricValues {
                win_pct: 1.0,
                gd_per_game: 1.0,
                ga_per_game: 1.0,
                points: 1.0,
            },
        };
        let err = predict(&ds, &scale, &PredictionRequest::default(), &ScoringParams::default())
            .unwrap_err();
        assert_eq!(err, PredictError::Data(DataError::EmptyDataset));
    }

    #[test]
    fn invalid_params_abort_before_scoring() {
        let params = ScoringParams {
            decay_exponent: f64::NAN,
            ..ScoringParams::default()
        };
        let err = run(PredictionRequest::default(), params).unwrap_err();
        assert!(matches!(
            err,
            PredictError::Score(ScoreError::InvalidParameter { name: "decay_exponent", .. })
        ));
    }

    #[test]
    fn rerun_with_changed_params_is_deterministic() {
        let a = run(PredictionRequest::default(), ScoringParams::default()).unwrap();
        let steep = ScoringParams {
            decay_exponent: 3.0,
            ..ScoringParams::default()
        };
        let b = run(PredictionRequest::default(), steep).unwrap();
        let c = run(PredictionRequest::default(), ScoringParams::default()).unwrap();
        assert_eq!(a.ranking, c.ranking);
        assert_ne!(a.profile.values, b.profile.values);
    }
}
