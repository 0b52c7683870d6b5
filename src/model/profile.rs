//! Recency-weighted champion profile.
//!
//! Each historical champion contributes its metrics with weight
//! `1 / (Y_max - Y + 1)^p`, where `Y` is the season start year and `Y_max`
//! the most recent title. `p = 0` is a plain average; large `p` converges on
//! the latest champion.

use serde::Serialize;

use crate::data::models::{Metric, MetricValues};
use crate::data::Dataset;
use crate::error::DataError;

/// One champion's contribution to the profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChampionWeight {
    pub team: String,
    pub season: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChampionProfile {
    pub values: MetricValues,
    pub decay_exponent: f64,
    /// Contributing champions, most recent first.
    pub champions: Vec<ChampionWeight>,
}

impl ChampionProfile {
    pub fn build(dataset: &Dataset, decay_exponent: f64) -> Result<Self, DataError> {
        let champions: Vec<_> = dataset.champions().collect();
        let latest = champions
            .iter()
            .map(|c| c.season.start_year)
            .max()
            .ok_or(DataError::NoChampions)?;

        let weights: Vec<f64> = champions
            .iter()
            .map(|c| recency_weight(latest, c.season.start_year, decay_exponent))
            .collect();
        let total: f64 = weights.iter().sum();

        let values = MetricValues::from_fn(|m: Metric| {
            champions
                .iter()
                .zip(&weights)
                .map(|(c, w)| c.metrics.get(m) * w)
                .sum::<f64>()
                / total
        });

        let mut contributions: Vec<ChampionWeight> = champions
            .iter()
            .zip(&weights)
            .map(|(c, w)| ChampionWeight {
                team: c.team.clone(),
                season: c.season.label.clone(),
                weight: *w,
            })
            .collect();
        contributions.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        Ok(ChampionProfile {
            values,
            decay_exponent,
            champions: contributions,
        })
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values.get(metric)
    }
}

/// `1 / (latest - year + 1)^p`. Always in (0, 1] since `year <= latest`.
fn recency_weight(latest: i32, year: i32, p: f64) -> f64 {
    let age = (latest - year + 1) as f64;
    1.0 / age.powf(p)
}
