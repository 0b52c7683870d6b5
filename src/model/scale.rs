use serde::Serialize;

use crate::data::models::{Metric, MetricValues};
use crate::data::Dataset;
use crate::error::DataError;

/// Deviations at or below this are treated as zero.
const STDEV_EPSILON: f64 = 1e-12;

/// Population standard deviation of each metric over every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricScale {
    pub values: MetricValues,
}

impl MetricScale {
    /// Fails on a metric that does not vary (including a one-row table),
    /// since it would divide the distance by zero.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, DataError> {
        let rows: Vec<&MetricValues> = dataset.records().iter().map(|r| &r.metrics).collect();
        let mean = MetricValues::mean(rows.iter().copied()).ok_or(DataError::DegenerateScale {
            metric: Metric::WinPct,
        })?;
        let n = rows.len() as f64;

        for metric in Metric::ALL {
            let stdev = population_stdev(&rows, metric, mean.get(metric), n);
            if stdev <= STDEV_EPSILON {
                return Err(DataError::DegenerateScale { metric });
            }
        }
        Ok(MetricScale {
            values: MetricValues::from_fn(|m| population_stdev(&rows, m, mean.get(m), n)),
        })
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values.get(metric)
    }
}

fn population_stdev(rows: &[&MetricValues], metric: Metric, mean: f64, n: f64) -> f64 {
    let variance = rows
        .iter()
        .map(|r| (r.get(metric) - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}
