//! Historical dataset loading and caching.
//!
//! A `DatasetRepository` owns one `DatasetSource` and keeps the validated
//! table (plus its metric scale) in memory. The cache is reused until the
//! source reports a different fingerprint, so parameter changes never cause a
//! reload and a changed file always does.

pub mod csv_source;
pub mod dataset;
pub mod models;
pub mod source;
pub mod sqlite;

pub use csv_source::CsvSource;
pub use dataset::Dataset;
pub use source::{DatasetSource, SourceFingerprint};
pub use sqlite::SqliteSource;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::DataError;
use crate::model::MetricScale;

/// A loaded dataset together with the scale derived from it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dataset: Arc<Dataset>,
    /// Computed once per load. Kept as a result so commands that never score
    /// (e.g. listing seasons) still work on a constant-metric table.
    pub scale: Result<Arc<MetricScale>, DataError>,
}

impl Snapshot {
    pub fn scale(&self) -> Result<Arc<MetricScale>, DataError> {
        self.scale.clone()
    }
}

struct CacheEntry {
    fingerprint: SourceFingerprint,
    snapshot: Snapshot,
}

/// Load-once, reuse-until-changed access to a dataset source.
pub struct DatasetRepository {
    source: Box<dyn DatasetSource>,
    cached: Option<CacheEntry>,
    loads: u64,
}

impl DatasetRepository {
    pub fn new(source: Box<dyn DatasetSource>) -> Self {
        DatasetRepository {
            source,
            cached: None,
            loads: 0,
        }
    }

    /// Return the cached snapshot, reloading first if the source changed.
    pub fn snapshot(&mut self) -> Result<Snapshot> {
        let fingerprint = self.source.fingerprint()?;
        if let Some(entry) = &self.cached {
            if entry.fingerprint == fingerprint {
                debug!("{}: cache hit", self.source.name());
                return Ok(entry.snapshot.clone());
            }
            info!("{}: source changed, reloading", self.source.name());
        }

        let records = self
            .source
            .load()
            .with_context(|| format!("Failed to load dataset from {}", self.source.name()))?;
        let dataset = Arc::new(Dataset::new(records)?);
        let scale = MetricScale::from_dataset(&dataset).map(Arc::new);
        self.loads += 1;

        info!(
            "Loaded {} records across {} seasons from {}",
            dataset.len(),
            dataset.seasons().len(),
            self.source.name()
        );

        let snapshot = Snapshot { dataset, scale };
        self.cached = Some(CacheEntry {
            fingerprint,
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Number of times the source has actually been read.
    pub fn load_count(&self) -> u64 {
        self.loads
    }
}

/// Pick a source implementation from the file extension.
pub fn open_source(path: &Path) -> Result<Box<dyn DatasetSource>> {
    if csv_source::is_csv(path) {
        Ok(Box::new(CsvSource::new(path)))
    } else if sqlite::is_sqlite(path) {
        Ok(Box::new(SqliteSource::new(path)))
    } else {
        anyhow::bail!(
            "Unsupported dataset format: {} (expected .csv, .db, .sqlite or .sqlite3)",
            path.display()
        )
    }
}
