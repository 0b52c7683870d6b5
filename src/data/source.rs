use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use super::models::SeasonRecord;

/// Identity of a source's current content. Two equal fingerprints mean the
/// cached table is still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFingerprint {
    /// Fingerprint a file on disk from its size and modification time.
    pub fn of_file(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(SourceFingerprint {
            len: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Trait that every historical dataset source must implement.
pub trait DatasetSource {
    /// Read every season record. Rows are validated individually; table-wide
    /// invariants are checked by `Dataset::new`.
    fn load(&self) -> Result<Vec<SeasonRecord>>;

    /// Current content fingerprint, used for cache invalidation.
    fn fingerprint(&self) -> Result<SourceFingerprint>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
