use std::collections::{HashMap, HashSet};

use crate::error::DataError;

use super::models::{SeasonLabel, SeasonRecord};

/// Validated, immutable table of historical season records.
///
/// Guarantees after construction:
/// - every (team, season) pair appears once
/// - no season has more than one champion
///
/// Seasons with no champion are allowed (e.g. a season still in progress).
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<SeasonRecord>,
    /// Distinct seasons ordered by start year, then first appearance.
    seasons: Vec<SeasonLabel>,
}

impl Dataset {
    pub fn new(records: Vec<SeasonRecord>) -> Result<Self, DataError> {
        let mut seasons: Vec<SeasonLabel> = Vec::new();
        {
            let mut seen: HashSet<(&str, &str)> = HashSet::new();
            let mut champions: HashMap<&str, &str> = HashMap::new();
            for rec in &records {
                let season = rec.season.label.as_str();
                if !seen.insert((rec.team.as_str(), season)) {
                    return Err(DataError::DuplicateRecord {
                        team: rec.team.clone(),
                        season: season.to_string(),
                    });
                }
                if rec.champion {
                    if let Some(first) = champions.insert(season, rec.team.as_str()) {
                        return Err(DataError::MultipleChampions {
                            season: season.to_string(),
                            first: first.to_string(),
                            second: rec.team.clone(),
                        });
                    }
                }
                if !seasons.iter().any(|s| s.label == season) {
                    seasons.push(rec.season.clone());
                }
            }
        }
        seasons.sort_by_key(|s| s.start_year);

        Ok(Dataset { records, seasons })
    }

    pub fn records(&self) -> &[SeasonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct season labels, oldest first.
    pub fn seasons(&self) -> &[SeasonLabel] {
        &self.seasons
    }

    pub fn season(&self, label: &str) -> Option<&SeasonLabel> {
        let label = label.trim();
        self.seasons.iter().find(|s| s.label == label)
    }

    /// Most recent season in the table.
    pub fn latest_season(&self) -> Option<&SeasonLabel> {
        self.seasons.last()
    }

    pub fn champions(&self) -> impl Iterator<Item = &SeasonRecord> {
        self.records.iter().filter(|r| r.champion)
    }

    pub fn champion_of(&self, season: &str) -> Option<&SeasonRecord> {
        self.champions().find(|r| r.season.label == season)
    }

    /// All records of one season, in dataset order.
    pub fn season_records<'a>(&'a self, season: &'a str) -> impl Iterator<Item = &'a SeasonRecord> {
        self.records.iter().filter(move |r| r.season.label == season)
    }

    pub fn record_for(&self, team: &str, season: &str) -> Option<&SeasonRecord> {
        self.records
            .iter()
            .find(|r| r.team == team && r.season.label == season)
    }

    /// The team's most recent record from a season starting before `before_year`.
    pub fn latest_record_before(&self, team: &str, before_year: i32) -> Option<&SeasonRecord> {
        self.records
            .iter()
            .filter(|r| r.team == team && r.season.start_year < before_year)
            .max_by_key(|r| r.season.start_year)
    }
}
