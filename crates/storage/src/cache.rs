use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::NaiveDate;
use log::{debug, warn};
use model::{
    ids::{TrainerId, WeekId},
    source::ScheduleSource,
    template::TrainingTemplate,
    training::RealTraining,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patch::{Change, Patch};

/// Signature of a fetch. Two fetches with equal keys share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKey {
    Templates,
    RealTrainings(RealTrainingsQuery),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RealTrainingsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trainer_id: Option<TrainerId>,
    pub with_students: bool,
}

impl RealTrainingsQuery {
    pub fn week(week: WeekId) -> Self {
        RealTrainingsQuery {
            start_date: week.id(),
            end_date: week.last_day(),
            trainer_id: None,
            with_students: true,
        }
    }

    pub fn with_trainer(mut self, trainer_id: Option<TrainerId>) -> Self {
        self.trainer_id = trainer_id;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryData {
    Templates(Vec<TrainingTemplate>),
    RealTrainings(Vec<RealTraining>),
}

impl QueryData {
    pub fn sources(&self) -> Vec<ScheduleSource> {
        match self {
            QueryData::Templates(templates) => templates
                .iter()
                .cloned()
                .map(ScheduleSource::Template)
                .collect(),
            QueryData::RealTrainings(trainings) => trainings
                .iter()
                .cloned()
                .map(ScheduleSource::RealTraining)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryData::Templates(templates) => templates.len(),
            QueryData::RealTrainings(trainings) => trainings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn templates(&self) -> Option<&[TrainingTemplate]> {
        match self {
            QueryData::Templates(templates) => Some(templates),
            QueryData::RealTrainings(_) => None,
        }
    }

    pub fn real_trainings(&self) -> Option<&[RealTraining]> {
        match self {
            QueryData::Templates(_) => None,
            QueryData::RealTrainings(trainings) => Some(trainings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: QueryData,
    pub version: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Change does not fit the cached collection of {0:?}")]
    KindMismatch(QueryKey),
}

struct Entry {
    data: QueryData,
    version: u64,
}

/// Client side cache of fetched collections. The only shared mutable state
/// of the calendar; writes happen through `set` (fetch results) and `patch`.
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    version: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Arc<QueryCache> {
        Arc::new(QueryCache::default())
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self, key: &QueryKey) -> Option<QueryData> {
        self.entries.read().get(key).map(|entry| entry.data.clone())
    }

    pub fn snapshot(&self, key: &QueryKey) -> Option<Snapshot> {
        self.entries.read().get(key).map(|entry| Snapshot {
            data: entry.data.clone(),
            version: entry.version,
        })
    }

    pub fn version(&self, key: &QueryKey) -> Option<u64> {
        self.entries.read().get(key).map(|entry| entry.version)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries.read().keys().cloned().collect()
    }

    /// Stores a fetch result, replacing whatever was cached under `key`.
    pub fn set(&self, key: QueryKey, data: QueryData) {
        let version = self.next_version();
        debug!("cache set {:?} ({} items) v{}", key, data.len(), version);
        self.entries.write().insert(key, Entry { data, version });
    }

    pub fn remove(&self, key: &QueryKey) -> Option<QueryData> {
        self.entries.write().remove(key).map(|entry| entry.data)
    }

    /// Applies `change` to the collection cached under `key` and returns the
    /// patch that reverts it. A key that is not cached yields an empty patch.
    pub fn patch(self: &Arc<Self>, key: &QueryKey, change: Change) -> Result<Patch, CacheError> {
        let mut entries = self.entries.write();
        let inverse = match entries.get_mut(key) {
            Some(entry) => {
                let inverse = change
                    .apply(&mut entry.data)
                    .map_err(|_| CacheError::KindMismatch(key.clone()))?;
                if inverse.is_some() {
                    entry.version = self.next_version();
                }
                inverse
            }
            None => {
                debug!("cache patch skipped, {:?} not cached", key);
                None
            }
        };
        Ok(Patch::new(key.clone(), inverse, Arc::downgrade(self)))
    }

    pub(crate) fn revert(&self, key: &QueryKey, inverse: Change) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(key) {
            match inverse.apply(&mut entry.data) {
                Ok(Some(_)) => entry.version = self.next_version(),
                Ok(None) => debug!("revert of {:?} found nothing to restore", key),
                Err(_) => warn!("revert of {:?} does not fit the cached collection", key),
            }
        }
    }
}
