use std::{collections::HashMap, sync::Arc};

use log::{error, info};
use model::{
    ids::{TrainerId, WeekId},
    rights::Actor,
    training_type::TrainingType,
    user::Trainer,
    week::WeekBuckets,
};
use parking_lot::Mutex;
use storage::{
    backend::ApiError,
    cache::{QueryData, QueryKey, RealTrainingsQuery},
    Storage,
};

const LOAD_FAILED: &str = "Не удалось загрузить расписание";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Templates,
    RealTrainings,
}

#[derive(Debug, Clone)]
pub enum WeekState {
    Ready(Arc<WeekBuckets>),
    Failed { week: WeekId, message: String },
}

impl WeekState {
    pub fn buckets(&self) -> Option<&WeekBuckets> {
        match self {
            WeekState::Ready(buckets) => Some(buckets),
            WeekState::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub trainers: Vec<Trainer>,
    pub training_types: Vec<TrainingType>,
}

impl Lookups {
    pub fn trainer(&self, id: TrainerId) -> Option<&Trainer> {
        self.trainers.iter().find(|t| t.id == id)
    }

    pub fn training_type(&self, id: model::ids::TrainingTypeId) -> Option<&TrainingType> {
        self.training_types.iter().find(|t| t.id == id)
    }
}

type GridKey = (QueryKey, WeekId);

/// Read side of the calendar: fetches collections into the cache and derives
/// the week buckets from it.
#[derive(Clone)]
pub struct Calendar {
    storage: Storage,
    grids: Arc<Mutex<HashMap<GridKey, (u64, Arc<WeekBuckets>)>>>,
}

impl Calendar {
    pub(crate) fn new(storage: Storage) -> Self {
        Calendar {
            storage,
            grids: Default::default(),
        }
    }

    /// Cache key for what `actor` sees in `week`. Trainers only get their own
    /// real trainings.
    pub fn query_key(actor: &Actor, week: WeekId, mode: ViewMode) -> QueryKey {
        match mode {
            ViewMode::Templates => QueryKey::Templates,
            ViewMode::RealTrainings => {
                let trainer = actor
                    .is_trainer()
                    .then(|| TrainerId(actor.user_id.0));
                QueryKey::RealTrainings(RealTrainingsQuery::week(week).with_trainer(trainer))
            }
        }
    }

    pub async fn load_week(&self, actor: &Actor, week: WeekId, mode: ViewMode) -> WeekState {
        let key = Self::query_key(actor, week, mode);
        if !self.storage.cache.contains(&key) {
            if let Err(err) = self.refetch(&key).await {
                error!("Failed to load {:?} for week {}: {:#}", key, week, err);
                return WeekState::Failed {
                    week,
                    message: load_failed_message(&err),
                };
            }
        }

        match self.buckets(&key, week) {
            Some(buckets) => WeekState::Ready(buckets),
            None => WeekState::Failed {
                week,
                message: LOAD_FAILED.to_owned(),
            },
        }
    }

    /// Replaces the cached collection of `key` with a fresh fetch.
    pub async fn refetch(&self, key: &QueryKey) -> Result<(), ApiError> {
        let data = match key {
            QueryKey::Templates => {
                QueryData::Templates(self.storage.backend.list_training_templates().await?)
            }
            QueryKey::RealTrainings(query) => {
                QueryData::RealTrainings(self.storage.backend.list_real_trainings(query).await?)
            }
        };
        info!("Fetched {:?}: {} item(s)", key, data.len());
        self.storage.cache.set(key.clone(), data);
        Ok(())
    }

    /// Buckets of `week` derived from the cached collection of `key`. Rebuilt
    /// only when the cache entry changed since the last call.
    pub fn buckets(&self, key: &QueryKey, week: WeekId) -> Option<Arc<WeekBuckets>> {
        let snapshot = self.storage.cache.snapshot(key)?;
        let grid_key = (key.clone(), week);

        let mut grids = self.grids.lock();
        if let Some((version, buckets)) = grids.get(&grid_key) {
            if *version == snapshot.version {
                return Some(buckets.clone());
            }
        }

        // Grids of replaced or dropped cache entries are never served again.
        let cache = &self.storage.cache;
        grids.retain(|(key, _), (version, _)| cache.version(key) == Some(*version));

        let buckets = Arc::new(WeekBuckets::build(&snapshot.data.sources(), week));
        grids.insert(grid_key, (snapshot.version, buckets.clone()));
        Some(buckets)
    }

    pub async fn lookups(&self) -> Result<Lookups, ApiError> {
        let (trainers, training_types) = futures::try_join!(
            self.storage.backend.list_trainers(),
            self.storage.backend.list_training_types()
        )?;
        Ok(Lookups {
            trainers,
            training_types,
        })
    }
}

fn load_failed_message(err: &ApiError) -> String {
    match err.detail() {
        Some(detail) if !detail.trim().is_empty() => format!("{}: {}", LOAD_FAILED, detail),
        _ => LOAD_FAILED.to_owned(),
    }
}
