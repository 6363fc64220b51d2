use chrono::{NaiveDate, Utc};
use log::{debug, info};
use model::{
    errors::ValidationError,
    ids::TrainingId,
    rights::Rule,
    training::{NewRealTraining, RealTraining, RealTrainingPatch},
};
use mutation_macro::mutation;
use storage::{
    cache::{QueryKey, RealTrainingsQuery},
    patch::Change,
    session::Session,
    Storage,
};

use super::{cached_training, validate_time};
use crate::error::MutationError;

#[derive(Clone)]
pub struct Trainings {
    storage: Storage,
}

impl Trainings {
    pub(crate) fn new(storage: Storage) -> Self {
        Trainings { storage }
    }

    /// Creates a dated training. Nothing is shown until the server answers;
    /// the created record then lands in every cached week that covers it.
    #[mutation]
    pub async fn create(
        &self,
        session: &mut Session,
        training: &NewRealTraining,
    ) -> Result<RealTraining, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        validate_new(training)?;
        session.pending();

        let created = self.storage.backend.create_real_training(training).await?;
        info!(
            "Created training {} on {} {}",
            created.id, created.training_date, created.start_time
        );
        self.insert_created(&created)?;
        Ok(created)
    }

    fn insert_created(&self, created: &RealTraining) -> Result<(), MutationError> {
        for key in self.storage.cache.keys() {
            let QueryKey::RealTrainings(query) = &key else {
                continue;
            };
            if !covers(query, created) {
                continue;
            }
            let mut patch = self.storage.cache.patch(
                &key,
                Change::InsertRealTraining {
                    training: Box::new(created.clone()),
                    index: None,
                },
            )?;
            patch.discard();
            debug!("Inserted training {} into {:?}", created.id, key);
        }
        Ok(())
    }

    #[mutation]
    pub async fn edit(
        &self,
        session: &mut Session,
        key: &QueryKey,
        id: TrainingId,
        patch: RealTrainingPatch,
    ) -> Result<RealTraining, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }
        if let Some(start_time) = &patch.start_time {
            validate_time(start_time)?;
        }

        self.patch_cached(session, key, id, &patch)?;
        session.pending();

        info!("Update training {}: {:?}", id, patch);
        Ok(self.storage.backend.update_real_training(id, &patch).await?)
    }

    /// Moves a training to another date and time. Trainer, type and roster
    /// stay as they are.
    #[mutation]
    pub async fn move_training(
        &self,
        session: &mut Session,
        key: &QueryKey,
        id: TrainingId,
        training_date: NaiveDate,
        start_time: String,
    ) -> Result<RealTraining, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        validate_time(&start_time)?;

        let patch = RealTrainingPatch {
            training_date: Some(training_date),
            start_time: Some(start_time),
            ..Default::default()
        };
        self.patch_cached(session, key, id, &patch)?;
        session.pending();

        info!("Move training {} to {} {:?}", id, training_date, patch.start_time);
        Ok(self.storage.backend.update_real_training(id, &patch).await?)
    }

    /// Applies `patch` to the training in every cached week. A week the
    /// patched training no longer fits loses it, a cached week it now fits
    /// gains it. Every change is held by `session`.
    fn patch_cached(
        &self,
        session: &mut Session,
        key: &QueryKey,
        id: TrainingId,
        patch: &RealTrainingPatch,
    ) -> Result<(), MutationError> {
        let change = Change::PatchRealTraining {
            id,
            patch: patch.clone(),
        };
        let Some(mut patched) = cached_training(&self.storage.cache, key, id) else {
            session.hold(self.storage.cache.patch(key, change)?);
            return Ok(());
        };
        patch.apply(&mut patched);

        for other in self.storage.cache.keys() {
            let QueryKey::RealTrainings(query) = &other else {
                continue;
            };
            let cached = cached_training(&self.storage.cache, &other, id).is_some();
            let change = match (cached, covers(query, &patched)) {
                (true, true) => change.clone(),
                (true, false) => Change::RemoveRealTraining { id },
                (false, true) => Change::InsertRealTraining {
                    training: Box::new(patched.clone()),
                    index: None,
                },
                (false, false) => continue,
            };
            debug!("Training {} in {:?}: {:?}", id, other, change);
            session.hold(self.storage.cache.patch(&other, change)?);
        }
        Ok(())
    }

    #[mutation]
    pub async fn cancel(
        &self,
        session: &mut Session,
        key: &QueryKey,
        id: TrainingId,
        reason: Option<String>,
    ) -> Result<RealTraining, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;

        let optimistic = self.storage.cache.patch(
            key,
            Change::SetCancellation {
                id,
                cancelled_at: Some(Utc::now()),
                reason: reason.clone(),
            },
        )?;
        session.hold(optimistic);
        session.pending();

        info!("Cancel training {}: {:?}", id, reason);
        Ok(self
            .storage
            .backend
            .cancel_real_training(id, reason.as_deref())
            .await?)
    }
}

fn validate_new(training: &NewRealTraining) -> Result<(), ValidationError> {
    if training.responsible_trainer_id.is_none() {
        return Err(ValidationError::MissingTrainer);
    }
    if training.training_type_id.is_none() {
        return Err(ValidationError::MissingTrainingType);
    }
    validate_time(&training.start_time)
}

fn covers(query: &RealTrainingsQuery, training: &RealTraining) -> bool {
    query.start_date <= training.training_date
        && training.training_date <= query.end_date
        && query
            .trainer_id
            .map(|trainer_id| trainer_id == training.responsible_trainer_id)
            .unwrap_or(true)
}
