use log::info;
use model::{
    errors::ValidationError,
    ids::TemplateId,
    rights::Rule,
    template::{NewTemplate, TemplatePatch, TrainingTemplate},
};
use mutation_macro::mutation;
use storage::{cache::QueryKey, patch::Change, session::Session, Storage};

use super::{validate_day_number, validate_time};
use crate::error::MutationError;

#[derive(Clone)]
pub struct Templates {
    storage: Storage,
}

impl Templates {
    pub(crate) fn new(storage: Storage) -> Self {
        Templates { storage }
    }

    #[mutation]
    pub async fn create(
        &self,
        session: &mut Session,
        template: &NewTemplate,
    ) -> Result<TrainingTemplate, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        validate_new(template)?;
        session.pending();

        let created = self
            .storage
            .backend
            .create_training_template(template)
            .await?;
        info!(
            "Created template {}: day {} {}",
            created.id, created.day_number, created.start_time
        );
        let mut patch = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::InsertTemplate {
                template: Box::new(created.clone()),
                index: None,
            },
        )?;
        patch.discard();
        Ok(created)
    }

    #[mutation]
    pub async fn edit(
        &self,
        session: &mut Session,
        id: TemplateId,
        patch: TemplatePatch,
    ) -> Result<TrainingTemplate, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        validate_patch(&patch)?;

        let optimistic = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::PatchTemplate {
                id,
                patch: patch.clone(),
            },
        )?;
        session.hold(optimistic);
        session.pending();

        info!("Update template {}: {:?}", id, patch);
        Ok(self.storage.backend.update_template(id, &patch).await?)
    }

    /// Moves the weekly slot to another weekday and time.
    #[mutation]
    pub async fn move_template(
        &self,
        session: &mut Session,
        id: TemplateId,
        day_number: u8,
        start_time: String,
    ) -> Result<TrainingTemplate, MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;
        let patch = TemplatePatch {
            day_number: Some(day_number),
            start_time: Some(start_time),
            ..Default::default()
        };
        validate_patch(&patch)?;

        let optimistic = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::PatchTemplate {
                id,
                patch: patch.clone(),
            },
        )?;
        session.hold(optimistic);
        session.pending();

        info!("Move template {} to day {}", id, day_number);
        Ok(self.storage.backend.update_template(id, &patch).await?)
    }

    #[mutation]
    pub async fn delete(&self, session: &mut Session, id: TemplateId) -> Result<(), MutationError> {
        session.actor().ensure(Rule::EditSchedule)?;

        let optimistic = self
            .storage
            .cache
            .patch(&QueryKey::Templates, Change::RemoveTemplate { id })?;
        session.hold(optimistic);
        session.pending();

        info!("Delete template {}", id);
        Ok(self.storage.backend.delete_template(id).await?)
    }
}

fn validate_new(template: &NewTemplate) -> Result<(), ValidationError> {
    validate_day_number(template.day_number)?;
    if template.responsible_trainer_id.is_none() {
        return Err(ValidationError::MissingTrainer);
    }
    if template.training_type_id.is_none() {
        return Err(ValidationError::MissingTrainingType);
    }
    validate_time(&template.start_time)
}

fn validate_patch(patch: &TemplatePatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(day_number) = patch.day_number {
        validate_day_number(day_number)?;
    }
    if let Some(start_time) = &patch.start_time {
        validate_time(start_time)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use model::ids::{TrainerId, TrainingTypeId};
    use storage::session::MutationState;

    use super::*;
    use crate::test_utils::{admin, ledger, template, MockBackend};

    fn cached(ledger: &crate::Ledger) -> Vec<TrainingTemplate> {
        ledger
            .storage
            .cache
            .get(&QueryKey::Templates)
            .unwrap()
            .templates()
            .unwrap()
            .to_vec()
    }

    async fn setup() -> (std::sync::Arc<MockBackend>, crate::Ledger) {
        let backend = MockBackend::new();
        backend.add_template(template(1, 1, "10:00"));
        backend.add_template(template(2, 3, "12:00"));
        backend.add_template(template(3, 5, "18:00"));
        let ledger = ledger(backend.clone());
        ledger.calendar.refetch(&QueryKey::Templates).await.unwrap();
        (backend, ledger)
    }

    #[tokio::test]
    async fn test_create() {
        let (backend, ledger) = setup().await;
        let new = NewTemplate {
            day_number: 8,
            start_time: "09:00".to_owned(),
            training_type_id: Some(TrainingTypeId(1)),
            responsible_trainer_id: Some(TrainerId(1)),
        };
        let err = ledger
            .templates
            .create(&mut Session::new(admin()), &new)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Validation(ValidationError::InvalidDayNumber(8))
        ));
        assert_eq!(backend.calls_of("create_training_template"), 0);

        let new = NewTemplate {
            day_number: 7,
            ..new
        };
        let created = ledger
            .templates
            .create(&mut Session::new(admin()), &new)
            .await
            .unwrap();
        assert_eq!(cached(&ledger).last(), Some(&created));
        assert_eq!(created.day_number, 7);
    }

    #[tokio::test]
    async fn test_delete_rollback_restores_position() {
        let (backend, ledger) = setup().await;
        let before = cached(&ledger);

        backend.fail_next(400, Some("Нет доступа к шаблону"));
        let mut session = Session::new(admin());
        let err = ledger
            .templates
            .delete(&mut session, TemplateId(2))
            .await
            .unwrap_err();
        assert!(err.is_permission());
        assert_eq!(session.state(), MutationState::RolledBack);
        assert_eq!(cached(&ledger), before);
    }

    #[tokio::test]
    async fn test_delete_confirmed() {
        let (backend, ledger) = setup().await;
        ledger
            .templates
            .delete(&mut Session::new(admin()), TemplateId(2))
            .await
            .unwrap();
        let ids = cached(&ledger).iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![TemplateId(1), TemplateId(3)]);
        assert_eq!(backend.calls_of("delete_template"), 1);
    }

    #[tokio::test]
    async fn test_move_rollback_keeps_other_fields() {
        let (backend, ledger) = setup().await;
        let before = cached(&ledger)[0].clone();

        backend.fail_next(500, None);
        let err = ledger
            .templates
            .move_template(&mut Session::new(admin()), TemplateId(1), 2, "11:00".to_owned())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), crate::error::OPERATION_FAILED);
        assert_eq!(cached(&ledger)[0], before);
    }

    #[tokio::test]
    async fn test_edit_trainer_carries_display_copy() {
        let (_, ledger) = setup().await;
        let lookups = ledger.calendar.lookups().await.unwrap();
        let trainer = lookups.trainer(TrainerId(2)).cloned();
        let patch = TemplatePatch {
            responsible_trainer_id: Some(TrainerId(2)),
            responsible_trainer: trainer.clone(),
            ..Default::default()
        };
        ledger
            .templates
            .edit(&mut Session::new(admin()), TemplateId(3), patch)
            .await
            .unwrap();
        let edited = &cached(&ledger)[2];
        assert_eq!(edited.responsible_trainer_id, TrainerId(2));
        assert_eq!(edited.responsible_trainer, trainer);
    }

    #[tokio::test]
    async fn test_edit_rollback_restores_record() {
        let (backend, ledger) = setup().await;
        let before = cached(&ledger);
        let patch = TemplatePatch {
            start_time: Some("19:15".to_owned()),
            responsible_trainer_id: Some(TrainerId(2)),
            responsible_trainer: crate::test_utils::trainers().pop(),
            ..Default::default()
        };

        backend.fail_next(500, None);
        let mut session = Session::new(admin());
        assert!(ledger
            .templates
            .edit(&mut session, TemplateId(3), patch)
            .await
            .is_err());
        assert_eq!(session.state(), MutationState::RolledBack);
        assert_eq!(cached(&ledger), before);
        assert_eq!(cached(&ledger)[2].responsible_trainer, before[2].responsible_trainer);
        assert_eq!(backend.calls_of("update_template"), 1);
    }
}
