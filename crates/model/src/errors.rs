use thiserror::Error;

use crate::{
    ids::{AssignmentId, StudentId, TemplateId, TrainingId},
    rights::Rule,
};

/// Precondition failures. These never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Read only access: missing {0:?}")]
    ReadOnly(Rule),
    #[error("Template {template_id} is full: {max} participants")]
    TemplateFull { template_id: TemplateId, max: u32 },
    #[error("Student {student_id} already assigned to template {template_id}")]
    StudentAlreadyAssigned {
        template_id: TemplateId,
        student_id: StudentId,
    },
    #[error("Trainer is not specified")]
    MissingTrainer,
    #[error("Training type is not specified")]
    MissingTrainingType,
    #[error("Invalid start time: {0:?}")]
    InvalidTime(String),
    #[error("Invalid day number: {0}")]
    InvalidDayNumber(u8),
    #[error("Nothing to update")]
    EmptyPatch,
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),
    #[error("Training not found: {0}")]
    TrainingNotFound(TrainingId),
    #[error("Student {student_id} is not on training {training_id}")]
    StudentNotOnTraining {
        training_id: TrainingId,
        student_id: StudentId,
    },
    #[error("Assignment not found: {0}")]
    AssignmentNotFound(AssignmentId),
    #[error("Confirmation not found")]
    ConfirmationNotFound,
}

impl ValidationError {
    /// Inline message for the control that triggered the action.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::ReadOnly(_) => "Недостаточно прав",
            ValidationError::TemplateFull { .. } => "Достигнуто максимальное количество участников",
            ValidationError::StudentAlreadyAssigned { .. } => "Ученик уже записан",
            ValidationError::MissingTrainer => "Выберите тренера",
            ValidationError::MissingTrainingType => "Выберите тип тренировки",
            ValidationError::InvalidTime(_) => "Неверное время",
            ValidationError::InvalidDayNumber(_) => "Неверный день недели",
            ValidationError::EmptyPatch => "Нет изменений",
            ValidationError::TemplateNotFound(_)
            | ValidationError::TrainingNotFound(_)
            | ValidationError::AssignmentNotFound(_)
            | ValidationError::StudentNotOnTraining { .. } => "Запись не найдена",
            ValidationError::ConfirmationNotFound => "Действие уже отменено",
        }
    }
}
