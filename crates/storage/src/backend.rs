use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    ids::{AssignmentId, StudentId, TemplateId, TrainingId},
    template::{AssignedStudent, NewTemplate, TemplatePatch, TrainingTemplate},
    training::{AttendanceStatus, NewRealTraining, RealTraining, RealTrainingPatch, StudentTraining},
    training_type::TrainingType,
    user::Trainer,
};
use thiserror::Error;

use crate::cache::RealTrainingsQuery;

/// Word sequences of a permission refusal. A trailing `*` matches any ending.
const PERMISSION_PHRASES: &[&[&str]] = &[
    &["permission*"],
    &["forbidden"],
    &["access", "denied"],
    &["прав"],
    &["нет", "доступа"],
    &["доступ", "запрещ*"],
];

fn word_matches(word: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => word == pattern,
    }
}

fn mentions_permission(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    let words: Vec<&str> = detail
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    PERMISSION_PHRASES.iter().any(|phrase| {
        words.windows(phrase.len()).any(|window| {
            window
                .iter()
                .zip(phrase.iter())
                .all(|(word, pattern)| word_matches(word, pattern))
        })
    })
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed with status {status}: {}", detail.as_deref().unwrap_or("-"))]
    Status { status: u16, detail: Option<String> },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(status: u16, detail: Option<&str>) -> Self {
        ApiError::Status {
            status,
            detail: detail.map(ToOwned::to_owned),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|status| status.as_u16()),
            ApiError::Url(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) | ApiError::Url(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        if self.status_code() == Some(403) {
            return true;
        }
        self.detail().map(mentions_permission).unwrap_or(false)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// REST backend of the studio. Payload shapes are owned by the server.
#[async_trait]
pub trait ScheduleBackend: Send + Sync {
    async fn list_training_templates(&self) -> Result<Vec<TrainingTemplate>, ApiError>;

    async fn list_real_trainings(
        &self,
        query: &RealTrainingsQuery,
    ) -> Result<Vec<RealTraining>, ApiError>;

    async fn list_trainers(&self) -> Result<Vec<Trainer>, ApiError>;

    async fn list_training_types(&self) -> Result<Vec<TrainingType>, ApiError>;

    async fn update_student_attendance(
        &self,
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
    ) -> Result<StudentTraining, ApiError>;

    async fn create_training_template(
        &self,
        template: &NewTemplate,
    ) -> Result<TrainingTemplate, ApiError>;

    async fn create_real_training(
        &self,
        training: &NewRealTraining,
    ) -> Result<RealTraining, ApiError>;

    async fn update_template(
        &self,
        id: TemplateId,
        patch: &TemplatePatch,
    ) -> Result<TrainingTemplate, ApiError>;

    async fn update_real_training(
        &self,
        id: TrainingId,
        patch: &RealTrainingPatch,
    ) -> Result<RealTraining, ApiError>;

    async fn delete_template(&self, id: TemplateId) -> Result<(), ApiError>;

    async fn cancel_real_training(
        &self,
        id: TrainingId,
        reason: Option<&str>,
    ) -> Result<RealTraining, ApiError>;

    async fn assign_student_to_template(
        &self,
        template_id: TemplateId,
        student_id: StudentId,
        start_date: NaiveDate,
    ) -> Result<AssignedStudent, ApiError>;

    async fn unassign_student_from_template(
        &self,
        template_id: TemplateId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError>;
}
