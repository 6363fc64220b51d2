use eyre::Error;
use model::{errors::ValidationError, notification::Notification};
use storage::{backend::ApiError, cache::CacheError};
use thiserror::Error;

pub const NO_PERMISSION: &str = "Нет прав для выполнения операции";
pub const OPERATION_FAILED: &str = "Не удалось выполнить операцию";

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Permission denied: {0}")]
    Permission(ApiError),
    #[error("Not found: {0}")]
    NotFound(ApiError),
    #[error("Api error: {0}")]
    Api(ApiError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Common error: {0}")]
    Eyre(#[from] Error),
}

impl MutationError {
    pub fn classify(err: ApiError) -> MutationError {
        if err.is_permission_denied() {
            MutationError::Permission(err)
        } else if err.is_not_found() {
            MutationError::NotFound(err)
        } else {
            MutationError::Api(err)
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MutationError::Validation(_))
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, MutationError::Permission(_))
    }

    /// Text shown to the user when the mutation fails.
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Validation(err) => err.user_message().to_owned(),
            MutationError::Permission(_) => NO_PERMISSION.to_owned(),
            MutationError::NotFound(err) | MutationError::Api(err) => err
                .detail()
                .filter(|detail| !detail.trim().is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| OPERATION_FAILED.to_owned()),
            MutationError::Cache(_) | MutationError::Eyre(_) => OPERATION_FAILED.to_owned(),
        }
    }

    pub fn notification(&self) -> Notification {
        Notification::error(self.user_message())
    }
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        MutationError::classify(err)
    }
}
