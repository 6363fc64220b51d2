use chrono::Utc;
use log::info;
use model::{
    errors::ValidationError,
    ids::{StudentId, TrainingId},
    rights::Rule,
    training::{AttendanceStatus, StudentTraining},
};
use mutation_macro::mutation;
use storage::{cache::QueryKey, patch::Change, session::Session, Storage};

use super::cached_training;
use crate::error::MutationError;

#[derive(Clone)]
pub struct Attendance {
    storage: Storage,
}

impl Attendance {
    pub(crate) fn new(storage: Storage) -> Self {
        Attendance { storage }
    }

    /// Marks one student of a real training. Only the student's `status` and
    /// `attendance_marked_at` are patched.
    #[mutation]
    pub async fn mark(
        &self,
        session: &mut Session,
        key: &QueryKey,
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
    ) -> Result<StudentTraining, MutationError> {
        session.actor().ensure(Rule::MarkAttendance)?;
        if let Some(training) = cached_training(&self.storage.cache, key, training_id) {
            if training.student(student_id).is_none() {
                return Err(ValidationError::StudentNotOnTraining {
                    training_id,
                    student_id,
                }
                .into());
            }
        }

        let marked_at = status.is_marked().then(Utc::now);
        let patch = self.storage.cache.patch(
            key,
            Change::SetAttendance {
                training_id,
                student_id,
                status,
                marked_at,
            },
        )?;
        session.hold(patch);
        session.pending();

        info!(
            "Mark attendance: training {} student {} -> {}",
            training_id, student_id, status
        );
        let record = self
            .storage
            .backend
            .update_student_attendance(training_id, student_id, status)
            .await?;
        Ok(record)
    }
}
