use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

use crate::{
    ids::{StudentId, TemplateId, TrainerId, TrainingId, TrainingTypeId},
    training_type::TrainingType,
    user::{Student, Trainer},
};

/// Single dated session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RealTraining {
    pub id: TrainingId,
    pub training_date: NaiveDate,
    pub start_time: String,
    pub training_type_id: TrainingTypeId,
    #[serde(default)]
    pub training_type: Option<TrainingType>,
    pub responsible_trainer_id: TrainerId,
    #[serde(default)]
    pub responsible_trainer: Option<Trainer>,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    #[serde(default)]
    pub students: Vec<StudentTraining>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl RealTraining {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    pub fn student(&self, student_id: StudentId) -> Option<&StudentTraining> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    pub fn student_mut(&mut self, student_id: StudentId) -> Option<&mut StudentTraining> {
        self.students.iter_mut().find(|s| s.student_id == student_id)
    }

    /// Students that still occupy a place.
    pub fn active_students(&self) -> usize {
        self.students
            .iter()
            .filter(|s| !s.status.is_cancelled())
            .count()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StudentTraining {
    pub student_id: StudentId,
    #[serde(default)]
    pub student: Option<Student>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub attendance_marked_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Registered,
    Present,
    Absent,
    CancelledSafe,
    CancelledPenalty,
}

impl AttendanceStatus {
    pub fn list() -> Vec<AttendanceStatus> {
        AttendanceStatus::iter().collect()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::CancelledSafe | AttendanceStatus::CancelledPenalty
        )
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Absent)
    }
}

/// Partial update of a real training. Only `Some` fields are sent and patched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RealTrainingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_type_id: Option<TrainingTypeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_trainer_id: Option<TrainerId>,
    /// Display copy written together with `training_type_id`.
    #[serde(skip)]
    pub training_type: Option<TrainingType>,
    /// Display copy written together with `responsible_trainer_id`.
    #[serde(skip)]
    pub responsible_trainer: Option<Trainer>,
}

impl RealTrainingPatch {
    pub fn is_empty(&self) -> bool {
        self.training_date.is_none()
            && self.start_time.is_none()
            && self.training_type_id.is_none()
            && self.responsible_trainer_id.is_none()
    }

    /// Writes the `Some` fields into `training` and returns the previous values
    /// of exactly those fields.
    pub fn apply(&self, training: &mut RealTraining) -> RealTrainingPatch {
        let mut prev = RealTrainingPatch::default();
        if let Some(date) = self.training_date {
            prev.training_date = Some(std::mem::replace(&mut training.training_date, date));
        }
        if let Some(start_time) = &self.start_time {
            prev.start_time = Some(std::mem::replace(
                &mut training.start_time,
                start_time.clone(),
            ));
        }
        if let Some(training_type_id) = self.training_type_id {
            prev.training_type_id = Some(std::mem::replace(
                &mut training.training_type_id,
                training_type_id,
            ));
            prev.training_type =
                std::mem::replace(&mut training.training_type, self.training_type.clone());
        }
        if let Some(trainer_id) = self.responsible_trainer_id {
            prev.responsible_trainer_id = Some(std::mem::replace(
                &mut training.responsible_trainer_id,
                trainer_id,
            ));
            prev.responsible_trainer = std::mem::replace(
                &mut training.responsible_trainer,
                self.responsible_trainer.clone(),
            );
        }
        prev
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewRealTraining {
    pub training_date: NaiveDate,
    pub start_time: String,
    pub training_type_id: Option<TrainingTypeId>,
    pub responsible_trainer_id: Option<TrainerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
}
