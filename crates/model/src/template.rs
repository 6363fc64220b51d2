use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{
    assignment::AssignmentStatus,
    ids::{
        weekday_from_number, AssignmentId, StudentId, TemplateId, TrainerId, TrainingTypeId,
    },
    training_type::TrainingType,
    user::{Student, Trainer},
};

/// Recurring weekly slot. It has no calendar date of its own.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TrainingTemplate {
    pub id: TemplateId,
    /// 1 is Monday, 7 is Sunday.
    pub day_number: u8,
    pub start_time: String,
    pub training_type_id: TrainingTypeId,
    #[serde(default)]
    pub training_type: Option<TrainingType>,
    pub responsible_trainer_id: TrainerId,
    #[serde(default)]
    pub responsible_trainer: Option<Trainer>,
    #[serde(default)]
    pub assigned_students: Vec<AssignedStudent>,
}

impl TrainingTemplate {
    pub fn weekday(&self) -> Option<Weekday> {
        weekday_from_number(self.day_number)
    }

    pub fn max_participants(&self) -> Option<u32> {
        self.training_type.as_ref().and_then(|tp| tp.max_participants)
    }

    pub fn is_full(&self) -> bool {
        match self.max_participants() {
            Some(max) => self.assigned_students.len() as u32 >= max,
            None => false,
        }
    }

    pub fn has_student(&self, student_id: StudentId) -> bool {
        self.assigned_students
            .iter()
            .any(|assignment| assignment.student_id == student_id)
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<&AssignedStudent> {
        self.assigned_students.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AssignedStudent {
    pub id: AssignmentId,
    pub student_id: StudentId,
    #[serde(default)]
    pub student: Option<Student>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub is_frozen: bool,
}

impl AssignedStudent {
    pub fn status(&self, today: NaiveDate) -> AssignmentStatus {
        AssignmentStatus::derive(self.start_date, today)
    }
}

/// Partial update of a template. Only `Some` fields are sent and patched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_number: Option<u8>,
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

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.day_number.is_none()
            && self.start_time.is_none()
            && self.training_type_id.is_none()
            && self.responsible_trainer_id.is_none()
    }

    /// Writes the `Some` fields into `template` and returns the previous values
    /// of exactly those fields.
    pub fn apply(&self, template: &mut TrainingTemplate) -> TemplatePatch {
        let mut prev = TemplatePatch::default();
        if let Some(day_number) = self.day_number {
            prev.day_number = Some(std::mem::replace(&mut template.day_number, day_number));
        }
        if let Some(start_time) = &self.start_time {
            prev.start_time = Some(std::mem::replace(
                &mut template.start_time,
                start_time.clone(),
            ));
        }
        if let Some(training_type_id) = self.training_type_id {
            prev.training_type_id = Some(std::mem::replace(
                &mut template.training_type_id,
                training_type_id,
            ));
            prev.training_type =
                std::mem::replace(&mut template.training_type, self.training_type.clone());
        }
        if let Some(trainer_id) = self.responsible_trainer_id {
            prev.responsible_trainer_id = Some(std::mem::replace(
                &mut template.responsible_trainer_id,
                trainer_id,
            ));
            prev.responsible_trainer = std::mem::replace(
                &mut template.responsible_trainer,
                self.responsible_trainer.clone(),
            );
        }
        prev
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub day_number: u8,
    pub start_time: String,
    pub training_type_id: Option<TrainingTypeId>,
    pub responsible_trainer_id: Option<TrainerId>,
}
