use serde::{Deserialize, Serialize};

use crate::{
    ids::TrainerId, template::TrainingTemplate, training::RealTraining,
    training_type::TrainingType, user::Trainer,
};

/// Record the calendar is built from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSource {
    Template(TrainingTemplate),
    RealTraining(RealTraining),
}

impl ScheduleSource {
    pub fn id(&self) -> u64 {
        match self {
            ScheduleSource::Template(template) => template.id.0,
            ScheduleSource::RealTraining(training) => training.id.0,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, ScheduleSource::Template(_))
    }

    pub fn start_time(&self) -> &str {
        match self {
            ScheduleSource::Template(template) => &template.start_time,
            ScheduleSource::RealTraining(training) => &training.start_time,
        }
    }

    pub fn trainer_id(&self) -> TrainerId {
        match self {
            ScheduleSource::Template(template) => template.responsible_trainer_id,
            ScheduleSource::RealTraining(training) => training.responsible_trainer_id,
        }
    }

    pub fn trainer(&self) -> Option<&Trainer> {
        match self {
            ScheduleSource::Template(template) => template.responsible_trainer.as_ref(),
            ScheduleSource::RealTraining(training) => training.responsible_trainer.as_ref(),
        }
    }

    pub fn training_type(&self) -> Option<&TrainingType> {
        match self {
            ScheduleSource::Template(template) => template.training_type.as_ref(),
            ScheduleSource::RealTraining(training) => training.training_type.as_ref(),
        }
    }

    pub fn as_template(&self) -> Option<&TrainingTemplate> {
        match self {
            ScheduleSource::Template(template) => Some(template),
            ScheduleSource::RealTraining(_) => None,
        }
    }

    pub fn as_real_training(&self) -> Option<&RealTraining> {
        match self {
            ScheduleSource::Template(_) => None,
            ScheduleSource::RealTraining(training) => Some(training),
        }
    }
}

impl From<TrainingTemplate> for ScheduleSource {
    fn from(template: TrainingTemplate) -> Self {
        ScheduleSource::Template(template)
    }
}

impl From<RealTraining> for ScheduleSource {
    fn from(training: RealTraining) -> Self {
        ScheduleSource::RealTraining(training)
    }
}
