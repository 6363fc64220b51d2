use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{TrainerId, TrainingTypeId, WeekId},
    slot::Slot,
    source::ScheduleSource,
    time::{parse_time, TimeParseError},
    user::NOT_SPECIFIED,
};

/// Used when the training type carries no duration of its own.
/// Observed behaviour of the studio, not a documented business rule.
pub const DEFAULT_DURATION_MINS: u32 = 30;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub id: u64,
    pub is_template: bool,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_mins: u32,
    pub title: String,
    pub trainer_id: TrainerId,
    pub training_type: Option<EventTrainingType>,
    pub trainer: Option<EventTrainer>,
    pub raw: ScheduleSource,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventTrainingType {
    pub id: TrainingTypeId,
    pub name: String,
    pub color: Option<String>,
    pub max_participants: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventTrainer {
    pub id: TrainerId,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error(transparent)]
    Time(#[from] TimeParseError),
    #[error("Invalid day number: {0}")]
    InvalidDayNumber(u8),
}

impl NormalizedEvent {
    pub fn slot(&self) -> Slot {
        Slot::new(self.start, self.duration_mins)
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn trainer_name(&self) -> String {
        match &self.trainer {
            Some(trainer) => match trainer.last_name.as_deref().filter(|n| !n.is_empty()) {
                Some(last_name) => format!("{} {}", trainer.first_name, last_name),
                None => trainer.first_name.clone(),
            },
            None => NOT_SPECIFIED.to_owned(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.raw {
            ScheduleSource::Template(_) => false,
            ScheduleSource::RealTraining(training) => training.is_cancelled(),
        }
    }

    /// Order inside a day bucket: start time, then trainer, then id.
    pub fn display_order(&self, other: &NormalizedEvent) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.trainer_id.cmp(&other.trainer_id))
            .then(self.id.cmp(&other.id))
    }
}

/// Builds the canonical event for `source` as displayed in `week`.
///
/// Templates land on their weekday of `week`. Real trainings keep their own
/// date, whether or not it falls into `week`.
pub fn normalize(source: &ScheduleSource, week: WeekId) -> Result<NormalizedEvent, NormalizeError> {
    let date = match source {
        ScheduleSource::Template(template) => {
            let weekday = template
                .weekday()
                .ok_or(NormalizeError::InvalidDayNumber(template.day_number))?;
            week.day(weekday)
        }
        ScheduleSource::RealTraining(training) => training.training_date,
    };
    let time = parse_time(source.start_time())?;
    let start = date.and_time(time);

    let training_type = source.training_type();
    let duration_mins = training_type
        .and_then(|tp| tp.duration_mins)
        .unwrap_or(DEFAULT_DURATION_MINS);

    Ok(NormalizedEvent {
        id: source.id(),
        is_template: source.is_template(),
        start,
        end: start + Duration::minutes(duration_mins as i64),
        duration_mins,
        title: training_type
            .map(|tp| tp.name.clone())
            .unwrap_or_else(|| NOT_SPECIFIED.to_owned()),
        trainer_id: source.trainer_id(),
        training_type: training_type.map(|tp| EventTrainingType {
            id: tp.id,
            name: tp.name.clone(),
            color: tp.color.clone(),
            max_participants: tp.max_participants,
        }),
        trainer: source.trainer().map(|trainer| EventTrainer {
            id: trainer.id,
            first_name: trainer.first_name.clone(),
            last_name: trainer.last_name.clone(),
        }),
        raw: source.clone(),
    })
}
