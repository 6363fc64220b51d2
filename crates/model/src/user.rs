use serde::{Deserialize, Serialize};

use crate::ids::{StudentId, TrainerId};

pub const NOT_SPECIFIED: &str = "Не указан";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Trainer {
    pub id: TrainerId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Trainer {
    pub fn new(id: TrainerId, first_name: &str, last_name: Option<&str>) -> Trainer {
        Trainer {
            id,
            first_name: first_name.to_owned(),
            last_name: last_name.map(ToOwned::to_owned),
        }
    }

    pub fn full_name(&self) -> String {
        full_name(&self.first_name, self.last_name.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Student {
    pub fn new(id: StudentId, first_name: &str, last_name: Option<&str>) -> Student {
        Student {
            id,
            first_name: first_name.to_owned(),
            last_name: last_name.map(ToOwned::to_owned),
        }
    }

    pub fn full_name(&self) -> String {
        full_name(&self.first_name, self.last_name.as_deref())
    }
}

fn full_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name.filter(|name| !name.is_empty()) {
        Some(last_name) => format!("{} {}", first_name, last_name),
        None => first_name.to_owned(),
    }
}

/// Display name of an optional trainer, falling back to the placeholder.
pub fn trainer_name(trainer: Option<&Trainer>) -> String {
    trainer
        .map(Trainer::full_name)
        .unwrap_or_else(|| NOT_SPECIFIED.to_owned())
}
