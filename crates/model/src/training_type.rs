use serde::{Deserialize, Serialize};

use crate::ids::TrainingTypeId;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TrainingType {
    pub id: TrainingTypeId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub duration_mins: Option<u32>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

impl TrainingType {
    pub fn new(id: TrainingTypeId, name: &str) -> TrainingType {
        TrainingType {
            id,
            name: name.to_owned(),
            color: None,
            max_participants: None,
            duration_mins: None,
            is_active: true,
        }
    }

    pub fn with_max_participants(mut self, max: u32) -> Self {
        self.max_participants = Some(max);
        self
    }

    pub fn with_duration(mut self, duration_mins: u32) -> Self {
        self.duration_mins = Some(duration_mins);
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_owned());
        self
    }
}

fn default_is_active() -> bool {
    true
}
