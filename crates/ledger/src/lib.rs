use service::{
    assignments::Assignments, attendance::Attendance, calendar::Calendar, templates::Templates,
    trainings::Trainings,
};
use storage::Storage;

pub mod commands;
pub mod error;
pub mod service;

#[cfg(test)]
mod test_utils;

/// Calendar core: the read path and every mutation of the schedule.
#[derive(Clone)]
pub struct Ledger {
    pub storage: Storage,
    pub calendar: Calendar,
    pub attendance: Attendance,
    pub trainings: Trainings,
    pub templates: Templates,
    pub assignments: Assignments,
}

impl Ledger {
    pub fn new(storage: Storage) -> Self {
        let calendar = Calendar::new(storage.clone());
        let attendance = Attendance::new(storage.clone());
        let trainings = Trainings::new(storage.clone());
        let templates = Templates::new(storage.clone());
        let assignments = Assignments::new(storage.clone());
        Ledger {
            storage,
            calendar,
            attendance,
            trainings,
            templates,
            assignments,
        }
    }
}
