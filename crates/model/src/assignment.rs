use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where an assigned student stands relative to their start date.
/// Derived on every read, never stored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    NotYetStarted,
    StartsToday,
    AlreadyStarted,
}

impl AssignmentStatus {
    pub fn derive(start_date: NaiveDate, today: NaiveDate) -> AssignmentStatus {
        match start_date.cmp(&today) {
            Ordering::Less => AssignmentStatus::AlreadyStarted,
            Ordering::Equal => AssignmentStatus::StartsToday,
            Ordering::Greater => AssignmentStatus::NotYetStarted,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, AssignmentStatus::NotYetStarted)
    }
}
