use std::fmt::Debug;

use chrono::{Duration, NaiveDateTime};

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start_at: NaiveDateTime,
    duration_mins: u32,
}

impl Slot {
    pub fn new(start_at: NaiveDateTime, duration_mins: u32) -> Slot {
        Slot {
            start_at,
            duration_mins,
        }
    }

    pub fn duration_mins(&self) -> u32 {
        self.duration_mins
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.start_at
    }

    pub fn end_at(&self) -> NaiveDateTime {
        self.start_at + Duration::minutes(self.duration_mins as i64)
    }

    pub fn in_slot(&self, time: NaiveDateTime) -> bool {
        time >= self.start_at && time < self.end_at()
    }

    pub fn has_conflict(&self, other: &Slot) -> bool {
        self.start_at < other.end_at() && other.start_at < self.end_at()
    }
}

impl Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = "%H:%M";
        write!(
            f,
            "[({}):{}<->{}]",
            self.start_at.format("%d.%m"),
            self.start_at.format(fmt),
            self.end_at().format(fmt)
        )
    }
}
