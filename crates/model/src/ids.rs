use std::fmt;

use chrono::{Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u64> for $name {
                fn from(id: u64) -> Self {
                    $name(id)
                }
            }
        )*
    };
}

numeric_id!(
    TemplateId,
    TrainingId,
    TrainerId,
    StudentId,
    AssignmentId,
    TrainingTypeId,
    UserId,
);

/// Monday of an ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekId(NaiveDate);

impl WeekId {
    pub fn new(date: NaiveDate) -> Self {
        WeekId(date.week(Weekday::Mon).first_day())
    }

    pub fn id(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    pub fn next(&self) -> Self {
        WeekId(self.0 + Duration::days(7))
    }

    pub fn prev(&self) -> Self {
        WeekId(self.0 - Duration::days(7))
    }

    pub fn day(&self, weekday: Weekday) -> NaiveDate {
        self.0 + Duration::days(weekday.num_days_from_monday() as i64)
    }

    pub fn days(&self) -> [NaiveDate; 7] {
        let mut days = [self.0; 7];
        for (offset, day) in days.iter_mut().enumerate() {
            *day = self.0 + Duration::days(offset as i64);
        }
        days
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.0 && date <= self.last_day()
    }
}

impl From<NaiveDate> for WeekId {
    fn from(date: NaiveDate) -> Self {
        WeekId::new(date)
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.0, self.last_day())
    }
}

/// Day of week as the backend encodes it: 1 is Monday, 7 is Sunday.
pub fn weekday_from_number(day_number: u8) -> Option<Weekday> {
    match day_number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}
