use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike as _};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    event::{normalize, NormalizedEvent},
    ids::WeekId,
    source::ScheduleSource,
};

/// Events of one displayed week, bucketed by date. Always holds exactly the
/// seven days of the week, keyed by ISO date.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WeekBuckets {
    week: WeekId,
    days: BTreeMap<NaiveDate, Vec<NormalizedEvent>>,
}

impl WeekBuckets {
    pub fn build<'s>(sources: impl IntoIterator<Item = &'s ScheduleSource>, week: WeekId) -> Self {
        let mut days = week
            .days()
            .into_iter()
            .map(|day| (day, Vec::new()))
            .collect::<BTreeMap<_, _>>();

        for source in sources {
            if let ScheduleSource::RealTraining(training) = source {
                if !week.contains(training.training_date) {
                    continue;
                }
            }

            let event = match normalize(source, week) {
                Ok(event) => event,
                Err(err) => {
                    warn!(
                        "Skip schedule entry {} (template:{}): {}",
                        source.id(),
                        source.is_template(),
                        err
                    );
                    continue;
                }
            };

            if let Some(bucket) = days.get_mut(&event.date()) {
                bucket.push(event);
            }
        }

        for bucket in days.values_mut() {
            bucket.sort_by(|a, b| a.display_order(b));
        }

        WeekBuckets { week, days }
    }

    pub fn week(&self) -> WeekId {
        self.week
    }

    pub fn day(&self, date: NaiveDate) -> &[NormalizedEvent] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Lookup by `YYYY-MM-DD` key.
    pub fn get_iso(&self, key: &str) -> Option<&[NormalizedEvent]> {
        let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
        self.days.get(&date).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[NormalizedEvent])> {
        self.days.iter().map(|(day, events)| (*day, events.as_slice()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.days.keys().map(|day| day.to_string()).collect()
    }

    pub fn events(&self) -> impl Iterator<Item = &NormalizedEvent> {
        self.days.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events of `date` grouped by start hour.
    pub fn hours(&self, date: NaiveDate) -> BTreeMap<u32, Vec<&NormalizedEvent>> {
        let mut hours: BTreeMap<u32, Vec<&NormalizedEvent>> = BTreeMap::new();
        for event in self.day(date) {
            hours.entry(event.start.hour()).or_default().push(event);
        }
        hours
    }

    /// Pairs of overlapping events led by the same trainer.
    pub fn trainer_conflicts(&self) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for events in self.days.values() {
            let events = events.iter().filter(|e| !e.is_cancelled()).collect::<Vec<_>>();
            for (idx, first) in events.iter().enumerate() {
                for second in &events[idx + 1..] {
                    if first.trainer_id == second.trainer_id
                        && first.slot().has_conflict(&second.slot())
                    {
                        collisions.push(Collision {
                            date: first.date(),
                            first: first.id,
                            second: second.id,
                        });
                    }
                }
            }
        }
        collisions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub date: NaiveDate,
    pub first: u64,
    pub second: u64,
}
