use std::fmt::Write as _;

use chrono::{Datelike as _, NaiveDate};
use ledger::service::calendar::WeekState;
use model::{ids::WeekId, rights::Actor, week::WeekBuckets};

use crate::{
    day::{fmt_dm, fmt_month, fmt_weekday},
    training::{fmt_attendance, fmt_event, fmt_roster},
};

const LINE: &str = "➖➖➖➖➖➖➖➖➖➖➖➖➖➖";

/// Render settings of one week.
#[derive(Debug, Clone, Copy)]
pub struct WeekView {
    /// Reference day of the roster statuses.
    pub today: NaiveDate,
    /// Attendance under real trainings, roster under templates.
    pub with_students: bool,
    pub read_only: bool,
}

impl WeekView {
    pub fn for_actor(actor: &Actor, today: NaiveDate, with_students: bool) -> Self {
        WeekView {
            today,
            with_students,
            read_only: actor.is_read_only(),
        }
    }
}

fn header(week: WeekId) -> String {
    let first = week.id();
    format!(
        "📅  Расписание\n{} {}\nс {} по {}\n{}\n",
        fmt_month(&first),
        first.year(),
        fmt_dm(&first),
        fmt_dm(&week.last_day()),
        LINE
    )
}

/// Text grid of a loaded week, or the inline error of a failed load.
pub fn render_week(state: &WeekState, view: &WeekView) -> String {
    match state {
        WeekState::Ready(buckets) => render_buckets(buckets, view),
        WeekState::Failed { week, message } => {
            format!("{}⚠️ {}\n", header(*week), message)
        }
    }
}

pub fn render_buckets(buckets: &WeekBuckets, view: &WeekView) -> String {
    let mut msg = header(buckets.week());
    msg.push_str("🔁 - шаблон\n🟢 - тренировка\n⛔ - тренировка отменена\n");
    if view.read_only {
        msg.push_str("👁 только просмотр\n");
    }
    msg.push_str(LINE);
    msg.push('\n');

    for (date, _) in buckets.iter() {
        render_day(&mut msg, buckets, date, view);
    }

    let conflicts = buckets.trainer_conflicts();
    if !conflicts.is_empty() {
        msg.push_str(LINE);
        msg.push('\n');
        for conflict in conflicts {
            let _ = writeln!(
                msg,
                "⚠️ {} пересекаются занятия {} и {}",
                fmt_dm(&conflict.date),
                conflict.first,
                conflict.second
            );
        }
    }
    msg
}

fn render_day(msg: &mut String, buckets: &WeekBuckets, date: NaiveDate, view: &WeekView) {
    let _ = writeln!(msg, "{} {}", fmt_weekday(date.weekday()), fmt_dm(&date));
    let hours = buckets.hours(date);
    if hours.is_empty() {
        msg.push_str("  нет занятий\n");
        return;
    }
    for (hour, events) in hours {
        let _ = writeln!(msg, "  {:02}:00", hour);
        for event in events {
            let _ = writeln!(msg, "    {}", fmt_event(event));
            if !view.with_students {
                continue;
            }
            let students = fmt_attendance(event)
                .into_iter()
                .chain(fmt_roster(event, view.today));
            for line in students {
                let _ = writeln!(msg, "      {}", line);
            }
        }
    }
}
