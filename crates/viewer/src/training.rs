use chrono::NaiveDate;
use ledger::service::assignments::statuses;
use model::{
    assignment::AssignmentStatus, event::NormalizedEvent, source::ScheduleSource,
    template::AssignedStudent, time::fmt_time, training::AttendanceStatus, user::NOT_SPECIFIED,
};

use crate::day::fmt_dm;

pub fn fmt_attendance_status(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Registered => "📝",
        AttendanceStatus::Present => "✅",
        AttendanceStatus::Absent => "❌",
        AttendanceStatus::CancelledSafe => "↩️",
        AttendanceStatus::CancelledPenalty => "💸",
    }
}

pub fn fmt_event_status(event: &NormalizedEvent) -> &'static str {
    match &event.raw {
        ScheduleSource::Template(_) => "🔁",
        ScheduleSource::RealTraining(training) => {
            if training.is_cancelled() {
                "⛔"
            } else {
                "🟢"
            }
        }
    }
}

/// One schedule line: `🟢 10:00-10:30 Йога (Анна Петрова) 2/4`.
pub fn fmt_event(event: &NormalizedEvent) -> String {
    let mut line = format!(
        "{} {}-{} {} ({})",
        fmt_event_status(event),
        fmt_time(event.start.time()),
        fmt_time(event.end.time()),
        event.title,
        event.trainer_name(),
    );
    let count = match &event.raw {
        ScheduleSource::Template(template) => template.assigned_students.len(),
        ScheduleSource::RealTraining(training) => training.active_students(),
    };
    let max = event
        .training_type
        .as_ref()
        .and_then(|training_type| training_type.max_participants);
    match max {
        Some(max) => line.push_str(&format!(" {}/{}", count, max)),
        None if count > 0 => line.push_str(&format!(" {}", count)),
        None => {}
    }
    line
}

/// Attendance lines of a real training; templates have no attendance.
pub fn fmt_attendance(event: &NormalizedEvent) -> Vec<String> {
    let ScheduleSource::RealTraining(training) = &event.raw else {
        return vec![];
    };
    training
        .students
        .iter()
        .map(|student| {
            let name = student
                .student
                .as_ref()
                .map(|s| s.full_name())
                .unwrap_or_else(|| NOT_SPECIFIED.to_owned());
            format!("{} {}", fmt_attendance_status(student.status), name)
        })
        .collect()
}

pub fn fmt_assignment_status(assignment: &AssignedStudent, status: AssignmentStatus) -> String {
    match status {
        AssignmentStatus::AlreadyStarted => "уже занимается".to_owned(),
        AssignmentStatus::StartsToday => "начинает сегодня".to_owned(),
        AssignmentStatus::NotYetStarted => format!("с {}", fmt_dm(&assignment.start_date)),
    }
}

/// Roster lines of a template as of `today`; real trainings have no roster.
pub fn fmt_roster(event: &NormalizedEvent, today: NaiveDate) -> Vec<String> {
    let ScheduleSource::Template(template) = &event.raw else {
        return vec![];
    };
    statuses(template, today)
        .into_iter()
        .map(|(assignment, status)| {
            let name = assignment
                .student
                .as_ref()
                .map(|s| s.full_name())
                .unwrap_or_else(|| NOT_SPECIFIED.to_owned());
            let frozen = if assignment.is_frozen { " ❄️" } else { "" };
            format!(
                "👤 {} ({}){}",
                name,
                fmt_assignment_status(assignment, status),
                frozen
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use model::{
        ids::{AssignmentId, StudentId},
        user::Student,
    };

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_fmt_assignment_status() {
        let assignment = AssignedStudent {
            id: AssignmentId(1),
            student_id: StudentId(100),
            student: Some(Student::new(StudentId(100), "Иван", None)),
            start_date: date(17),
            is_frozen: false,
        };
        assert_eq!(
            fmt_assignment_status(&assignment, AssignmentStatus::NotYetStarted),
            "с 17.06"
        );
        assert_eq!(
            fmt_assignment_status(&assignment, AssignmentStatus::StartsToday),
            "начинает сегодня"
        );
        assert_eq!(
            fmt_assignment_status(&assignment, AssignmentStatus::AlreadyStarted),
            "уже занимается"
        );
    }
}
