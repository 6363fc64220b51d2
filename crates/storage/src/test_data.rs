use chrono::NaiveDate;
use model::{
    ids::{AssignmentId, StudentId, TemplateId, TrainerId, TrainingId, TrainingTypeId, WeekId},
    template::{AssignedStudent, TrainingTemplate},
    training::{AttendanceStatus, RealTraining, StudentTraining},
    training_type::TrainingType,
};

pub fn week() -> WeekId {
    WeekId::new(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
}

pub fn template(id: u64) -> TrainingTemplate {
    TrainingTemplate {
        id: TemplateId(id),
        day_number: 1,
        start_time: "10:00".to_owned(),
        training_type_id: TrainingTypeId(1),
        training_type: Some(TrainingType::new(TrainingTypeId(1), "Йога").with_max_participants(2)),
        responsible_trainer_id: TrainerId(1),
        responsible_trainer: None,
        assigned_students: vec![],
    }
}

pub fn assignment(id: u64, student: u64) -> AssignedStudent {
    AssignedStudent {
        id: AssignmentId(id),
        student_id: StudentId(student),
        student: None,
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        is_frozen: false,
    }
}

pub fn real_training(id: u64) -> RealTraining {
    RealTraining {
        id: TrainingId(id),
        training_date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
        start_time: "10:00".to_owned(),
        training_type_id: TrainingTypeId(1),
        training_type: None,
        responsible_trainer_id: TrainerId(1),
        responsible_trainer: None,
        template_id: None,
        students: vec![
            StudentTraining {
                student_id: StudentId(100),
                student: None,
                status: AttendanceStatus::Registered,
                attendance_marked_at: None,
            },
            StudentTraining {
                student_id: StudentId(101),
                student: None,
                status: AttendanceStatus::Registered,
                attendance_marked_at: None,
            },
        ],
        cancelled_at: None,
        cancellation_reason: None,
    }
}
