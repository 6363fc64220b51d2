use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use model::{
    ids::{
        AssignmentId, StudentId, TemplateId, TrainerId, TrainingId, TrainingTypeId, UserId, WeekId,
    },
    notification::{Notification, Severity},
    rights::{Actor, Role},
    template::{AssignedStudent, NewTemplate, TemplatePatch, TrainingTemplate},
    training::{
        AttendanceStatus, NewRealTraining, RealTraining, RealTrainingPatch, StudentTraining,
    },
    training_type::TrainingType,
    user::Trainer,
};
use parking_lot::Mutex;
use storage::{
    backend::{ApiError, ScheduleBackend},
    cache::{QueryKey, RealTrainingsQuery},
    Storage,
};
use tokio::sync::{Mutex as Gate, OwnedMutexGuard};

use crate::{service::notification::Notifier, Ledger};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn admin() -> Actor {
    Actor::new(UserId(1000), Role::Admin)
}

pub fn week_key() -> QueryKey {
    QueryKey::RealTrainings(RealTrainingsQuery::week(WeekId::new(date(2024, 6, 3))))
}

pub fn yoga() -> TrainingType {
    TrainingType::new(TrainingTypeId(1), "Йога")
        .with_max_participants(2)
        .with_color("#4caf50")
}

pub fn swimming() -> TrainingType {
    TrainingType::new(TrainingTypeId(2), "Плавание").with_duration(45)
}

pub fn trainers() -> Vec<Trainer> {
    vec![
        Trainer::new(TrainerId(1), "Анна", Some("Петрова")),
        Trainer::new(TrainerId(2), "Олег", None),
    ]
}

pub fn template(id: u64, day_number: u8, start_time: &str) -> TrainingTemplate {
    TrainingTemplate {
        id: TemplateId(id),
        day_number,
        start_time: start_time.to_owned(),
        training_type_id: TrainingTypeId(1),
        training_type: Some(yoga()),
        responsible_trainer_id: TrainerId(1),
        responsible_trainer: trainers().into_iter().next(),
        assigned_students: vec![],
    }
}

pub fn assignment(id: u64, student: u64, start_date: NaiveDate) -> AssignedStudent {
    AssignedStudent {
        id: AssignmentId(id),
        student_id: StudentId(student),
        student: None,
        start_date,
        is_frozen: false,
    }
}

pub fn real_training(id: u64, training_date: NaiveDate, start_time: &str) -> RealTraining {
    RealTraining {
        id: TrainingId(id),
        training_date,
        start_time: start_time.to_owned(),
        training_type_id: TrainingTypeId(2),
        training_type: Some(swimming()),
        responsible_trainer_id: TrainerId(1),
        responsible_trainer: trainers().into_iter().next(),
        template_id: None,
        students: [100, 101]
            .into_iter()
            .map(|id| StudentTraining {
                student_id: StudentId(id),
                student: None,
                status: AttendanceStatus::Registered,
                attendance_marked_at: None,
            })
            .collect(),
        cancelled_at: None,
        cancellation_reason: None,
    }
}

pub fn ledger(backend: Arc<MockBackend>) -> Ledger {
    Ledger::new(Storage::new(backend))
}

#[derive(Default)]
struct State {
    templates: Vec<TrainingTemplate>,
    trainings: Vec<RealTraining>,
    last_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory backend. Records every call, can fail the next one and can hold
/// writes behind a gate to observe the optimistic phase.
pub struct MockBackend {
    state: Mutex<State>,
    calls: Mutex<Vec<&'static str>>,
    failure: Mutex<Option<(u16, Option<String>)>>,
    gate: Arc<Gate<()>>,
}

impl MockBackend {
    pub fn new() -> Arc<MockBackend> {
        Arc::new(MockBackend {
            state: Mutex::new(State {
                last_id: 1000,
                ..Default::default()
            }),
            calls: Mutex::new(vec![]),
            failure: Mutex::new(None),
            gate: Arc::new(Gate::new(())),
        })
    }

    pub fn add_template(&self, template: TrainingTemplate) {
        self.state.lock().templates.push(template);
    }

    pub fn add_training(&self, training: RealTraining) {
        self.state.lock().trainings.push(training);
    }

    /// The next call answers with `status` instead of running.
    pub fn fail_next(&self, status: u16, detail: Option<&str>) {
        *self.failure.lock() = Some((status, detail.map(ToOwned::to_owned)));
    }

    /// Writes wait until the returned guard is dropped.
    pub async fn pause(&self) -> OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn calls_of(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|call| **call == name).count()
    }

    fn read(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.lock().push(name);
        self.take_failure()
    }

    async fn write(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.lock().push(name);
        let _gate = self.gate.lock().await;
        self.take_failure()
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.failure.lock().take() {
            Some((status, detail)) => Err(ApiError::Status { status, detail }),
            None => Ok(()),
        }
    }

    fn training_type(id: Option<TrainingTypeId>) -> Option<TrainingType> {
        [yoga(), swimming()].into_iter().find(|t| Some(t.id) == id)
    }

    fn trainer(id: Option<TrainerId>) -> Option<Trainer> {
        trainers().into_iter().find(|t| Some(t.id) == id)
    }
}

fn not_found() -> ApiError {
    ApiError::status(404, Some("Not found"))
}

#[async_trait]
impl ScheduleBackend for MockBackend {
    async fn list_training_templates(&self) -> Result<Vec<TrainingTemplate>, ApiError> {
        self.read("list_training_templates")?;
        Ok(self.state.lock().templates.clone())
    }

    async fn list_real_trainings(
        &self,
        query: &RealTrainingsQuery,
    ) -> Result<Vec<RealTraining>, ApiError> {
        self.read("list_real_trainings")?;
        Ok(self
            .state
            .lock()
            .trainings
            .iter()
            .filter(|t| query.start_date <= t.training_date && t.training_date <= query.end_date)
            .filter(|t| {
                query
                    .trainer_id
                    .map(|id| id == t.responsible_trainer_id)
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn list_trainers(&self) -> Result<Vec<Trainer>, ApiError> {
        self.read("list_trainers")?;
        Ok(trainers())
    }

    async fn list_training_types(&self) -> Result<Vec<TrainingType>, ApiError> {
        self.read("list_training_types")?;
        Ok(vec![yoga(), swimming()])
    }

    async fn update_student_attendance(
        &self,
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
    ) -> Result<StudentTraining, ApiError> {
        self.write("update_student_attendance").await?;
        let mut state = self.state.lock();
        let student = state
            .trainings
            .iter_mut()
            .find(|t| t.id == training_id)
            .and_then(|t| t.student_mut(student_id))
            .ok_or_else(not_found)?;
        student.status = status;
        student.attendance_marked_at = status.is_marked().then(Utc::now);
        Ok(student.clone())
    }

    async fn create_training_template(
        &self,
        template: &NewTemplate,
    ) -> Result<TrainingTemplate, ApiError> {
        self.write("create_training_template").await?;
        let mut state = self.state.lock();
        let created = TrainingTemplate {
            id: TemplateId(state.next_id()),
            day_number: template.day_number,
            start_time: template.start_time.clone(),
            training_type_id: template.training_type_id.ok_or_else(not_found)?,
            training_type: Self::training_type(template.training_type_id),
            responsible_trainer_id: template.responsible_trainer_id.ok_or_else(not_found)?,
            responsible_trainer: Self::trainer(template.responsible_trainer_id),
            assigned_students: vec![],
        };
        state.templates.push(created.clone());
        Ok(created)
    }

    async fn create_real_training(
        &self,
        training: &NewRealTraining,
    ) -> Result<RealTraining, ApiError> {
        self.write("create_real_training").await?;
        let mut state = self.state.lock();
        let created = RealTraining {
            id: TrainingId(state.next_id()),
            training_date: training.training_date,
            start_time: training.start_time.clone(),
            training_type_id: training.training_type_id.ok_or_else(not_found)?,
            training_type: Self::training_type(training.training_type_id),
            responsible_trainer_id: training.responsible_trainer_id.ok_or_else(not_found)?,
            responsible_trainer: Self::trainer(training.responsible_trainer_id),
            template_id: training.template_id,
            students: vec![],
            cancelled_at: None,
            cancellation_reason: None,
        };
        state.trainings.push(created.clone());
        Ok(created)
    }

    async fn update_template(
        &self,
        id: TemplateId,
        patch: &TemplatePatch,
    ) -> Result<TrainingTemplate, ApiError> {
        self.write("update_template").await?;
        let mut state = self.state.lock();
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(not_found)?;
        patch.apply(template);
        Ok(template.clone())
    }

    async fn update_real_training(
        &self,
        id: TrainingId,
        patch: &RealTrainingPatch,
    ) -> Result<RealTraining, ApiError> {
        self.write("update_real_training").await?;
        let mut state = self.state.lock();
        let training = state
            .trainings
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(not_found)?;
        patch.apply(training);
        Ok(training.clone())
    }

    async fn delete_template(&self, id: TemplateId) -> Result<(), ApiError> {
        self.write("delete_template").await?;
        let mut state = self.state.lock();
        let len = state.templates.len();
        state.templates.retain(|t| t.id != id);
        if state.templates.len() == len {
            return Err(not_found());
        }
        Ok(())
    }

    async fn cancel_real_training(
        &self,
        id: TrainingId,
        reason: Option<&str>,
    ) -> Result<RealTraining, ApiError> {
        self.write("cancel_real_training").await?;
        let mut state = self.state.lock();
        let training = state
            .trainings
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(not_found)?;
        training.cancelled_at = Some(Utc::now());
        training.cancellation_reason = reason.map(ToOwned::to_owned);
        Ok(training.clone())
    }

    async fn assign_student_to_template(
        &self,
        template_id: TemplateId,
        student_id: StudentId,
        start_date: NaiveDate,
    ) -> Result<AssignedStudent, ApiError> {
        self.write("assign_student_to_template").await?;
        let mut state = self.state.lock();
        let id = AssignmentId(state.next_id());
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(not_found)?;
        let assigned = assignment(id.0, student_id.0, start_date);
        template.assigned_students.push(assigned.clone());
        Ok(assigned)
    }

    async fn unassign_student_from_template(
        &self,
        template_id: TemplateId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError> {
        self.write("unassign_student_from_template").await?;
        let mut state = self.state.lock();
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(not_found)?;
        template.assigned_students.retain(|a| a.id != assignment_id);
        Ok(())
    }
}

/// Keeps every notification for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<RecordingNotifier> {
        Arc::new(RecordingNotifier::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.sent.lock().push(Notification::new(message, severity));
    }
}
