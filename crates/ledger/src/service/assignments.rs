use std::{
    collections::HashMap,
    fmt::{self, Display},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::NaiveDate;
use log::{info, warn};
use model::{
    assignment::AssignmentStatus,
    errors::ValidationError,
    ids::{AssignmentId, StudentId, TemplateId},
    rights::{Actor, Rule},
    template::{AssignedStudent, TrainingTemplate},
};
use mutation_macro::mutation;
use parking_lot::Mutex;
use storage::{cache::QueryKey, patch::Change, session::Session, Storage};

use super::cached_template;
use crate::error::MutationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmationId(pub u64);

impl Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A removal waiting for the user to confirm it. Nothing is patched yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    pub template_id: TemplateId,
    pub assignment_id: AssignmentId,
    pub student_id: StudentId,
}

/// Template rosters. Operates on the cached templates collection only.
#[derive(Clone)]
pub struct Assignments {
    storage: Storage,
    pending: Arc<Mutex<HashMap<ConfirmationId, PendingRemoval>>>,
    next_confirmation: Arc<AtomicU64>,
    // Optimistic rows count down from the top so they never meet server ids.
    next_temp_id: Arc<AtomicU64>,
}

impl Assignments {
    pub(crate) fn new(storage: Storage) -> Self {
        Assignments {
            storage,
            pending: Default::default(),
            next_confirmation: Arc::new(AtomicU64::new(1)),
            next_temp_id: Arc::new(AtomicU64::new(u64::MAX)),
        }
    }

    /// Whether `student_id` may be added to `template`. Used both to disable
    /// the action and to guard `add`.
    pub fn can_add(
        &self,
        template: &TrainingTemplate,
        student_id: StudentId,
    ) -> Result<(), ValidationError> {
        if template.is_full() {
            return Err(ValidationError::TemplateFull {
                template_id: template.id,
                max: template.max_participants().unwrap_or_default(),
            });
        }
        if template.has_student(student_id) {
            return Err(ValidationError::StudentAlreadyAssigned {
                template_id: template.id,
                student_id,
            });
        }
        Ok(())
    }

    #[mutation]
    pub async fn add(
        &self,
        session: &mut Session,
        template_id: TemplateId,
        student_id: StudentId,
        start_date: NaiveDate,
    ) -> Result<AssignedStudent, MutationError> {
        session.actor().ensure(Rule::ManageAssignments)?;
        let template = cached_template(&self.storage.cache, template_id)
            .ok_or(ValidationError::TemplateNotFound(template_id))?;
        self.can_add(&template, student_id)?;

        let temp_id = AssignmentId(self.next_temp_id.fetch_sub(1, Ordering::SeqCst));
        let optimistic = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::InsertAssignment {
                template_id,
                assignment: AssignedStudent {
                    id: temp_id,
                    student_id,
                    student: None,
                    start_date,
                    is_frozen: false,
                },
                index: None,
            },
        )?;
        session.hold(optimistic);
        session.pending();

        info!(
            "Assign student {} to template {} from {}",
            student_id, template_id, start_date
        );
        let assigned = self
            .storage
            .backend
            .assign_student_to_template(template_id, student_id, start_date)
            .await?;

        let mut confirmed = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::ReplaceAssignment {
                template_id,
                assignment_id: temp_id,
                assignment: assigned.clone(),
            },
        )?;
        confirmed.discard();
        Ok(assigned)
    }

    /// First step of a removal. The roster is left as is until `confirm_removal`.
    pub fn request_removal(
        &self,
        actor: &Actor,
        template_id: TemplateId,
        assignment_id: AssignmentId,
    ) -> Result<ConfirmationId, ValidationError> {
        actor.ensure(Rule::ManageAssignments)?;
        let template = cached_template(&self.storage.cache, template_id)
            .ok_or(ValidationError::TemplateNotFound(template_id))?;
        let assignment = template
            .assignment(assignment_id)
            .ok_or(ValidationError::AssignmentNotFound(assignment_id))?;

        let id = ConfirmationId(self.next_confirmation.fetch_add(1, Ordering::SeqCst));
        let mut pending = self.pending.lock();
        // A new request for the same row replaces the abandoned one.
        pending.retain(|_, removal| {
            removal.template_id != template_id || removal.assignment_id != assignment_id
        });
        pending.insert(
            id,
            PendingRemoval {
                template_id,
                assignment_id,
                student_id: assignment.student_id,
            },
        );
        Ok(id)
    }

    pub fn pending_removal(&self, id: ConfirmationId) -> Option<PendingRemoval> {
        self.pending.lock().get(&id).cloned()
    }

    /// Drops a pending removal. Returns false if there was nothing to drop.
    pub fn cancel_removal(&self, id: ConfirmationId) -> bool {
        self.pending.lock().remove(&id).is_some()
    }

    #[mutation]
    pub async fn confirm_removal(
        &self,
        session: &mut Session,
        id: ConfirmationId,
    ) -> Result<PendingRemoval, MutationError> {
        session.actor().ensure(Rule::ManageAssignments)?;
        let removal = self
            .pending
            .lock()
            .remove(&id)
            .ok_or(ValidationError::ConfirmationNotFound)?;

        let optimistic = self.storage.cache.patch(
            &QueryKey::Templates,
            Change::RemoveAssignment {
                template_id: removal.template_id,
                assignment_id: removal.assignment_id,
            },
        )?;
        if optimistic.is_noop() {
            warn!(
                "Assignment {} is not in the cached roster of template {}",
                removal.assignment_id, removal.template_id
            );
        }
        session.hold(optimistic);
        session.pending();

        info!(
            "Unassign {} from template {}",
            removal.assignment_id, removal.template_id
        );
        self.storage
            .backend
            .unassign_student_from_template(removal.template_id, removal.assignment_id)
            .await?;
        Ok(removal)
    }
}

/// Status of every assigned student of `template` as of `today`.
pub fn statuses(
    template: &TrainingTemplate,
    today: NaiveDate,
) -> Vec<(&AssignedStudent, AssignmentStatus)> {
    template
        .assigned_students
        .iter()
        .map(|assignment| (assignment, assignment.status(today)))
        .collect()
}

#[cfg(test)]
mod tests {
    use model::{ids::UserId, rights::Role};
    use storage::session::MutationState;

    use super::*;
    use crate::test_utils::{admin, assignment, date, ledger, template, MockBackend};

    fn roster(ledger: &crate::Ledger, id: u64) -> Vec<AssignedStudent> {
        ledger
            .storage
            .cache
            .get(&QueryKey::Templates)
            .unwrap()
            .templates()
            .unwrap()
            .iter()
            .find(|t| t.id == TemplateId(id))
            .unwrap()
            .assigned_students
            .clone()
    }

    async fn setup(assigned: &[(u64, u64)]) -> (Arc<MockBackend>, crate::Ledger) {
        let backend = MockBackend::new();
        let mut yoga = template(1, 1, "10:00");
        yoga.assigned_students = assigned
            .iter()
            .map(|(id, student)| assignment(*id, *student, date(2024, 6, 1)))
            .collect();
        backend.add_template(yoga);
        let ledger = ledger(backend.clone());
        ledger.calendar.refetch(&QueryKey::Templates).await.unwrap();
        (backend, ledger)
    }

    #[tokio::test]
    async fn test_full_template_is_rejected_without_network() {
        let (backend, ledger) = setup(&[(1, 100), (2, 101)]).await;
        let mut session = Session::new(admin());
        let err = ledger
            .assignments
            .add(&mut session, TemplateId(1), StudentId(102), date(2024, 6, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Validation(ValidationError::TemplateFull { max: 2, .. })
        ));
        assert_eq!(roster(&ledger, 1).len(), 2);
        assert_eq!(backend.calls_of("assign_student_to_template"), 0);
    }

    #[tokio::test]
    async fn test_duplicate_student_is_rejected() {
        let (_, ledger) = setup(&[(1, 100)]).await;
        let err = ledger
            .assignments
            .add(
                &mut Session::new(admin()),
                TemplateId(1),
                StudentId(100),
                date(2024, 6, 10),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Validation(ValidationError::StudentAlreadyAssigned { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_replaces_temporary_row() {
        let (backend, ledger) = setup(&[(1, 100)]).await;

        let gate = backend.pause().await;
        let pending = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .assignments
                    .add(
                        &mut Session::new(admin()),
                        TemplateId(1),
                        StudentId(101),
                        date(2024, 6, 11),
                    )
                    .await
            })
        };
        while roster(&ledger, 1).len() < 2 {
            tokio::task::yield_now().await;
        }
        let temp = roster(&ledger, 1)[1].clone();
        assert_eq!(temp.student_id, StudentId(101));
        assert!(temp.id.0 > 1_000_000);

        drop(gate);
        let assigned = pending.await.unwrap().unwrap();
        assert_eq!(roster(&ledger, 1), vec![roster(&ledger, 1)[0].clone(), assigned]);
        assert!(roster(&ledger, 1)[1].id.0 < 1_000_000);
    }

    #[tokio::test]
    async fn test_add_rolled_back() {
        let (backend, ledger) = setup(&[(1, 100)]).await;
        backend.fail_next(403, None);
        let mut session = Session::new(admin());
        let err = ledger
            .assignments
            .add(&mut session, TemplateId(1), StudentId(101), date(2024, 6, 11))
            .await
            .unwrap_err();
        assert!(err.is_permission());
        assert_eq!(session.state(), MutationState::RolledBack);
        assert_eq!(roster(&ledger, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_removal_needs_confirmation() {
        let (backend, ledger) = setup(&[(1, 100), (2, 101)]).await;
        let before = ledger.storage.cache.get(&QueryKey::Templates).unwrap();

        let id = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(1))
            .unwrap();
        assert_eq!(
            ledger.assignments.pending_removal(id).unwrap().student_id,
            StudentId(100)
        );
        assert!(ledger.assignments.cancel_removal(id));
        assert!(!ledger.assignments.cancel_removal(id));
        assert_eq!(ledger.storage.cache.get(&QueryKey::Templates).unwrap(), before);
        assert_eq!(backend.calls_of("unassign_student_from_template"), 0);

        let err = ledger
            .assignments
            .confirm_removal(&mut Session::new(admin()), id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Validation(ValidationError::ConfirmationNotFound)
        ));

        let id = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(1))
            .unwrap();
        ledger
            .assignments
            .confirm_removal(&mut Session::new(admin()), id)
            .await
            .unwrap();
        let ids = roster(&ledger, 1).iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![AssignmentId(2)]);
        assert_eq!(backend.calls_of("unassign_student_from_template"), 1);
    }

    #[tokio::test]
    async fn test_repeated_request_replaces_pending_removal() {
        let (_, ledger) = setup(&[(1, 100), (2, 101)]).await;
        let first = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(1))
            .unwrap();
        let other = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(2))
            .unwrap();
        let second = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(1))
            .unwrap();

        assert_ne!(first, second);
        assert!(ledger.assignments.pending_removal(first).is_none());
        assert!(ledger.assignments.pending_removal(second).is_some());
        assert!(ledger.assignments.pending_removal(other).is_some());
        assert_eq!(ledger.assignments.pending.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_removal_restores_position() {
        let (backend, ledger) = setup(&[(1, 100), (2, 101)]).await;
        let id = ledger
            .assignments
            .request_removal(&admin(), TemplateId(1), AssignmentId(1))
            .unwrap();
        backend.fail_next(500, Some("Ошибка сервера"));
        let err = ledger
            .assignments
            .confirm_removal(&mut Session::new(admin()), id)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Ошибка сервера");
        let ids = roster(&ledger, 1).iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![AssignmentId(1), AssignmentId(2)]);
    }

    #[test]
    fn test_trainer_cannot_request_removal() {
        let backend = MockBackend::new();
        let ledger = ledger(backend);
        let trainer = Actor::new(UserId(1), Role::Trainer);
        assert_eq!(
            ledger
                .assignments
                .request_removal(&trainer, TemplateId(1), AssignmentId(1)),
            Err(ValidationError::ReadOnly(Rule::ManageAssignments))
        );
    }

    #[test]
    fn test_statuses() {
        let mut yoga = template(1, 1, "10:00");
        yoga.assigned_students = vec![
            assignment(1, 100, date(2024, 6, 9)),
            assignment(2, 101, date(2024, 6, 10)),
            assignment(3, 102, date(2024, 6, 11)),
        ];
        let statuses = statuses(&yoga, date(2024, 6, 10))
            .into_iter()
            .map(|(_, status)| status)
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                AssignmentStatus::AlreadyStarted,
                AssignmentStatus::StartsToday,
                AssignmentStatus::NotYetStarted,
            ]
        );
    }
}
