use std::sync::Weak;

use chrono::{DateTime, Utc};
use log::debug;
use model::{
    ids::{AssignmentId, StudentId, TemplateId, TrainingId},
    template::{AssignedStudent, TemplatePatch, TrainingTemplate},
    training::{AttendanceStatus, RealTraining, RealTrainingPatch},
};

use crate::cache::{QueryCache, QueryData, QueryKey};

/// A single edit of a cached collection. Every variant touches only the
/// fields it names, so reverting one change leaves the rest of the record as
/// other mutations left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    SetAttendance {
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
        marked_at: Option<DateTime<Utc>>,
    },
    PatchRealTraining {
        id: TrainingId,
        patch: RealTrainingPatch,
    },
    SetCancellation {
        id: TrainingId,
        cancelled_at: Option<DateTime<Utc>>,
        reason: Option<String>,
    },
    InsertRealTraining {
        training: Box<RealTraining>,
        index: Option<usize>,
    },
    RemoveRealTraining {
        id: TrainingId,
    },
    PatchTemplate {
        id: TemplateId,
        patch: TemplatePatch,
    },
    InsertTemplate {
        template: Box<TrainingTemplate>,
        index: Option<usize>,
    },
    RemoveTemplate {
        id: TemplateId,
    },
    InsertAssignment {
        template_id: TemplateId,
        assignment: AssignedStudent,
        index: Option<usize>,
    },
    RemoveAssignment {
        template_id: TemplateId,
        assignment_id: AssignmentId,
    },
    ReplaceAssignment {
        template_id: TemplateId,
        assignment_id: AssignmentId,
        assignment: AssignedStudent,
    },
}

/// The change targets the other kind of collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch;

impl Change {
    /// Applies the change and returns its inverse, or `None` when the target
    /// record is not in the collection.
    pub fn apply(&self, data: &mut QueryData) -> Result<Option<Change>, Mismatch> {
        match data {
            QueryData::RealTrainings(trainings) => self.apply_to_trainings(trainings),
            QueryData::Templates(templates) => self.apply_to_templates(templates),
        }
    }

    fn apply_to_trainings(&self, trainings: &mut Vec<RealTraining>) -> Result<Option<Change>, Mismatch> {
        Ok(match self {
            Change::SetAttendance {
                training_id,
                student_id,
                status,
                marked_at,
            } => trainings
                .iter_mut()
                .find(|training| training.id == *training_id)
                .and_then(|training| training.student_mut(*student_id))
                .map(|student| Change::SetAttendance {
                    training_id: *training_id,
                    student_id: *student_id,
                    status: std::mem::replace(&mut student.status, *status),
                    marked_at: std::mem::replace(&mut student.attendance_marked_at, *marked_at),
                }),
            Change::PatchRealTraining { id, patch } => {
                training_index(trainings, *id).map(|idx| Change::PatchRealTraining {
                    id: *id,
                    patch: patch.apply(&mut trainings[idx]),
                })
            }
            Change::SetCancellation {
                id,
                cancelled_at,
                reason,
            } => training_index(trainings, *id).map(|idx| {
                let training = &mut trainings[idx];
                Change::SetCancellation {
                    id: *id,
                    cancelled_at: std::mem::replace(&mut training.cancelled_at, *cancelled_at),
                    reason: std::mem::replace(&mut training.cancellation_reason, reason.clone()),
                }
            }),
            Change::InsertRealTraining { training, index } => {
                if training_index(trainings, training.id).is_some() {
                    None
                } else {
                    let idx = index.unwrap_or(trainings.len()).min(trainings.len());
                    trainings.insert(idx, training.as_ref().clone());
                    Some(Change::RemoveRealTraining { id: training.id })
                }
            }
            Change::RemoveRealTraining { id } => training_index(trainings, *id).map(|idx| {
                let training = trainings.remove(idx);
                Change::InsertRealTraining {
                    training: Box::new(training),
                    index: Some(idx),
                }
            }),
            Change::PatchTemplate { .. }
            | Change::InsertTemplate { .. }
            | Change::RemoveTemplate { .. }
            | Change::InsertAssignment { .. }
            | Change::RemoveAssignment { .. }
            | Change::ReplaceAssignment { .. } => return Err(Mismatch),
        })
    }

    fn apply_to_templates(&self, templates: &mut Vec<TrainingTemplate>) -> Result<Option<Change>, Mismatch> {
        Ok(match self {
            Change::PatchTemplate { id, patch } => {
                template_index(templates, *id).map(|idx| Change::PatchTemplate {
                    id: *id,
                    patch: patch.apply(&mut templates[idx]),
                })
            }
            Change::InsertTemplate { template, index } => {
                if template_index(templates, template.id).is_some() {
                    None
                } else {
                    let idx = index.unwrap_or(templates.len()).min(templates.len());
                    templates.insert(idx, template.as_ref().clone());
                    Some(Change::RemoveTemplate { id: template.id })
                }
            }
            Change::RemoveTemplate { id } => template_index(templates, *id).map(|idx| {
                let template = templates.remove(idx);
                Change::InsertTemplate {
                    template: Box::new(template),
                    index: Some(idx),
                }
            }),
            Change::InsertAssignment {
                template_id,
                assignment,
                index,
            } => template_index(templates, *template_id).and_then(|idx| {
                let students = &mut templates[idx].assigned_students;
                if students.iter().any(|a| a.id == assignment.id) {
                    return None;
                }
                let pos = index.unwrap_or(students.len()).min(students.len());
                students.insert(pos, assignment.clone());
                Some(Change::RemoveAssignment {
                    template_id: *template_id,
                    assignment_id: assignment.id,
                })
            }),
            Change::RemoveAssignment {
                template_id,
                assignment_id,
            } => template_index(templates, *template_id).and_then(|idx| {
                let students = &mut templates[idx].assigned_students;
                let pos = students.iter().position(|a| a.id == *assignment_id)?;
                let assignment = students.remove(pos);
                Some(Change::InsertAssignment {
                    template_id: *template_id,
                    assignment,
                    index: Some(pos),
                })
            }),
            Change::ReplaceAssignment {
                template_id,
                assignment_id,
                assignment,
            } => template_index(templates, *template_id).and_then(|idx| {
                let student = templates[idx]
                    .assigned_students
                    .iter_mut()
                    .find(|a| a.id == *assignment_id)?;
                let prev = std::mem::replace(student, assignment.clone());
                Some(Change::ReplaceAssignment {
                    template_id: *template_id,
                    assignment_id: assignment.id,
                    assignment: prev,
                })
            }),
            Change::SetAttendance { .. }
            | Change::PatchRealTraining { .. }
            | Change::SetCancellation { .. }
            | Change::InsertRealTraining { .. }
            | Change::RemoveRealTraining { .. } => return Err(Mismatch),
        })
    }
}

fn training_index(trainings: &[RealTraining], id: TrainingId) -> Option<usize> {
    trainings.iter().position(|training| training.id == id)
}

fn template_index(templates: &[TrainingTemplate], id: TemplateId) -> Option<usize> {
    templates.iter().position(|template| template.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    Active,
    Discarded,
    Undone,
}

/// Handle on an applied optimistic change. `undo` restores the fields the
/// change touched; `discard` forgets it. Both are idempotent, and once either
/// ran the other is a no-op.
#[derive(Debug)]
pub struct Patch {
    key: QueryKey,
    inverse: Option<Change>,
    cache: Weak<QueryCache>,
    state: PatchState,
}

impl Patch {
    pub(crate) fn new(key: QueryKey, inverse: Option<Change>, cache: Weak<QueryCache>) -> Patch {
        Patch {
            key,
            inverse,
            cache,
            state: PatchState::Active,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> PatchState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PatchState::Active
    }

    /// Whether applying the change found its target.
    pub fn is_noop(&self) -> bool {
        self.inverse.is_none()
    }

    pub fn undo(&mut self) {
        if self.state != PatchState::Active {
            return;
        }
        self.state = PatchState::Undone;
        let Some(inverse) = self.inverse.take() else {
            return;
        };
        match self.cache.upgrade() {
            Some(cache) => cache.revert(&self.key, inverse),
            None => debug!("cache dropped before undo of {:?}", self.key),
        }
    }

    pub fn discard(&mut self) {
        if self.state != PatchState::Active {
            return;
        }
        self.state = PatchState::Discarded;
        self.inverse = None;
    }
}
