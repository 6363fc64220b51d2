use std::sync::Arc;

use chrono::NaiveDate;
use eyre::{eyre, Result};
use log::{debug, error, info};
use model::{
    errors::ValidationError,
    ids::{AssignmentId, StudentId, TemplateId, TrainingId},
    notification::Notification,
    rights::Actor,
    template::{NewTemplate, TemplatePatch},
    training::{AttendanceStatus, NewRealTraining, RealTrainingPatch},
};
use storage::{cache::QueryKey, session::Session};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    error::MutationError,
    service::{assignments::ConfirmationId, notification::Notifier},
    Ledger,
};

#[derive(Debug, Clone)]
pub enum MoveRequest {
    Template {
        id: TemplateId,
        day_number: u8,
        start_time: String,
    },
    RealTraining {
        key: QueryKey,
        id: TrainingId,
        training_date: NaiveDate,
        start_time: String,
    },
}

#[derive(Debug, Clone)]
pub enum EditRequest {
    Template {
        id: TemplateId,
        patch: TemplatePatch,
    },
    RealTraining {
        key: QueryKey,
        id: TrainingId,
        patch: RealTrainingPatch,
    },
}

/// Templates are deleted, real trainings are cancelled.
#[derive(Debug, Clone)]
pub enum DeleteRequest {
    Template(TemplateId),
    RealTraining {
        key: QueryKey,
        id: TrainingId,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub enum CreateRequest {
    Template(NewTemplate),
    RealTraining(NewRealTraining),
}

/// Everything a view can ask the calendar to change.
#[derive(Debug, Clone)]
pub enum Command {
    MarkAttendance {
        key: QueryKey,
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
    },
    RequestMove(MoveRequest),
    RequestEdit(EditRequest),
    RequestDelete(DeleteRequest),
    RequestCreate(CreateRequest),
    RequestAssign {
        template_id: TemplateId,
        student_id: StudentId,
        start_date: NaiveDate,
    },
    RequestUnassign {
        template_id: TemplateId,
        assignment_id: AssignmentId,
    },
    ConfirmRemoval(ConfirmationId),
    CancelRemoval(ConfirmationId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Confirmed,
    RolledBack { error: String },
    /// Stopped before any network call; shown inline, not as a notification.
    Rejected(ValidationError),
    AwaitingConfirmation(ConfirmationId),
    Dismissed,
}

/// Runs commands against the ledger and reports every resolution to the
/// notifier.
#[derive(Clone)]
pub struct Dispatcher {
    ledger: Ledger,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(ledger: Ledger, notifier: Arc<dyn Notifier>) -> Self {
        Dispatcher { ledger, notifier }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn dispatch(&self, actor: &Actor, command: Command) -> CommandOutcome {
        debug!("dispatch {:?} by {}", command, actor.user_id);
        let ledger = &self.ledger;
        let mut session = Session::new(actor.clone());
        let session = &mut session;

        let result = match command {
            Command::MarkAttendance {
                key,
                training_id,
                student_id,
                status,
            } => ledger
                .attendance
                .mark(session, &key, training_id, student_id, status)
                .await
                .map(|_| "Посещаемость отмечена"),
            Command::RequestMove(MoveRequest::Template {
                id,
                day_number,
                start_time,
            }) => ledger
                .templates
                .move_template(session, id, day_number, start_time)
                .await
                .map(|_| "Шаблон перенесён"),
            Command::RequestMove(MoveRequest::RealTraining {
                key,
                id,
                training_date,
                start_time,
            }) => ledger
                .trainings
                .move_training(session, &key, id, training_date, start_time)
                .await
                .map(|_| "Тренировка перенесена"),
            Command::RequestEdit(EditRequest::Template { id, patch }) => ledger
                .templates
                .edit(session, id, patch)
                .await
                .map(|_| "Изменения сохранены"),
            Command::RequestEdit(EditRequest::RealTraining { key, id, patch }) => ledger
                .trainings
                .edit(session, &key, id, patch)
                .await
                .map(|_| "Изменения сохранены"),
            Command::RequestDelete(DeleteRequest::Template(id)) => ledger
                .templates
                .delete(session, id)
                .await
                .map(|_| "Шаблон удалён"),
            Command::RequestDelete(DeleteRequest::RealTraining { key, id, reason }) => ledger
                .trainings
                .cancel(session, &key, id, reason)
                .await
                .map(|_| "Тренировка отменена"),
            Command::RequestCreate(CreateRequest::Template(template)) => ledger
                .templates
                .create(session, &template)
                .await
                .map(|_| "Шаблон создан"),
            Command::RequestCreate(CreateRequest::RealTraining(training)) => ledger
                .trainings
                .create(session, &training)
                .await
                .map(|_| "Тренировка создана"),
            Command::RequestAssign {
                template_id,
                student_id,
                start_date,
            } => ledger
                .assignments
                .add(session, template_id, student_id, start_date)
                .await
                .map(|_| "Ученик записан"),
            Command::ConfirmRemoval(id) => ledger
                .assignments
                .confirm_removal(session, id)
                .await
                .map(|_| "Ученик удалён из шаблона"),
            Command::RequestUnassign {
                template_id,
                assignment_id,
            } => {
                return match ledger
                    .assignments
                    .request_removal(actor, template_id, assignment_id)
                {
                    Ok(id) => CommandOutcome::AwaitingConfirmation(id),
                    Err(err) => CommandOutcome::Rejected(err),
                };
            }
            Command::CancelRemoval(id) => {
                return if ledger.assignments.cancel_removal(id) {
                    CommandOutcome::Dismissed
                } else {
                    CommandOutcome::Rejected(ValidationError::ConfirmationNotFound)
                };
            }
        };
        self.resolve(result)
    }

    fn resolve(&self, result: Result<&'static str, MutationError>) -> CommandOutcome {
        match result {
            Ok(message) => {
                info!("{}", message);
                self.notifier.send(&Notification::success(message));
                CommandOutcome::Confirmed
            }
            Err(MutationError::Validation(err)) => {
                debug!("rejected: {}", err);
                CommandOutcome::Rejected(err)
            }
            Err(err) => {
                error!("Mutation failed: {:#}", err);
                let notification = err.notification();
                self.notifier.send(&notification);
                CommandOutcome::RolledBack {
                    error: notification.message,
                }
            }
        }
    }
}

struct Envelope {
    actor: Actor,
    command: Command,
    reply: Option<oneshot::Sender<CommandOutcome>>,
}

/// Handle for sending commands. Each command runs in its own task, so a slow
/// network call never holds up the ones sent after it.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl CommandBus {
    pub fn start(dispatcher: Dispatcher) -> (CommandBus, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let dispatcher = Arc::new(dispatcher);
        let handle = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    let outcome = dispatcher
                        .dispatch(&envelope.actor, envelope.command)
                        .await;
                    if let Some(reply) = envelope.reply {
                        if reply.send(outcome).is_err() {
                            debug!("command reply dropped");
                        }
                    }
                });
            }
            debug!("command bus stopped");
        });
        (CommandBus { tx }, handle)
    }

    /// Fire and forget. The outcome only reaches the notifier.
    pub fn send(&self, actor: Actor, command: Command) -> Result<()> {
        self.tx
            .send(Envelope {
                actor,
                command,
                reply: None,
            })
            .map_err(|_| eyre!("Command bus is closed"))
    }

    pub async fn request(&self, actor: Actor, command: Command) -> Result<CommandOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                actor,
                command,
                reply: Some(reply),
            })
            .map_err(|_| eyre!("Command bus is closed"))?;
        Ok(rx.await?)
    }
}
