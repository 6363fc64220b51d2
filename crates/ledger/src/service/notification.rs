use log::{info, warn};
use model::notification::{Notification, Severity};

/// Toast/snackbar sink. Called once per mutation resolution.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    fn send(&self, notification: &Notification) {
        self.notify(&notification.message, notification.severity);
    }
}

/// Writes notifications to the log.
#[derive(Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => info!("[{}] {}", severity, message),
            Severity::Warning | Severity::Error => warn!("[{}] {}", severity, message),
        }
    }
}
