use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Notification {
        Notification {
            message: message.into(),
            severity,
        }
    }

    pub fn success(message: impl Into<String>) -> Notification {
        Notification::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Notification {
        Notification::new(message, Severity::Error)
    }
}
