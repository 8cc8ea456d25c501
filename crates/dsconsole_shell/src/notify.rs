//! User-visible notifications

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Receiver of toast-style messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

impl<F> NotificationSink for F
where
    F: Fn(Severity, &str) + Send + Sync,
{
    fn notify(&self, severity: Severity, message: &str) {
        self(severity, message)
    }
}

/// Forwards notifications to the tracing subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success | Severity::Info => tracing::info!(%severity, "{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

/// Keeps every notification in order
#[derive(Clone, Debug, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<(Severity, String)> {
        self.entries.lock().ok().and_then(|e| e.last().cloned())
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((severity, message.to_owned()));
        }
    }
}
