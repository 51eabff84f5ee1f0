//! Transient toast notifications.
//!
//! `NotificationCenter` owns its toasts; there is no page-global container.
//! Each toast auto-dismisses on a fire-and-forget tokio task unless shown
//! with a zero duration.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::html::escape_html;

/// Default time a toast stays on screen.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(5);

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        write!(f, "{s}")
    }
}

/// A toast currently on screen.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub severity: Severity,
    /// The message as typed by the caller.
    pub message: String,
    /// HTML-escaped message, safe to insert into markup.
    pub html: String,
    pub created_at: DateTime<Utc>,
}

/// Anything that can display a severity-tagged transient message.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }
}

type ToastSink = Box<dyn Fn(&Toast) + Send + Sync>;

/// Instance-owned toast container.
pub struct NotificationCenter {
    toasts: Arc<Mutex<Vec<Toast>>>,
    default_duration: Duration,
    sink: Option<ToastSink>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_DURATION)
    }

    /// Center whose toasts stay for `default_duration` (zero = sticky).
    pub fn with_duration(default_duration: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            default_duration,
            sink: None,
        }
    }

    /// Also hand every new toast to `sink` (e.g. to print it).
    pub fn with_sink(mut self, sink: impl Fn(&Toast) + Send + Sync + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Show a toast and schedule its removal. Returns the toast id.
    pub fn show(&self, message: &str, severity: Severity, duration: Option<Duration>) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            severity,
            message: message.to_string(),
            html: escape_html(message),
            created_at: Utc::now(),
        };
        let id = toast.id;

        info!(toast_id = %id, severity = %severity, "{}", message);
        if let Some(ref sink) = self.sink {
            sink(&toast);
        }
        lock(&self.toasts).push(toast);

        let duration = duration.unwrap_or(self.default_duration);
        if !duration.is_zero() {
            self.schedule_dismiss(id, duration);
        }
        id
    }

    fn schedule_dismiss(&self, id: Uuid, duration: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(toast_id = %id, "No runtime; toast stays until dismissed");
            return;
        };
        let toasts = Arc::clone(&self.toasts);
        handle.spawn(async move {
            tokio::time::sleep(duration).await;
            lock(&toasts).retain(|t| t.id != id);
        });
    }

    /// Remove a toast early. Returns false if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = lock(&self.toasts);
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    pub fn clear(&self) {
        lock(&self.toasts).clear();
    }

    /// Snapshot of toasts currently on screen, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        lock(&self.toasts).clone()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, severity: Severity, message: &str) {
        self.show(message, severity, None);
    }
}

fn lock(toasts: &Mutex<Vec<Toast>>) -> MutexGuard<'_, Vec<Toast>> {
    toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
