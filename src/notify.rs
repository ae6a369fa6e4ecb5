//! User-visible notifications.
//!
//! The controller reports everything the user should see through a
//! [`Notifier`]. [`ToastBoard`] is the front end's implementation: a shared
//! list of transient messages that expire after a fixed lifetime.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message as delivered to a notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Sink for user-visible feedback
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Collects notifications in order; handy for headless use and tests.
impl Notifier for Vec<Notification> {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.push(Notification {
            message: message.to_string(),
            severity,
        });
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _message: &str, _severity: Severity) {}
}

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    expires_at: Instant,
}

/// Auto-dismissing toasts shared between the controller and the UI.
#[derive(Debug, Clone)]
pub struct ToastBoard {
    toasts: Arc<Mutex<Vec<Toast>>>,
    lifetime: Duration,
}

impl ToastBoard {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            lifetime,
        }
    }

    /// Add a toast that expires `lifetime` after `now`.
    pub fn push_at(&self, notification: Notification, now: Instant) {
        self.toasts.lock().push(Toast {
            notification,
            expires_at: now + self.lifetime,
        });
    }

    /// Drop expired toasts and return the ones still visible, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<Notification> {
        let mut toasts = self.toasts.lock();
        toasts.retain(|t| t.expires_at > now);
        toasts.iter().map(|t| t.notification.clone()).collect()
    }

    /// Most recent visible toast
    pub fn latest(&self, now: Instant) -> Option<Notification> {
        self.visible(now).pop()
    }
}

impl Notifier for ToastBoard {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.push_at(
            Notification {
                message: message.to_string(),
                severity,
            },
            Instant::now(),
        );
    }
}
