// Notification interface for transient user-facing messages.
// Injected into the flow instead of being looked up globally.

use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, kind: NoticeKind, message: &str);

    // Called when the dialog closes and its transient messages go away.
    fn clear(&self) {}
}

/// Routes notices into the tracing pipeline.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Info | NoticeKind::Success => info!(target: "notice", "{}", message),
            NoticeKind::Warning => warn!(target: "notice", "{}", message),
            NoticeKind::Error => error!(target: "notice", "{}", message),
        }
    }
}

/// Collects notices instead of rendering them. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().clone()
    }

    pub fn last(&self) -> Option<(NoticeKind, String)> {
        self.notices.lock().last().cloned()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.notices
            .lock()
            .iter()
            .any(|(_, message)| message.contains(fragment))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().push((kind, message.to_string()));
    }

    fn clear(&self) {
        self.notices.lock().clear();
    }
}
