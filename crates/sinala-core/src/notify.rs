//! Notifications shown by the dashboard and the native notification gate.

use serde::{Deserialize, Serialize};

/// How long a notification stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Dismisses itself after a few seconds.
    Transient,
    /// Stays until the user closes it.
    Persistent,
    /// Stays until closed and pulses to draw attention.
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
        }
    }

    /// `true` unless the notification dismisses itself.
    pub fn is_persistent(&self) -> bool {
        self.kind != NotificationKind::Transient
    }
}

/// Permission to raise native (system-level) notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// A system notification facility, used fire-and-forget.
pub trait NativeNotifier {
    fn permission(&self) -> Permission;

    /// Display a notification. `tag` groups repeated alerts of the same kind.
    fn show(&mut self, title: &str, body: &str, tag: &str);
}

/// Native notifier for hosts without a notification facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl NativeNotifier for SilentNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&mut self, _title: &str, _body: &str, _tag: &str) {}
}

/// Show a native notification if permission was granted beforehand.
///
/// Returns whether the notifier was invoked.
pub fn notify_if_permitted<N: NativeNotifier + ?Sized>(
    notifier: &mut N,
    title: &str,
    body: &str,
    tag: &str,
) -> bool {
    if notifier.permission() != Permission::Granted {
        tracing::debug!(tag, "native notification skipped: permission not granted");
        return false;
    }
    notifier.show(title, body, tag);
    true
}
