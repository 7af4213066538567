//! Native notifications through `notify-send`.

use std::path::PathBuf;

use sinala_core::{NativeNotifier, Permission};
use tracing::{debug, info, warn};

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "sinala";

pub struct DesktopNotifier {
    permission: Permission,
    binary: Option<PathBuf>,
}

impl DesktopNotifier {
    /// Build a notifier from the configured permission.
    ///
    /// `Default` means nobody decided yet, so ask the host once: the
    /// permission is granted when `notify-send` can be found.
    pub fn new(configured: Permission) -> Self {
        let binary = which::which(NOTIFY_SEND).ok();
        let permission = resolve_permission(configured, binary.is_some());
        info!(?permission, "desktop notifications");
        Self { permission, binary }
    }
}

fn resolve_permission(configured: Permission, available: bool) -> Permission {
    match configured {
        Permission::Default if available => Permission::Granted,
        Permission::Default => Permission::Denied,
        other => other,
    }
}

impl NativeNotifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn show(&mut self, title: &str, body: &str, tag: &str) {
        let Some(binary) = &self.binary else {
            debug!(tag, "no {NOTIFY_SEND} on PATH, skipping native notification");
            return;
        };
        let mut command = tokio::process::Command::new(binary);
        command
            .arg("--urgency=critical")
            .arg(format!("--app-name={APP_NAME}"))
            .arg(format!("--hint=string:x-canonical-private-synchronous:{tag}"))
            .arg(title)
            .arg(body)
            .kill_on_drop(false);
        tokio::spawn(async move {
            match command.status().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(%status, "{NOTIFY_SEND} exited with failure"),
                Err(e) => warn!(error = %e, "failed to run {NOTIFY_SEND}"),
            }
        });
    }
}
