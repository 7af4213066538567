//! Plain-text dashboard on stdout.

use std::fmt;
use std::io::Write;

use sinala_core::{
    Assessment, ConnectionState, Notification, NotificationKind, Presenter, Reading, RiskTier,
};
use tracing::warn;

use crate::status::StatusHandle;

const RED_BOLD: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

pub struct TerminalDashboard<W> {
    out: W,
    color: bool,
    status: Option<StatusHandle>,
}

impl<W: Write> TerminalDashboard<W> {
    pub fn new(out: W, color: bool, status: Option<StatusHandle>) -> Self {
        Self { out, color, status }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{args}").and_then(|()| self.out.flush()) {
            warn!(error = %e, "failed to write to dashboard");
        }
    }

    /// Record the final, disconnected state in the status file, if any.
    pub async fn close(self) {
        if let Some(status) = self.status {
            status
                .close(|s| s.state = ConnectionState::Disconnected)
                .await;
        }
    }

    fn emphasize(&self, text: &str) -> String {
        if self.color {
            format!("{RED_BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn tier_marker(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Safe => "[ ok ]",
        RiskTier::Warning => "[ !  ]",
        RiskTier::Alert => "[ !! ]",
        RiskTier::HighRisk => "[!!!!]",
    }
}

impl<W: Write> Presenter for TerminalDashboard<W> {
    fn show_state(&mut self, state: ConnectionState) {
        self.line(format_args!("[status] {state}"));
        if let Some(status) = &self.status {
            status.update(|s| s.state = state);
        }
    }

    fn show_reading(&mut self, reading: Reading, assessment: &Assessment) {
        let tier = if assessment.tier.is_critical() {
            self.emphasize(assessment.tier.label())
        } else {
            assessment.tier.label().to_string()
        };
        self.line(format_args!(
            "{} {reading} | {tier} | {}",
            tier_marker(assessment.tier),
            assessment.advisory
        ));
        if let Some(status) = &self.status {
            status.update(|s| {
                s.last_reading = Some(reading.ppm());
                s.tier = Some(assessment.tier);
            });
        }
    }

    fn notify(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Transient => self.line(format_args!(
                "[info] {}: {}",
                notification.title, notification.body
            )),
            NotificationKind::Persistent => self.line(format_args!(
                "[notice] {}: {}",
                notification.title, notification.body
            )),
            NotificationKind::Critical => {
                let title = self.emphasize(&format!("*** {} ***", notification.title));
                self.line(format_args!("{title}\n    {}", notification.body));
            }
        }
        if notification.is_persistent()
            && let Some(status) = &self.status
        {
            status.update(|s| s.alert = Some(notification.title.clone()));
        }
    }
}
