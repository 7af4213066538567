//! Connection lifecycle: connect, react to losses, and retry on a fixed delay.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::BrokerClient;
use crate::config::MonitorConfig;
use crate::notify::{NativeNotifier, Notification, NotificationKind, notify_if_permitted};
use crate::reading::{Assessment, Reading, RiskTier, parse_reading};
use crate::types::{
    ClientEvent, ConnectOptions, ConnectionState, HaltReason, LossReason, ManagerEvent, SessionId,
};

const CRITICAL_TITLE: &str = "CRITICAL ALERT: High Risk";
const CRITICAL_BODY: &str =
    "Dangerous CO2 levels detected! Take immediate action to ventilate the area.";
const NATIVE_TITLE: &str = "Alert: gas detected";
const CRITICAL_TAG: &str = "critical-alert";

/// Where the manager sends everything the user should see.
pub trait Presenter {
    fn show_state(&mut self, state: ConnectionState);
    fn show_reading(&mut self, reading: Reading, assessment: &Assessment);
    fn notify(&mut self, notification: Notification);
}

/// Owns the broker client and drives its connection state machine.
///
/// ```text
/// Disconnected --connect()--> Connecting
/// Connecting --success--> Connected
/// Connecting --failure--> Disconnected (retry unless capped)
/// Connected --lost--> Disconnected (retry unless capped or manual)
/// ```
///
/// At most one retry is pending at any time: it is a deadline owned by the
/// manager, and every scheduling path overwrites it. Each connect starts a
/// new session; client events tagged with an older session are dropped.
pub struct ConnectionManager<C, P, N> {
    config: MonitorConfig,
    client: C,
    presenter: P,
    native: N,
    state: ConnectionState,
    attempts: u32,
    retry_at: Option<Instant>,
    halted: Option<HaltReason>,
    session: SessionId,
    /// Resume arrived while a requested disconnect was still closing.
    resume_pending: bool,
    last: Option<(Reading, RiskTier)>,
}

impl<C, P, N> ConnectionManager<C, P, N>
where
    C: BrokerClient,
    P: Presenter,
    N: NativeNotifier,
{
    pub fn new(config: MonitorConfig, client: C, presenter: P, native: N) -> Self {
        Self {
            config,
            client,
            presenter,
            native,
            state: ConnectionState::Disconnected,
            attempts: 0,
            retry_at: None,
            halted: None,
            session: 0,
            resume_pending: false,
            last: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Retries scheduled since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the pending retry fires, if one is scheduled.
    pub fn pending_retry(&self) -> Option<Instant> {
        self.retry_at
    }

    pub fn halted(&self) -> Option<HaltReason> {
        self.halted
    }

    /// Session of the most recent connect attempt. Zero before the first.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The last accepted reading and its tier.
    pub fn last_reading(&self) -> Option<(Reading, RiskTier)> {
        self.last
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    /// Take the broker client and presenter back, e.g. to let a final
    /// disconnect flush and record the stopped state.
    pub fn into_parts(self) -> (C, P) {
        (self.client, self.presenter)
    }

    /// Process events until unload or until every sender is gone.
    ///
    /// Connects immediately, then interleaves queued events with the pending
    /// retry deadline. Returns the manager so callers can inspect final state.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ManagerEvent>) -> Self {
        self.connect();
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("event queue closed, stopping");
                        break;
                    };
                    if self.handle(event).is_break() {
                        break;
                    }
                }
                _ = sleep_until_retry(self.retry_at) => {
                    self.retry_now();
                }
            }
        }
        self
    }

    /// Apply one event. Returns `Break` once the manager has been unloaded.
    pub fn handle(&mut self, event: ManagerEvent) -> ControlFlow<()> {
        match event {
            ManagerEvent::Client { session, event } if session != self.session => {
                debug!(session, current = self.session, ?event, "dropping stale client event");
            }
            ManagerEvent::Client { event, .. } => match event {
                ClientEvent::ConnectSucceeded => self.on_connect_succeeded(),
                ClientEvent::ConnectFailed(reason) => self.on_connect_failed(reason),
                ClientEvent::ConnectionLost(reason) => self.on_connection_lost(reason),
                ClientEvent::MessageArrived { topic, payload } => {
                    self.on_message_arrived(&topic, &payload)
                }
            },
            ManagerEvent::FocusRegained => self.on_focus_regained(),
            ManagerEvent::Resume => self.resume(),
            ManagerEvent::Disconnect => self.disconnect(),
            ManagerEvent::Unload => {
                self.unload();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Start a connect attempt unless one is live or in flight.
    pub fn connect(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            debug!(state = ?self.state, "already connected or connecting, not connecting");
            return;
        }
        self.retry_at = None;
        self.session = self.session.wrapping_add(1);
        self.set_state(ConnectionState::Connecting);
        let options = ConnectOptions {
            session: self.session,
            ..self.config.connect_options()
        };
        self.client.connect(options);
    }

    /// The pending retry is due: drop it and connect.
    pub fn retry_now(&mut self) {
        self.retry_at = None;
        info!(
            attempt = self.attempts,
            max = self.config.reconnect.max_attempts,
            "retrying connection"
        );
        self.connect();
    }

    fn on_connect_succeeded(&mut self) {
        if self.state == ConnectionState::Connected {
            debug!("duplicate connect success ignored");
            return;
        }
        if self.halted == Some(HaltReason::ManualDisconnect) {
            info!("connected after a disconnect was requested, closing");
            self.client.disconnect();
            self.set_state(ConnectionState::Disconnected);
            return;
        }
        info!(topic = %self.config.topic, "connected to broker");
        self.attempts = 0;
        self.halted = None;
        self.retry_at = None;
        self.set_state(ConnectionState::Connected);
        self.client.subscribe(&self.config.topic);
        self.presenter.notify(Notification::new(
            "Connection established",
            "Connected to the MQTT broker.",
            NotificationKind::Transient,
        ));
    }

    fn on_connect_failed(&mut self, reason: LossReason) {
        warn!(%reason, "connect attempt failed");
        self.set_state(ConnectionState::Disconnected);
        self.schedule_reconnect();
    }

    fn on_connection_lost(&mut self, reason: LossReason) {
        self.set_state(ConnectionState::Disconnected);
        let resume = std::mem::take(&mut self.resume_pending);
        if reason.is_manual() && resume {
            info!("connection closed on request, resuming as asked");
            self.connect();
            return;
        }
        if reason.is_manual() {
            info!("connection closed on request, not reconnecting");
            self.retry_at = None;
            self.halted = Some(HaltReason::ManualDisconnect);
            return;
        }
        warn!(%reason, "connection lost");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if let Some(reason) = self.halted {
            debug!(?reason, "session halted, no retry scheduled");
            return;
        }
        let max = self.config.reconnect.max_attempts;
        if self.attempts >= max {
            warn!(max, "maximum reconnect attempts reached");
            self.retry_at = None;
            self.halted = Some(HaltReason::Exhausted);
            self.presenter.notify(Notification::new(
                "Connection failed",
                "Could not reach the server. Check your internet connection.",
                NotificationKind::Persistent,
            ));
            return;
        }
        self.attempts += 1;
        let delay = self.config.reconnect.delay();
        info!(
            attempt = self.attempts,
            max,
            delay_ms = delay.as_millis() as u64,
            "scheduling reconnect"
        );
        self.retry_at = Some(Instant::now() + delay);
    }

    fn on_message_arrived(&mut self, topic: &str, payload: &str) {
        let Some(reading) = parse_reading(payload) else {
            debug!(topic, payload, "discarding non-numeric reading");
            return;
        };
        let assessment = self.config.thresholds.assess(reading);
        info!(ppm = reading.ppm(), tier = %assessment.tier, "reading received");
        self.last = Some((reading, assessment.tier));
        self.presenter.show_reading(reading, &assessment);

        if assessment.tier.is_critical() {
            self.presenter.notify(Notification::new(
                CRITICAL_TITLE,
                CRITICAL_BODY,
                NotificationKind::Critical,
            ));
            notify_if_permitted(&mut self.native, NATIVE_TITLE, CRITICAL_BODY, CRITICAL_TAG);
        }
    }

    fn on_focus_regained(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            return;
        }
        if let Some(reason) = self.halted {
            debug!(?reason, "focus regained but session is halted");
            return;
        }
        info!("focus regained while disconnected, reconnecting now");
        self.connect();
    }

    /// Leave a halted session and try again with a fresh attempt budget.
    pub fn resume(&mut self) {
        info!(halted = ?self.halted, "resume requested");
        if self.halted == Some(HaltReason::ManualDisconnect)
            && self.state == ConnectionState::Connected
        {
            debug!("disconnect still closing, reconnecting once it has");
            self.resume_pending = true;
        }
        self.halted = None;
        self.attempts = 0;
        self.connect();
    }

    /// Close the connection on purpose. No retry follows.
    pub fn disconnect(&mut self) {
        self.retry_at = None;
        self.resume_pending = false;
        self.halted = Some(HaltReason::ManualDisconnect);
        if self.client.is_connected() {
            info!("disconnecting on request");
            self.client.disconnect();
        } else {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Cancel the pending retry and close a live connection.
    pub fn unload(&mut self) {
        if self.retry_at.take().is_some() {
            debug!("pending retry cancelled");
        }
        if self.client.is_connected() {
            info!("closing connection before exit");
            self.client.disconnect();
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "connection state changed");
        self.state = state;
        self.presenter.show_state(state);
    }
}

/// Sleep until the retry deadline, or pend forever if none is scheduled.
async fn sleep_until_retry(retry_at: Option<Instant>) {
    match retry_at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::notify::Permission;
    use crate::types::reason_code;

    #[derive(Default)]
    struct FakeClient {
        connects: Vec<ConnectOptions>,
        subscriptions: Vec<String>,
        disconnects: usize,
        connected: bool,
    }

    impl BrokerClient for FakeClient {
        fn connect(&mut self, options: ConnectOptions) {
            self.connects.push(options);
        }

        fn subscribe(&mut self, topic: &str) {
            self.subscriptions.push(topic.to_string());
        }

        fn disconnect(&mut self) {
            self.disconnects += 1;
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        states: Vec<ConnectionState>,
        readings: Vec<(Reading, RiskTier)>,
        notifications: Vec<Notification>,
    }

    impl Presenter for RecordingPresenter {
        fn show_state(&mut self, state: ConnectionState) {
            self.states.push(state);
        }

        fn show_reading(&mut self, reading: Reading, assessment: &Assessment) {
            self.readings.push((reading, assessment.tier));
        }

        fn notify(&mut self, notification: Notification) {
            self.notifications.push(notification);
        }
    }

    struct FakeNative {
        permission: Permission,
        shown: Vec<(String, String)>,
    }

    impl NativeNotifier for FakeNative {
        fn permission(&self) -> Permission {
            self.permission
        }

        fn show(&mut self, title: &str, _body: &str, tag: &str) {
            self.shown.push((title.to_string(), tag.to_string()));
        }
    }

    type Manager = ConnectionManager<FakeClient, RecordingPresenter, FakeNative>;

    fn manager_with(permission: Permission) -> Manager {
        ConnectionManager::new(
            MonitorConfig::default(),
            FakeClient::default(),
            RecordingPresenter::default(),
            FakeNative {
                permission,
                shown: Vec::new(),
            },
        )
    }

    fn manager() -> Manager {
        manager_with(Permission::Default)
    }

    /// Deliver `event` as if reported for the current session.
    fn report(m: &mut Manager, event: ClientEvent) {
        let session = m.session();
        let _ = m.handle(event.for_session(session));
    }

    fn succeed(m: &mut Manager) {
        m.client.connected = true;
        report(m, ClientEvent::ConnectSucceeded);
    }

    fn refused() -> ClientEvent {
        ClientEvent::ConnectFailed(LossReason::new(reason_code::TRANSPORT, "refused"))
    }

    fn fail(m: &mut Manager) {
        report(m, refused());
    }

    fn lose(m: &mut Manager, code: i32) {
        m.client.connected = false;
        report(m, ClientEvent::ConnectionLost(LossReason::new(code, "gone")));
    }

    fn message(m: &mut Manager, payload: &str) {
        report(
            m,
            ClientEvent::MessageArrived {
                topic: "sinala/ppm/value".to_string(),
                payload: payload.to_string(),
            },
        );
    }

    fn persistent_count(m: &Manager) -> usize {
        m.presenter
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::Persistent)
            .count()
    }

    #[test]
    fn connect_issues_secure_request_with_timeout() {
        let mut m = manager();
        m.connect();
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(
            m.client.connects,
            vec![ConnectOptions {
                secure: true,
                timeout: Duration::from_secs(10),
                session: 1,
            }]
        );
    }

    #[test]
    fn connect_is_a_noop_while_connecting_or_connected() {
        let mut m = manager();
        m.connect();
        m.connect();
        assert_eq!(m.client.connects.len(), 1);

        succeed(&mut m);
        m.connect();
        assert_eq!(m.client.connects.len(), 1);
    }

    #[test]
    fn success_resets_counter_subscribes_and_notifies() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        m.retry_now();
        assert_eq!(m.attempts(), 1);

        succeed(&mut m);
        assert_eq!(m.state(), ConnectionState::Connected);
        assert_eq!(m.attempts(), 0);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.client.subscriptions, vec!["sinala/ppm/value".to_string()]);
        let last = m.presenter.notifications.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Transient);
        assert_eq!(last.title, "Connection established");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_schedules_one_retry_after_fixed_delay() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.attempts(), 1);
        assert_eq!(
            m.pending_retry(),
            Some(Instant::now() + Duration::from_millis(5000))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_manual_loss_schedules_retry() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        lose(&mut m, reason_code::TRANSPORT);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.attempts(), 1);
        assert_eq!(
            m.pending_retry(),
            Some(Instant::now() + Duration::from_millis(5000))
        );
        assert!(m.halted().is_none());
    }

    #[test]
    fn manual_loss_never_retries() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        lose(&mut m, reason_code::MANUAL_DISCONNECT);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.attempts(), 0);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.halted(), Some(HaltReason::ManualDisconnect));
    }

    #[test]
    fn ceiling_stops_retries_and_notifies_once() {
        let mut m = manager();
        m.connect();
        for _ in 0..10 {
            fail(&mut m);
            assert!(m.pending_retry().is_some());
            m.retry_now();
        }
        assert_eq!(m.attempts(), 10);
        assert_eq!(m.client.connects.len(), 11);

        fail(&mut m);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.halted(), Some(HaltReason::Exhausted));
        assert_eq!(persistent_count(&m), 1);

        // Late losses and focus must not re-notify or reconnect.
        lose(&mut m, reason_code::TRANSPORT);
        let _ = m.handle(ManagerEvent::FocusRegained);
        assert_eq!(persistent_count(&m), 1);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.client.connects.len(), 11);
    }

    #[test]
    fn zero_ceiling_halts_on_first_failure() {
        let mut config = MonitorConfig::default();
        config.reconnect.max_attempts = 0;
        let mut m = ConnectionManager::new(
            config,
            FakeClient::default(),
            RecordingPresenter::default(),
            FakeNative {
                permission: Permission::Denied,
                shown: Vec::new(),
            },
        );
        m.connect();
        fail(&mut m);
        assert_eq!(m.halted(), Some(HaltReason::Exhausted));
        assert_eq!(persistent_count(&m), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_retry() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        let first = m.pending_retry().unwrap();

        tokio::time::advance(Duration::from_millis(1000)).await;
        lose(&mut m, reason_code::TRANSPORT);
        let second = m.pending_retry().unwrap();
        assert_eq!(second, first + Duration::from_millis(1000));
        assert_eq!(m.attempts(), 2);
    }

    #[test]
    fn readings_are_classified_and_shown() {
        let mut m = manager();
        message(&mut m, "42");
        assert_eq!(m.last_reading(), Some((Reading(42), RiskTier::Warning)));
        assert_eq!(m.presenter.readings, vec![(Reading(42), RiskTier::Warning)]);
        assert!(m.presenter.notifications.is_empty());
    }

    #[test]
    fn alert_tier_does_not_notify() {
        let mut m = manager_with(Permission::Granted);
        message(&mut m, "499");
        assert_eq!(m.last_reading(), Some((Reading(499), RiskTier::Alert)));
        assert!(m.presenter.notifications.is_empty());
        assert!(m.native.shown.is_empty());
    }

    #[test]
    fn non_numeric_payload_keeps_previous_reading() {
        let mut m = manager();
        message(&mut m, "120");
        message(&mut m, "n/a");
        message(&mut m, "");
        assert_eq!(m.last_reading(), Some((Reading(120), RiskTier::Alert)));
        assert_eq!(m.presenter.readings.len(), 1);
    }

    #[test]
    fn high_risk_reading_raises_critical_alert_when_granted() {
        let mut m = manager_with(Permission::Granted);
        message(&mut m, "750");
        assert_eq!(m.last_reading(), Some((Reading(750), RiskTier::HighRisk)));
        let n = m.presenter.notifications.last().unwrap();
        assert_eq!(n.kind, NotificationKind::Critical);
        assert!(n.is_persistent());
        assert_eq!(
            m.native.shown,
            vec![(NATIVE_TITLE.to_string(), CRITICAL_TAG.to_string())]
        );
    }

    #[test]
    fn high_risk_reading_skips_native_without_permission() {
        for permission in [Permission::Default, Permission::Denied] {
            let mut m = manager_with(permission);
            message(&mut m, "750");
            assert_eq!(
                m.presenter.notifications.last().map(|n| n.kind),
                Some(NotificationKind::Critical)
            );
            assert!(m.native.shown.is_empty());
        }
    }

    #[test]
    fn focus_reconnects_immediately_and_cancels_retry() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        assert!(m.pending_retry().is_some());

        let _ = m.handle(ManagerEvent::FocusRegained);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.client.connects.len(), 2);
        assert_eq!(m.attempts(), 1);
    }

    #[test]
    fn focus_while_connected_does_nothing() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        let _ = m.handle(ManagerEvent::FocusRegained);
        assert_eq!(m.client.connects.len(), 1);
    }

    #[test]
    fn resume_leaves_exhausted_session_with_fresh_budget() {
        let mut m = manager();
        m.connect();
        for _ in 0..10 {
            fail(&mut m);
            m.retry_now();
        }
        fail(&mut m);
        assert_eq!(m.halted(), Some(HaltReason::Exhausted));

        let _ = m.handle(ManagerEvent::Resume);
        assert!(m.halted().is_none());
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.client.connects.len(), 12);
    }

    #[test]
    fn disconnect_closes_live_connection_without_retry() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        let _ = m.handle(ManagerEvent::Disconnect);
        assert_eq!(m.client.disconnects, 1);
        lose(&mut m, reason_code::MANUAL_DISCONNECT);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.halted(), Some(HaltReason::ManualDisconnect));
    }

    #[test]
    fn disconnect_cancels_pending_retry() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        let _ = m.handle(ManagerEvent::Disconnect);
        assert!(m.pending_retry().is_none());
        assert_eq!(m.client.disconnects, 0);
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn late_success_after_disconnect_is_closed() {
        let mut m = manager();
        m.connect();
        let _ = m.handle(ManagerEvent::Disconnect);
        succeed(&mut m);
        assert_eq!(m.client.disconnects, 1);
        assert!(m.client.subscriptions.is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn each_connect_starts_a_new_session() {
        let mut m = manager();
        assert_eq!(m.session(), 0);
        m.connect();
        fail(&mut m);
        m.retry_now();
        let sessions: Vec<_> = m.client.connects.iter().map(|o| o.session).collect();
        assert_eq!(sessions, vec![1, 2]);
        assert_eq!(m.session(), 2);
    }

    #[test]
    fn failure_from_an_abandoned_attempt_is_ignored() {
        let mut m = manager();
        m.connect();
        let abandoned = m.session();
        let _ = m.handle(ManagerEvent::Disconnect);
        let _ = m.handle(ManagerEvent::Resume);
        assert_eq!(m.state(), ConnectionState::Connecting);

        let _ = m.handle(refused().for_session(abandoned));
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.attempts(), 0);
        assert!(m.pending_retry().is_none());

        let _ = m.handle(ClientEvent::ConnectSucceeded.for_session(abandoned));
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(m.client.subscriptions.is_empty());

        succeed(&mut m);
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn resume_while_disconnect_is_closing_reconnects_after_close() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        let _ = m.handle(ManagerEvent::Disconnect);
        assert_eq!(m.client.disconnects, 1);

        let _ = m.handle(ManagerEvent::Resume);
        assert_eq!(m.client.connects.len(), 1);
        assert!(m.halted().is_none());

        lose(&mut m, reason_code::MANUAL_DISCONNECT);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.client.connects.len(), 2);
        assert!(m.halted().is_none());
        assert!(m.pending_retry().is_none());
    }

    #[test]
    fn disconnect_after_resume_wins() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        let _ = m.handle(ManagerEvent::Disconnect);
        let _ = m.handle(ManagerEvent::Resume);
        let _ = m.handle(ManagerEvent::Disconnect);

        lose(&mut m, reason_code::MANUAL_DISCONNECT);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.client.connects.len(), 1);
        assert_eq!(m.halted(), Some(HaltReason::ManualDisconnect));
    }

    #[test]
    fn unload_with_pending_retry_and_no_connection() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        assert!(m.pending_retry().is_some());

        assert!(m.handle(ManagerEvent::Unload).is_break());
        assert!(m.pending_retry().is_none());
        assert_eq!(m.client.disconnects, 0);
    }

    #[test]
    fn unload_disconnects_live_connection() {
        let mut m = manager();
        m.connect();
        succeed(&mut m);
        assert!(m.handle(ManagerEvent::Unload).is_break());
        assert_eq!(m.client.disconnects, 1);
    }

    #[test]
    fn state_changes_reach_presenter() {
        let mut m = manager();
        m.connect();
        fail(&mut m);
        m.retry_now();
        succeed(&mut m);
        assert_eq!(
            m.presenter.states,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ]
        );
    }
}
