//! [`BrokerClient`] over MQTT-on-WebSocket, backed by rumqttc.
//!
//! Every connect spawns one task owning a fresh rumqttc event loop. The task
//! reports the CONNACK (or its absence), forwards publishes, and ends on the
//! first transport error. rumqttc's own reconnect is never used; retries
//! belong to the [`ConnectionManager`](crate::ConnectionManager).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport,
};
use tokio::task::JoinHandle;

use crate::client::{BrokerClient, EventSender};
use crate::config::BrokerConfig;
use crate::types::{ClientEvent, ConnectOptions, Error, LossReason, SessionId, reason_code};

const CLIENT_ID_PREFIX: &str = "sinala-";
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Build the WebSocket URL rumqttc connects to.
pub(crate) fn broker_url(broker: &BrokerConfig, secure: bool) -> Result<url::Url, Error> {
    let scheme = if secure { "wss" } else { "ws" };
    let mut u = url::Url::parse(&format!("{scheme}://{}:{}", broker.host, broker.port))?;
    if u.host_str().is_none_or(str::is_empty) {
        return Err(Error::BrokerUrl(broker.host.clone()));
    }
    u.set_path(&broker.path);
    Ok(u)
}

fn client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let short = id.get(..8).unwrap_or(&id);
    format!("{CLIENT_ID_PREFIX}{short}")
}

pub(crate) fn mqtt_options(
    broker: &BrokerConfig,
    client_id: &str,
    secure: bool,
) -> Result<MqttOptions, Error> {
    let url = broker_url(broker, secure)?;
    // rumqttc's WebSocket transports take the full URL in place of the host.
    let mut opts = MqttOptions::new(client_id, url.as_str(), broker.port);
    opts.set_keep_alive(Duration::from_secs(broker.keep_alive_secs))
        .set_clean_session(true)
        .set_transport(if secure {
            Transport::wss_with_default_config()
        } else {
            Transport::Ws
        });
    Ok(opts)
}

fn loss_reason(err: &ConnectionError) -> LossReason {
    let code = match err {
        ConnectionError::ConnectionRefused(_) => reason_code::CONNECTION_REFUSED,
        ConnectionError::Io(_) => reason_code::TRANSPORT,
        _ => reason_code::PROTOCOL,
    };
    LossReason::new(code, err.to_string())
}

struct Session {
    id: SessionId,
    client: AsyncClient,
    task: JoinHandle<()>,
    manual: Arc<AtomicBool>,
}

pub struct MqttBrokerClient {
    broker: BrokerConfig,
    client_id: String,
    events: EventSender,
    connected: Arc<AtomicBool>,
    session: Option<Session>,
}

impl MqttBrokerClient {
    /// Create a client reporting to `events`. Nothing connects until
    /// [`BrokerClient::connect`] is called.
    pub fn new(broker: &BrokerConfig, events: EventSender) -> Result<Self, Error> {
        broker_url(broker, broker.secure)?;
        Ok(Self {
            broker: broker.clone(),
            client_id: client_id(),
            events,
            connected: Arc::new(AtomicBool::new(false)),
            session: None,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Wait up to `grace` for the session task to finish, then drop it.
    ///
    /// Call after [`BrokerClient::disconnect`] so the DISCONNECT packet
    /// reaches the broker before the process exits.
    pub async fn wait_closed(&mut self, grace: Duration) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if tokio::time::timeout(grace, &mut session.task).await.is_err() {
            tracing::debug!("session still running after grace period, aborting");
            session.task.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    fn report(&self, session: SessionId, event: ClientEvent) {
        if self.events.send(event.for_session(session)).is_err() {
            tracing::debug!("event queue closed, dropping client event");
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.task.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl BrokerClient for MqttBrokerClient {
    fn connect(&mut self, options: ConnectOptions) {
        self.end_session();

        let opts = match mqtt_options(&self.broker, &self.client_id, options.secure) {
            Ok(opts) => opts,
            Err(e) => {
                self.report(
                    options.session,
                    ClientEvent::ConnectFailed(LossReason::new(reason_code::PROTOCOL, e.to_string())),
                );
                return;
            }
        };
        tracing::info!(
            broker = %opts.broker_address().0,
            client_id = %self.client_id,
            session = options.session,
            "connecting to broker"
        );

        let (client, eventloop) = AsyncClient::new(opts, REQUEST_CHANNEL_CAPACITY);
        let manual = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(drive(
            eventloop,
            SessionEvents {
                session: options.session,
                events: self.events.clone(),
            },
            self.connected.clone(),
            manual.clone(),
            options.timeout,
        ));
        self.session = Some(Session {
            id: options.session,
            client,
            task,
            manual,
        });
    }

    fn subscribe(&mut self, topic: &str) {
        let Some(session) = &self.session else {
            tracing::warn!(topic, "subscribe without a session");
            return;
        };
        match session.client.try_subscribe(topic, QoS::AtMostOnce) {
            Ok(()) => tracing::info!(topic, "subscribed"),
            Err(e) => tracing::warn!(topic, "subscribe failed: {e}"),
        }
    }

    fn disconnect(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        session.manual.store(true, Ordering::SeqCst);
        if let Err(e) = session.client.try_disconnect() {
            tracing::warn!("disconnect request failed, dropping session: {e}");
            let id = session.id;
            self.end_session();
            self.report(id, ClientEvent::ConnectionLost(LossReason::manual()));
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for MqttBrokerClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.task.abort();
        }
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = eventloop.poll().await? {
            return Ok(());
        }
    }
}

/// Event sender bound to one session.
struct SessionEvents {
    session: SessionId,
    events: EventSender,
}

impl SessionEvents {
    fn send(&self, event: ClientEvent) {
        let _ = self.events.send(event.for_session(self.session));
    }
}

/// Decide whether a polled result ends an established session, and why.
///
/// Once this client has asked to disconnect, any end of the event loop counts
/// as a manual disconnect so the manager never retries it.
fn session_end(polled: &Result<Event, ConnectionError>, manual: bool) -> Option<LossReason> {
    match polled {
        Ok(Event::Outgoing(Outgoing::Disconnect)) => Some(LossReason::manual()),
        Ok(_) => None,
        Err(e) if manual => {
            tracing::debug!("event loop ended after disconnect: {e}");
            Some(LossReason::manual())
        }
        Err(e) => Some(loss_reason(e)),
    }
}

async fn drive(
    mut eventloop: EventLoop,
    events: SessionEvents,
    connected: Arc<AtomicBool>,
    manual: Arc<AtomicBool>,
    timeout: Duration,
) {
    let send = |event: ClientEvent| events.send(event);

    match tokio::time::timeout(timeout, wait_for_connack(&mut eventloop)).await {
        Ok(Ok(())) => {
            connected.store(true, Ordering::SeqCst);
            send(ClientEvent::ConnectSucceeded);
        }
        Ok(Err(e)) => {
            send(ClientEvent::ConnectFailed(loss_reason(&e)));
            return;
        }
        Err(_) => {
            send(ClientEvent::ConnectFailed(LossReason::new(
                reason_code::TIMEOUT,
                format!("no CONNACK within {}s", timeout.as_secs_f32()),
            )));
            return;
        }
    }

    let reason = loop {
        let polled = eventloop.poll().await;
        if let Ok(Event::Incoming(Packet::Publish(publish))) = &polled {
            match std::str::from_utf8(&publish.payload) {
                Ok(payload) => send(ClientEvent::MessageArrived {
                    topic: publish.topic.clone(),
                    payload: payload.to_string(),
                }),
                Err(_) => {
                    tracing::debug!(topic = %publish.topic, "discarding non-UTF-8 payload");
                }
            }
        }
        if let Some(reason) = session_end(&polled, manual.load(Ordering::SeqCst)) {
            break reason;
        }
    };

    connected.store(false, Ordering::SeqCst);
    send(ClientEvent::ConnectionLost(reason));
}
