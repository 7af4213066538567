//! The broker client seam the manager drives.

use tokio::sync::mpsc;

use crate::types::{ConnectOptions, ManagerEvent};

/// Sending half of the manager's event queue.
pub type EventSender = mpsc::UnboundedSender<ManagerEvent>;

/// Create the queue every event source feeds into the manager.
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<ManagerEvent>) {
    mpsc::unbounded_channel()
}

/// A publish/subscribe client capable of one connection at a time.
///
/// Calls are fire-and-forget. Outcomes come back as
/// [`ClientEvent`](crate::ClientEvent)s on the event queue the client was
/// created with.
pub trait BrokerClient {
    /// Start a connect attempt. Reports `ConnectSucceeded` or `ConnectFailed`.
    fn connect(&mut self, options: ConnectOptions);

    fn subscribe(&mut self, topic: &str);

    /// Close the live connection. Reports `ConnectionLost` with the manual
    /// disconnect code.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}
