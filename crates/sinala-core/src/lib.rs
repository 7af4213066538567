//! Connection lifecycle and reading classification for the sinala CO2 monitor.
//!
//! Subscribes to a single MQTT topic over a WebSocket transport, classifies
//! each ppm reading into a risk tier, and keeps the broker connection alive
//! with a capped, fixed-delay reconnect loop.
//!
//! # Features
//! - Event-driven [`ConnectionManager`] with a single owned retry deadline
//! - Pluggable [`BrokerClient`] (the bundled [`MqttBrokerClient`] uses rumqttc)
//! - Configurable threshold table with a pure [`Thresholds::classify`]
//! - Native notifications gated by a [`Permission`] flag
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), sinala_core::Error> {
//! use sinala_core::{ConnectionManager, MonitorConfig, MqttBrokerClient, event_channel};
//! # struct Quiet;
//! # impl sinala_core::Presenter for Quiet {
//! #     fn show_state(&mut self, _: sinala_core::ConnectionState) {}
//! #     fn show_reading(&mut self, _: sinala_core::Reading, _: &sinala_core::Assessment) {}
//! #     fn notify(&mut self, _: sinala_core::Notification) {}
//! # }
//!
//! let config = MonitorConfig::default();
//! config.validate()?;
//! let (events_tx, events_rx) = event_channel();
//! let client = MqttBrokerClient::new(&config.broker, events_tx.clone())?;
//! let manager = ConnectionManager::new(config, client, Quiet, sinala_core::SilentNotifier);
//! manager.run(events_rx).await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod manager;
mod mqtt;
mod notify;
mod reading;
mod types;

pub use client::{BrokerClient, EventSender, event_channel};
pub use config::{
    BrokerConfig, ConfigError, DEFAULT_TOPIC, MonitorConfig, ReconnectPolicy, Thresholds,
};
pub use manager::{ConnectionManager, Presenter};
pub use mqtt::MqttBrokerClient;
pub use notify::{
    NativeNotifier, Notification, NotificationKind, Permission, SilentNotifier,
    notify_if_permitted,
};
pub use reading::{Assessment, Reading, RiskTier, parse_reading};
pub use types::{
    ClientEvent, ConnectOptions, ConnectionState, Error, HaltReason, LossReason, ManagerEvent,
    SessionId, reason_code,
};
