//! Monitor configuration with the fixed defaults baked in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notify::Permission;
use crate::types::ConnectOptions;

pub const DEFAULT_TOPIC: &str = "sinala/ppm/value";
pub(crate) const DEFAULT_BROKER_HOST: &str = "broker.hivemq.com";
pub(crate) const DEFAULT_BROKER_PORT: u16 = 8884;
pub(crate) const DEFAULT_BROKER_PATH: &str = "/mqtt";
pub(crate) const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 5000;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_WARNING_PPM: i64 = 10;
pub(crate) const DEFAULT_ALERT_PPM: i64 = 100;
pub(crate) const DEFAULT_HIGH_RISK_PPM: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        max: u64,
        value: u64,
    },

    #[error("topic must not contain wildcards: {0}")]
    WildcardTopic(String),

    #[error(
        "thresholds must increase: warning_ppm ({warning}) < alert_ppm ({alert}) < high_risk_ppm ({high_risk})"
    )]
    Thresholds {
        warning: i64,
        alert: i64,
        high_risk: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub broker: BrokerConfig,
    pub topic: String,
    pub reconnect: ReconnectPolicy,
    pub connect_timeout_secs: u64,
    pub thresholds: Thresholds,
    pub notifications: Permission,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            topic: DEFAULT_TOPIC.to_string(),
            reconnect: ReconnectPolicy::default(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            thresholds: Thresholds::default(),
            notifications: Permission::Default,
        }
    }
}

impl MonitorConfig {
    /// Reject values the manager cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        if self.topic.is_empty() {
            return Err(ConfigError::Empty { field: "topic" });
        }
        if self.topic.contains(['#', '+']) {
            return Err(ConfigError::WildcardTopic(self.topic.clone()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "connect_timeout_secs",
            });
        }
        self.reconnect.validate()?;
        self.thresholds.validate()
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            secure: self.broker.secure,
            timeout: Duration::from_secs(self.connect_timeout_secs),
            session: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// WebSocket path on the broker, e.g. `/mqtt`.
    pub path: String,
    pub secure: bool,
    pub keep_alive_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER_HOST.to_string(),
            port: DEFAULT_BROKER_PORT,
            path: DEFAULT_BROKER_PATH.to_string(),
            secure: true,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl BrokerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Empty {
                field: "broker.host",
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Zero {
                field: "broker.port",
            });
        }
        // MQTT carries keep-alive as a 16-bit number of seconds.
        let max = u64::from(u16::MAX);
        if self.keep_alive_secs > max {
            return Err(ConfigError::TooLarge {
                field: "broker.keep_alive_secs",
                max,
                value: self.keep_alive_secs,
            });
        }
        Ok(())
    }
}

/// Fixed-delay reconnect policy: every retry waits the same interval and
/// retries stop once `max_attempts` have been scheduled without a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_ms == 0 {
            return Err(ConfigError::Zero {
                field: "reconnect.delay_ms",
            });
        }
        Ok(())
    }
}

/// Lower bounds (inclusive) of each tier above Safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub warning_ppm: i64,
    pub alert_ppm: i64,
    pub high_risk_ppm: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_ppm: DEFAULT_WARNING_PPM,
            alert_ppm: DEFAULT_ALERT_PPM,
            high_risk_ppm: DEFAULT_HIGH_RISK_PPM,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.warning_ppm < self.alert_ppm && self.alert_ppm < self.high_risk_ppm {
            Ok(())
        } else {
            Err(ConfigError::Thresholds {
                warning: self.warning_ppm,
                alert: self.alert_ppm,
                high_risk: self.high_risk_ppm,
            })
        }
    }
}
