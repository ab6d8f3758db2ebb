use serde::Deserialize;

use crate::broker::SlowConsumerPolicy;

/// Top-level configuration settings for the application.
///
/// Includes settings for the HTTP server, the broker and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the bind address, the optional static asset directory served at
/// `/`, the publish body limit and the SSE keep-alive interval.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<String>,
    pub max_body_bytes: usize,
    pub keep_alive_secs: u64,
}

/// Configuration settings for the broker.
///
/// Controls how many messages are replayed to new clients and how a
/// subscriber that cannot keep up is treated.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub history_capacity: usize,
    pub subscriber_buffer: usize,
    pub slow_consumer: SlowConsumerPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub max_body_bytes: Option<usize>,
    pub keep_alive_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub history_capacity: Option<usize>,
    pub subscriber_buffer: Option<usize>,
    pub slow_consumer: Option<SlowConsumerPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5000,
                static_dir: None,
                max_body_bytes: 64 * 1024,
                keep_alive_secs: 15,
            },
            broker: BrokerSettings {
                history_capacity: 10,
                subscriber_buffer: 64,
                slow_consumer: SlowConsumerPolicy::Disconnect,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let server = self.server;
        let broker = self.broker;
        let log = self.log;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                static_dir: server
                    .as_ref()
                    .and_then(|s| s.static_dir.clone())
                    .or(default.server.static_dir),
                max_body_bytes: server
                    .as_ref()
                    .and_then(|s| s.max_body_bytes)
                    .unwrap_or(default.server.max_body_bytes),
                keep_alive_secs: server
                    .as_ref()
                    .and_then(|s| s.keep_alive_secs)
                    .unwrap_or(default.server.keep_alive_secs),
            },
            broker: BrokerSettings {
                history_capacity: broker
                    .as_ref()
                    .and_then(|b| b.history_capacity)
                    .unwrap_or(default.broker.history_capacity),
                subscriber_buffer: broker
                    .as_ref()
                    .and_then(|b| b.subscriber_buffer)
                    .unwrap_or(default.broker.subscriber_buffer),
                slow_consumer: broker
                    .as_ref()
                    .and_then(|b| b.slow_consumer)
                    .unwrap_or(default.broker.slow_consumer),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }
}
