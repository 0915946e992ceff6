//! Configuration for sla-daemon

use serde::{Deserialize, Serialize};
use sla_engine::{EngineConfig, LifecycleCloser};
use std::net::{Ipv4Addr, SocketAddr};

/// Longest accepted scheduler interval (one week)
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted auto-close grace period (ten years)
pub const MAX_GRACE_PERIOD_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// SLA rules
    #[serde(default)]
    pub sla: SlaConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// REST server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between evaluation cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run a cycle immediately at startup instead of after one interval
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            run_on_start: true,
        }
    }
}

/// SLA rules that are not carried on the ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Seconds a ticket stays Resolved before it is auto-closed
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
        }
    }
}

impl SlaConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let secs = self.grace_period_secs.min(MAX_GRACE_PERIOD_SECS) as i64;
        EngineConfig {
            close_grace_period: chrono::Duration::seconds(secs),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL helpdesk and tracking tables
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Outbound mail configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MailConfig {
    /// Log every message instead of delivering it
    #[default]
    Log,

    /// POST each message as JSON to a mail relay
    Webhook {
        url: String,

        /// Request timeout in seconds
        #[serde(default = "default_request_timeout")]
        timeout_secs: u64,
    },
}

/// REST server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Serve the REST API
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_listen_addr(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    300
}

fn default_grace_period() -> u64 {
    LifecycleCloser::DEFAULT_GRACE_SECS as u64
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8089))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `SLA_`-prefixed environment variables (`SLA_SCHEDULER__INTERVAL_SECS`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with SLA_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SLA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: DaemonConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler or the closer cannot work with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let interval = self.scheduler.interval_secs;
        if interval == 0 || interval > MAX_INTERVAL_SECS {
            return Err(config::ConfigError::Message(format!(
                "scheduler.interval_secs must be between 1 and {}, got {}",
                MAX_INTERVAL_SECS, interval
            )));
        }

        let grace = self.sla.grace_period_secs;
        if grace > MAX_GRACE_PERIOD_SECS {
            return Err(config::ConfigError::Message(format!(
                "sla.grace_period_secs must be at most {}, got {}",
                MAX_GRACE_PERIOD_SECS, grace
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8089);
        assert!(config.server.enabled);
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert!(matches!(config.mail, MailConfig::Log));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval_secs, 300);
        assert!(config.run_on_start);
    }

    #[test]
    fn test_grace_period_becomes_engine_config() {
        let sla = SlaConfig::default();
        assert_eq!(sla.grace_period_secs, 172_800);
        assert_eq!(
            sla.engine_config().close_grace_period,
            chrono::Duration::days(2)
        );

        let short = SlaConfig {
            grace_period_secs: 90,
        };
        assert_eq!(
            short.engine_config().close_grace_period,
            chrono::Duration::seconds(90)
        );
    }

    #[test]
    fn test_tagged_sections_deserialize() {
        let json = serde_json::json!({
            "storage": { "type": "postgres", "url": "postgres://localhost/helpdesk" },
            "mail": { "type": "webhook", "url": "http://relay.local/send" }
        });
        let config: DaemonConfig = serde_json::from_value(json).unwrap();

        match config.storage {
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                assert_eq!(url, "postgres://localhost/helpdesk");
                assert_eq!(max_connections, 10);
                assert_eq!(connect_timeout_secs, 5);
            }
            other => panic!("unexpected storage config: {:?}", other),
        }
        assert!(matches!(
            config.mail,
            MailConfig::Webhook { timeout_secs: 10, .. }
        ));
        assert_eq!(config.scheduler.interval_secs, 300);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.sla.grace_period_secs, 172_800);
        assert!(matches!(config.storage, StorageConfig::Memory));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        assert!(DaemonConfig::default().validate().is_ok());

        let mut config = DaemonConfig::default();
        config.sla.grace_period_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.scheduler.interval_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_config_clamps_grace_period() {
        let sla = SlaConfig {
            grace_period_secs: u64::MAX,
        };
        assert_eq!(
            sla.engine_config().close_grace_period,
            chrono::Duration::seconds(MAX_GRACE_PERIOD_SECS as i64)
        );
    }
}
