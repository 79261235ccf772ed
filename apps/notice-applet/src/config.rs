//! Applet configuration.
//!
//! Stored as TOML at `~/.config/notice-applet/applet.toml`. Missing keys
//! fall back to their defaults, so a partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notice_agent_client::AgentSettings;
use notice_engine::{DISPLAY_LIMIT, EngineConfig, TITLE_LIMIT, Timing};
use notice_protocol::constants::{AGENT_BUS_NAME, AGENT_OBJECT_PATH};
use serde::{Deserialize, Serialize};

/// Applet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Well-known bus name of the notice agent.
    #[serde(default = "default_agent_bus_name")]
    pub agent_bus_name: String,

    /// Object path of the notice agent.
    #[serde(default = "default_agent_object_path")]
    pub agent_object_path: String,

    /// systemd unit probed before connecting to the agent.
    #[serde(default = "default_agent_unit")]
    pub agent_unit: String,

    /// Delay before a failed poll is retried, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub retry_delay_ms: u64,

    /// Period of the dispatch loop, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub dispatch_interval_ms: u64,

    /// Maximum notifications on screen at once.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Character budget of a notification title.
    #[serde(default = "default_title_limit")]
    pub title_limit: usize,

    /// How long a notification stays up, in milliseconds.
    #[serde(default = "default_notification_timeout_ms")]
    pub notification_timeout_ms: i32,

    /// Count NetworkManager's "local only" state as connected.
    #[serde(default)]
    pub treat_local_network_as_connected: bool,
}

fn default_agent_bus_name() -> String {
    AGENT_BUS_NAME.into()
}

fn default_agent_object_path() -> String {
    AGENT_OBJECT_PATH.into()
}

fn default_agent_unit() -> String {
    "gooroom-agent.service".into()
}

fn default_interval_ms() -> u64 {
    500
}

fn default_display_limit() -> usize {
    DISPLAY_LIMIT
}

fn default_title_limit() -> usize {
    TITLE_LIMIT
}

fn default_notification_timeout_ms() -> i32 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_bus_name: default_agent_bus_name(),
            agent_object_path: default_agent_object_path(),
            agent_unit: default_agent_unit(),
            retry_delay_ms: default_interval_ms(),
            dispatch_interval_ms: default_interval_ms(),
            display_limit: default_display_limit(),
            title_limit: default_title_limit(),
            notification_timeout_ms: default_notification_timeout_ms(),
            treat_local_network_as_connected: false,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            bus_name: self.agent_bus_name.clone(),
            object_path: self.agent_object_path.clone(),
            unit: self.agent_unit.clone(),
        }
    }

    /// Dispatch limits. A zero display limit would stall the queue, so it is
    /// raised to one.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            display_limit: self.display_limit.max(1),
            title_limit: self.title_limit,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            dispatch_interval: Duration::from_millis(self.dispatch_interval_ms),
        }
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("notice-applet")
        .join("applet.toml")
}
