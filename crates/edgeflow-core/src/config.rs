//! edgeflow.toml configuration parser.
//!
//! Both sections are optional; absent values fall back to the defaults
//! (3s scoring round, 60s notification wait). Durations are written as
//! human-readable strings: `"500ms"`, `"3s"`, `"1m"`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeflowConfig {
    pub scoring: Option<ScoringConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Global budget for one scoring round (e.g., "3s").
    pub round_timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bounded wait for a session's single status notification (e.g., "60s").
    pub notify_timeout: Option<String>,
}

impl EdgeflowConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: EdgeflowConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The scoring round budget, defaulting to 3 seconds.
    pub fn round_timeout(&self) -> Duration {
        self.scoring
            .as_ref()
            .and_then(|s| s.round_timeout.as_deref())
            .and_then(parse_duration)
            .unwrap_or(Duration::from_secs(3))
    }

    /// The session notification wait, defaulting to 60 seconds.
    pub fn notify_timeout(&self) -> Duration {
        self.session
            .as_ref()
            .and_then(|s| s.notify_timeout.as_deref())
            .and_then(parse_duration)
            .unwrap_or(Duration::from_secs(60))
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
