//! Engine configuration
//!
//! Configuration is constructed once and passed explicitly to the
//! components that need it. The narrative capability probe reads
//! `NarrativeConfig` from its caller rather than any process-wide state,
//! which keeps the engine testable without environment setup.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the AI-backed narrative branch
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Chat model requested from the narrative capability
    pub model: String,

    /// Sampling temperature for narrative generation
    pub temperature: f64,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Timeout for the single remote narrative call
    pub timeout: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the analysis API binds to
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 8080).into(),
        }
    }
}

/// Top-level configuration for the monitoring engine
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub narrative: NarrativeConfig,
    pub server: ServerConfig,
}

impl MonitorConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `MONITOR_BIND`, `MONITOR_NARRATIVE_MODEL`,
    /// `MONITOR_NARRATIVE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("MONITOR_BIND") {
            match bind.parse() {
                Ok(addr) => config.server.bind_addr = addr,
                Err(_) => tracing::warn!(%bind, "ignoring unparseable MONITOR_BIND"),
            }
        }

        if let Ok(model) = std::env::var("MONITOR_NARRATIVE_MODEL") {
            if !model.is_empty() {
                config.narrative.model = model;
            }
        }

        if let Ok(secs) = std::env::var("MONITOR_NARRATIVE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    config.narrative.timeout = Duration::from_secs(secs);
                }
                _ => tracing::warn!(%secs, "ignoring unparseable MONITOR_NARRATIVE_TIMEOUT_SECS"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_defaults_match_documented_call_parameters() {
        let config = NarrativeConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_server_default_bind() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
