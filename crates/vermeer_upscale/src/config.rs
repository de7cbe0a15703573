//! Configuration for the enhancement-server connection and lifecycle.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use vermeer_error::{UpscaleError, UpscaleErrorKind};

/// A program invocation: executable plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments in order
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command spec.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Default enhancement parameters sent with every request.
///
/// These mirror what the server accepts: a target short-side resolution,
/// an optional ceiling, a seed, a color-correction mode and two noise
/// scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceDefaults {
    /// Target short-side resolution in pixels
    pub resolution: u32,
    /// Upper bound on the output resolution; 0 means unbounded
    pub max_resolution: u32,
    /// Random seed
    pub seed: u32,
    /// Color correction mode: lab, wavelet, wavelet_adaptive, hsv, adain, none
    pub color_correction: String,
    /// Input noise scale
    pub input_noise_scale: f64,
    /// Latent noise scale
    pub latent_noise_scale: f64,
}

impl Default for EnhanceDefaults {
    fn default() -> Self {
        Self {
            resolution: 1080,
            max_resolution: 0,
            seed: 42,
            color_correction: "lab".to_string(),
            input_noise_scale: 0.0,
            latent_noise_scale: 0.0,
        }
    }
}

/// Configuration for the enhancement-server supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpscaleConfig {
    /// Loopback host the server binds to
    pub host: String,
    /// Port the server binds to
    pub port: u16,
    /// One-shot setup command; `None` when installation is managed elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<CommandSpec>,
    /// Long-running server command
    pub start_command: CommandSpec,
    /// Working directory for both commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Interval between health probes, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on health polling after this many seconds. The default is
    /// generous: first startup downloads models and can take minutes.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    /// Grace period between cooperative and forced shutdown, in seconds
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
    /// Per-request timeout for enhancement calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enhancement parameters sent with every request
    #[serde(default)]
    pub enhance: EnhanceDefaults,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_health_timeout_secs() -> u64 {
    600
}

fn default_stop_grace_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    7200
}

impl UpscaleConfig {
    /// Create a configuration for a server started with `start_command` on
    /// the given loopback port.
    pub fn new(host: impl Into<String>, port: u16, start_command: CommandSpec) -> Self {
        Self {
            host: host.into(),
            port,
            install_command: None,
            start_command,
            working_dir: None,
            poll_interval_ms: default_poll_interval_ms(),
            health_timeout_secs: default_health_timeout_secs(),
            stop_grace_secs: default_stop_grace_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            enhance: EnhanceDefaults::default(),
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `UPSCALE_SERVER_HOST` (default: "127.0.0.1")
    /// - `UPSCALE_SERVER_PORT` (default: 8000)
    /// - `UPSCALE_SERVER_COMMAND` (required; whitespace-separated)
    pub fn from_env() -> Result<Self, UpscaleError> {
        let host =
            std::env::var("UPSCALE_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("UPSCALE_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);
        let command = std::env::var("UPSCALE_SERVER_COMMAND").map_err(|_| {
            UpscaleError::new(UpscaleErrorKind::StartFailed(
                "UPSCALE_SERVER_COMMAND not set".into(),
            ))
        })?;
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            UpscaleError::new(UpscaleErrorKind::StartFailed(
                "UPSCALE_SERVER_COMMAND is empty".into(),
            ))
        })?;
        let args: Vec<&str> = parts.collect();

        Ok(Self::new(host, port, CommandSpec::new(program, &args)))
    }

    /// Set the one-shot install command.
    pub fn with_install_command(mut self, command: CommandSpec) -> Self {
        self.install_command = Some(command);
        self
    }

    /// Set the working directory for install and start.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Base URL of the running server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Interval between health probes.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Health polling budget.
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// Grace period before forced shutdown.
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_host_and_port() {
        let config = UpscaleConfig::new("127.0.0.1", 8000, CommandSpec::new("server", &[]));
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn defaults_allow_slow_model_loading() {
        let config = UpscaleConfig::new("127.0.0.1", 8000, CommandSpec::new("server", &[]));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(config.health_timeout() >= Duration::from_secs(600));
    }
}
