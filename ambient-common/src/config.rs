//! Bootstrap configuration loading
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `AMBIENT_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/ambient/config.toml`)
//! 4. Built-in defaults
//!
//! A missing file is not fatal: a warning is logged and defaults apply.
//! A file that exists but does not parse or validate is an error.

use crate::{Error, FadeCurve, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "AMBIENT_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Initial target volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Loop engine timing
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Loop engine timing constants
///
/// All durations in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// How far before track end a crossfade begins
    pub preload_lead_time_ms: u64,
    /// Track length assumed when the player cannot report one
    pub fallback_duration_ms: u64,
    /// Position monitor polling interval
    pub poll_interval_ms: u64,
    /// Pause between restarting the incoming player and the first crossfade step
    pub stabilization_delay_ms: u64,
    pub fade_in_ms: u64,
    pub fade_in_steps: u32,
    pub fade_out_ms: u64,
    pub fade_out_steps: u32,
    pub crossfade_ms: u64,
    pub crossfade_steps: u32,
    pub volume_ramp_ms: u64,
    pub volume_ramp_steps: u32,
    /// Curve for start fade-in, stop fade-out and volume ramps
    #[serde(deserialize_with = "deserialize_curve")]
    pub fade_curve: FadeCurve,
    /// Curve for loop crossfades
    #[serde(deserialize_with = "deserialize_curve")]
    pub crossfade_curve: FadeCurve,
    /// Consecutive loop failures tolerated before forcing idle
    pub max_consecutive_failures: u32,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            default_volume: default_volume(),
            logging: LoggingConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            preload_lead_time_ms: 3500,
            fallback_duration_ms: 30_000,
            poll_interval_ms: 100,
            stabilization_delay_ms: 100,
            fade_in_ms: 1000,
            fade_in_steps: 25,
            fade_out_ms: 500,
            fade_out_steps: 15,
            crossfade_ms: 3000,
            crossfade_steps: 75,
            volume_ramp_ms: 300,
            volume_ramp_steps: 10,
            fade_curve: FadeCurve::Linear,
            crossfade_curve: FadeCurve::SmoothStep,
            max_consecutive_failures: 3,
        }
    }
}

/// Accept any curve alias `FadeCurve::from_str` knows
fn deserialize_curve<'de, D>(deserializer: D) -> std::result::Result<FadeCurve, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    FadeCurve::from_str(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown fade curve '{}'", name)))
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5750
}

fn default_volume() -> f32 {
    0.75
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse and validate a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges and timing relationships
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(Error::Config(format!(
                "default_volume must be within 0.0-1.0, got {}",
                self.default_volume
            )));
        }
        self.timing.validate()
    }
}

impl TimingConfig {
    /// Check that the loop can actually advance with these values
    pub fn validate(&self) -> Result<()> {
        let steps = [
            ("fade_in_steps", self.fade_in_steps),
            ("fade_out_steps", self.fade_out_steps),
            ("crossfade_steps", self.crossfade_steps),
            ("volume_ramp_steps", self.volume_ramp_steps),
        ];
        for (name, value) in steps {
            if value == 0 {
                return Err(Error::Config(format!("{} must be at least 1", name)));
            }
        }

        let durations = [
            ("poll_interval_ms", self.poll_interval_ms),
            ("fade_in_ms", self.fade_in_ms),
            ("fade_out_ms", self.fade_out_ms),
            ("crossfade_ms", self.crossfade_ms),
            ("volume_ramp_ms", self.volume_ramp_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }

        if self.crossfade_ms >= self.preload_lead_time_ms {
            return Err(Error::Config(format!(
                "crossfade_ms ({}) must be shorter than preload_lead_time_ms ({})",
                self.crossfade_ms, self.preload_lead_time_ms
            )));
        }
        if self.preload_lead_time_ms >= self.fallback_duration_ms {
            return Err(Error::Config(format!(
                "preload_lead_time_ms ({}) must be shorter than fallback_duration_ms ({})",
                self.preload_lead_time_ms, self.fallback_duration_ms
            )));
        }
        if self.max_consecutive_failures == 0 {
            return Err(Error::Config(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read, if any
///
/// Returns `None` when neither an explicit path nor a platform default
/// file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ambient").join("config.toml"))
}

/// Load bootstrap configuration with graceful degradation
///
/// A resolved path that does not exist falls back to defaults with a
/// warning; parse and validation failures are returned.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    info!("Loading config from {}", path.display());
    TomlConfig::from_file(&path)
}
