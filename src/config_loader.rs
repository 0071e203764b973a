use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::input::ReadMode;

pub const DEFAULT_PIN: i32 = 17;
pub const DEFAULT_PINCTRL_CMD: &str = "pinctrl";
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
pub const DEFAULT_PI_ID: &str = "pi-001";
pub const CONFIG_FILE_NAME: &str = "led_control.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioBackend {
    Pinctrl,
    Gpiod,
}

impl FromStr for GpioBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinctrl" => Ok(GpioBackend::Pinctrl),
            "gpiod" => Ok(GpioBackend::Gpiod),
            other => Err(anyhow!("GPIO_BACKEND '{}' is not supported. Use 'pinctrl' or 'gpiod'.", other)),
        }
    }
}

// Raw host block as written in led_control.yaml (key names match the file exactly)
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HostConfig {
    pub GPIO_ENABLED: Option<bool>,
    pub GPIO_BACKEND: Option<String>,
    pub LED_PIN: Option<i32>,
    pub PINCTRL_CMD: Option<String>,
    pub GPIO_CHIP: Option<String>,
    pub READ_MODE: Option<String>,
    pub PI_ID: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(rename = "RaspberryPi")]
    pub rpi: Option<HashMap<String, HostConfig>>, // hostname -> HostConfig
    #[serde(rename = "Ubuntu")]
    pub ubuntu: Option<HashMap<String, HostConfig>>,
    #[serde(rename = "macOS")]
    pub macos: Option<HashMap<String, HostConfig>>,
}

impl Config {
    /// Find the block for `hostname`, searching RaspberryPi, Ubuntu, then macOS.
    pub fn host(&self, hostname: &str) -> Option<&HostConfig> {
        [&self.rpi, &self.ubuntu, &self.macos]
            .into_iter()
            .flatten()
            .find_map(|hosts| hosts.get(hostname))
    }
}

/// Resolved settings for this host.
#[derive(Debug, Clone, PartialEq)]
pub struct LedSettings {
    pub gpio_enabled: bool,
    pub backend: GpioBackend,
    pub pin: i32,
    pub pinctrl_cmd: String,
    pub gpio_chip: String,
    pub read_mode: ReadMode,
    pub pi_id: String,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            gpio_enabled: true,
            backend: GpioBackend::Pinctrl,
            pin: DEFAULT_PIN,
            pinctrl_cmd: DEFAULT_PINCTRL_CMD.to_string(),
            gpio_chip: DEFAULT_GPIO_CHIP.to_string(),
            read_mode: ReadMode::SkipWhitespace,
            pi_id: DEFAULT_PI_ID.to_string(),
        }
    }
}

impl LedSettings {
    pub fn from_host_config(host: &HostConfig) -> Result<Self> {
        let defaults = Self::default();
        let backend = match host.GPIO_BACKEND.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.backend,
        };
        let read_mode = match host.READ_MODE.as_deref() {
            Some(mode) => mode.parse()?,
            None => defaults.read_mode,
        };

        Ok(Self {
            gpio_enabled: host.GPIO_ENABLED.unwrap_or(defaults.gpio_enabled),
            backend,
            pin: host.LED_PIN.unwrap_or(defaults.pin),
            pinctrl_cmd: host.PINCTRL_CMD.clone().unwrap_or(defaults.pinctrl_cmd),
            gpio_chip: host.GPIO_CHIP.clone().unwrap_or(defaults.gpio_chip),
            read_mode,
            pi_id: host.PI_ID.clone().unwrap_or(defaults.pi_id),
        })
    }

    /// Apply `LED_PIN` from the environment, if set.
    pub fn apply_env_pin(&mut self, value: Option<String>) -> Result<()> {
        if let Some(raw) = value {
            self.pin = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("LED_PIN '{}' is not an integer: {}", raw, e))?;
        }
        Ok(())
    }
}

/// Parse settings for `hostname` from YAML text. A host without a block gets defaults.
pub fn parse_settings(yaml: &str, hostname: &str) -> Result<LedSettings> {
    // An empty file has no host entries, same as `{}`
    let config: Config = if yaml.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    match config.host(hostname) {
        Some(host) => LedSettings::from_host_config(host)
            .with_context(|| format!("Invalid host entry for '{}'", hostname)),
        None => {
            log::info!(target: "config_loader", "No host entry for '{}'; using defaults", hostname);
            Ok(LedSettings::default())
        }
    }
}

pub fn load_settings_from(path: &Path, hostname: &str) -> Result<LedSettings> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {:?}: {}", path, e))?;
    parse_settings(&text, hostname).with_context(|| format!("Failed to parse {:?}", path))
}

/// Where the config file is expected when none is named explicitly.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(CONFIG_FILE_NAME)
}

/// Which config file to read, and whether it has to exist.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Named by `--config` or `LED_CONTROL_CONFIG`; must exist.
    Explicit(PathBuf),
    /// The file next to the crate manifest; may be absent.
    Default(PathBuf),
}

/// `--config` first, then `LED_CONTROL_CONFIG`, then the default path.
pub fn config_source(cli_path: Option<&Path>, env_path: Option<PathBuf>) -> ConfigSource {
    match cli_path.map(Path::to_path_buf).or(env_path) {
        Some(path) => ConfigSource::Explicit(path),
        None => ConfigSource::Default(default_config_path()),
    }
}

pub fn settings_from_source(source: &ConfigSource, hostname: &str) -> Result<LedSettings> {
    match source {
        ConfigSource::Explicit(path) => load_settings_from(path, hostname),
        ConfigSource::Default(path) if path.exists() => load_settings_from(path, hostname),
        ConfigSource::Default(path) => {
            log::info!(target: "config_loader", "{:?} not found; using built-in defaults", path);
            Ok(LedSettings::default())
        }
    }
}

/// Resolve settings for `hostname`.
///
/// An explicit path (CLI or `LED_CONTROL_CONFIG`) must exist; the default
/// path may be absent, in which case built-in defaults are used. `LED_PIN`
/// from the environment (or `.env`) overrides the file.
pub fn load_led_settings(explicit: Option<&Path>, hostname: &str) -> Result<LedSettings> {
    // Ensure .env is loaded once here so all env-based config is centralized
    let _ = dotenv();

    let source = config_source(explicit, env::var_os("LED_CONTROL_CONFIG").map(PathBuf::from));
    let mut settings = settings_from_source(&source, hostname)?;

    settings.apply_env_pin(env::var("LED_PIN").ok())?;

    log::info!(target: "config_loader", "LedSettings: enabled={}, backend={:?}, pin={}, read_mode={:?} (hostname={})",
               settings.gpio_enabled, settings.backend, settings.pin, settings.read_mode, hostname);
    Ok(settings)
}
