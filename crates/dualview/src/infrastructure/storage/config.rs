//! TOML-based configuration persistence for DualView.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\DualView\config.toml`
//! - Linux:    `~/.config/dualview/config.toml`
//! - macOS:    `~/Library/Application Support/DualView/config.toml`
//!
//! Example:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [telemetry.push]
//! enabled = true
//! port = 26761
//!
//! [[sessions]]
//! name = "desktop"
//! host = "192.168.1.20"
//! enable_bottom = true
//! ```
//!
//! Every field has a serde default, so partial files work and a missing file
//! yields [`AppConfig::default()`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use dualview_core::{AutoScrollConfig, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub display: DisplayConfig,
    pub input: InputConfig,
    pub autoscroll: AutoScrollConfig,
    pub telemetry: TelemetryConfig,
    pub sessions: Vec<SessionEntry>,
}

impl AppConfig {
    /// Finds a saved session entry by name.
    pub fn session(&self, name: &str) -> Option<&SessionEntry> {
        self.sessions.iter().find(|s| s.name == name)
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory holding key binding files; defaults to the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keymap_dir: Option<PathBuf>,
}

/// Physical display geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_top_width")]
    pub top_width: u32,
    #[serde(default = "default_height")]
    pub top_height: u32,
    #[serde(default = "default_bottom_width")]
    pub bottom_width: u32,
    #[serde(default = "default_height")]
    pub bottom_height: u32,
    /// Bits per pixel of created surfaces.
    #[serde(default = "default_depth")]
    pub depth: u8,
    #[serde(default = "default_scrollbar_width")]
    pub scrollbar_width: u32,
    /// Framebuffers wider or taller than this are refused.
    #[serde(default = "default_max_framebuffer_dimension")]
    pub max_framebuffer_dimension: u32,
}

impl DisplayConfig {
    pub fn top(&self) -> Size {
        Size::new(self.top_width, self.top_height)
    }

    pub fn bottom(&self) -> Size {
        Size::new(self.bottom_width, self.bottom_height)
    }
}

/// Input and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Analog axis magnitude above which a direction counts as pressed.
    #[serde(default = "default_axis_dead_zone")]
    pub axis_dead_zone: i16,
    /// Bounded wait per live connection per tick, in microseconds.
    #[serde(default = "default_wait_timeout_us")]
    pub wait_timeout_us: u64,
    /// Upper bound on a connection handshake, in milliseconds.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

impl InputConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_micros(self.wait_timeout_us)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Telemetry service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Attach motion-sensor readings to samples.
    pub motion: bool,
    pub push: PushConfig,
    pub query: QueryConfig,
}

/// Push client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Destination host; defaults to the session host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_push_port")]
    pub port: u16,
}

/// Query server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_query_port")]
    pub port: u16,
    /// Subscribers that do not renew within this window are dropped.
    #[serde(default = "default_subscriber_ttl_ms")]
    pub subscriber_ttl_ms: u64,
}

impl QueryConfig {
    pub fn subscriber_ttl(&self) -> Duration {
        Duration::from_millis(self.subscriber_ttl_ms)
    }
}

/// A saved connection entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Fit the top session to its display instead of panning.
    #[serde(default = "default_true")]
    pub scaling: bool,
    /// Also connect a session for the bottom display.
    #[serde(default)]
    pub enable_bottom: bool,
    #[serde(default = "default_bottom_port")]
    pub bottom_port: u16,
    #[serde(default = "default_true")]
    pub bottom_scaling: bool,
    /// Initial event target when both sessions are live.
    #[serde(default = "default_true")]
    pub target_bottom: bool,
    /// Switch the bottom backlight off while connected.
    #[serde(default)]
    pub backlight_off: bool,
    /// Keep the local keyboard hidden while connected.
    #[serde(default)]
    pub hide_keyboard: bool,
}

impl SessionEntry {
    /// An entry with defaults for everything but name and host.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            user: String::new(),
            password: None,
            scaling: true,
            enable_bottom: false,
            bottom_port: default_bottom_port(),
            bottom_scaling: true,
            target_bottom: true,
            backlight_off: false,
            hide_keyboard: false,
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_top_width() -> u32 {
    400
}
fn default_bottom_width() -> u32 {
    320
}
fn default_height() -> u32 {
    240
}
fn default_depth() -> u8 {
    32
}
fn default_scrollbar_width() -> u32 {
    dualview_core::domain::viewport::DEFAULT_SCROLLBAR_WIDTH
}
fn default_max_framebuffer_dimension() -> u32 {
    dualview_core::domain::viewport::DEFAULT_MAX_DIMENSION
}
fn default_axis_dead_zone() -> i16 {
    16384
}
fn default_wait_timeout_us() -> u64 {
    500
}
fn default_handshake_timeout_ms() -> u64 {
    10_000
}
fn default_push_port() -> u16 {
    26761
}
fn default_query_port() -> u16 {
    26760
}
fn default_subscriber_ttl_ms() -> u64 {
    5000
}
fn default_port() -> u16 {
    5900
}
fn default_bottom_port() -> u16 {
    5901
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            keymap_dir: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_width: default_top_width(),
            top_height: default_height(),
            bottom_width: default_bottom_width(),
            bottom_height: default_height(),
            depth: default_depth(),
            scrollbar_width: default_scrollbar_width(),
            max_framebuffer_dimension: default_max_framebuffer_dimension(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            axis_dead_zone: default_axis_dead_zone(),
            wait_timeout_us: default_wait_timeout_us(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: None,
            port: default_push_port(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_query_port(),
            subscriber_ttl_ms: default_subscriber_ttl_ms(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `DualView` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DualView"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("dualview"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DualView")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dualview_cfg_{tag}_{}", std::process::id()))
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_has_handheld_display_sizes() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.display.top(), Size::new(400, 240));
        assert_eq!(cfg.display.bottom(), Size::new(320, 240));
        assert_eq!(cfg.display.max_framebuffer_dimension, 1024);
    }

    #[test]
    fn test_app_config_default_input_timing() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.input.axis_dead_zone, 16384);
        assert_eq!(cfg.input.wait_timeout(), Duration::from_micros(500));
        assert_eq!(cfg.input.handshake_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_app_config_default_has_telemetry_disabled() {
        let cfg = AppConfig::default();
        assert!(!cfg.telemetry.push.enabled);
        assert!(!cfg.telemetry.query.enabled);
        assert_eq!(cfg.telemetry.query.port, 26760);
        assert_eq!(cfg.telemetry.push.port, 26761);
    }

    #[test]
    fn test_general_config_default_log_level_is_info() {
        assert_eq!(GeneralConfig::default().log_level, "info");
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        // Arrange
        let toml_str = r#"
[autoscroll]
margin = 30

[telemetry.query]
enabled = true
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.autoscroll.margin, 30);
        assert_eq!(cfg.autoscroll.max_speed, 200.0);
        assert!(cfg.telemetry.query.enabled);
        assert_eq!(cfg.telemetry.query.subscriber_ttl_ms, 5000);
    }

    #[test]
    fn test_session_entry_minimal_fields_use_defaults() {
        // Arrange
        let toml_str = r#"
[[sessions]]
name = "desktop"
host = "10.0.0.2"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        let entry = cfg.session("desktop").expect("entry present");
        assert_eq!(entry, &SessionEntry::new("desktop", "10.0.0.2"));
        assert_eq!(entry.port, 5900);
        assert_eq!(entry.bottom_port, 5901);
        assert!(entry.scaling);
        assert!(!entry.enable_bottom);
    }

    #[test]
    fn test_session_without_password_omits_it_from_toml() {
        let mut cfg = AppConfig::default();
        cfg.sessions.push(SessionEntry::new("bare", "host"));

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");

        assert!(!toml_str.contains("password"), "None password must be omitted");
    }

    #[test]
    fn test_config_with_sessions_round_trips() {
        // Arrange
        let mut cfg = AppConfig::default();
        let mut entry = SessionEntry::new("lab", "192.168.1.100");
        entry.password = Some("secret".to_string());
        entry.enable_bottom = true;
        entry.bottom_scaling = false;
        cfg.sessions.push(entry);
        cfg.telemetry.push.host = Some("192.168.1.5".to_string());

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let dir = temp_dir("invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── load/save ─────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir("roundtrip");
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.input.wait_timeout_us = 250;

        // Act
        save_config_to(&path, &cfg).expect("save creates directories");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
    }
}
