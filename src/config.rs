use crate::device::LensFacing;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReccamConfig {
    pub camera: CameraConfig,
    pub recording: RecordingConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Viewport resolution (width, height) used for aspect ratio selection
    #[serde(default = "default_viewport")]
    pub viewport: (u32, u32),

    /// Lens to prefer when both are available
    #[serde(default = "default_lens")]
    pub lens: LensFacing,

    /// Whether the simulated device exposes a front lens
    #[serde(default = "default_has_front")]
    pub has_front: bool,

    /// Whether the simulated device exposes a back lens
    #[serde(default = "default_has_back")]
    pub has_back: bool,

    /// Display the capture screen is attached to
    #[serde(default = "default_display_id")]
    pub display_id: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecordingConfig {
    /// Interval between elapsed-time ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Directory recordings are written to
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Timezone used for output file names
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Write a JSON sidecar next to each saved recording
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Log every published event at debug level, timer ticks included
    #[serde(default = "default_debug_events")]
    pub debug_events: bool,

    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<String>,
}

impl RecordingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl ReccamConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "camera.viewport",
                vec![default_viewport().0, default_viewport().1],
            )?
            .set_default("camera.lens", "Back")?
            .set_default("camera.has_front", default_has_front())?
            .set_default("camera.has_back", default_has_back())?
            .set_default("camera.display_id", default_display_id())?
            .set_default("recording.tick_interval_ms", default_tick_interval_ms())?
            .set_default("recording.output_path", default_output_path())?
            .set_default("recording.timezone", default_timezone())?
            .set_default("recording.save_metadata", default_save_metadata())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("system.debug_events", default_debug_events())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("RECCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ReccamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.viewport.0 == 0 || self.camera.viewport.1 == 0 {
            return Err(ConfigError::Message(
                "Camera viewport must be greater than 0".to_string(),
            ));
        }

        if !self.camera.has_back && !self.camera.has_front {
            return Err(ConfigError::Message(
                "At least one of camera.has_back or camera.has_front must be set".to_string(),
            ));
        }

        if self.recording.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Recording tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.recording.output_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Recording output_path must not be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for ReccamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                viewport: default_viewport(),
                lens: default_lens(),
                has_front: default_has_front(),
                has_back: default_has_back(),
                display_id: default_display_id(),
            },
            recording: RecordingConfig {
                tick_interval_ms: default_tick_interval_ms(),
                output_path: default_output_path(),
                timezone: default_timezone(),
                save_metadata: default_save_metadata(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                debug_events: default_debug_events(),
                log_dir: None,
            },
        }
    }
}

// Default value functions
fn default_viewport() -> (u32, u32) {
    (1080, 1920)
}
fn default_lens() -> LensFacing {
    LensFacing::Back
}
fn default_has_front() -> bool {
    true
}
fn default_has_back() -> bool {
    true
}
fn default_display_id() -> u32 {
    0
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_output_path() -> String {
    "./recordings".to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_save_metadata() -> bool {
    false
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_debug_events() -> bool {
    false
}
