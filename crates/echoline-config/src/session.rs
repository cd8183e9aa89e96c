//! Session configuration: which devices, what frame format, which effect.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, EffectConfig};

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Default frame size in samples.
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Everything needed to start a processing session.
///
/// Missing keys take their defaults, so an empty file is a valid session
/// (without devices).
///
/// ```toml
/// input_device = "USB Audio Device"
/// output_device = "Speakers"
/// sample_rate = 16000
/// frame_size = 512
///
/// [effect]
/// type = "echo"
/// delay = 2
/// decay = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capture device name, matched case-insensitively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Playback device name, matched case-insensitively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per frame.
    pub frame_size: usize,
    /// Effect applied to every frame.
    pub effect: EffectConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            effect: EffectConfig::None,
        }
    }
}

impl SessionConfig {
    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: SessionConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no session config, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the session to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that the session can be started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be > 0".to_string()));
        }
        if self.frame_size == 0 {
            return Err(ConfigError::Invalid("frame_size must be > 0".to_string()));
        }
        self.effect.validate()
    }
}
