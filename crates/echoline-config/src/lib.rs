//! Session configuration for echoline.
//!
//! A session names the capture and playback devices, the sample rate and
//! frame size, and the effect applied between them. Sessions are stored as
//! TOML.
//!
//! # Example
//!
//! ```rust,no_run
//! use echoline_config::{EffectConfig, SessionConfig, default_session_path};
//!
//! let session = SessionConfig {
//!     input_device: Some("USB Audio Device".to_string()),
//!     output_device: Some("Speakers".to_string()),
//!     effect: EffectConfig::EchoLine { delay: 4000, decay: 0.4 },
//!     ..SessionConfig::default()
//! };
//! session.validate().unwrap();
//! session.save(default_session_path()).unwrap();
//! ```

mod effect_config;
mod error;
mod session;

/// Platform-specific configuration paths.
pub mod paths;

pub use effect_config::{EffectConfig, MAX_DELAY_SAMPLES};
pub use error::ConfigError;
pub use paths::{default_session_path, user_config_dir};
pub use session::{DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE, SessionConfig};
