//! Effect selection for a session.

use echoline_core::{Echo, EchoLine, FrameEffect, Passthrough};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Longest accepted echo delay in samples (ten seconds at 192 kHz).
pub const MAX_DELAY_SAMPLES: usize = 1_920_000;

/// Which effect the processor applies, with its parameters.
///
/// Serialized as a TOML table tagged by `type`:
///
/// ```toml
/// [effect]
/// type = "echo_line"
/// delay = 4000
/// decay = 0.4
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectConfig {
    /// Copy input to output unchanged.
    #[default]
    None,
    /// Frame-local feedback echo.
    Echo {
        /// Delay in samples.
        delay: usize,
        /// Feedback gain.
        decay: f64,
    },
    /// Echo with a delay line that persists across frames.
    EchoLine {
        /// Delay in samples.
        delay: usize,
        /// Feedback gain.
        decay: f64,
    },
}

impl EffectConfig {
    /// Identifier matching [`FrameEffect::name`] of the built effect.
    pub fn name(&self) -> &'static str {
        match self {
            EffectConfig::None => "none",
            EffectConfig::Echo { .. } => "echo",
            EffectConfig::EchoLine { .. } => "echo_line",
        }
    }

    /// Check parameter ranges. Delay must not exceed [`MAX_DELAY_SAMPLES`];
    /// decay must be finite and in `[0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (EffectConfig::Echo { delay, decay } | EffectConfig::EchoLine { delay, decay }) = *self
        else {
            return Ok(());
        };
        if delay > MAX_DELAY_SAMPLES {
            return Err(ConfigError::Invalid(format!(
                "{} delay must be at most {MAX_DELAY_SAMPLES} samples, got {delay}",
                self.name()
            )));
        }
        if !(decay.is_finite() && (0.0..1.0).contains(&decay)) {
            return Err(ConfigError::Invalid(format!(
                "{} decay must be in [0, 1), got {decay}",
                self.name()
            )));
        }
        Ok(())
    }

    /// Construct the configured effect.
    pub fn build(&self) -> Box<dyn FrameEffect + Send> {
        match *self {
            EffectConfig::None => Box::new(Passthrough),
            EffectConfig::Echo { delay, decay } => Box::new(Echo::new(delay, decay)),
            EffectConfig::EchoLine { delay, decay } => Box::new(EchoLine::new(delay, decay)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_effect_matches_name() {
        for config in [
            EffectConfig::None,
            EffectConfig::Echo {
                delay: 2,
                decay: 0.5,
            },
            EffectConfig::EchoLine {
                delay: 100,
                decay: 0.3,
            },
        ] {
            assert_eq!(config.build().name(), config.name());
        }
    }

    #[test]
    fn decay_range_enforced() {
        let ok = EffectConfig::Echo {
            delay: 1,
            decay: 0.0,
        };
        assert!(ok.validate().is_ok());

        for decay in [1.0, -0.1, f64::NAN, f64::INFINITY] {
            let bad = EffectConfig::EchoLine { delay: 1, decay };
            assert!(
                matches!(bad.validate(), Err(ConfigError::Invalid(_))),
                "decay {decay} accepted"
            );
        }
    }

    #[test]
    fn delay_bounded_before_build() {
        let longest = EffectConfig::EchoLine {
            delay: MAX_DELAY_SAMPLES,
            decay: 0.5,
        };
        assert!(longest.validate().is_ok());

        for delay in [MAX_DELAY_SAMPLES + 1, usize::MAX / 4, usize::MAX] {
            for bad in [
                EffectConfig::Echo { delay, decay: 0.5 },
                EffectConfig::EchoLine { delay, decay: 0.5 },
            ] {
                let result = bad.validate();
                assert!(
                    matches!(result, Err(ConfigError::Invalid(ref msg)) if msg.contains("delay")),
                    "delay {delay} accepted"
                );
            }
        }
    }

    #[test]
    fn oversized_delay_from_toml_rejected() {
        let config: EffectConfig =
            toml::from_str("type = \"echo_line\"\ndelay = 9223372036854775807\ndecay = 0.5")
                .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_tagged_table() {
        let config: EffectConfig =
            toml::from_str("type = \"echo\"\ndelay = 8\ndecay = 0.25").unwrap();
        assert_eq!(
            config,
            EffectConfig::Echo {
                delay: 8,
                decay: 0.25
            }
        );
        let none: EffectConfig = toml::from_str("type = \"none\"").unwrap();
        assert_eq!(none, EffectConfig::None);
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(toml::from_str::<EffectConfig>("type = \"reverb\"").is_err());
    }
}
