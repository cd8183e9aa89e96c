//! Shared CLI helpers used across multiple commands.

use clap::{Args, ValueEnum};
use echoline_config::EffectConfig;

/// Echo delay used when `--delay` is not given, in samples.
pub const DEFAULT_DELAY: usize = 2000;

/// Echo decay used when `--decay` is not given.
pub const DEFAULT_DECAY: f64 = 0.5;

/// Effect selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EffectKind {
    /// Pass input through unchanged
    None,
    /// Echo confined to each frame
    Echo,
    /// Echo whose tail carries across frames
    EchoLine,
}

/// `--effect`, `--delay`, and `--decay`, layered over a configured effect.
#[derive(Args, Debug, Clone, Default)]
pub struct EffectArgs {
    /// Effect to apply
    #[arg(long, value_enum)]
    pub effect: Option<EffectKind>,

    /// Echo delay in samples
    #[arg(long)]
    pub delay: Option<usize>,

    /// Echo feedback gain in [0, 1)
    #[arg(long)]
    pub decay: Option<f64>,
}

impl EffectArgs {
    /// Combine the flags with `base`; flags win.
    pub fn resolve(&self, base: &EffectConfig) -> anyhow::Result<EffectConfig> {
        let (base_delay, base_decay) = match *base {
            EffectConfig::None => (DEFAULT_DELAY, DEFAULT_DECAY),
            EffectConfig::Echo { delay, decay } | EffectConfig::EchoLine { delay, decay } => {
                (delay, decay)
            }
        };
        let delay = self.delay.unwrap_or(base_delay);
        let decay = self.decay.unwrap_or(base_decay);

        let kind = match (self.effect, base) {
            (Some(kind), _) => kind,
            (None, EffectConfig::None) => EffectKind::None,
            (None, EffectConfig::Echo { .. }) => EffectKind::Echo,
            (None, EffectConfig::EchoLine { .. }) => EffectKind::EchoLine,
        };

        let config = match kind {
            EffectKind::None => {
                if self.delay.is_some() || self.decay.is_some() {
                    anyhow::bail!("--delay and --decay need --effect echo or --effect echo-line");
                }
                EffectConfig::None
            }
            EffectKind::Echo => EffectConfig::Echo { delay, decay },
            EffectKind::EchoLine => EffectConfig::EchoLine { delay, decay },
        };
        config.validate()?;
        Ok(config)
    }
}

/// One-line description of an effect for status output.
pub fn describe_effect(effect: &EffectConfig) -> String {
    match effect {
        EffectConfig::None => "none".to_string(),
        EffectConfig::Echo { delay, decay } | EffectConfig::EchoLine { delay, decay } => {
            format!("{} (delay {} samples, decay {})", effect.name(), delay, decay)
        }
    }
}
