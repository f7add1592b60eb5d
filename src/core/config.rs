//! Engine configuration.
//!
//! - `GameConfig`: per-game rule variants, stored inside every snapshot so
//!   a game keeps the rules it was created with
//! - `CoordinatorConfig`: retry and timeout policy for committing moves
//! - `EngineSettings`: both of the above, loadable from TOML

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::DECK_SIZE;

/// Errors loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Rule variants for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Allow answering a DrawTwo/WildDrawFour with another draw card.
    pub stacking_enabled: bool,

    /// Skip the "no card of the current color" check on WildDrawFour.
    pub relaxed_wild_draw_four: bool,

    /// Cards dealt to each player on joining.
    pub hand_size: usize,

    /// Players required before the game may start.
    pub min_players: usize,

    /// Seats available.
    pub max_players: usize,

    /// Start automatically once this many players are seated.
    /// `None` leaves starting to the creator.
    pub auto_start_players: Option<usize>,

    /// Fixed shuffle seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stacking_enabled: false,
            relaxed_wild_draw_four: false,
            hand_size: 7,
            min_players: 2,
            max_players: 10,
            auto_start_players: Some(2),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Enable or disable draw-card stacking.
    #[must_use]
    pub fn with_stacking(mut self, enabled: bool) -> Self {
        self.stacking_enabled = enabled;
        self
    }

    /// Enable or disable the relaxed WildDrawFour rule.
    #[must_use]
    pub fn with_relaxed_wild_draw_four(mut self, relaxed: bool) -> Self {
        self.relaxed_wild_draw_four = relaxed;
        self
    }

    /// Use a fixed shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the seat limit.
    #[must_use]
    pub fn with_max_players(mut self, max: usize) -> Self {
        self.max_players = max;
        self
    }

    /// Auto-start threshold; `None` for manual start only.
    #[must_use]
    pub fn with_auto_start(mut self, players: Option<usize>) -> Self {
        self.auto_start_players = players;
        self
    }

    /// Set the opening hand size.
    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    /// Check the rules can be satisfied by one 108-card deck.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hand_size == 0 {
            return Err(ConfigError::Invalid {
                field: "hand_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.min_players < 2 {
            return Err(ConfigError::Invalid {
                field: "min_players",
                message: "must be at least 2".to_string(),
            });
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::Invalid {
                field: "max_players",
                message: format!("must be at least min_players ({})", self.min_players),
            });
        }
        // One card seeds the discard pile
        let dealt = self.max_players.checked_mul(self.hand_size);
        if dealt.map_or(true, |dealt| dealt >= DECK_SIZE) {
            return Err(ConfigError::Invalid {
                field: "max_players",
                message: format!(
                    "{} players x {} cards leaves no draw pile",
                    self.max_players, self.hand_size
                ),
            });
        }
        if let Some(auto) = self.auto_start_players {
            if auto < self.min_players || auto > self.max_players {
                return Err(ConfigError::Invalid {
                    field: "auto_start_players",
                    message: format!(
                        "must be between {} and {}",
                        self.min_players, self.max_players
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Commit policy for the concurrency coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Load/apply/swap attempts before giving up with `Conflict`.
    pub max_attempts: u32,

    /// Deadline for each store or feed call, in milliseconds.
    pub io_timeout_ms: u64,

    /// First retry delay, doubled per attempt.
    pub retry_backoff_ms: u64,

    /// Cap on the retry delay.
    pub max_backoff_ms: u64,

    /// Snapshots buffered per subscriber before it starts skipping.
    pub feed_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            io_timeout_ms: 2_000,
            retry_backoff_ms: 5,
            max_backoff_ms: 100,
            feed_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(
            self.retry_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "io_timeout_ms",
                message: "must be positive".to_string(),
            });
        }
        if self.feed_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "feed_capacity",
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level settings file.
///
/// ```
/// use uno_engine::core::EngineSettings;
///
/// let settings = EngineSettings::from_toml_str(r#"
///     [rules]
///     stacking_enabled = true
///
///     [coordinator]
///     max_attempts = 8
/// "#).unwrap();
///
/// assert!(settings.rules.stacking_enabled);
/// assert_eq!(settings.rules.hand_size, 7);
/// assert_eq!(settings.coordinator.max_attempts, 8);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub rules: GameConfig,
    pub coordinator: CoordinatorConfig,
}

impl EngineSettings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: EngineSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.coordinator.validate()
    }
}
