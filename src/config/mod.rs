//! Grace configuration: how many days each season's crops stay protected
//! after their season has ended.
//!
//! Two file shapes are accepted, both written in RON:
//!
//! ```ron
//! SeasonDurations(spring: 28, summer: 28, fall: 14, winter: 0)
//! ```
//!
//! ```ron
//! SeasonToggles(spring: true, summer: true, fall: false, winter: false, grace_seasons: 1)
//! ```
//!
//! Either one resolves into [`GraceDurations`], the only shape the grace
//! rules ever read. Validation happens here, once, at load time.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::*;

pub const DEFAULT_CONFIG_PATH: &str = "config/grace.ron";

/// Grace length given to every season when no config file exists.
pub const DEFAULT_GRACE_DAYS: u32 = DAYS_PER_SEASON_U32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read grace config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed grace config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("grace duration for {season:?} is negative ({days} days)")]
    NegativeDuration { season: Season, days: i64 },
}

/// The grace settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraceConfig {
    /// Independent grace length in days for each season.
    SeasonDurations {
        spring: i64,
        summer: i64,
        fall: i64,
        winter: i64,
    },
    /// Per-season switch plus one shared length counted in whole seasons.
    /// Three or more seasons never expire.
    SeasonToggles {
        spring: bool,
        summer: bool,
        fall: bool,
        winter: bool,
        grace_seasons: u8,
    },
}

impl GraceConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Validates the settings and maps them to per-season day counts.
    pub fn resolve(&self) -> Result<GraceDurations, ConfigError> {
        match *self {
            GraceConfig::SeasonDurations { spring, summer, fall, winter } => {
                let mut days = [0; 4];
                for (season, raw) in Season::ALL.into_iter().zip([spring, summer, fall, winter]) {
                    if raw < 0 {
                        return Err(ConfigError::NegativeDuration { season, days: raw });
                    }
                    days[season.index()] = u32::try_from(raw).unwrap_or(u32::MAX);
                }
                Ok(GraceDurations { days })
            }
            GraceConfig::SeasonToggles { spring, summer, fall, winter, grace_seasons } => {
                let shared_days = if u32::from(grace_seasons) >= MAX_LOOKBACK_SEASONS {
                    PERMANENT_GRACE_DAYS
                } else {
                    u32::from(grace_seasons) * DAYS_PER_SEASON_U32
                };
                let mut days = [0; 4];
                for (season, enabled) in Season::ALL.into_iter().zip([spring, summer, fall, winter]) {
                    if enabled {
                        days[season.index()] = shared_days;
                    }
                }
                Ok(GraceDurations { days })
            }
        }
    }
}

/// Validated grace length per season, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceDurations {
    days: [u32; 4],
}

impl Default for GraceDurations {
    fn default() -> Self {
        Self::uniform(DEFAULT_GRACE_DAYS)
    }
}

impl GraceDurations {
    pub fn new(spring: u32, summer: u32, fall: u32, winter: u32) -> Self {
        Self { days: [spring, summer, fall, winter] }
    }

    pub fn uniform(days: u32) -> Self {
        Self { days: [days; 4] }
    }

    /// No grace at all; out-of-season crops die the day after their season.
    pub fn none() -> Self {
        Self::uniform(0)
    }

    pub fn grace_duration_days(&self, season: Season) -> u32 {
        self.days[season.index()]
    }

    pub fn is_permanent(&self, season: Season) -> bool {
        self.grace_duration_days(season) >= PERMANENT_GRACE_DAYS
    }
}

/// Reads and validates the grace config at `path`.
///
/// A missing file is not an error: every season then gets
/// [`DEFAULT_GRACE_DAYS`]. Anything unreadable or invalid is.
pub fn load_grace_config(path: &Path) -> Result<GraceDurations, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "[Config] No grace config at {}, using {} days for every season",
                path.display(),
                DEFAULT_GRACE_DAYS
            );
            return Ok(GraceDurations::default());
        }
        Err(source) => {
            return Err(ConfigError::Io { path: path.to_path_buf(), source });
        }
    };

    let durations = GraceConfig::parse(&text)?.resolve()?;
    info!(
        "[Config] Grace days: Spring {}, Summer {}, Fall {}, Winter {}",
        durations.grace_duration_days(Season::Spring),
        durations.grace_duration_days(Season::Summer),
        durations.grace_duration_days(Season::Fall),
        durations.grace_duration_days(Season::Winter),
    );
    Ok(durations)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
