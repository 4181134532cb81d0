//! Service configuration.
//!
//! [`BarConfig`] is read from an optional TOML file, then overridden by
//! `BLUFFHALL_*` environment variables, then clamped into range. Every
//! field has a default, so an empty file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bluffhall_room::RoomConfig;
use bluffhall_timer::TimerConfig;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Prefix for environment overrides, e.g. `BLUFFHALL_GUIDE_MODE`.
pub const ENV_PREFIX: &str = "BLUFFHALL_";

/// Top-level settings for a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Seconds a player may hold the turn before being eliminated.
    pub play_timeout_seconds: u64,
    /// Seconds a penalized player may take before a wire is cut for them.
    pub wire_timeout_seconds: u64,
    /// Append a "Next:" hint to replies.
    pub guide_mode: bool,
    /// Width hint passed to the renderer for hand images.
    pub hand_image_width: u32,
    /// Probe every seated player's private channel before starting.
    pub require_dm_reachable_before_start: bool,
    /// Lobbies idle this long are closed by the reaper.
    pub room_ttl_minutes: u64,
    /// Root for room records and the image cache.
    pub state_dir: PathBuf,
    /// Seeds all randomness when set.
    pub rng_seed: Option<u64>,
    /// Seconds between reaper sweeps.
    pub reap_interval_seconds: u64,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            play_timeout_seconds: 120,
            wire_timeout_seconds: 120,
            guide_mode: true,
            hand_image_width: 960,
            require_dm_reachable_before_start: true,
            room_ttl_minutes: 180,
            state_dir: PathBuf::from("./bluffhall-data"),
            rng_seed: None,
            reap_interval_seconds: 300,
            log_level: "info".to_string(),
        }
    }
}

impl BarConfig {
    /// Parses TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` if given, applies the process environment and clamps.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        Ok(base.with_env(|key| std::env::var(key).ok())?.validated())
    }

    /// Applies overrides found through `lookup`, which maps a full
    /// variable name (`BLUFFHALL_PLAY_TIMEOUT_SECONDS`) to its value.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("PLAY_TIMEOUT_SECONDS") {
            self.play_timeout_seconds = parse("PLAY_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = var("WIRE_TIMEOUT_SECONDS") {
            self.wire_timeout_seconds = parse("WIRE_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = var("GUIDE_MODE") {
            self.guide_mode = parse_bool("GUIDE_MODE", &v)?;
        }
        if let Some(v) = var("HAND_IMAGE_WIDTH") {
            self.hand_image_width = parse("HAND_IMAGE_WIDTH", &v)?;
        }
        if let Some(v) = var("REQUIRE_DM_REACHABLE_BEFORE_START") {
            self.require_dm_reachable_before_start =
                parse_bool("REQUIRE_DM_REACHABLE_BEFORE_START", &v)?;
        }
        if let Some(v) = var("ROOM_TTL_MINUTES") {
            self.room_ttl_minutes = parse("ROOM_TTL_MINUTES", &v)?;
        }
        if let Some(v) = var("STATE_DIR") {
            self.state_dir = PathBuf::from(v);
        }
        if let Some(v) = var("RNG_SEED") {
            self.rng_seed = if v.trim().is_empty() {
                None
            } else {
                Some(parse("RNG_SEED", &v)?)
            };
        }
        if let Some(v) = var("REAP_INTERVAL_SECONDS") {
            self.reap_interval_seconds = parse("REAP_INTERVAL_SECONDS", &v)?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(self)
    }

    /// Clamps values that would make the bar unusable.
    pub fn validated(mut self) -> Self {
        if self.play_timeout_seconds == 0 {
            warn!("play_timeout_seconds is 0, clamping to 1");
            self.play_timeout_seconds = 1;
        }
        if self.wire_timeout_seconds == 0 {
            warn!("wire_timeout_seconds is 0, clamping to 1");
            self.wire_timeout_seconds = 1;
        }
        if self.room_ttl_minutes == 0 {
            warn!("room_ttl_minutes is 0, clamping to 1");
            self.room_ttl_minutes = 1;
        }
        if self.reap_interval_seconds == 0 {
            warn!("reap_interval_seconds is 0, clamping to 1");
            self.reap_interval_seconds = 1;
        }
        if self.hand_image_width == 0 {
            self.hand_image_width = Self::default().hand_image_width;
        }
        self
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::from_secs(self.play_timeout_seconds, self.wire_timeout_seconds)
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            timers: self.timer_config(),
            ..RoomConfig::default()
        }
    }

    pub fn room_ttl(&self) -> TimeDelta {
        i64::try_from(self.room_ttl_minutes.max(1))
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_seconds.max(1))
    }

    /// Where room records live.
    pub fn rooms_dir(&self) -> PathBuf {
        self.state_dir.join("rooms")
    }

    /// Where rendered images are cached.
    pub fn cache_dir(&self) -> PathBuf {
        self.state_dir.join("cache")
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{key}"),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{key}"),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = BarConfig::default();
        assert_eq!(cfg.play_timeout_seconds, 120);
        assert_eq!(cfg.wire_timeout_seconds, 120);
        assert!(cfg.guide_mode);
        assert_eq!(cfg.hand_image_width, 960);
        assert!(cfg.require_dm_reachable_before_start);
        assert_eq!(cfg.room_ttl_minutes, 180);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let cfg = BarConfig::from_toml_str("guide_mode = false\nplay_timeout_seconds = 30\n").unwrap();
        assert!(!cfg.guide_mode);
        assert_eq!(cfg.play_timeout_seconds, 30);
        assert_eq!(cfg.wire_timeout_seconds, 120);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            BarConfig::from_toml_str("play_timeout_seconds = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let cfg = BarConfig::default()
            .with_env(env(&[
                ("BLUFFHALL_WIRE_TIMEOUT_SECONDS", "45"),
                ("BLUFFHALL_GUIDE_MODE", "off"),
                ("BLUFFHALL_RNG_SEED", "7"),
                ("BLUFFHALL_STATE_DIR", "/tmp/bar"),
            ]))
            .unwrap();
        assert_eq!(cfg.wire_timeout_seconds, 45);
        assert!(!cfg.guide_mode);
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.rooms_dir(), PathBuf::from("/tmp/bar/rooms"));
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = BarConfig::default()
            .with_env(env(&[("BLUFFHALL_ROOM_TTL_MINUTES", "forever")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "BLUFFHALL_ROOM_TTL_MINUTES"));
    }

    #[test]
    fn test_validated_clamps_zeroes() {
        let cfg = BarConfig {
            play_timeout_seconds: 0,
            wire_timeout_seconds: 0,
            room_ttl_minutes: 0,
            reap_interval_seconds: 0,
            ..BarConfig::default()
        }
        .validated();
        assert_eq!(cfg.play_timeout_seconds, 1);
        assert_eq!(cfg.wire_timeout_seconds, 1);
        assert_eq!(cfg.room_ttl(), TimeDelta::minutes(1));
        assert_eq!(cfg.reap_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_room_config_carries_timeouts() {
        let cfg = BarConfig {
            play_timeout_seconds: 30,
            ..BarConfig::default()
        };
        let room = cfg.room_config();
        assert_eq!(room.timers.play_timeout, Duration::from_secs(30));
        assert_eq!(room.max_players, 5);
    }
}
