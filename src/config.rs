use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CENTER_THRESHOLD_RATIO, DEFAULT_TILE_SIZE, EATEN_MAX_SECS, FRIGHTENED_DURATION_SECS,
    GHOST_EXIT_DELAYS, GHOST_HIT_SIZE_RATIO, GHOST_SPEED_TILES, INVULNERABLE_SECS,
    PLAYER_HIT_SIZE_RATIO, PLAYER_SPEED_TILES, SCATTER_DURATION_SECS, STARTING_LIVES,
    TICK_SECONDS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
    #[error("option {field} must be {rule}")]
    Invalid {
        field: &'static str,
        rule: &'static str,
    },
}

/// Round tunables. Every field is optional in JSON and falls back to the
/// values in `constants`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameOptions {
    pub tick_seconds: f32,
    pub tile_size: f32,
    pub player_speed_tiles: f32,
    /// Touch devices play at a reduced pace (0.75 in the browser build).
    pub player_speed_scale: f32,
    pub ghost_speed_tiles: f32,
    pub center_threshold_ratio: f32,
    pub player_hit_size_ratio: f32,
    pub ghost_hit_size_ratio: f32,
    pub scatter_secs: f32,
    pub frightened_secs: f32,
    pub eaten_max_secs: f32,
    pub invulnerable_secs: f32,
    pub exit_delays: [f32; 4],
    pub starting_lives: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            tick_seconds: TICK_SECONDS,
            tile_size: DEFAULT_TILE_SIZE,
            player_speed_tiles: PLAYER_SPEED_TILES,
            player_speed_scale: 1.0,
            ghost_speed_tiles: GHOST_SPEED_TILES,
            center_threshold_ratio: CENTER_THRESHOLD_RATIO,
            player_hit_size_ratio: PLAYER_HIT_SIZE_RATIO,
            ghost_hit_size_ratio: GHOST_HIT_SIZE_RATIO,
            scatter_secs: SCATTER_DURATION_SECS,
            frightened_secs: FRIGHTENED_DURATION_SECS,
            eaten_max_secs: EATEN_MAX_SECS,
            invulnerable_secs: INVULNERABLE_SECS,
            exit_delays: GHOST_EXIT_DELAYS,
            starting_lives: STARTING_LIVES,
        }
    }
}

impl GameOptions {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tickSeconds", self.tick_seconds),
            ("tileSize", self.tile_size),
            ("playerSpeedTiles", self.player_speed_tiles),
            ("playerSpeedScale", self.player_speed_scale),
            ("ghostSpeedTiles", self.ghost_speed_tiles),
            ("playerHitSizeRatio", self.player_hit_size_ratio),
            ("ghostHitSizeRatio", self.ghost_hit_size_ratio),
            ("frightenedSecs", self.frightened_secs),
            ("eatenMaxSecs", self.eaten_max_secs),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    rule: "a positive number",
                });
            }
        }
        if !(self.center_threshold_ratio > 0.0 && self.center_threshold_ratio <= 0.5) {
            return Err(ConfigError::Invalid {
                field: "centerThresholdRatio",
                rule: "in (0, 0.5]",
            });
        }
        // Faster than one tile per tick would skip decision points.
        if (self.player_speed_tiles * self.player_speed_scale).max(self.ghost_speed_tiles)
            * self.tick_seconds
            >= self.center_threshold_ratio * 2.0
        {
            return Err(ConfigError::Invalid {
                field: "tickSeconds",
                rule: "small enough that agents cannot skip a tile center",
            });
        }
        let non_negative = [
            ("scatterSecs", self.scatter_secs),
            ("invulnerableSecs", self.invulnerable_secs),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    rule: "zero or positive",
                });
            }
        }
        if self
            .exit_delays
            .iter()
            .any(|delay| !delay.is_finite() || *delay < 0.0)
        {
            return Err(ConfigError::Invalid {
                field: "exitDelays",
                rule: "zero or positive",
            });
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid {
                field: "startingLives",
                rule: "at least 1",
            });
        }
        Ok(())
    }

    pub fn player_step(&self, tile_size: f32) -> f32 {
        self.player_speed_tiles * self.player_speed_scale * tile_size * self.tick_seconds
    }

    pub fn ghost_step(&self, tile_size: f32) -> f32 {
        self.ghost_speed_tiles * tile_size * self.tick_seconds
    }

    pub fn center_threshold(&self, tile_size: f32) -> f32 {
        self.center_threshold_ratio * tile_size
    }

    /// Distance under which the player and a ghost touch.
    pub fn contact_radius(&self, tile_size: f32) -> f32 {
        (self.player_hit_size_ratio + self.ghost_hit_size_ratio) * tile_size / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameOptions::default().validate().is_ok());
    }

    #[test]
    fn default_steps_match_browser_pace() {
        let options = GameOptions::default();
        assert!((options.player_step(20.0) - 3.0).abs() < 1e-4);
        assert!((options.ghost_step(20.0) - 2.0).abs() < 1e-4);
        assert!((options.contact_radius(20.0) - 12.5).abs() < 1e-4);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options =
            GameOptions::from_json_str(r#"{"startingLives": 5, "scatterSecs": 2.5}"#)
                .expect("valid options");
        assert_eq!(options.starting_lives, 5);
        assert_eq!(options.scatter_secs, 2.5);
        assert_eq!(options.exit_delays, GHOST_EXIT_DELAYS);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            GameOptions::from_json_str(r#"{"startingLives": 0}"#),
            Err(ConfigError::Invalid {
                field: "startingLives",
                ..
            })
        ));
        assert!(matches!(
            GameOptions::from_json_str(r#"{"tileSize": -1.0}"#),
            Err(ConfigError::Invalid {
                field: "tileSize",
                ..
            })
        ));
        assert!(matches!(
            GameOptions::from_json_str(r#"{"tickSeconds": 0.5}"#),
            Err(ConfigError::Invalid {
                field: "tickSeconds",
                ..
            })
        ));
        assert!(matches!(
            GameOptions::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = GameOptions::load(Path::new("/nonexistent/packman-options.json"))
            .expect_err("file does not exist");
        assert!(error.to_string().contains("packman-options.json"));
    }
}
