//! Gameplay configuration
//!
//! Tunable constants that the combat and bolt code read at run time. The
//! defaults reproduce the stock game; changing any of them changes replay
//! outcomes.

use serde::{Deserialize, Serialize};

use crate::consts::{DCOLS, DROWS};
use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Turns of hallucination inflicted by a hallucinating hit
    pub hallucination_on_hit: i32,
    /// Weakness duration inflicted by a weakening hit
    pub weakness_on_hit: i32,
    /// Percent of max HP restored by a mercy weapon proc
    pub mercy_heal_percent: i32,
    /// Divisor applied to the player's transference bonus
    pub player_transference_ratio: i32,
    /// Allied clone population at which splitting stops
    pub max_allied_clones: usize,
    /// Soul-bearing kills needed to identify an unknown weapon
    pub weapon_kills_to_auto_id: i32,
    /// Lifespan of conjured spectral blades
    pub blade_lifespan: i32,
    /// Lifespan of spectral images from multiplicity runics
    pub spectral_image_lifespan: i32,
    /// Attempts at finding a random reflection target
    pub reflection_tries: u32,
    pub map_width: i32,
    pub map_height: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hallucination_on_hit: 20,
            weakness_on_hit: 300,
            mercy_heal_percent: 50,
            player_transference_ratio: 20,
            max_allied_clones: 100,
            weapon_kills_to_auto_id: 20,
            blade_lifespan: 15,
            spectral_image_lifespan: 3,
            reflection_tries: 50,
            map_width: DCOLS,
            map_height: DROWS,
        }
    }
}

impl SimConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_width <= 0 {
            return Err(invalid("map_width", "must be positive"));
        }
        if self.map_height <= 0 {
            return Err(invalid("map_height", "must be positive"));
        }
        if self.player_transference_ratio == 0 {
            return Err(invalid("player_transference_ratio", "must be non-zero"));
        }
        if self.reflection_tries == 0 {
            return Err(invalid("reflection_tries", "must be at least 1"));
        }
        if !(0..=100).contains(&self.mercy_heal_percent) {
            return Err(invalid("mercy_heal_percent", "must be between 0 and 100"));
        }
        if self.weapon_kills_to_auto_id <= 0 {
            return Err(invalid("weapon_kills_to_auto_id", "must be positive"));
        }
        if self.hallucination_on_hit < 0 || self.weakness_on_hit < 0 {
            return Err(invalid("durations", "must not be negative"));
        }
        if self.blade_lifespan <= 0 || self.spectral_image_lifespan <= 0 {
            return Err(invalid("lifespans", "must be positive"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    #[cfg(feature = "config-json")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config-json")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
