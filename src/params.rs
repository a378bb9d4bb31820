//! World and agent configuration
//!
//! Loaders hand these structures to the core fully formed. Every field has a
//! documented default so partial JSON documents deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Global simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    // === Physics ===
    /// Fixed timestep in seconds
    pub dt: f64,
    /// Downward acceleration applied to projectiles (m/s²)
    pub gravity: f64,
    /// Collision radius shared by every agent (m)
    pub agent_radius: f64,

    // === Arena ===
    pub arena_width: f64,
    pub arena_height: f64,

    // === Broad phase ===
    /// Edge length of a spatial-grid cell (m), at least one agent diameter
    pub cell_size: f64,
    /// Living-agent count at or below which pairs are enumerated brute force
    pub brute_force_threshold: usize,

    // === Projectiles ===
    /// Spawn height above ground (roughly shoulder height)
    pub launch_height: f64,
    /// How far past the arena edge a projectile may travel before expiring
    pub projectile_margin: f64,
    /// Depth below ground at which a projectile expires
    pub expire_depth: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            gravity: 9.81,
            agent_radius: 0.3,

            arena_width: 100.0,
            arena_height: 100.0,

            cell_size: 1.0,
            brute_force_threshold: 150,

            launch_height: 1.0,
            projectile_margin: 10.0,
            expire_depth: 50.0,
        }
    }
}

impl SimParams {
    /// Reject configurations the stepper cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("dt", self.dt)?;
        ConfigError::require_positive("cell_size", self.cell_size)?;
        ConfigError::require_positive("agent_radius", self.agent_radius)?;
        ConfigError::require_positive("arena_width", self.arena_width)?;
        ConfigError::require_positive("arena_height", self.arena_height)?;

        let diameter = 2.0 * self.agent_radius;
        if self.arena_width < diameter || self.arena_height < diameter {
            return Err(ConfigError::ArenaTooSmall {
                width: self.arena_width,
                height: self.arena_height,
                diameter,
            });
        }
        if self.cell_size < diameter {
            return Err(ConfigError::CellTooSmall {
                cell_size: self.cell_size,
                diameter,
            });
        }

        for (field, value) in [
            ("gravity", self.gravity),
            ("launch_height", self.launch_height),
            ("projectile_margin", self.projectile_margin),
            ("expire_depth", self.expire_depth),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON parameter document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-agent attributes
///
/// Only the kinematic attributes (`max_speed`, `acceleration`, `agility`)
/// drive the stepper. The rest are carried for scenario scripting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentAttributes {
    // === Physical ===
    /// Default 1.0
    pub strength: f64,
    /// Preferred travel speed, m/s. Default 5.0
    pub cruise_speed: f64,
    /// Hard speed cap, m/s. Default 8.0
    pub max_speed: f64,
    /// Speed change per second, m/s². Default 2.0
    pub acceleration: f64,
    /// Turn rate, rad/s. Default 3.0
    pub agility: f64,

    // === Cognitive ===
    /// Default 0.7
    pub precision: f64,
    /// Default 0.5
    pub impetuousness: f64,
    /// Default 0.5
    pub timidity: f64,
}

impl Default for AgentAttributes {
    fn default() -> Self {
        Self {
            strength: 1.0,
            cruise_speed: 5.0,
            max_speed: 8.0,
            acceleration: 2.0,
            agility: 3.0,

            precision: 0.7,
            impetuousness: 0.5,
            timidity: 0.5,
        }
    }
}

impl AgentAttributes {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("strength", self.strength),
            ("cruise_speed", self.cruise_speed),
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("agility", self.agility),
            ("precision", self.precision),
            ("impetuousness", self.impetuousness),
            ("timidity", self.timidity),
        ] {
            ConfigError::require_non_negative(field, value)?;
        }
        Ok(())
    }
}
