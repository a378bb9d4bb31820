//! Skirmish - deterministic 2D combat physics
//!
//! Core modules:
//! - `sim`: Deterministic stepping engine (kinematics, collisions, ballistics)
//! - `params`: World and agent configuration with documented defaults
//! - `error`: Configuration and runtime error types

pub mod error;
pub mod params;
pub mod sim;

pub use error::{ConfigError, SimError};
pub use params::{AgentAttributes, SimParams};
pub use sim::{Actions, AgentView, Event, Projectile, ProjectileState, Team, World};

/// Simulation constants that are not exposed as tunables
pub mod consts {
    use glam::DVec2;

    /// Per-step multiplicative velocity decay when an agent has no desired velocity
    pub const VELOCITY_DECAY: f64 = 0.95;
    /// Extra push applied to each agent on top of half the overlap
    pub const SEPARATION_EPSILON: f64 = 0.001;
    /// Height of the flat ground plane
    pub const GROUND_Z: f64 = 0.0;
    /// Contact normal used when two agents share the exact same position
    pub const FALLBACK_NORMAL: DVec2 = DVec2::X;
}

/// Normalize an angle into (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Signed shortest rotation taking `from` onto `to`
#[inline]
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    let delta = to - from;
    delta.sin().atan2(delta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_angle_bounds() {
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(-2.5 * PI) + 0.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_shortest_delta_wraps() {
        // 170° -> -170° is a 20° turn, not 340°
        let from = 170f64.to_radians();
        let to = (-170f64).to_radians();
        let delta = shortest_angle_delta(from, to);
        assert!((delta - 20f64.to_radians()).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn normalize_angle_stays_in_half_open_range(angle in -100.0f64..100.0) {
            let n = normalize_angle(angle);
            prop_assert!(n > -PI && n <= PI);
            prop_assert!((n.sin() - angle.sin()).abs() < 1e-9);
            prop_assert!((n.cos() - angle.cos()).abs() < 1e-9);
        }
    }
}
