//! Agent records and per-agent kinematics

use glam::DVec2;
use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::consts::VELOCITY_DECAY;
use crate::params::AgentAttributes;
use crate::{normalize_angle, shortest_angle_delta};

/// Stable agent identifier, assigned in increasing order and never reused
pub type AgentId = u32;

/// Side an agent fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Blue,
    Red,
}

impl Team {
    pub fn index(self) -> u8 {
        match self {
            Team::Blue => 0,
            Team::Red => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Team::Blue),
            1 => Some(Team::Red),
            _ => None,
        }
    }
}

/// A simulated agent
///
/// Owned by the world. Collaborators read [`AgentView`] snapshots instead.
#[derive(Debug, Clone)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) team: Team,
    pub(crate) pos: DVec2,
    pub(crate) vel: DVec2,
    /// Facing in radians, normalized to (-π, π]
    pub(crate) heading: f64,
    pub(crate) desired_vel: DVec2,
    pub(crate) attrs: AgentAttributes,
    pub(crate) alive: bool,
}

impl Agent {
    pub(crate) fn new(id: AgentId, team: Team, pos: DVec2, attrs: AgentAttributes) -> Self {
        Self {
            id,
            team,
            pos,
            vel: DVec2::ZERO,
            heading: 0.0,
            desired_vel: DVec2::ZERO,
            attrs,
            alive: true,
        }
    }

    /// Turn toward the desired direction, at most `agility * dt` radians
    pub(crate) fn update_heading(&mut self, dt: f64) {
        if self.desired_vel == DVec2::ZERO {
            return;
        }
        let target = self.desired_vel.y.atan2(self.desired_vel.x);
        let max_turn = self.attrs.agility * dt;
        let delta = shortest_angle_delta(self.heading, target).clamp(-max_turn, max_turn);
        self.heading = normalize_angle(self.heading + delta);
    }

    /// Ramp speed toward the desired speed, limited by acceleration
    ///
    /// Velocity always points along the heading while a desired velocity is
    /// set. With no desired velocity the agent coasts to rest.
    pub(crate) fn update_velocity(&mut self, dt: f64) {
        if self.desired_vel == DVec2::ZERO {
            self.vel *= VELOCITY_DECAY;
            return;
        }

        let max_speed = self.attrs.max_speed;
        let target = self.desired_vel.length().clamp(0.0, max_speed);
        let current = self.vel.length();
        let step = self.attrs.acceleration * dt;
        let speed = target.clamp(current - step, current + step).min(max_speed);

        self.vel = DVec2::from_angle(self.heading) * speed;
    }

    /// Advance position and keep the agent inside the arena
    ///
    /// Only the velocity component pointing into a violated wall is zeroed.
    pub(crate) fn integrate(&mut self, dt: f64, radius: f64, width: f64, height: f64) {
        self.vel = self.vel.clamp_length_max(self.attrs.max_speed);
        self.pos += self.vel * dt;

        if self.pos.x < radius {
            self.pos.x = radius;
            self.vel.x = 0.0;
        } else if self.pos.x > width - radius {
            self.pos.x = width - radius;
            self.vel.x = 0.0;
        }

        if self.pos.y < radius {
            self.pos.y = radius;
            self.vel.y = 0.0;
        } else if self.pos.y > height - radius {
            self.pos.y = height - radius;
            self.vel.y = 0.0;
        }
    }

    pub(crate) fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            team: self.team,
            x: self.pos.x,
            y: self.pos.y,
            vx: self.vel.x,
            vy: self.vel.y,
            heading: self.heading,
            alive: self.alive,
        }
    }

    /// Feed the state hash: id, then IEEE bit patterns, then liveness
    pub(crate) fn hash_into(&self, hasher: &mut impl Digest) {
        hasher.update(self.id.to_le_bytes());
        for value in [
            self.pos.x,
            self.pos.y,
            self.vel.x,
            self.vel.y,
            self.heading,
            self.desired_vel.x,
            self.desired_vel.y,
        ] {
            hasher.update(value.to_bits().to_le_bytes());
        }
        hasher.update([u8::from(self.alive)]);
    }
}

/// Read-only agent snapshot for rendering and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub team: Team,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub heading: f64,
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn agent_with(attrs: AgentAttributes) -> Agent {
        Agent::new(0, Team::Blue, DVec2::new(50.0, 50.0), attrs)
    }

    #[test]
    fn test_heading_turn_is_rate_limited() {
        let mut agent = agent_with(AgentAttributes::default());
        agent.desired_vel = DVec2::new(0.0, 5.0);

        // agility 3 rad/s at dt 0.1 -> 0.3 rad per step
        agent.update_heading(0.1);
        assert!((agent.heading - 0.3).abs() < 1e-12);

        for _ in 0..10 {
            agent.update_heading(0.1);
        }
        assert!((agent.heading - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_heading_takes_shortest_path_across_pi() {
        let mut agent = agent_with(AgentAttributes::default());
        agent.heading = 3.0;
        agent.desired_vel = DVec2::new(-1.0, -0.2);

        agent.update_heading(0.1);
        // Crossing the ±π seam counter-clockwise, result wraps negative
        assert!(agent.heading < 0.0 || agent.heading > 3.0);
        assert!(agent.heading > -PI && agent.heading <= PI);
    }

    #[test]
    fn test_zero_desired_velocity_keeps_heading_and_decays() {
        let mut agent = agent_with(AgentAttributes::default());
        agent.heading = 1.0;
        agent.vel = DVec2::new(4.0, 0.0);

        agent.update_heading(0.1);
        agent.update_velocity(0.1);
        assert_eq!(agent.heading, 1.0);
        assert!((agent.vel.x - 3.8).abs() < 1e-12);
    }

    #[test]
    fn test_speed_ramps_by_acceleration_and_caps_at_max() {
        let mut agent = agent_with(AgentAttributes::default());
        agent.desired_vel = DVec2::new(100.0, 0.0);

        agent.update_velocity(0.1);
        assert!((agent.vel.length() - 0.2).abs() < 1e-12);

        for _ in 0..100 {
            agent.update_velocity(0.1);
        }
        assert!((agent.vel.length() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_wall_clamp_zeroes_only_perpendicular_component() {
        let mut agent = agent_with(AgentAttributes::default());
        agent.pos = DVec2::new(0.5, 50.0);
        agent.vel = DVec2::new(-4.0, 3.0);

        agent.integrate(0.1, 0.3, 100.0, 100.0);
        assert_eq!(agent.pos.x, 0.3);
        assert_eq!(agent.vel.x, 0.0);
        assert_eq!(agent.vel.y, 3.0);
    }

    #[test]
    fn test_team_index_roundtrip() {
        assert_eq!(Team::from_index(Team::Red.index()), Some(Team::Red));
        assert_eq!(Team::from_index(2), None);
    }
}
