//! Ballistic projectiles
//!
//! Flight is integrated in closed form: position and velocity are evaluated
//! directly from time since launch, so the pre-impact path is exact for any
//! timestep. Ground contact is solved exactly inside the step where z crosses
//! the ground plane, and the state at that instant is frozen.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::agent::{AgentId, Team};
use crate::consts::GROUND_Z;

pub type ProjectileId = u32;

/// Lifecycle of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Still airborne and integrated every step
    InFlight,
    /// Hit the flat ground plane
    GroundImpact,
    /// Hit raised terrain. Never produced while the ground is flat
    TerrainImpact,
    /// Left the playable envelope or sank far below ground
    Expired,
}

impl ProjectileState {
    pub fn is_in_flight(self) -> bool {
        self == ProjectileState::InFlight
    }
}

/// Region a projectile may occupy before it expires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightBounds {
    pub min: DVec2,
    pub max: DVec2,
    /// Lowest z still considered in flight
    pub floor: f64,
}

impl FlightBounds {
    /// Arena rectangle grown by `margin`, with expiry `depth` below ground
    pub fn around_arena(width: f64, height: f64, margin: f64, depth: f64) -> Self {
        Self {
            min: DVec2::splat(-margin),
            max: DVec2::new(width + margin, height + margin),
            floor: GROUND_Z - depth,
        }
    }

    pub fn contains(&self, pos: DVec3) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.floor
    }
}

/// Cartesian launch velocity from speed, azimuth (in the ground plane) and loft (elevation)
#[inline]
pub fn launch_velocity(speed: f64, azimuth: f64, loft: f64) -> DVec3 {
    let horizontal = speed * loft.cos();
    DVec3::new(
        horizontal * azimuth.cos(),
        horizontal * azimuth.sin(),
        speed * loft.sin(),
    )
}

/// A single ballistic projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    id: ProjectileId,
    launcher_id: AgentId,
    launcher_team: Team,
    origin: DVec3,
    launch_vel: DVec3,
    gravity: f64,
    /// Time since launch
    elapsed: f64,
    state: ProjectileState,
    /// Sampled positions, launch point first
    trajectory: Vec<DVec3>,
    /// Set once, when the projectile stops being in flight
    frozen: Option<(DVec3, DVec3)>,
}

impl Projectile {
    /// Launch with polar parameters
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        id: ProjectileId,
        launcher_id: AgentId,
        launcher_team: Team,
        origin: DVec3,
        azimuth: f64,
        loft: f64,
        speed: f64,
        gravity: f64,
    ) -> Self {
        Self::launch_cartesian(
            id,
            launcher_id,
            launcher_team,
            origin,
            launch_velocity(speed, azimuth, loft),
            gravity,
        )
    }

    /// Launch with an explicit velocity vector
    pub fn launch_cartesian(
        id: ProjectileId,
        launcher_id: AgentId,
        launcher_team: Team,
        origin: DVec3,
        velocity: DVec3,
        gravity: f64,
    ) -> Self {
        Self {
            id,
            launcher_id,
            launcher_team,
            origin,
            launch_vel: velocity,
            gravity,
            elapsed: 0.0,
            state: ProjectileState::InFlight,
            trajectory: vec![origin],
            frozen: None,
        }
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn launcher_id(&self) -> AgentId {
        self.launcher_id
    }

    pub fn launcher_team(&self) -> Team {
        self.launcher_team
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn trajectory(&self) -> &[DVec3] {
        &self.trajectory
    }

    /// Where the projectile stopped, once it has
    pub fn impact_pos(&self) -> Option<DVec3> {
        self.frozen.map(|(pos, _)| pos)
    }

    pub fn impact_velocity(&self) -> Option<DVec3> {
        self.frozen.map(|(_, vel)| vel)
    }

    /// Current position; frozen once the projectile leaves flight
    pub fn position(&self) -> DVec3 {
        match self.frozen {
            Some((pos, _)) => pos,
            None => self.position_at(self.elapsed),
        }
    }

    /// Current velocity; frozen once the projectile leaves flight
    pub fn velocity(&self) -> DVec3 {
        match self.frozen {
            Some((_, vel)) => vel,
            None => self.velocity_at(self.elapsed),
        }
    }

    #[inline]
    fn position_at(&self, t: f64) -> DVec3 {
        let p = self.origin + self.launch_vel * t;
        DVec3::new(p.x, p.y, p.z - 0.5 * self.gravity * t * t)
    }

    #[inline]
    fn velocity_at(&self, t: f64) -> DVec3 {
        DVec3::new(
            self.launch_vel.x,
            self.launch_vel.y,
            self.launch_vel.z - self.gravity * t,
        )
    }

    /// Advance by `dt`, returning whether the projectile is still in flight
    pub fn advance(&mut self, dt: f64, bounds: &FlightBounds) -> bool {
        if !self.state.is_in_flight() {
            return false;
        }

        let t_start = self.elapsed;
        let z_start = self.position_at(t_start).z;
        self.elapsed += dt;
        let end = self.position_at(self.elapsed);

        if z_start > GROUND_Z && end.z <= GROUND_Z {
            let t_hit = t_start + self.solve_ground_crossing(t_start, dt);
            let mut pos = self.position_at(t_hit);
            pos.z = GROUND_Z;
            self.freeze(ProjectileState::GroundImpact, pos, self.velocity_at(t_hit));
            return false;
        }

        self.trajectory.push(end);

        if !bounds.contains(end) {
            self.freeze(ProjectileState::Expired, end, self.velocity_at(self.elapsed));
            return false;
        }
        true
    }

    fn freeze(&mut self, state: ProjectileState, pos: DVec3, vel: DVec3) {
        debug_assert!(self.frozen.is_none());
        if state != ProjectileState::Expired {
            self.trajectory.push(pos);
        }
        self.frozen = Some((pos, vel));
        self.state = state;
    }

    /// Offset into the step at which z reaches the ground, in [0, dt]
    ///
    /// Solves `z_s + vz_s·τ − ½g·τ² = ground` relative to the step start and
    /// keeps the smallest root inside the step. Rounding can leave no usable
    /// root even though a crossing was observed; the step end is used then.
    fn solve_ground_crossing(&self, t_start: f64, dt: f64) -> f64 {
        let c = self.position_at(t_start).z - GROUND_Z;
        let b = self.velocity_at(t_start).z;
        let a = -0.5 * self.gravity;

        let roots = quadratic_roots(a, b, c);
        roots
            .into_iter()
            .flatten()
            .filter(|tau| (0.0..=dt).contains(tau))
            .reduce(f64::min)
            .unwrap_or(dt)
    }

    /// Time until z returns to the ground, ignoring the arena entirely
    ///
    /// `None` if the trajectory never reaches the ground.
    pub fn flight_time_to_impact(&self) -> Option<f64> {
        let roots = quadratic_roots(-0.5 * self.gravity, self.launch_vel.z, self.origin.z - GROUND_Z);
        roots
            .into_iter()
            .flatten()
            .filter(|&t| t > 0.0)
            .reduce(f64::min)
    }

    /// Horizontal distance travelled before landing on level ground
    pub fn range_on_level_ground(&self) -> f64 {
        match self.flight_time_to_impact() {
            Some(t) => self.launch_vel.truncate().length() * t,
            None => 0.0,
        }
    }
}

/// Real roots of `a·t² + b·t + c = 0`; degenerates to the linear case when `a == 0`
fn quadratic_roots(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    if a == 0.0 {
        if b == 0.0 {
            return [None, None];
        }
        return [Some(-c / b), None];
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return [None, None];
    }
    let sqrt_d = discriminant.sqrt();
    [
        Some((-b + sqrt_d) / (2.0 * a)),
        Some((-b - sqrt_d) / (2.0 * a)),
    ]
}
