//! World state and core simulation types
//!
//! The world exclusively owns every agent and projectile. Collaborators change
//! it only through the mutation methods here and read it through views and
//! snapshots.

use std::collections::HashMap;

use glam::{DVec2, DVec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::agent::{Agent, AgentId, AgentView, Team};
use super::collision::CollisionStats;
use super::grid::SpatialGrid;
use super::projectile::{FlightBounds, Projectile, ProjectileId, ProjectileState};
use crate::error::{ConfigError, SimError};
use crate::params::{AgentAttributes, SimParams};

/// Something notable that happened during a step
///
/// Returned by [`World::step`]; the world does not keep them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Two agents touched. Ids are ascending
    Collision {
        agent_a: AgentId,
        agent_b: AgentId,
        contact_pos: DVec2,
    },
    /// A projectile reached the ground
    ProjectileImpact {
        projectile_id: ProjectileId,
        launcher_id: AgentId,
        impact_pos: DVec3,
    },
}

/// Read-only projectile summary for telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub launcher_id: AgentId,
    pub launcher_team: Team,
    pub state: ProjectileState,
    pub position: DVec3,
    pub velocity: DVec3,
}

impl From<&Projectile> for ProjectileView {
    fn from(proj: &Projectile) -> Self {
        Self {
            id: proj.id(),
            launcher_id: proj.launcher_id(),
            launcher_team: proj.launcher_team(),
            state: proj.state(),
            position: proj.position(),
            velocity: proj.velocity(),
        }
    }
}

/// Full exported state of a world at one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub step_count: u64,
    pub agents: Vec<AgentView>,
    pub projectiles: Vec<ProjectileView>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Complete simulation state (deterministic for a given seed and action sequence)
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) params: SimParams,
    seed: u64,
    rng: Pcg32,
    /// Dense records in ascending id order
    pub(crate) agents: Vec<Agent>,
    /// Lookup only; never iterated
    pub(crate) agent_index: HashMap<AgentId, usize>,
    /// Every projectile ever launched, ascending id
    pub(crate) projectiles: Vec<Projectile>,
    /// Indices into `projectiles` still in flight, in launch order
    pub(crate) active: Vec<usize>,
    pub(crate) grid: SpatialGrid,
    pub(crate) bounds: FlightBounds,
    pub(crate) stats: CollisionStats,
    pub(crate) step_count: u64,
    next_agent_id: AgentId,
    next_projectile_id: ProjectileId,
}

impl World {
    /// Build an empty world; fails only on invalid configuration
    pub fn new(params: SimParams, seed: u64) -> Result<Self, ConfigError> {
        params.validate()?;

        log::debug!(
            "World created: {}x{} arena, dt={}, cell_size={}, seed={}",
            params.arena_width,
            params.arena_height,
            params.dt,
            params.cell_size,
            seed
        );

        Ok(Self {
            grid: SpatialGrid::new(params.cell_size, params.arena_width, params.arena_height),
            bounds: FlightBounds::around_arena(
                params.arena_width,
                params.arena_height,
                params.projectile_margin,
                params.expire_depth,
            ),
            params,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            agents: Vec::new(),
            agent_index: HashMap::new(),
            projectiles: Vec::new(),
            active: Vec::new(),
            stats: CollisionStats::default(),
            step_count: 0,
            next_agent_id: 0,
            next_projectile_id: 0,
        })
    }

    /// Drop all agents and projectiles and reseed
    ///
    /// Id counters keep counting, so ids stay unique for this world's lifetime.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.agents.clear();
        self.agent_index.clear();
        self.projectiles.clear();
        self.active.clear();
        self.grid.clear();
        self.stats = CollisionStats::default();
        self.step_count = 0;
        log::debug!("World reset with seed {seed}");
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Seeded random stream for scenario scripting; the stepper never draws from it
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    // === Mutation ===

    /// Add a living agent at rest facing +x
    pub fn add_agent(
        &mut self,
        team: Team,
        x: f64,
        y: f64,
        attributes: AgentAttributes,
    ) -> Result<AgentId, SimError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SimError::NonFiniteInput {
                what: "agent position",
            });
        }
        attributes.validate()?;

        let id = self.next_agent_id;
        self.next_agent_id += 1;
        self.agent_index.insert(id, self.agents.len());
        self.agents
            .push(Agent::new(id, team, DVec2::new(x, y), attributes));
        Ok(id)
    }

    pub fn set_desired_velocity(&mut self, id: AgentId, vx: f64, vy: f64) -> Result<(), SimError> {
        if !vx.is_finite() || !vy.is_finite() {
            return Err(SimError::NonFiniteInput {
                what: "desired velocity",
            });
        }
        self.agent_mut(id)?.desired_vel = DVec2::new(vx, vy);
        Ok(())
    }

    /// Toggle liveness; dead agents are neither moved nor collided
    pub fn set_alive(&mut self, id: AgentId, alive: bool) -> Result<(), SimError> {
        self.agent_mut(id)?.alive = alive;
        Ok(())
    }

    /// Throw a projectile from an agent's position at launch height
    pub fn launch_projectile(
        &mut self,
        id: AgentId,
        azimuth: f64,
        loft: f64,
        speed: f64,
    ) -> Result<ProjectileId, SimError> {
        if !azimuth.is_finite() || !loft.is_finite() || !speed.is_finite() {
            return Err(SimError::NonFiniteInput {
                what: "launch parameters",
            });
        }
        let agent = self.agent_ref(id)?;
        let origin = agent.pos.extend(self.params.launch_height);
        let team = agent.team;

        let proj_id = self.next_projectile_id;
        self.next_projectile_id += 1;
        self.active.push(self.projectiles.len());
        self.projectiles.push(Projectile::launch(
            proj_id,
            id,
            team,
            origin,
            azimuth,
            loft,
            speed,
            self.params.gravity,
        ));
        Ok(proj_id)
    }

    fn agent_ref(&self, id: AgentId) -> Result<&Agent, SimError> {
        self.agent_index
            .get(&id)
            .map(|&idx| &self.agents[idx])
            .ok_or(SimError::UnknownAgent(id))
    }

    fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, SimError> {
        match self.agent_index.get(&id) {
            Some(&idx) => Ok(&mut self.agents[idx]),
            None => Err(SimError::UnknownAgent(id)),
        }
    }

    // === Queries ===

    /// All agents in ascending id order
    pub fn agents(&self) -> impl Iterator<Item = AgentView> + '_ {
        self.agents.iter().map(Agent::view)
    }

    pub fn agent(&self, id: AgentId) -> Option<AgentView> {
        self.agent_ref(id).ok().map(Agent::view)
    }

    pub fn agent_attributes(&self, id: AgentId) -> Option<AgentAttributes> {
        self.agent_ref(id).ok().map(|a| a.attrs)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Every projectile ever launched, including resolved ones
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles
            .binary_search_by_key(&id, Projectile::id)
            .ok()
            .map(|idx| &self.projectiles[idx])
    }

    /// Projectiles still being integrated, in launch order
    pub fn active_projectiles(&self) -> impl Iterator<Item = &Projectile> + '_ {
        self.active.iter().map(|&idx| &self.projectiles[idx])
    }

    pub fn in_flight_count(&self) -> usize {
        self.active.len()
    }

    /// Broad/narrow phase counters from the most recent step
    pub fn collision_stats(&self) -> CollisionStats {
        self.stats
    }

    /// Spatial grid as rebuilt during the most recent step
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// SHA-256 over agent state in ascending id order, as lowercase hex
    ///
    /// Hashes exact IEEE bit patterns, so equal floats give equal digests on
    /// every platform.
    pub fn state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        // `agents` is stored in ascending id order
        for agent in &self.agents {
            agent.hash_into(&mut hasher);
        }
        hex::encode(hasher.finalize())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            step_count: self.step_count,
            agents: self.agents().collect(),
            projectiles: self.projectiles.iter().map(ProjectileView::from).collect(),
        }
    }
}
