//! Fixed timestep simulation step
//!
//! Advances the world deterministically. Phase order within a step is fixed:
//! actions, kinematics, broad phase, collisions, integration, projectiles.

use std::collections::BTreeMap;

use glam::DVec2;

use super::agent::AgentId;
use super::collision::{CollisionStats, resolve_brute_force, resolve_with_grid};
use super::projectile::ProjectileState;
use super::state::{Event, World};

/// Desired velocity per agent for one step, iterated in ascending id order
pub type Actions = BTreeMap<AgentId, DVec2>;

impl World {
    /// Advance the world by one fixed timestep
    ///
    /// Actions for unknown agents or with non-finite components are dropped.
    /// Agents without an entry keep their previous desired velocity. Returned
    /// events list every collision first, then projectile impacts.
    pub fn step(&mut self, actions: &Actions) -> Vec<Event> {
        let mut events = Vec::new();

        for (&id, desired) in actions {
            if let Err(err) = self.set_desired_velocity(id, desired.x, desired.y) {
                log::warn!("step {}: dropping action: {err}", self.step_count);
            }
        }

        let dt = self.params.dt;
        for agent in self.agents.iter_mut().filter(|a| a.alive) {
            agent.update_heading(dt);
            agent.update_velocity(dt);
        }

        self.grid.rebuild(
            self.agents
                .iter()
                .filter(|a| a.alive)
                .map(|a| (a.id, a.pos)),
        );
        self.resolve_collisions(&mut events);

        let radius = self.params.agent_radius;
        let (width, height) = (self.params.arena_width, self.params.arena_height);
        for agent in self.agents.iter_mut().filter(|a| a.alive) {
            agent.integrate(dt, radius, width, height);
        }

        self.advance_projectiles(&mut events);

        self.step_count += 1;
        log::trace!(
            "step {}: {} events, {} pairs checked, {} projectiles in flight",
            self.step_count,
            events.len(),
            self.stats.pairs_checked,
            self.active.len()
        );
        events
    }

    fn resolve_collisions(&mut self, events: &mut Vec<Event>) {
        let living = self.agents.iter().filter(|a| a.alive).count();
        let radius = self.params.agent_radius;
        let mut stats = CollisionStats {
            cells_occupied: self.grid.occupied_cells(),
            ..Default::default()
        };

        if living <= self.params.brute_force_threshold {
            resolve_brute_force(&mut self.agents, radius, events, &mut stats);
        } else {
            stats.used_grid = true;
            resolve_with_grid(
                &mut self.agents,
                &self.agent_index,
                &mut self.grid,
                radius,
                events,
                &mut stats,
            );
        }
        self.stats = stats;
    }

    /// Integrate in-flight projectiles; each leaves the active list exactly once
    fn advance_projectiles(&mut self, events: &mut Vec<Event>) {
        let dt = self.params.dt;
        let bounds = self.bounds;
        let projectiles = &mut self.projectiles;

        self.active.retain(|&idx| {
            let proj = &mut projectiles[idx];
            if proj.advance(dt, &bounds) {
                return true;
            }

            match (proj.state(), proj.impact_pos()) {
                (ProjectileState::GroundImpact | ProjectileState::TerrainImpact, Some(impact_pos)) => {
                    log::debug!(
                        "projectile {} from agent {} landed at ({:.2}, {:.2})",
                        proj.id(),
                        proj.launcher_id(),
                        impact_pos.x,
                        impact_pos.y
                    );
                    events.push(Event::ProjectileImpact {
                        projectile_id: proj.id(),
                        launcher_id: proj.launcher_id(),
                        impact_pos,
                    });
                }
                (state, _) => log::debug!("projectile {} resolved as {state:?}", proj.id()),
            }
            false
        });
    }
}
