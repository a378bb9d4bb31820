//! Narrow-phase collision detection and response between agents
//!
//! All agents share one radius, so a pair touches when their centres are
//! closer than one diameter. Response is an equal-mass elastic exchange along
//! the contact normal plus a positional push that removes the overlap.

use std::collections::HashMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentId};
use super::grid::SpatialGrid;
use super::state::Event;
use crate::consts::{FALLBACK_NORMAL, SEPARATION_EPSILON};

/// Result of an overlap test between two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the first circle towards the second
    pub normal: DVec2,
    /// Centre distance
    pub distance: f64,
    /// How far the circles interpenetrate
    pub penetration: f64,
}

/// Overlap test between two equal circles of diameter `min_dist`
///
/// Compares squared distances so the common miss costs no square root.
/// Coincident centres fall back to [`FALLBACK_NORMAL`].
#[inline]
pub fn circle_contact(a: DVec2, b: DVec2, min_dist: f64) -> Option<Contact> {
    let delta = b - a;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let distance = dist_sq.sqrt();
    let normal = if distance > 0.0 {
        delta / distance
    } else {
        FALLBACK_NORMAL
    };
    Some(Contact {
        normal,
        distance,
        penetration: min_dist - distance,
    })
}

/// Swap the normal velocity components of two equal masses
///
/// Only applied while the bodies approach; tangential components are kept.
#[inline]
pub fn exchange_normal_velocity(va: DVec2, vb: DVec2, normal: DVec2) -> (DVec2, DVec2) {
    let closing = (vb - va).dot(normal);
    if closing < 0.0 {
        (va + normal * closing, vb - normal * closing)
    } else {
        (va, vb)
    }
}

/// Resolve one candidate pair, returning the contact point if they touched
pub(crate) fn resolve_pair(a: &mut Agent, b: &mut Agent, radius: f64) -> Option<DVec2> {
    let contact = circle_contact(a.pos, b.pos, 2.0 * radius)?;
    let normal = contact.normal;

    (a.vel, b.vel) = exchange_normal_velocity(a.vel, b.vel, normal);

    let push = contact.penetration / 2.0 + SEPARATION_EPSILON;
    a.pos -= normal * push;
    b.pos += normal * push;

    Some((a.pos + b.pos) * 0.5)
}

/// Per-step broad/narrow phase counters, for benchmarking only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionStats {
    /// Candidate pairs handed to the narrow phase
    pub pairs_checked: usize,
    /// Candidates that actually overlapped
    pub pairs_colliding: usize,
    /// Occupied grid cells after the rebuild
    pub cells_occupied: usize,
    /// Whether the grid (rather than brute force) produced the candidates
    pub used_grid: bool,
}

/// Test every living pair in ascending id order
pub(crate) fn resolve_brute_force(
    agents: &mut [Agent],
    radius: f64,
    events: &mut Vec<Event>,
    stats: &mut CollisionStats,
) {
    for i in 0..agents.len() {
        if !agents[i].alive {
            continue;
        }
        for j in i + 1..agents.len() {
            if !agents[j].alive {
                continue;
            }
            let (a, b) = pair_mut(agents, i, j);
            stats.pairs_checked += 1;
            if let Some(contact_pos) = resolve_pair(a, b, radius) {
                stats.pairs_colliding += 1;
                events.push(collision_event(a, b, contact_pos));
            }
        }
    }
}

/// Test each living agent against grid neighbours with a larger id
///
/// Visits pairs in the same ascending order as [`resolve_brute_force`]. The
/// grid follows every positional correction, so a pair pushed together
/// earlier in the pass is still found. Cells at least one diameter wide keep
/// every overlapping pair in adjacent cells, so outcomes equal brute force.
pub(crate) fn resolve_with_grid(
    agents: &mut [Agent],
    index: &HashMap<AgentId, usize>,
    grid: &mut SpatialGrid,
    radius: f64,
    events: &mut Vec<Event>,
    stats: &mut CollisionStats,
) {
    for i in 0..agents.len() {
        if !agents[i].alive {
            continue;
        }
        let id_a = agents[i].id;
        let mut candidates = neighbors_after(grid, agents[i].pos, id_a);
        let mut next = 0;

        while let Some(&id_b) = candidates.get(next) {
            next += 1;
            let Some(&j) = index.get(&id_b) else {
                continue;
            };
            let (a, b) = pair_mut(agents, i, j);
            if !b.alive {
                continue;
            }

            stats.pairs_checked += 1;
            let (from_a, from_b) = (a.pos, b.pos);
            if let Some(contact_pos) = resolve_pair(a, b, radius) {
                stats.pairs_colliding += 1;
                events.push(collision_event(a, b, contact_pos));
                grid.relocate(a.id, from_a, a.pos);
                grid.relocate(b.id, from_b, b.pos);
                // `a` moved; its neighbourhood past `b` may have changed
                candidates = neighbors_after(grid, a.pos, id_b);
                next = 0;
            }
        }
    }
}

fn neighbors_after(grid: &SpatialGrid, pos: DVec2, after: AgentId) -> Vec<AgentId> {
    let mut ids = grid.neighbors(pos);
    ids.retain(|&id| id > after);
    ids
}

fn collision_event(a: &Agent, b: &Agent, contact_pos: DVec2) -> Event {
    Event::Collision {
        agent_a: a.id,
        agent_b: b.id,
        contact_pos,
    }
}

/// Two distinct mutable elements of one slice, in argument order
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j, "pair_mut needs two distinct indices");
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AgentAttributes;
    use crate::sim::agent::Team;

    fn agent(id: AgentId, x: f64, y: f64, vx: f64, vy: f64) -> Agent {
        let mut agent = Agent::new(id, Team::Blue, DVec2::new(x, y), AgentAttributes::default());
        agent.vel = DVec2::new(vx, vy);
        agent
    }

    #[test]
    fn test_circle_contact_miss_and_hit() {
        assert!(circle_contact(DVec2::ZERO, DVec2::new(0.6, 0.0), 0.6).is_none());

        let contact = circle_contact(DVec2::ZERO, DVec2::new(0.0, 0.4), 0.6).unwrap();
        assert!((contact.normal - DVec2::Y).length() < 1e-12);
        assert!((contact.penetration - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_coincident_centres_use_fallback_normal() {
        let contact = circle_contact(DVec2::new(5.0, 5.0), DVec2::new(5.0, 5.0), 0.6).unwrap();
        assert_eq!(contact.normal, FALLBACK_NORMAL);
        assert_eq!(contact.distance, 0.0);

        let mut a = agent(0, 5.0, 5.0, 0.0, 0.0);
        let mut b = agent(1, 5.0, 5.0, 0.0, 0.0);
        let contact_pos = resolve_pair(&mut a, &mut b, 0.3).unwrap();
        assert!(a.pos.x < b.pos.x);
        assert!(a.pos.is_finite() && b.pos.is_finite());
        assert!((contact_pos - DVec2::new(5.0, 5.0)).length() < 1e-12);
    }

    #[test]
    fn test_head_on_exchange() {
        let (va, vb) =
            exchange_normal_velocity(DVec2::new(5.0, 0.0), DVec2::new(-5.0, 0.0), DVec2::X);
        assert_eq!(va, DVec2::new(-5.0, 0.0));
        assert_eq!(vb, DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_separating_pair_keeps_velocity() {
        let (va, vb) =
            exchange_normal_velocity(DVec2::new(-1.0, 0.0), DVec2::new(1.0, 0.0), DVec2::X);
        assert_eq!(va, DVec2::new(-1.0, 0.0));
        assert_eq!(vb, DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_tangential_component_untouched() {
        let (va, vb) =
            exchange_normal_velocity(DVec2::new(3.0, 2.0), DVec2::new(-1.0, -4.0), DVec2::X);
        assert_eq!(va.y, 2.0);
        assert_eq!(vb.y, -4.0);
        // Momentum along the normal is conserved
        assert!((va.x + vb.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_positional_correction_removes_overlap() {
        let mut a = agent(0, 49.8, 50.0, 5.0, 0.0);
        let mut b = agent(1, 50.2, 50.0, -5.0, 0.0);
        resolve_pair(&mut a, &mut b, 0.3).unwrap();

        let dist = a.pos.distance(b.pos);
        assert!((dist - (0.6 + 2.0 * SEPARATION_EPSILON)).abs() < 1e-9);
        assert_eq!(a.vel, DVec2::new(-5.0, 0.0));
        assert_eq!(b.vel, DVec2::new(5.0, 0.0));
    }

    fn run_both(make: impl Fn() -> Vec<Agent>, cell_size: f64) -> (Vec<Agent>, Vec<Event>, Vec<Event>) {
        let mut brute = make();
        let mut brute_events = Vec::new();
        resolve_brute_force(&mut brute, 0.3, &mut brute_events, &mut CollisionStats::default());

        let mut swept = make();
        let index: HashMap<AgentId, usize> =
            swept.iter().enumerate().map(|(i, a)| (a.id, i)).collect();
        let mut grid = SpatialGrid::new(cell_size, 100.0, 100.0);
        grid.rebuild(swept.iter().map(|a| (a.id, a.pos)));
        let mut swept_events = Vec::new();
        resolve_with_grid(
            &mut swept,
            &index,
            &mut grid,
            0.3,
            &mut swept_events,
            &mut CollisionStats::default(),
        );

        for (x, y) in brute.iter().zip(&swept) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
        }
        (swept, brute_events, swept_events)
    }

    #[test]
    fn test_brute_force_and_grid_agree() {
        let make = || {
            vec![
                agent(0, 10.0, 10.0, 1.0, 0.0),
                agent(1, 10.4, 10.0, -1.0, 0.0),
                agent(2, 10.2, 10.3, 0.0, -1.0),
                agent(3, 40.0, 40.0, 0.0, 0.0),
            ]
        };
        let (_, brute_events, grid_events) = run_both(make, 1.0);
        assert_eq!(brute_events, grid_events);
        assert!(!grid_events.is_empty());
    }

    #[test]
    fn test_push_across_cell_border_creates_contact() {
        // 1 and 2 start two cells apart and clear of each other; pushing 1
        // out of 0 carries it into contact with 2 within the same pass
        let make = || {
            vec![
                agent(0, 10.5, 50.0, 0.0, 0.0),
                agent(1, 10.79, 50.0, 0.0, 0.0),
                agent(2, 11.41, 50.0, 0.0, 0.0),
            ]
        };
        let mut grid = SpatialGrid::new(0.6, 100.0, 100.0);
        grid.rebuild(make().iter().map(|a| (a.id, a.pos)));
        assert!(!grid.candidate_pairs().contains(&(1, 2)));

        let (_, brute_events, grid_events) = run_both(make, 0.6);
        assert_eq!(brute_events.len(), 2);
        assert!(matches!(grid_events[1], Event::Collision { agent_a: 1, agent_b: 2, .. }));
        assert_eq!(brute_events, grid_events);
    }

    #[test]
    fn test_grid_sweep_skips_dead_agents() {
        let mut agents = vec![agent(0, 10.0, 10.0, 0.0, 0.0), agent(1, 10.1, 10.0, 0.0, 0.0)];
        agents[1].alive = false;
        let index: HashMap<AgentId, usize> = (0..2).map(|i| (i as AgentId, i)).collect();
        let mut grid = SpatialGrid::new(1.0, 100.0, 100.0);
        grid.rebuild(agents.iter().map(|a| (a.id, a.pos)));
        let mut events = Vec::new();
        let mut stats = CollisionStats::default();
        resolve_with_grid(&mut agents, &index, &mut grid, 0.3, &mut events, &mut stats);
        assert!(events.is_empty());
        assert_eq!(stats.pairs_checked, 0);
    }

    #[test]
    fn test_dead_agents_are_skipped() {
        let mut agents = vec![agent(0, 10.0, 10.0, 0.0, 0.0), agent(1, 10.1, 10.0, 0.0, 0.0)];
        agents[1].alive = false;
        let mut events = Vec::new();
        let mut stats = CollisionStats::default();
        resolve_brute_force(&mut agents, 0.3, &mut events, &mut stats);
        assert!(events.is_empty());
        assert_eq!(stats.pairs_checked, 0);
    }

    #[test]
    fn test_pair_mut_either_order() {
        let mut values = [1, 2, 3];
        let (a, b) = pair_mut(&mut values, 2, 0);
        std::mem::swap(a, b);
        assert_eq!(values, [3, 2, 1]);
    }
}
