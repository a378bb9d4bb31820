//! Skirmish headless demo
//!
//! Two teams charge each other across the arena while a few agents throw
//! projectiles. Prints a summary and the final state hash.
//!
//! Usage: `skirmish [seed] [params.json]`

use std::f64::consts::{FRAC_PI_4, PI};

use glam::DVec2;
use rand::Rng;
use skirmish::{Actions, AgentAttributes, Event, SimParams, Team, World};

const AGENTS_PER_TEAM: u32 = 40;
const STEPS: u64 = 200;
const THROW_EVERY: u64 = 25;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse()?,
        None => 42,
    };
    let params = match args.next() {
        Some(path) => SimParams::from_json(&std::fs::read_to_string(path)?)?,
        None => SimParams::default(),
    };

    log::info!("Skirmish starting with seed {seed}");
    let mut world = World::new(params, seed)?;
    let (width, height) = (world.params().arena_width, world.params().arena_height);

    let mut actions = Actions::new();
    for team in [Team::Blue, Team::Red] {
        let (x, charge) = match team {
            Team::Blue => (width * 0.2, 1.0),
            Team::Red => (width * 0.8, -1.0),
        };
        for i in 0..AGENTS_PER_TEAM {
            let y = height * (i as f64 + 0.5) / AGENTS_PER_TEAM as f64;
            let attrs = AgentAttributes {
                max_speed: world.rng().random_range(6.0..9.0),
                agility: world.rng().random_range(2.0..4.0),
                ..Default::default()
            };
            let id = world.add_agent(team, x, y, attrs)?;
            actions.insert(id, DVec2::new(charge * attrs.cruise_speed, 0.0));
        }
    }

    let (mut collisions, mut impacts, mut thrown) = (0usize, 0usize, 0usize);
    for step in 0..STEPS {
        if step % THROW_EVERY == 0 {
            let count = world.agent_count() as u32;
            let thrower = world.rng().random_range(0..count);
            let azimuth = world.rng().random_range(-PI..PI);
            let speed = world.rng().random_range(10.0..25.0);
            world.launch_projectile(thrower, azimuth, FRAC_PI_4, speed)?;
            thrown += 1;
        }

        // Desired velocities persist, so the charge order is issued once
        let events = world.step(&actions);
        actions.clear();
        for event in &events {
            match event {
                Event::Collision { .. } => collisions += 1,
                Event::ProjectileImpact { .. } => impacts += 1,
            }
        }
    }

    let stats = world.collision_stats();
    log::info!(
        "{} steps: {collisions} collisions, {impacts}/{thrown} projectiles landed, {} still in flight",
        world.step_count(),
        world.in_flight_count()
    );
    log::info!(
        "last step: {} pairs checked, {} colliding, {} cells occupied, grid={}",
        stats.pairs_checked,
        stats.pairs_colliding,
        stats.cells_occupied,
        stats.used_grid
    );
    println!("{}", world.state_hash());
    Ok(())
}
