//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, AI or platform dependencies

pub mod agent;
pub mod collision;
pub mod grid;
pub mod projectile;
pub mod state;
pub mod tick;

pub use agent::{AgentId, AgentView, Team};
pub use collision::{CollisionStats, Contact, circle_contact, exchange_normal_velocity};
pub use grid::{CellCoord, GridOccupancy, SpatialGrid, estimate_cell_size};
pub use projectile::{FlightBounds, Projectile, ProjectileId, ProjectileState, launch_velocity};
pub use state::{Event, ProjectileView, World, WorldSnapshot};
pub use tick::Actions;
