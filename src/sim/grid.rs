//! Uniform spatial grid for broad-phase pair search
//!
//! The arena is cut into square cells. Every agent lands in exactly one cell,
//! so any two agents closer than one cell edge sit in the same or adjacent
//! cells. Pair search then only has to look at a 3×3 neighborhood.
//!
//! Cells are keyed `(row, col)` in a `BTreeMap`, so iteration order depends
//! only on positions, never on hashing.

use std::collections::BTreeMap;

use glam::DVec2;

use super::agent::AgentId;

/// Integer cell coordinate `(row, col)`, row from y and col from x
pub type CellCoord = (i64, i64);

/// Neighbor offsets visited from each occupied cell
///
/// Only "forward" neighbors (`dr > 0`, or `dr == 0 && dc > 0`) so each pair of
/// adjacent cells is visited from exactly one side.
const FORWARD_NEIGHBORS: [(i64, i64); 4] = [(0, 1), (1, -1), (1, 0), (1, 1)];

/// Summary of how agents are spread over the grid
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridOccupancy {
    pub occupied_cells: usize,
    pub total_agents: usize,
    pub mean_per_cell: f64,
    pub max_per_cell: usize,
}

/// Uniform-cell spatial index, rebuilt from scratch every step
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    width: f64,
    height: f64,
    cells: BTreeMap<CellCoord, Vec<AgentId>>,
}

impl SpatialGrid {
    /// `cell_size` must be positive; [`crate::SimParams::validate`] guarantees it
    pub fn new(cell_size: f64, width: f64, height: f64) -> Self {
        debug_assert!(cell_size > 0.0);
        Self {
            cell_size,
            width,
            height,
            cells: BTreeMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `pos`, with the position first clipped to the arena
    #[inline]
    pub fn cell_of(&self, pos: DVec2) -> CellCoord {
        let x = pos.x.clamp(0.0, self.width);
        let y = pos.y.clamp(0.0, self.height);
        (
            (y / self.cell_size).floor() as i64,
            (x / self.cell_size).floor() as i64,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, id: AgentId, pos: DVec2) {
        let cell = self.cell_of(pos);
        let bucket = self.cells.entry(cell).or_default();
        // Keep buckets sorted so pair output never depends on insertion order
        if let Err(at) = bucket.binary_search(&id) {
            bucket.insert(at, id);
        }
    }

    /// Drop `id` from the cell holding `pos`; empty cells are released
    pub fn remove(&mut self, id: AgentId, pos: DVec2) {
        let cell = self.cell_of(pos);
        let Some(bucket) = self.cells.get_mut(&cell) else {
            return;
        };
        if let Ok(at) = bucket.binary_search(&id) {
            bucket.remove(at);
        }
        if bucket.is_empty() {
            self.cells.remove(&cell);
        }
    }

    /// Move `id` after its position changed from `from` to `to`
    pub fn relocate(&mut self, id: AgentId, from: DVec2, to: DVec2) {
        if self.cell_of(from) != self.cell_of(to) {
            self.remove(id, from);
            self.insert(id, to);
        }
    }

    /// Clear and repopulate from `(id, position)` entries
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (AgentId, DVec2)>) {
        self.clear();
        for (id, pos) in entries {
            self.insert(id, pos);
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every unordered pair in the same or adjacent cells
    ///
    /// Pairs are canonical `(min, max)`, unique, and sorted ascending.
    pub fn candidate_pairs(&self) -> Vec<(AgentId, AgentId)> {
        let mut pairs = Vec::new();

        for (&(row, col), ids) in &self.cells {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    pairs.push(canonical(a, b));
                }
            }

            for (dr, dc) in FORWARD_NEIGHBORS {
                let Some(other) = self.cells.get(&(row + dr, col + dc)) else {
                    continue;
                };
                for &a in ids {
                    for &b in other {
                        pairs.push(canonical(a, b));
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Ids in the 3×3 block of cells around `pos`, ascending
    pub fn neighbors(&self, pos: DVec2) -> Vec<AgentId> {
        let (row, col) = self.cell_of(pos);
        let mut found = Vec::new();
        for dr in -1..=1 {
            for dc in -1..=1 {
                if let Some(ids) = self.cells.get(&(row + dr, col + dc)) {
                    found.extend_from_slice(ids);
                }
            }
        }
        found.sort_unstable();
        found
    }

    pub fn occupancy(&self) -> GridOccupancy {
        let occupied_cells = self.cells.len();
        let total_agents = self.len();
        GridOccupancy {
            occupied_cells,
            total_agents,
            mean_per_cell: total_agents as f64 / occupied_cells.max(1) as f64,
            max_per_cell: self.cells.values().map(Vec::len).max().unwrap_or(0),
        }
    }
}

#[inline]
fn canonical(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Cell edge that puts roughly three agents in each occupied cell
///
/// Clamped to at least one agent diameter and at most a third of the arena.
pub fn estimate_cell_size(width: f64, height: f64, num_agents: usize, agent_radius: f64) -> f64 {
    const TARGET_AGENTS_PER_CELL: f64 = 3.0;

    let target_cells = (num_agents as f64 / TARGET_AGENTS_PER_CELL).max(1.0);
    let cell_size = (width * height / target_cells).sqrt();

    let min_cell = 2.0 * agent_radius;
    let max_cell = (width.max(height) / 3.0).max(min_cell);
    cell_size.clamp(min_cell, max_cell)
}
