use std::collections::HashMap;

use crate::consts::SPATIAL_CELL_SIZE;

/// Uniform-grid broad phase over live enemies. Fully rebuilt every tick
/// and never holds entities across ticks. Queries return the 3×3 cell
/// neighborhood around the query point, a superset of the true radius
/// result, so callers must re-check exact distance.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: HashMap<(i32, i32), Vec<hecs::Entity>>,
}

fn cell_of(x: f32, y: f32) -> (i32, i32) {
    (
        (x / SPATIAL_CELL_SIZE).floor() as i32,
        (y / SPATIAL_CELL_SIZE).floor() as i32,
    )
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, entity: hecs::Entity, x: f32, y: f32) {
        self.cells.entry(cell_of(x, y)).or_default().push(entity);
    }

    /// Broad-phase candidates near (x, y). The radius only matters when
    /// it exceeds one cell; the 3×3 neighborhood already covers any
    /// radius up to the cell size.
    pub fn query(&self, x: f32, y: f32, radius: f32) -> Vec<hecs::Entity> {
        let (cx, cy) = cell_of(x, y);
        let reach = (radius / SPATIAL_CELL_SIZE).ceil().max(1.0) as i32;
        let mut out = Vec::new();
        for gy in (cy - reach)..=(cy + reach) {
            for gx in (cx - reach)..=(cx + reach) {
                if let Some(bucket) = self.cells.get(&(gx, gy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_returns_nothing() {
        let grid = SpatialGrid::new();
        assert!(grid.query(100.0, 100.0, 50.0).is_empty());
    }

    #[test]
    fn query_is_a_superset_of_brute_force() {
        let mut world = hecs::World::new();
        let mut grid = SpatialGrid::new();
        let mut placed: Vec<(hecs::Entity, f32, f32)> = Vec::new();

        // Deterministic scatter without pulling in an RNG.
        for i in 0..200u32 {
            let x = ((i * 73) % 1600) as f32;
            let y = ((i * 137) % 1200) as f32;
            let e = world.spawn(((x, y),));
            grid.insert(e, x, y);
            placed.push((e, x, y));
        }

        for &(qx, qy, radius) in &[(100.0, 100.0, 140.0), (800.0, 600.0, 50.0), (0.0, 0.0, 300.0)] {
            let candidates = grid.query(qx, qy, radius);
            for &(e, x, y) in &placed {
                let dx = x - qx;
                let dy = y - qy;
                if dx * dx + dy * dy <= radius * radius {
                    assert!(candidates.contains(&e), "missing entity at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn clear_empties_all_buckets() {
        let mut world = hecs::World::new();
        let mut grid = SpatialGrid::new();
        let e = world.spawn(());
        grid.insert(e, 10.0, 10.0);
        assert!(!grid.query(10.0, 10.0, 10.0).is_empty());
        grid.clear();
        assert!(grid.query(10.0, 10.0, 10.0).is_empty());
    }
}
