use noise::{NoiseFn, Simplex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{MAP_HEIGHT, MAP_WIDTH, SAFE_ZONE_RADIUS};

/// Noise sampling cell for water/mud patches (world units).
const PATCH_CELL: f32 = 40.0;
/// Noise thresholds for patch placement.
const WATER_THRESHOLD: f64 = 0.55;
const MUD_THRESHOLD: f64 = -0.55;
const PATCH_SCALE: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    Wall,
    EarthWall,
    Water,
    Mud,
}

impl TerrainKind {
    /// Z-priority used to resolve overlapping tiles: higher wins.
    pub fn priority(self) -> u8 {
        match self {
            TerrainKind::Wall => 3,
            TerrainKind::EarthWall => 2,
            TerrainKind::Mud => 1,
            TerrainKind::Water => 0,
        }
    }

    /// Solid and earth walls block movement and projectiles.
    pub fn blocks(self) -> bool {
        matches!(self, TerrainKind::Wall | TerrainKind::EarthWall)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainTile {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub kind: TerrainKind,
}

impl TerrainTile {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    /// Overlap test against an entity rect centered at (cx, cy).
    pub fn overlaps(&self, cx: f32, cy: f32, w: f32, h: f32) -> bool {
        let half_w = w / 2.0;
        let half_h = h / 2.0;
        cx + half_w > self.x
            && cx - half_w < self.x + self.w
            && cy + half_h > self.y
            && cy - half_h < self.y + self.h
    }
}

/// All terrain for the current stage. Regenerated once per stage.
#[derive(Debug, Clone, Default)]
pub struct Terrain {
    pub tiles: Vec<TerrainTile>,
}

fn in_safe_zone(x: f32, y: f32, w: f32, h: f32) -> bool {
    let cx = MAP_WIDTH / 2.0;
    let cy = MAP_HEIGHT / 2.0;
    // Clamp map center onto the rect, then distance-check.
    let px = cx.clamp(x, x + w);
    let py = cy.clamp(y, y + h);
    let dx = cx - px;
    let dy = cy - py;
    dx * dx + dy * dy < SAFE_ZONE_RADIUS * SAFE_ZONE_RADIUS
}

impl Terrain {
    /// Generates stage terrain: random wall and earth-wall rectangles
    /// plus simplex-noise water and mud patches, all excluded from the
    /// central safe zone.
    pub fn generate(stage: u32, seed: u32, rng: &mut impl Rng) -> Self {
        let mut tiles = Vec::new();

        let wall_count = 6 + (stage / 2).min(8);
        let earth_count = 4 + (stage / 3).min(6);

        for kind in [TerrainKind::Wall, TerrainKind::EarthWall] {
            let count = if kind == TerrainKind::Wall {
                wall_count
            } else {
                earth_count
            };
            let mut placed = 0;
            let mut attempts = 0;
            while placed < count && attempts < count * 10 {
                attempts += 1;
                let w = rng.gen_range(40.0..120.0);
                let h = rng.gen_range(40.0..120.0);
                let x = rng.gen_range(0.0..MAP_WIDTH - w);
                let y = rng.gen_range(0.0..MAP_HEIGHT - h);
                if in_safe_zone(x, y, w, h) {
                    continue;
                }
                tiles.push(TerrainTile { x, y, w, h, kind });
                placed += 1;
            }
        }

        // Water and mud patches from noise thresholds, one tile per
        // sampling cell, same approach as chunked terrain generation.
        let noise_fn = Simplex::new(seed.wrapping_add(stage));
        let cols = (MAP_WIDTH / PATCH_CELL) as i32;
        let rows = (MAP_HEIGHT / PATCH_CELL) as i32;
        for gy in 0..rows {
            for gx in 0..cols {
                let x = gx as f32 * PATCH_CELL;
                let y = gy as f32 * PATCH_CELL;
                if in_safe_zone(x, y, PATCH_CELL, PATCH_CELL) {
                    continue;
                }
                let value = noise_fn.get([x as f64 * PATCH_SCALE, y as f64 * PATCH_SCALE]);
                let kind = if value > WATER_THRESHOLD {
                    TerrainKind::Water
                } else if value < MUD_THRESHOLD {
                    TerrainKind::Mud
                } else {
                    continue;
                };
                tiles.push(TerrainTile {
                    x,
                    y,
                    w: PATCH_CELL,
                    h: PATCH_CELL,
                    kind,
                });
            }
        }

        Terrain { tiles }
    }

    /// Returns the terrain kind at a point, resolving overlaps by
    /// z-priority (walls beat earth walls beat mud/water).
    pub fn kind_at(&self, x: f32, y: f32) -> Option<TerrainKind> {
        self.tiles
            .iter()
            .filter(|t| t.contains(x, y))
            .max_by_key(|t| t.kind.priority())
            .map(|t| t.kind)
    }

    /// True if a blocking tile overlaps the entity rect centered at
    /// (cx, cy).
    pub fn blocked(&self, cx: f32, cy: f32, w: f32, h: f32) -> bool {
        self.tiles
            .iter()
            .any(|t| t.kind.blocks() && t.overlaps(cx, cy, w, h))
    }

    /// Converts the earth-wall tile containing the point (if any) to
    /// mud. Used by projectile impacts and explosions.
    pub fn crumble_earth_wall(&mut self, x: f32, y: f32) {
        for tile in &mut self.tiles {
            if tile.kind == TerrainKind::EarthWall && tile.contains(x, y) {
                tile.kind = TerrainKind::Mud;
            }
        }
    }

    /// Converts every earth-wall tile overlapping a circle to mud.
    pub fn crumble_earth_walls_in_radius(&mut self, x: f32, y: f32, radius: f32) {
        for tile in &mut self.tiles {
            if tile.kind == TerrainKind::EarthWall && tile.overlaps(x, y, radius * 2.0, radius * 2.0)
            {
                tile.kind = TerrainKind::Mud;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generation_is_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let a = Terrain::generate(3, 1234, &mut rng_a);
        let b = Terrain::generate(3, 1234, &mut rng_b);
        assert_eq!(a.tiles.len(), b.tiles.len());
        for (ta, tb) in a.tiles.iter().zip(&b.tiles) {
            assert_eq!(ta.kind, tb.kind);
            assert_eq!(ta.x, tb.x);
            assert_eq!(ta.y, tb.y);
        }
    }

    #[test]
    fn safe_zone_has_no_obstacles() {
        let mut rng = StdRng::seed_from_u64(10);
        let terrain = Terrain::generate(5, 77, &mut rng);
        let cx = MAP_WIDTH / 2.0;
        let cy = MAP_HEIGHT / 2.0;
        assert!(terrain.kind_at(cx, cy).is_none());
        assert!(!terrain.blocked(cx, cy, 32.0, 32.0));
    }

    #[test]
    fn overlap_resolves_by_priority() {
        let mut terrain = Terrain::default();
        terrain.tiles.push(TerrainTile {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
            kind: TerrainKind::Water,
        });
        terrain.tiles.push(TerrainTile {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
            kind: TerrainKind::Wall,
        });
        assert_eq!(terrain.kind_at(50.0, 50.0), Some(TerrainKind::Wall));
    }

    #[test]
    fn earth_walls_crumble_to_mud() {
        let mut terrain = Terrain::default();
        terrain.tiles.push(TerrainTile {
            x: 0.0,
            y: 0.0,
            w: 50.0,
            h: 50.0,
            kind: TerrainKind::EarthWall,
        });
        assert!(terrain.blocked(25.0, 25.0, 10.0, 10.0));
        terrain.crumble_earth_wall(25.0, 25.0);
        assert_eq!(terrain.kind_at(25.0, 25.0), Some(TerrainKind::Mud));
        assert!(!terrain.blocked(25.0, 25.0, 10.0, 10.0));
    }
}
