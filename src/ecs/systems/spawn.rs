use hecs::World;
use rand::Rng;
use tracing::debug;

use crate::consts::{
    MAP_HEIGHT, MAP_WIDTH, SPAWN_ATTEMPTS, SPAWN_FALLBACK_ATTEMPTS, SPAWN_INTERVAL,
    SPAWN_MAX_PLAYER_DIST, SPAWN_MIN_PLAYER_DIST,
};
use crate::ecs::components::{
    Affinity, Archetype, AttackTimer, BossAbility, BossState, Collider, Debuffs, Enemy, EnemyKind,
    EnemyStats, Health, Minion, Position, ShieldBuffer, SimState, Velocity,
};
use crate::game::loot::pick_weighted;
use crate::game::stats::Element;

/// Minimum stage at which an archetype may appear.
fn min_stage(kind: EnemyKind) -> u32 {
    match kind {
        EnemyKind::Grunt => 1,
        EnemyKind::Sprinter => 2,
        EnemyKind::Ranged => 2,
        EnemyKind::Shambler => 3,
        EnemyKind::Brute => 4,
        EnemyKind::Bomber => 4,
        EnemyKind::Support => 5,
        EnemyKind::Incinerator => 7,
        EnemyKind::Boss => u32::MAX, // never via weighted selection
    }
}

/// Spawn weight within the eligible pool.
fn spawn_weight(kind: EnemyKind) -> f32 {
    match kind {
        EnemyKind::Grunt => 30.0,
        EnemyKind::Sprinter => 18.0,
        EnemyKind::Brute => 10.0,
        EnemyKind::Ranged => 16.0,
        EnemyKind::Bomber => 8.0,
        EnemyKind::Incinerator => 6.0,
        EnemyKind::Shambler => 8.0,
        EnemyKind::Support => 4.0,
        EnemyKind::Boss => 0.0,
    }
}

/// Base HP and per-stage growth.
fn base_stats(kind: EnemyKind, stage: u32) -> (f32, f32, f32) {
    let s = stage as f32;
    // (hp, attack, move_speed)
    match kind {
        EnemyKind::Grunt => (20.0 + 6.0 * s, 5.0 + 1.2 * s, 1.6),
        EnemyKind::Sprinter => (12.0 + 4.0 * s, 4.0 + 1.0 * s, 3.0),
        EnemyKind::Brute => (60.0 + 14.0 * s, 9.0 + 2.0 * s, 0.9),
        EnemyKind::Ranged => (16.0 + 5.0 * s, 6.0 + 1.4 * s, 1.8),
        EnemyKind::Bomber => (22.0 + 6.0 * s, 8.0 + 1.8 * s, 1.4),
        EnemyKind::Incinerator => (26.0 + 7.0 * s, 7.0 + 1.6 * s, 1.3),
        EnemyKind::Shambler => (30.0 + 8.0 * s, 6.0 + 1.3 * s, 1.0),
        EnemyKind::Support => (18.0 + 5.0 * s, 3.0 + 0.8 * s, 1.5),
        EnemyKind::Boss => (400.0 + 120.0 * s, 14.0 + 2.5 * s, 1.2),
    }
}

fn collider_radius(kind: EnemyKind) -> f32 {
    match kind {
        EnemyKind::Brute => 22.0,
        EnemyKind::Boss => 34.0,
        _ => 14.0,
    }
}

fn roll_element(rng: &mut impl Rng) -> Element {
    pick_weighted(
        rng,
        &[
            (Element::Fire, 23.0),
            (Element::Grass, 23.0),
            (Element::Earth, 23.0),
            (Element::Water, 23.0),
            (Element::None, 8.0),
        ],
    )
}

/// Picks an archetype for the current stage by weighted random over the
/// kinds whose minimum-stage requirement is met.
pub fn pick_archetype(stage: u32, rng: &mut impl Rng) -> EnemyKind {
    let pool: Vec<(EnemyKind, f32)> = [
        EnemyKind::Grunt,
        EnemyKind::Sprinter,
        EnemyKind::Brute,
        EnemyKind::Ranged,
        EnemyKind::Bomber,
        EnemyKind::Incinerator,
        EnemyKind::Shambler,
        EnemyKind::Support,
    ]
    .into_iter()
    .filter(|&k| min_stage(k) <= stage)
    .map(|k| (k, spawn_weight(k)))
    .collect();
    pick_weighted(rng, &pool)
}

/// Best-effort spawn placement: up to [`SPAWN_ATTEMPTS`] tries for a
/// point that is unobstructed and inside the min/max distance ring
/// around the player; a fallback pass drops the distance constraint.
/// Returns `None` if even the fallback fails (the spawn is skipped for
/// this tick and retried on the normal cadence).
pub fn find_spawn_position(state: &mut SimState, radius: f32) -> Option<(f32, f32)> {
    let (px, py) = (state.player.x, state.player.y);

    for _ in 0..SPAWN_ATTEMPTS {
        let x = state.rng.gen_range(radius..MAP_WIDTH - radius);
        let y = state.rng.gen_range(radius..MAP_HEIGHT - radius);
        let dx = x - px;
        let dy = y - py;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq < SPAWN_MIN_PLAYER_DIST * SPAWN_MIN_PLAYER_DIST
            || dist_sq > SPAWN_MAX_PLAYER_DIST * SPAWN_MAX_PLAYER_DIST
        {
            continue;
        }
        if state.terrain.blocked(x, y, radius * 2.0, radius * 2.0) {
            continue;
        }
        return Some((x, y));
    }

    debug!("spawn placement fell back to unconstrained distance");
    for _ in 0..SPAWN_FALLBACK_ATTEMPTS {
        let x = state.rng.gen_range(radius..MAP_WIDTH - radius);
        let y = state.rng.gen_range(radius..MAP_HEIGHT - radius);
        if !state.terrain.blocked(x, y, radius * 2.0, radius * 2.0) {
            return Some((x, y));
        }
    }

    None
}

/// Spawns one enemy of the given kind at (x, y), scaled to the stage.
pub fn spawn_enemy(
    world: &mut World,
    state: &mut SimState,
    kind: EnemyKind,
    x: f32,
    y: f32,
    minion: bool,
) -> hecs::Entity {
    let (hp, attack, move_speed) = base_stats(kind, state.stage.number);
    let element = roll_element(&mut state.rng);

    let entity = world.spawn((
        Enemy,
        Archetype { kind },
        Affinity { element },
        Position { x, y },
        Velocity::default(),
        Collider {
            radius: collider_radius(kind),
        },
        Health {
            current: hp,
            max: hp,
        },
        ShieldBuffer::default(),
        EnemyStats { attack, move_speed },
        Debuffs::default(),
    ));
    // Second insert: hecs spawn tuples cap out, and only some kinds
    // need the extras anyway.
    let _ = world.insert_one(entity, AttackTimer::default());
    if minion {
        let _ = world.insert_one(entity, Minion);
    }
    if kind == EnemyKind::Boss {
        let abilities = pick_boss_abilities(&mut state.rng);
        let ability_timer = [
            abilities[0].period().unwrap_or(0),
            abilities[1].period().unwrap_or(0),
        ];
        let _ = world.insert_one(
            entity,
            BossState {
                abilities,
                fired_boundary: [0, 0],
                ability_timer,
                cumulative_damage: 0.0,
                summon_timer: crate::consts::secs(8),
                cone_timer: crate::consts::secs(3),
                invincible: 0,
                berserk: 0,
            },
        );
    }
    entity
}

/// Two distinct abilities from the fixed pool.
fn pick_boss_abilities(rng: &mut impl Rng) -> [BossAbility; 2] {
    let pool = BossAbility::all();
    let first = pool[rng.gen_range(0..pool.len())];
    loop {
        let second = pool[rng.gen_range(0..pool.len())];
        if second != first {
            return [first, second];
        }
    }
}

/// Runs the automatic spawn cadence for one tick. Boss stages spawn
/// exactly one boss and suppress all other spawning.
pub fn spawn_system(world: &mut World, state: &mut SimState) {
    if state.stage.cleared || state.stage.spawned >= state.stage.total_enemies {
        return;
    }

    if state.spawn_timer > 0 {
        state.spawn_timer -= 1;
        return;
    }
    state.spawn_timer = SPAWN_INTERVAL;

    let kind = if state.stage.is_boss_stage() {
        EnemyKind::Boss
    } else {
        pick_archetype(state.stage.number, &mut state.rng)
    };

    let radius = collider_radius(kind);
    let Some((x, y)) = find_spawn_position(state, radius) else {
        debug!("spawn skipped this tick: no valid position");
        return;
    };

    spawn_enemy(world, state, kind, x, y, false);
    state.stage.spawned += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::world::create_world;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn archetype_pool_respects_min_stage() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            let kind = pick_archetype(1, &mut rng);
            assert_eq!(kind, EnemyKind::Grunt, "stage 1 only allows grunts");
        }
        for _ in 0..2_000 {
            let kind = pick_archetype(3, &mut rng);
            assert!(min_stage(kind) <= 3);
            assert_ne!(kind, EnemyKind::Boss);
        }
    }

    #[test]
    fn archetype_weights_converge() {
        let mut rng = StdRng::seed_from_u64(12);
        let stage = 10; // everything eligible
        let mut counts: HashMap<EnemyKind, u32> = HashMap::new();
        let draws = 100_000;
        for _ in 0..draws {
            *counts.entry(pick_archetype(stage, &mut rng)).or_default() += 1;
        }
        let total: f32 = [
            EnemyKind::Grunt,
            EnemyKind::Sprinter,
            EnemyKind::Brute,
            EnemyKind::Ranged,
            EnemyKind::Bomber,
            EnemyKind::Incinerator,
            EnemyKind::Shambler,
            EnemyKind::Support,
        ]
        .iter()
        .map(|&k| spawn_weight(k))
        .sum();
        for (&kind, &count) in &counts {
            let expected = spawn_weight(kind) / total;
            let observed = count as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.01,
                "{kind:?}: expected ~{expected:.3}, got {observed:.3}"
            );
        }
    }

    #[test]
    fn placement_avoids_walls() {
        let (_, mut state) = create_world(13);
        let mut rng = StdRng::seed_from_u64(14);
        state.terrain = crate::game::terrain::Terrain::generate(4, 55, &mut rng);
        for _ in 0..200 {
            if let Some((x, y)) = find_spawn_position(&mut state, 14.0) {
                assert!(!state.terrain.blocked(x, y, 28.0, 28.0));
            }
        }
    }

    #[test]
    fn boss_gets_two_distinct_abilities() {
        let mut rng = StdRng::seed_from_u64(15);
        for _ in 0..500 {
            let [a, b] = pick_boss_abilities(&mut rng);
            assert_ne!(a, b);
        }
    }
}
