use hecs::World;
use rand::Rng;
use tracing::info;

use crate::consts::{
    BOSS_GOLD_BASE, BOSS_GOLD_PER_STAGE, DURABILITY_BASE_LOSS, DURABILITY_HP_LOSS_SCALE,
    GOLD_DROP_CHANCE, INITIAL_GOLD_DROPS, MAP_HEIGHT, MAP_WIDTH, STAGE_CLEAR_GRACE,
    STAGE_QUOTA_BASE, STAGE_QUOTA_GROWTH, STAGE_TIME_LIMIT,
};
use crate::ecs::components::{
    Archetype, Dying, Enemy, EnemyKind, GlobalTimers, GoldDrop, Health, Minion, Position,
    SimState, StageInfo,
};
use crate::game::items::TalentKind;
use crate::game::stats::armor_starting_shield;
use crate::game::terrain::Terrain;
use crate::protocol::SimEvent;

const DYING_FRAMES: u32 = 30;
const GOLD_PICKUP_RADIUS: f32 = 26.0;

/// Resets the world and state for the given stage number. The player's
/// purse, equipment, and permanent upgrades carry over; everything
/// transient (entities, timers, buffered damage) is discarded.
pub fn initialize_stage(world: &mut World, state: &mut SimState, number: u32) {
    clear_transient_entities(world);

    state.stage = StageInfo {
        number,
        total_enemies: if number % crate::consts::BOSS_STAGE_INTERVAL == 0 {
            1
        } else {
            STAGE_QUOTA_BASE + STAGE_QUOTA_GROWTH * (number - 1)
        },
        spawned: 0,
        kills: 0,
        cleared: false,
        boss_killed: false,
        clear_grace: 0,
        timer: STAGE_TIME_LIMIT,
        hp_at_start: state.player.stats.hp,
    };
    state.player.stage = number;
    state.player.x = MAP_WIDTH / 2.0;
    state.player.y = MAP_HEIGHT / 2.0;
    state.player.vx = 0.0;
    state.player.vy = 0.0;
    state.player.stats.shield = armor_starting_shield(&state.player);
    state.player.ult_charge = 0.0;
    state.timers = GlobalTimers::default();
    state.weapon_cooldowns = [0.0, 0.0];
    state.spawn_timer = 0;
    state.dot_buffer = 0.0;
    state.spatial.clear();

    state.terrain = Terrain::generate(number, state.terrain_seed, &mut state.rng);

    scatter_initial_gold(world, state);

    info!(
        stage = number,
        quota = state.stage.total_enemies,
        "stage initialized"
    );
}

fn clear_transient_entities(world: &mut World) {
    let doomed: Vec<hecs::Entity> = world
        .query::<&Position>()
        .iter()
        .map(|(e, _)| e)
        .collect();
    for entity in doomed {
        let _ = world.despawn(entity);
    }
}

/// Seed gold scattered outside the safe zone so early movement pays.
fn scatter_initial_gold(world: &mut World, state: &mut SimState) {
    for _ in 0..INITIAL_GOLD_DROPS {
        for _ in 0..20 {
            let x = state.rng.gen_range(60.0..MAP_WIDTH - 60.0);
            let y = state.rng.gen_range(60.0..MAP_HEIGHT - 60.0);
            if state.terrain.blocked(x, y, 20.0, 20.0) {
                continue;
            }
            let amount = state.rng.gen_range(2..=5) + state.stage.number as i64;
            world.spawn((GoldDrop { amount }, Position { x, y }));
            break;
        }
    }
}

/// The stage-clear predicate, with no side effects: a boss stage clears
/// when its boss is dead; a normal stage clears when the kill quota is
/// met or the countdown ran out.
pub fn is_stage_cleared(stage: &StageInfo) -> bool {
    if stage.is_boss_stage() {
        stage.boss_killed
    } else {
        stage.kills >= stage.total_enemies || stage.timer == 0
    }
}

/// Gold multiplier from the Greed talent, applied to every award.
fn gold_multiplier(state: &SimState) -> f32 {
    match &state.player.talent {
        Some(talent) if talent.kind == TalentKind::Greed => 1.0 + talent.values[0],
        _ => 1.0,
    }
}

/// Death and stage bookkeeping: marks zero-HP enemies as dying, counts
/// kills and pays out gold, runs the countdowns, and fires the one-shot
/// clear latch. Runs after every damage source for the tick.
pub fn cleanup_system(world: &mut World, state: &mut SimState) {
    // Dying entities only count down to removal.
    let mut expired: Vec<hecs::Entity> = Vec::new();
    for (entity, dying) in world.query_mut::<&mut Dying>() {
        dying.timer = dying.timer.saturating_sub(1);
        if dying.timer == 0 {
            expired.push(entity);
        }
    }
    for entity in expired {
        let _ = world.despawn(entity);
    }

    // Newly dead enemies.
    let dead: Vec<(hecs::Entity, EnemyKind, bool, f32, f32)> = world
        .query::<(&Archetype, &Health, &Position)>()
        .with::<&Enemy>()
        .without::<&Dying>()
        .iter()
        .filter(|(_, (_, health, _))| health.current <= 0.0)
        .map(|(entity, (arch, _, pos))| {
            let minion = world.get::<&Minion>(entity).is_ok();
            (entity, arch.kind, minion, pos.x, pos.y)
        })
        .collect();

    for (entity, kind, minion, x, y) in dead {
        let _ = world.insert_one(entity, Dying {
            timer: DYING_FRAMES,
        });

        if minion {
            continue;
        }
        state.stage.kills += 1;

        if kind == EnemyKind::Boss {
            let alive = world
                .query::<&Archetype>()
                .with::<&Enemy>()
                .without::<&Dying>()
                .iter()
                .any(|(_, a)| a.kind == EnemyKind::Boss);
            if !alive {
                state.stage.boss_killed = true;
            }
            let amount = ((BOSS_GOLD_BASE + state.stage.number as i64 * BOSS_GOLD_PER_STAGE)
                as f32
                * gold_multiplier(state)) as i64;
            state.player.gold += amount;
            state.events.push(SimEvent::GoldPickup { amount });
            continue;
        }

        let last_hostile =
            !state.stage.is_boss_stage() && state.stage.kills >= state.stage.total_enemies;
        if last_hostile {
            // Direct award so a drop can't strand the stage transition.
            let amount = ((3 + state.stage.number as i64) as f32 * gold_multiplier(state)) as i64;
            state.player.gold += amount;
            state.events.push(SimEvent::GoldPickup { amount });
        } else if state.rng.gen::<f32>() < GOLD_DROP_CHANCE {
            let amount = state.rng.gen_range(2..=5) + state.stage.number as i64;
            world.spawn((GoldDrop { amount }, Position { x, y }));
        }
    }

    // Countdowns and the one-shot clear latch.
    if state.stage.cleared {
        state.stage.clear_grace = state.stage.clear_grace.saturating_sub(1);
        return;
    }
    state.stage.timer = state.stage.timer.saturating_sub(1);

    if is_stage_cleared(&state.stage) {
        state.stage.cleared = true;
        state.stage.clear_grace = STAGE_CLEAR_GRACE;
        apply_durability_decay(state);
        state.events.push(SimEvent::StageCleared {
            stage: state.stage.number,
        });
        info!(stage = state.stage.number, kills = state.stage.kills, "stage cleared");
    }
}

/// Collects gold drops the player walks over.
pub fn gold_pickup_system(world: &mut World, state: &mut SimState) {
    let mult = gold_multiplier(state);
    let mut collected: Vec<(hecs::Entity, i64)> = Vec::new();
    for (entity, (drop, pos)) in world.query::<(&GoldDrop, &Position)>().iter() {
        let dx = pos.x - state.player.x;
        let dy = pos.y - state.player.y;
        let reach = GOLD_PICKUP_RADIUS + state.player.width / 2.0;
        if dx * dx + dy * dy <= reach * reach {
            collected.push((entity, (drop.amount as f32 * mult) as i64));
        }
    }
    for (entity, amount) in collected {
        let _ = world.despawn(entity);
        state.player.gold += amount;
        state.events.push(SimEvent::GoldPickup { amount });
    }
}

/// Stage-end wear: each equipped piece loses a base amount plus a share
/// proportional to the HP fraction lost this stage. Items at zero are
/// destroyed and unequipped.
fn apply_durability_decay(state: &mut SimState) {
    let max_hp = state.player.stats.max_hp.max(1.0);
    let hp_lost_frac =
        ((state.stage.hp_at_start - state.player.stats.hp) / max_hp).clamp(0.0, 1.0);
    let mut loss = DURABILITY_BASE_LOSS + DURABILITY_HP_LOSS_SCALE * hp_lost_frac;
    if let Some(talent) = &state.player.talent {
        if talent.kind == TalentKind::Tinkerer {
            loss *= 1.0 - talent.values[0];
        }
    }

    let mut destroyed = false;
    let player = &mut state.player;
    for slot in [
        &mut player.weapon1,
        &mut player.weapon2,
        &mut player.armor1,
        &mut player.armor2,
    ] {
        if let Some(item) = slot {
            item.durability -= loss;
            if item.durability <= 0.0 {
                info!(name = %item.name, "item destroyed by wear");
                *slot = None;
                destroyed = true;
            }
        }
    }
    if destroyed {
        crate::game::stats::recalculate_player_stats(&mut state.player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::systems::spawn::spawn_enemy;
    use crate::ecs::world::create_world;
    use crate::game::loot::generate_random_weapon;

    #[test]
    fn quota_grows_per_stage_and_boss_stage_is_single() {
        let (mut world, mut state) = create_world(61);
        initialize_stage(&mut world, &mut state, 1);
        assert_eq!(state.stage.total_enemies, STAGE_QUOTA_BASE);
        initialize_stage(&mut world, &mut state, 3);
        assert_eq!(
            state.stage.total_enemies,
            STAGE_QUOTA_BASE + 2 * STAGE_QUOTA_GROWTH
        );
        initialize_stage(&mut world, &mut state, 6);
        assert!(state.stage.is_boss_stage());
        assert_eq!(state.stage.total_enemies, 1);
    }

    #[test]
    fn initialize_clears_entities_and_recenters_player() {
        let (mut world, mut state) = create_world(62);
        spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 300.0, 300.0, false);
        state.player.x = 100.0;

        initialize_stage(&mut world, &mut state, 2);
        assert_eq!(world.query::<&Enemy>().iter().count(), 0);
        assert_eq!(state.player.x, MAP_WIDTH / 2.0);
        assert_eq!(
            world.query::<&GoldDrop>().iter().count(),
            INITIAL_GOLD_DROPS as usize
        );
    }

    #[test]
    fn kill_quota_fires_clear_latch_exactly_once() {
        let (mut world, mut state) = create_world(63);
        initialize_stage(&mut world, &mut state, 1);
        state.stage.total_enemies = 1;

        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 400.0, 400.0, false);
        world.get::<&mut Health>(enemy).unwrap().current = 0.0;

        cleanup_system(&mut world, &mut state);
        assert!(state.stage.cleared);
        let clears = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::StageCleared { .. }))
            .count();
        assert_eq!(clears, 1);

        // Latch never re-fires.
        cleanup_system(&mut world, &mut state);
        cleanup_system(&mut world, &mut state);
        let clears = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::StageCleared { .. }))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn timer_expiry_clears_a_normal_stage() {
        let (mut world, mut state) = create_world(64);
        initialize_stage(&mut world, &mut state, 1);
        state.stage.timer = 1;
        cleanup_system(&mut world, &mut state);
        assert!(state.stage.cleared);
    }

    #[test]
    fn boss_stage_ignores_timer_and_needs_the_kill() {
        let (mut world, mut state) = create_world(65);
        initialize_stage(&mut world, &mut state, 6);
        state.stage.timer = 1;
        cleanup_system(&mut world, &mut state);
        assert!(!state.stage.cleared, "timer alone never clears a boss stage");

        let boss = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 400.0, 400.0, false);
        world.get::<&mut Health>(boss).unwrap().current = 0.0;
        let gold_before = state.player.gold;
        cleanup_system(&mut world, &mut state);
        assert!(state.stage.boss_killed);
        assert!(state.stage.cleared);
        assert_eq!(
            state.player.gold - gold_before,
            BOSS_GOLD_BASE + 6 * BOSS_GOLD_PER_STAGE
        );
    }

    #[test]
    fn clone_must_also_die_before_the_stage_clears() {
        let (mut world, mut state) = create_world(66);
        initialize_stage(&mut world, &mut state, 6);
        let a = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 400.0, 400.0, false);
        let _b = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 500.0, 400.0, false);

        world.get::<&mut Health>(a).unwrap().current = 0.0;
        cleanup_system(&mut world, &mut state);
        assert!(!state.stage.boss_killed, "one of two bosses still stands");
    }

    #[test]
    fn minions_count_for_neither_quota_nor_gold() {
        let (mut world, mut state) = create_world(67);
        initialize_stage(&mut world, &mut state, 1);
        let minion = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 400.0, 400.0, true);
        world.get::<&mut Health>(minion).unwrap().current = 0.0;

        cleanup_system(&mut world, &mut state);
        assert_eq!(state.stage.kills, 0);
        assert_eq!(world.query::<&GoldDrop>().iter().count(), 0);
    }

    #[test]
    fn gold_pickup_applies_greed() {
        let (mut world, mut state) = create_world(68);
        state.player.talent = Some(crate::game::items::Talent {
            kind: TalentKind::Greed,
            rarity: crate::game::items::Rarity::Common,
            values: [0.5, 0.0, 0.0],
            description: String::new(),
        });
        world.spawn((
            GoldDrop { amount: 10 },
            Position {
                x: state.player.x,
                y: state.player.y,
            },
        ));
        let before = state.player.gold;
        gold_pickup_system(&mut world, &mut state);
        assert_eq!(state.player.gold - before, 15);
    }

    #[test]
    fn durability_decay_scales_with_hp_lost_and_destroys_at_zero() {
        let (_world, mut state) = create_world(69);
        state.player.weapon1 = Some(generate_random_weapon(1, &mut state.rng));
        crate::game::stats::recalculate_player_stats(&mut state.player);

        state.stage.hp_at_start = state.player.stats.max_hp;
        state.player.stats.hp = 0.0;
        apply_durability_decay(&mut state);
        let after = state.player.weapon1.as_ref().map(|w| w.durability);
        assert_eq!(
            after,
            Some(100.0 - DURABILITY_BASE_LOSS - DURABILITY_HP_LOSS_SCALE)
        );

        state.player.weapon1.as_mut().unwrap().durability = 1.0;
        apply_durability_decay(&mut state);
        assert!(state.player.weapon1.is_none(), "worn-out item unequipped");
    }
}
