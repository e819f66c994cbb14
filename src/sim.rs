//! Tick orchestration. One `update` call advances the simulation by
//! exactly one frame at [`crate::consts::TICK_RATE`] ticks per second;
//! pausing is simply the caller not ticking. Pass order is load-bearing
//! and documented inline.

use hecs::World;
use tracing::info;

use crate::consts::{TICK_RATE, ULT_CHARGE_MAX};
use crate::ecs::components::{
    DamageSource, Debuffs, Dying, Enemy, FloatingText, Position, Projectile, SimState, Velocity,
};
use crate::ecs::systems::{combat, enemy_ai, hazard, movement, projectile, spawn, stage};
use crate::game::items::UltimateKind;
use crate::protocol::{
    EnemySnapshot, PlayerSnapshot, SimEvent, StageSnapshot, Vec2,
};

const NOVA_SHOTS: usize = 16;
const NOVA_SPEED: f32 = 7.0;
const NOVA_RANGE: f32 = 400.0;
const HEAL_FRACTION: f32 = 0.4;
const ULT_WINDOW: u32 = crate::consts::secs(5);

/// Advances the world by one tick. The caller drains `state.events`
/// afterwards.
pub fn update(world: &mut World, state: &mut SimState) {
    state.tick += 1;

    // 1. Global timers, per-enemy debuff counters, stage handled by
    //    cleanup below.
    state.timers.tick();
    for (_, debuffs) in world.query_mut::<&mut Debuffs>().without::<&Dying>() {
        debuffs.tick();
    }

    // 2. Spawn cadence.
    spawn::spawn_system(world, state);

    // 3. Spatial index rebuild. Dying enemies are no longer collidable.
    state.spatial.clear();
    for (entity, pos) in world
        .query::<&Position>()
        .with::<&Enemy>()
        .without::<&Dying>()
        .iter()
    {
        state.spatial.insert(entity, pos.x, pos.y);
    }

    // 4. Player movement.
    movement::player_movement_system(state);

    // 5. Enemy AI, frozen wholesale under time-stop.
    if state.timers.time_stop == 0 {
        enemy_ai::enemy_ai_system(world, state);
    }

    // 6. Projectiles.
    projectile::projectile_system(world, state);

    // 7. Gold pickup.
    stage::gold_pickup_system(world, state);

    // 8. Hazards.
    hazard::hazard_system(world, state);

    // 9. Floating-text lifetimes.
    let mut faded: Vec<hecs::Entity> = Vec::new();
    for (entity, text) in world.query_mut::<&mut FloatingText>() {
        text.ttl = text.ttl.saturating_sub(1);
        if text.ttl == 0 {
            faded.push(entity);
        }
    }
    for entity in faded {
        let _ = world.despawn(entity);
    }

    // 10. Weapon firing.
    combat::weapon_fire_system(world, state);

    // 11. Deaths, gold payouts, stage countdowns and the clear latch.
    stage::cleanup_system(world, state);

    // 12. Passive ultimate accrual, then the one-shot death report.
    if !state.player.dead {
        state
            .player
            .gain_ult_charge(state.player.stats.ult_charge_rate / TICK_RATE as f32);
        if state.player.stats.hp <= 0.0 {
            state.player.dead = true;
            state.events.push(SimEvent::PlayerDied);
            info!(stage = state.stage.number, "player died");
        }
    }
}

// ── Ultimate activation ──────────────────────────────────────────────

/// Fires the ultimate carried by the first equipped weapon that has
/// one, consuming the full charge bar. No-op unless the bar is full.
/// Returns the activated kind so callers can present it.
pub fn activate_ultimate(world: &mut World, state: &mut SimState) -> Option<UltimateKind> {
    if state.player.dead || state.player.ult_charge < ULT_CHARGE_MAX {
        return None;
    }
    let (kind, element) = [&state.player.weapon1, &state.player.weapon2]
        .into_iter()
        .flatten()
        .find_map(|w| w.ultimate.map(|u| (u, w.element)))?;
    state.player.ult_charge = 0.0;

    match kind {
        UltimateKind::Heal => {
            let max = state.player.stats.max_hp;
            state.player.stats.hp = (state.player.stats.hp + max * HEAL_FRACTION).min(max);
        }
        UltimateKind::TimeStop => state.timers.time_stop = ULT_WINDOW,
        UltimateKind::SpeedBoost => state.timers.speed_boost = ULT_WINDOW,
        UltimateKind::OmniForce => state.timers.omni_force = ULT_WINDOW,
        UltimateKind::Nova => nova(world, state, element),
    }
    Some(kind)
}

/// Ring of projectiles radiating from the player.
fn nova(world: &mut World, state: &mut SimState, element: crate::game::stats::Element) {
    let damage = state.player.stats.attack * 2.0;
    for i in 0..NOVA_SHOTS {
        let angle = i as f32 / NOVA_SHOTS as f32 * std::f32::consts::TAU;
        world.spawn((
            Projectile {
                damage,
                radius: 8.0,
                lifetime: (NOVA_RANGE / NOVA_SPEED) as u32,
                source: DamageSource::Player,
                element,
                penetrates: true,
                melee: false,
                bomb: None,
                knockback: state.player.stats.knockback,
                crit_chance: state.player.stats.crit_chance,
                shield_on_hit: 0.0,
                enchant: None,
                anchor: None,
                hit_ids: Default::default(),
            },
            Position {
                x: state.player.x,
                y: state.player.y,
            },
            Velocity {
                x: angle.cos() * NOVA_SPEED,
                y: angle.sin() * NOVA_SPEED,
            },
        ));
    }
}

// ── Snapshots ────────────────────────────────────────────────────────

pub fn player_snapshot(state: &SimState) -> PlayerSnapshot {
    PlayerSnapshot {
        position: Vec2 {
            x: state.player.x,
            y: state.player.y,
        },
        hp: state.player.stats.hp,
        max_hp: state.player.stats.max_hp,
        shield: state.player.stats.shield,
        ult_charge: state.player.ult_charge,
        gold: state.player.gold,
        stage: state.player.stage,
    }
}

pub fn enemy_snapshots(world: &World) -> Vec<EnemySnapshot> {
    world
        .query::<(
            &crate::ecs::components::Archetype,
            &crate::ecs::components::Affinity,
            &crate::ecs::components::Health,
            &Position,
        )>()
        .with::<&Enemy>()
        .without::<&Dying>()
        .iter()
        .map(|(_, (arch, aff, health, pos))| EnemySnapshot {
            position: Vec2 { x: pos.x, y: pos.y },
            kind: format!("{:?}", arch.kind),
            element: aff.element,
            hp_pct: (health.current / health.max.max(0.001)).clamp(0.0, 1.0),
            is_boss: arch.kind == crate::ecs::components::EnemyKind::Boss,
        })
        .collect()
}

pub fn stage_snapshot(state: &SimState) -> StageSnapshot {
    StageSnapshot {
        number: state.stage.number,
        kills: state.stage.kills,
        total_enemies: state.stage.total_enemies,
        timer: state.stage.timer,
        cleared: state.stage.cleared,
    }
}
