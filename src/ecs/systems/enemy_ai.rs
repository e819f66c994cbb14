use hecs::World;
use rand::Rng;

use crate::consts::{
    CONTACT_STUN_FRAMES, MAP_HEIGHT, MAP_WIDTH, MUD_SPEED_MULT, WALL_REPULSION_RADIUS,
};
use crate::ecs::components::{
    Affinity, Archetype, AttackTimer, BossAbility, BossState, Collider, DamageSource, Debuffs,
    Dying, EnemyKind, EnemyStats, Health, HazardKind, Position, Projectile, ShieldBuffer,
    SimState, Velocity,
};
use crate::ecs::systems::combat::damage_player;
use crate::ecs::systems::hazard::create_hazard;
use crate::ecs::systems::spawn::{find_spawn_position, pick_archetype, spawn_enemy};
use crate::game::stats::Element;
use crate::game::terrain::TerrainKind;

const ENEMY_SHOT_SPEED: f32 = 5.0;
const ENEMY_SHOT_RANGE: f32 = 320.0;
const ENEMY_SHOT_COOLDOWN: u32 = crate::consts::secs(2);
const ENEMY_BOMB_SPEED: f32 = 3.0;
const ENEMY_BOMB_RANGE: f32 = 380.0;
const ENEMY_BOMB_COOLDOWN: u32 = crate::consts::secs(3);
const TRAIL_INTERVAL: u32 = 30;
const TRAIL_RADIUS: f32 = 36.0;
const TRAIL_DURATION: u32 = crate::consts::secs(3);
const SUPPORT_INTERVAL: u32 = crate::consts::secs(4);
const SUPPORT_RANGE: f32 = 260.0;
const BOSS_SUMMON_INTERVAL: u32 = crate::consts::secs(8);
const BOSS_CONE_INTERVAL: u32 = crate::consts::secs(3);
const BOSS_CONE_SHOTS: usize = 5;
const BOSS_CONE_RANGE: f32 = 420.0;
const BOSS_CONE_HALF_ANGLE: f32 = std::f32::consts::PI / 6.0;
const BERSERK_SPEED_MULT: f32 = 2.0;
const SLOW_DEBUFF_MULT: f32 = 0.5;
const WANDER_FREQ: f32 = 0.05;

struct EnemyFrame {
    entity: hecs::Entity,
    kind: EnemyKind,
    x: f32,
    y: f32,
    radius: f32,
    attack: f32,
    move_speed: f32,
    element: Element,
    stunned: bool,
    slowed: bool,
    berserk: bool,
}

/// Runs one AI tick for every live enemy: steering toward the player
/// with a per-entity wander, wall avoidance, archetype attacks, boss
/// behavior, and contact damage. Callers skip this system entirely
/// while a time-stop window is active.
pub fn enemy_ai_system(world: &mut World, state: &mut SimState) {
    let frames: Vec<EnemyFrame> = world
        .query::<(
            &Archetype,
            &Position,
            &Collider,
            &EnemyStats,
            &Affinity,
            &Debuffs,
        )>()
        .without::<&Dying>()
        .iter()
        .map(|(entity, (arch, pos, col, stats, aff, debuffs))| {
            let berserk = world
                .get::<&BossState>(entity)
                .map(|b| b.berserk > 0)
                .unwrap_or(false);
            EnemyFrame {
                entity,
                kind: arch.kind,
                x: pos.x,
                y: pos.y,
                radius: col.radius,
                attack: stats.attack,
                move_speed: stats.move_speed,
                element: aff.element,
                stunned: debuffs.stun > 0,
                slowed: debuffs.slow > 0,
                berserk,
            }
        })
        .collect();

    for frame in frames {
        if frame.stunned {
            continue;
        }

        steer_and_move(world, state, &frame);

        match frame.kind {
            EnemyKind::Ranged => ranged_attack(world, state, &frame),
            EnemyKind::Bomber => bomb_attack(world, state, &frame, HazardKind::Explosion),
            EnemyKind::Incinerator => bomb_attack(world, state, &frame, HazardKind::Fire),
            EnemyKind::Shambler => poison_trail(world, state, &frame),
            EnemyKind::Support => support_shield(world, state, &frame),
            EnemyKind::Boss => boss_behavior(world, state, &frame),
            _ => {}
        }

        contact_damage(world, state, &frame);
    }
}

// ── Steering ─────────────────────────────────────────────────────────

/// Preferred standoff distance. Melee kinds close to contact; ranged
/// kinds hold inside their firing envelope.
fn standoff(kind: EnemyKind) -> f32 {
    match kind {
        EnemyKind::Ranged => ENEMY_SHOT_RANGE * 0.7,
        EnemyKind::Bomber | EnemyKind::Incinerator => ENEMY_BOMB_RANGE * 0.6,
        EnemyKind::Support => SUPPORT_RANGE * 0.8,
        _ => 0.0,
    }
}

fn steer_and_move(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    let dx = state.player.x - frame.x;
    let dy = state.player.y - frame.y;
    let dist = (dx * dx + dy * dy).sqrt().max(0.001);

    let mut dir_x = dx / dist;
    let mut dir_y = dy / dist;
    if dist < standoff(frame.kind) {
        // Inside the standoff envelope: hold position, don't back up.
        dir_x = 0.0;
        dir_y = 0.0;
    }

    // Sinusoidal wander, phase-keyed to the entity so paths diverge.
    // Shamblers weave hard so their poison trail carpets a wide lane.
    let amplitude = if frame.kind == EnemyKind::Shambler {
        1.2
    } else {
        0.3
    };
    let phase = frame.entity.id() as f32 * 1.37;
    let weave = (state.tick as f32 * WANDER_FREQ + phase).sin() * amplitude;
    // Perpendicular to the seek direction.
    let mut vx = dir_x - dir_y * weave;
    let mut vy = dir_y + dir_x * weave;

    let (rx, ry) = wall_repulsion(state, frame.x, frame.y);
    vx += rx;
    vy += ry;

    let norm = (vx * vx + vy * vy).sqrt();
    if norm < 0.001 {
        return;
    }

    let mut speed = frame.move_speed;
    if frame.berserk {
        speed *= BERSERK_SPEED_MULT;
    }
    if frame.slowed {
        speed *= SLOW_DEBUFF_MULT;
    }
    if state.terrain.kind_at(frame.x, frame.y) == Some(TerrainKind::Mud) {
        speed *= MUD_SPEED_MULT;
    }

    let mut step_x = vx / norm * speed;
    let mut step_y = vy / norm * speed;
    let size = frame.radius * 2.0;
    let (nx, ny) = super::movement::move_axis_separated(
        &state.terrain,
        frame.x,
        frame.y,
        &mut step_x,
        &mut step_y,
        size,
        size,
    );

    if let Ok(mut pos) = world.get::<&mut Position>(frame.entity) {
        pos.x = nx.clamp(frame.radius, MAP_WIDTH - frame.radius);
        pos.y = ny.clamp(frame.radius, MAP_HEIGHT - frame.radius);
    }
    if let Ok(mut vel) = world.get::<&mut Velocity>(frame.entity) {
        vel.x = step_x;
        vel.y = step_y;
    }
}

/// Summed push-away from every blocking tile within range. Keeps
/// steering from grinding enemies face-first into walls.
fn wall_repulsion(state: &SimState, x: f32, y: f32) -> (f32, f32) {
    let mut rx = 0.0;
    let mut ry = 0.0;
    for tile in &state.terrain.tiles {
        if !tile.kind.blocks() {
            continue;
        }
        let nearest_x = x.clamp(tile.x, tile.x + tile.w);
        let nearest_y = y.clamp(tile.y, tile.y + tile.h);
        let dx = x - nearest_x;
        let dy = y - nearest_y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= 0.001 || dist >= WALL_REPULSION_RADIUS {
            continue;
        }
        let strength = 1.0 - dist / WALL_REPULSION_RADIUS;
        rx += dx / dist * strength;
        ry += dy / dist * strength;
    }
    (rx, ry)
}

// ── Archetype attacks ────────────────────────────────────────────────

/// Decrements the enemy's attack timer; true when it fired and was
/// reset to `cooldown`.
fn timer_ready(world: &mut World, entity: hecs::Entity, cooldown: u32) -> bool {
    let Ok(mut timer) = world.get::<&mut AttackTimer>(entity) else {
        return false;
    };
    if timer.remaining > 0 {
        timer.remaining -= 1;
        return false;
    }
    timer.remaining = cooldown;
    true
}

fn spawn_enemy_shot(
    world: &mut World,
    x: f32,
    y: f32,
    dir_x: f32,
    dir_y: f32,
    damage: f32,
    element: Element,
) {
    world.spawn((
        Projectile {
            damage,
            radius: 6.0,
            lifetime: (ENEMY_SHOT_RANGE / ENEMY_SHOT_SPEED) as u32,
            source: DamageSource::Enemy,
            element,
            penetrates: false,
            melee: false,
            bomb: None,
            knockback: 0.0,
            crit_chance: 0.0,
            shield_on_hit: 0.0,
            enchant: None,
            anchor: None,
            hit_ids: Default::default(),
        },
        Position { x, y },
        Velocity {
            x: dir_x * ENEMY_SHOT_SPEED,
            y: dir_y * ENEMY_SHOT_SPEED,
        },
    ));
}

fn ranged_attack(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    let dx = state.player.x - frame.x;
    let dy = state.player.y - frame.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > ENEMY_SHOT_RANGE || !timer_ready(world, frame.entity, ENEMY_SHOT_COOLDOWN) {
        return;
    }
    spawn_enemy_shot(
        world,
        frame.x,
        frame.y,
        dx / dist.max(0.001),
        dy / dist.max(0.001),
        frame.attack,
        frame.element,
    );
}

/// Bombers and incinerators lob at the player's current position; the
/// bomb's flight time is sized so it lands exactly there.
fn bomb_attack(world: &mut World, state: &mut SimState, frame: &EnemyFrame, kind: HazardKind) {
    let dx = state.player.x - frame.x;
    let dy = state.player.y - frame.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > ENEMY_BOMB_RANGE || !timer_ready(world, frame.entity, ENEMY_BOMB_COOLDOWN) {
        return;
    }
    let flight = (dist / ENEMY_BOMB_SPEED).ceil().max(1.0) as u32;
    let bomb = match kind {
        HazardKind::Fire => crate::ecs::components::BombKind::Incendiary,
        _ => crate::ecs::components::BombKind::Explosive,
    };
    world.spawn((
        Projectile {
            damage: frame.attack,
            radius: 8.0,
            lifetime: flight,
            source: DamageSource::Enemy,
            element: frame.element,
            penetrates: false,
            melee: false,
            bomb: Some(bomb),
            knockback: 0.0,
            crit_chance: 0.0,
            shield_on_hit: 0.0,
            enchant: None,
            anchor: None,
            hit_ids: Default::default(),
        },
        Position {
            x: frame.x,
            y: frame.y,
        },
        Velocity {
            x: dx / flight as f32,
            y: dy / flight as f32,
        },
    ));
}

fn poison_trail(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    if !timer_ready(world, frame.entity, TRAIL_INTERVAL) {
        return;
    }
    create_hazard(
        world,
        state,
        frame.x,
        frame.y,
        TRAIL_RADIUS,
        frame.attack,
        HazardKind::Poison,
        DamageSource::Enemy,
        Element::Grass,
        0.0,
        0.0,
        TRAIL_DURATION,
    );
}

/// Grants a shield buffer to a random unshielded ally in range.
fn support_shield(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    if !timer_ready(world, frame.entity, SUPPORT_INTERVAL) {
        return;
    }
    let mut eligible: Vec<hecs::Entity> = Vec::new();
    for (entity, (pos, shield)) in world
        .query::<(&Position, &ShieldBuffer)>()
        .with::<&Archetype>()
        .without::<&Dying>()
        .iter()
    {
        if entity == frame.entity || shield.value > 0.0 {
            continue;
        }
        let dx = pos.x - frame.x;
        let dy = pos.y - frame.y;
        if dx * dx + dy * dy > SUPPORT_RANGE * SUPPORT_RANGE {
            continue;
        }
        eligible.push(entity);
    }
    if eligible.is_empty() {
        return;
    }
    let ally = eligible[state.rng.gen_range(0..eligible.len())];
    let amount = 8.0 + 2.0 * state.stage.number as f32;
    if let Ok(mut shield) = world.get::<&mut ShieldBuffer>(ally) {
        shield.value += amount;
    }
}

// ── Boss behavior ────────────────────────────────────────────────────

fn boss_behavior(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    let mut summon = false;
    let mut cone = false;
    let mut periodic: Vec<BossAbility> = Vec::new();

    if let Ok(mut boss) = world.get::<&mut BossState>(frame.entity) {
        boss.invincible = boss.invincible.saturating_sub(1);
        boss.berserk = boss.berserk.saturating_sub(1);

        if boss.summon_timer > 0 {
            boss.summon_timer -= 1;
        } else {
            boss.summon_timer = BOSS_SUMMON_INTERVAL;
            summon = true;
        }
        if boss.cone_timer > 0 {
            boss.cone_timer -= 1;
        } else {
            boss.cone_timer = BOSS_CONE_INTERVAL;
            cone = true;
        }
        for slot in 0..2 {
            let Some(period) = boss.abilities[slot].period() else {
                continue;
            };
            if boss.ability_timer[slot] > 0 {
                boss.ability_timer[slot] -= 1;
            } else {
                boss.ability_timer[slot] = period;
                periodic.push(boss.abilities[slot]);
            }
        }
    }

    if summon {
        summon_minion_pair(world, state, frame.x, frame.y);
    }
    if cone {
        boss_cone_shot(world, state, frame);
    }
    for ability in periodic {
        trigger_boss_ability(world, state, frame.entity, ability);
    }
}

/// Two stage-weighted minions placed just outside the boss's body.
fn summon_minion_pair(world: &mut World, state: &mut SimState, x: f32, y: f32) {
    for _ in 0..2 {
        let kind = pick_archetype(state.stage.number, &mut state.rng);
        let angle = state.rng.gen_range(0.0..std::f32::consts::TAU);
        let dist = state.rng.gen_range(50.0..90.0);
        let mx = (x + angle.cos() * dist).clamp(20.0, MAP_WIDTH - 20.0);
        let my = (y + angle.sin() * dist).clamp(20.0, MAP_HEIGHT - 20.0);
        spawn_enemy(world, state, kind, mx, my, true);
    }
}

/// Fan of shots centered on the player's bearing, fired only when the
/// player is within cone range.
fn boss_cone_shot(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    let dx = state.player.x - frame.x;
    let dy = state.player.y - frame.y;
    if dx * dx + dy * dy > BOSS_CONE_RANGE * BOSS_CONE_RANGE {
        return;
    }
    let bearing = dy.atan2(dx);
    let damage = frame.attack * 0.8;
    for i in 0..BOSS_CONE_SHOTS {
        let t = i as f32 / (BOSS_CONE_SHOTS - 1) as f32;
        let angle = bearing - BOSS_CONE_HALF_ANGLE + t * 2.0 * BOSS_CONE_HALF_ANGLE;
        spawn_enemy_shot(
            world,
            frame.x,
            frame.y,
            angle.cos(),
            angle.sin(),
            damage,
            frame.element,
        );
    }
}

/// Fires one boss ability, whether it came from a periodic timer or a
/// cumulative-damage step.
pub fn trigger_boss_ability(
    world: &mut World,
    state: &mut SimState,
    entity: hecs::Entity,
    ability: BossAbility,
) {
    state.events.push(crate::protocol::SimEvent::BossAbility {
        name: ability.name(),
    });

    match ability {
        BossAbility::Invincibility => {
            if let Ok(mut boss) = world.get::<&mut BossState>(entity) {
                boss.invincible = crate::consts::secs(3);
            }
        }
        BossAbility::Berserk => {
            if let Ok(mut boss) = world.get::<&mut BossState>(entity) {
                boss.berserk = crate::consts::secs(5);
            }
        }
        BossAbility::MassSummon => {
            let pos = world.get::<&Position>(entity).map(|p| (p.x, p.y)).ok();
            if let Some((x, y)) = pos {
                for _ in 0..2 {
                    summon_minion_pair(world, state, x, y);
                }
            }
        }
        BossAbility::Blink => {
            let radius = world
                .get::<&Collider>(entity)
                .map(|c| c.radius)
                .unwrap_or(34.0);
            if let Some((x, y)) = find_spawn_position(state, radius) {
                if let Ok(mut pos) = world.get::<&mut Position>(entity) {
                    pos.x = x;
                    pos.y = y;
                }
            }
        }
        BossAbility::Clone => {
            clone_boss(world, state, entity);
        }
    }
}

/// Spawns a second boss next to the original with the original's
/// current health and ability pair, but a fresh identity: zeroed
/// damage counters, no debuffs, no shield.
fn clone_boss(world: &mut World, state: &mut SimState, entity: hecs::Entity) {
    let Ok((pos, health, aff, boss)) = world.query_one_mut::<(
        &Position,
        &Health,
        &Affinity,
        &BossState,
    )>(entity) else {
        return;
    };
    let (x, y) = (pos.x, pos.y);
    let (current, max) = (health.current, health.max);
    let element = aff.element;
    let abilities = boss.abilities;

    let offset = state.rng.gen_range(60.0..120.0);
    let clone = spawn_enemy(
        world,
        state,
        EnemyKind::Boss,
        (x + offset).clamp(40.0, MAP_WIDTH - 40.0),
        y.clamp(40.0, MAP_HEIGHT - 40.0),
        false,
    );
    if let Ok(mut health) = world.get::<&mut Health>(clone) {
        health.current = current;
        health.max = max;
    }
    if let Ok(mut clone_aff) = world.get::<&mut Affinity>(clone) {
        clone_aff.element = element;
    }
    if let Ok(mut clone_boss) = world.get::<&mut BossState>(clone) {
        clone_boss.abilities = abilities;
        clone_boss.ability_timer = [
            abilities[0].period().unwrap_or(0),
            abilities[1].period().unwrap_or(0),
        ];
    }
}

// ── Contact damage ───────────────────────────────────────────────────

/// Touching the player costs the enemy its momentum: it deals its
/// attack once, then stuns itself for the recovery window.
fn contact_damage(world: &mut World, state: &mut SimState, frame: &EnemyFrame) {
    let (x, y) = world
        .get::<&Position>(frame.entity)
        .map(|p| (p.x, p.y))
        .unwrap_or((frame.x, frame.y));
    let dx = state.player.x - x;
    let dy = state.player.y - y;
    let reach = frame.radius + state.player.width / 2.0;
    if dx * dx + dy * dy > reach * reach {
        return;
    }
    damage_player(state, frame.attack, frame.element, None, false, false, 0.0);
    if let Ok(mut debuffs) = world.get::<&mut Debuffs>(frame.entity) {
        // Direct write: the recovery stun bypasses boss debuff
        // resistance on purpose.
        debuffs.stun = debuffs.stun.max(CONTACT_STUN_FRAMES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Enemy;
    use crate::ecs::world::create_world;

    fn frame_of(world: &World, state: &SimState, entity: hecs::Entity) -> EnemyFrame {
        let arch = world.get::<&Archetype>(entity).unwrap();
        let pos = world.get::<&Position>(entity).unwrap();
        let col = world.get::<&Collider>(entity).unwrap();
        let stats = world.get::<&EnemyStats>(entity).unwrap();
        let aff = world.get::<&Affinity>(entity).unwrap();
        let debuffs = world.get::<&Debuffs>(entity).unwrap();
        let _ = state;
        EnemyFrame {
            entity,
            kind: arch.kind,
            x: pos.x,
            y: pos.y,
            radius: col.radius,
            attack: stats.attack,
            move_speed: stats.move_speed,
            element: aff.element,
            stunned: debuffs.stun > 0,
            slowed: debuffs.slow > 0,
            berserk: false,
        }
    }

    #[test]
    fn enemies_advance_toward_player() {
        let (mut world, mut state) = create_world(51);
        state.terrain.tiles.clear();
        state.player.x = 800.0;
        state.player.y = 600.0;
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 400.0, 600.0, false);

        let before = world.get::<&Position>(enemy).unwrap().x;
        enemy_ai_system(&mut world, &mut state);
        let after = world.get::<&Position>(enemy).unwrap().x;
        assert!(after > before, "grunt closes distance on x axis");
    }

    #[test]
    fn stunned_enemies_do_not_move_or_attack() {
        let (mut world, mut state) = create_world(52);
        state.terrain.tiles.clear();
        state.player.x = 800.0;
        state.player.y = 600.0;
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 790.0, 600.0, false);
        world.get::<&mut Debuffs>(enemy).unwrap().stun = 30;
        let hp = state.player.stats.hp;

        enemy_ai_system(&mut world, &mut state);
        let pos = world.get::<&Position>(enemy).unwrap();
        assert_eq!(pos.x, 790.0);
        assert_eq!(state.player.stats.hp, hp, "no contact damage while stunned");
    }

    #[test]
    fn contact_damage_stuns_the_attacker() {
        let (mut world, mut state) = create_world(53);
        state.terrain.tiles.clear();
        state.player.x = 800.0;
        state.player.y = 600.0;
        state.player.stats.dodge_chance = 0.0;
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 801.0, 600.0, false);
        let hp = state.player.stats.hp + state.player.stats.shield;

        let frame = frame_of(&world, &state, enemy);
        contact_damage(&mut world, &mut state, &frame);

        assert!(state.player.stats.hp + state.player.stats.shield < hp);
        assert_eq!(
            world.get::<&Debuffs>(enemy).unwrap().stun,
            CONTACT_STUN_FRAMES
        );
    }

    #[test]
    fn ranged_enemy_fires_when_in_range() {
        let (mut world, mut state) = create_world(54);
        state.terrain.tiles.clear();
        state.stage.number = 2;
        state.player.x = 800.0;
        state.player.y = 600.0;
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Ranged, 700.0, 600.0, false);
        world.get::<&mut AttackTimer>(enemy).unwrap().remaining = 0;

        enemy_ai_system(&mut world, &mut state);
        let shots = world
            .query::<&Projectile>()
            .iter()
            .filter(|(_, p)| p.source == DamageSource::Enemy)
            .count();
        assert_eq!(shots, 1);
    }

    #[test]
    fn shambler_lays_poison_trail() {
        let (mut world, mut state) = create_world(55);
        state.terrain.tiles.clear();
        state.stage.number = 3;
        let enemy =
            spawn_enemy(&mut world, &mut state, EnemyKind::Shambler, 400.0, 400.0, false);
        world.get::<&mut AttackTimer>(enemy).unwrap().remaining = 0;

        enemy_ai_system(&mut world, &mut state);
        let trails = world
            .query::<&crate::ecs::components::Hazard>()
            .iter()
            .filter(|(_, h)| h.kind == HazardKind::Poison)
            .count();
        assert_eq!(trails, 1);
    }

    #[test]
    fn support_shields_one_random_unshielded_ally() {
        let (mut world, mut state) = create_world(56);
        state.terrain.tiles.clear();
        state.stage.number = 5;
        state.player.x = 1500.0;
        state.player.y = 1100.0;
        let support =
            spawn_enemy(&mut world, &mut state, EnemyKind::Support, 400.0, 400.0, false);
        let near = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 450.0, 400.0, false);
        let far = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 400.0, 600.0, false);
        world.get::<&mut AttackTimer>(support).unwrap().remaining = 0;

        let frame = frame_of(&world, &state, support);
        support_shield(&mut world, &mut state, &frame);

        // Both allies are in range and eligible, so exactly one of the
        // two draws the shield.
        let shielded = [near, far]
            .iter()
            .filter(|&&e| world.get::<&ShieldBuffer>(e).unwrap().value > 0.0)
            .count();
        assert_eq!(shielded, 1);
    }

    #[test]
    fn boss_cone_requires_player_in_range() {
        let (mut world, mut state) = create_world(59);
        state.terrain.tiles.clear();
        state.stage.number = 6;
        state.player.x = 1800.0;
        state.player.y = 1100.0;
        let boss = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 200.0, 200.0, false);

        let frame = frame_of(&world, &state, boss);
        boss_cone_shot(&mut world, &mut state, &frame);
        assert_eq!(world.query::<&Projectile>().iter().count(), 0);

        state.player.x = 200.0 + BOSS_CONE_RANGE - 50.0;
        state.player.y = 200.0;
        boss_cone_shot(&mut world, &mut state, &frame);
        assert_eq!(world.query::<&Projectile>().iter().count(), BOSS_CONE_SHOTS);
    }

    #[test]
    fn blink_repositions_the_boss() {
        let (mut world, mut state) = create_world(57);
        state.terrain.tiles.clear();
        state.stage.number = 6;
        let boss = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 400.0, 400.0, false);

        trigger_boss_ability(&mut world, &mut state, boss, BossAbility::Blink);
        let pos = world.get::<&Position>(boss).unwrap();
        assert!(
            pos.x != 400.0 || pos.y != 400.0,
            "boss moved somewhere else"
        );
        assert!(matches!(
            state.events.last(),
            Some(crate::protocol::SimEvent::BossAbility { name: "Phase Step" })
        ));
    }

    #[test]
    fn clone_copies_health_but_resets_counters() {
        let (mut world, mut state) = create_world(58);
        state.terrain.tiles.clear();
        state.stage.number = 6;
        let boss = spawn_enemy(&mut world, &mut state, EnemyKind::Boss, 400.0, 400.0, false);
        world.get::<&mut Health>(boss).unwrap().current = 123.0;
        world.get::<&mut BossState>(boss).unwrap().cumulative_damage = 500.0;

        trigger_boss_ability(&mut world, &mut state, boss, BossAbility::Clone);

        let bosses: Vec<hecs::Entity> = world
            .query::<&Archetype>()
            .with::<&Enemy>()
            .iter()
            .filter(|(_, a)| a.kind == EnemyKind::Boss)
            .map(|(e, _)| e)
            .collect();
        assert_eq!(bosses.len(), 2);
        let clone = bosses.into_iter().find(|&e| e != boss).unwrap();
        assert_eq!(world.get::<&Health>(clone).unwrap().current, 123.0);
        assert_eq!(
            world.get::<&BossState>(clone).unwrap().cumulative_damage,
            0.0
        );
    }
}
