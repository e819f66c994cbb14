use hecs::World;

use crate::consts::{DOT_SLOW_INTENSITY, DOT_TEXT_THRESHOLD, TICK_RATE};
use crate::ecs::components::{
    Archetype, Collider, DamageSource, Dying, EnemyKind, FloatingText, Hazard, HazardKind,
    Position, SimState,
};
use crate::ecs::systems::combat::{
    apply_hit_to_enemy, apply_raw_damage_to_enemy, damage_player, HitParams,
};
use crate::game::stats::Element;
use crate::game::terrain::TerrainKind;
use crate::protocol::TextColor;

/// Spawns an area hazard unless the terrain under it smothers the
/// effect: fire never ignites on water, poison never pools on mud.
#[allow(clippy::too_many_arguments)]
pub fn create_hazard(
    world: &mut World,
    state: &mut SimState,
    x: f32,
    y: f32,
    radius: f32,
    damage: f32,
    kind: HazardKind,
    source: DamageSource,
    element: Element,
    crit_chance: f32,
    knockback: f32,
    duration: u32,
) -> Option<hecs::Entity> {
    let under = state.terrain.kind_at(x, y);
    let smothered = matches!(
        (kind, under),
        (HazardKind::Fire, Some(TerrainKind::Water)) | (HazardKind::Poison, Some(TerrainKind::Mud))
    );
    if smothered {
        return None;
    }
    Some(world.spawn((
        Hazard {
            kind,
            radius,
            damage,
            remaining: duration,
            max_duration: duration,
            source,
            element,
            crit_chance,
            knockback,
            applied: false,
        },
        Position { x, y },
    )))
}

/// Ticks every active hazard. A hazard only arms on the tick after it
/// was created; explosions then apply their full damage exactly once,
/// while fire and poison zones deal per-second damage spread over
/// every tick of their lifetime to anyone standing inside.
pub fn hazard_system(world: &mut World, state: &mut SimState) {
    let hazards: Vec<(hecs::Entity, Hazard, f32, f32)> = world
        .query::<(&Hazard, &Position)>()
        .iter()
        .map(|(e, (h, p))| (e, h.clone(), p.x, p.y))
        .collect();

    let mut expired = Vec::new();
    for (entity, hazard, x, y) in hazards {
        // Arming tick: created this frame, no effect yet.
        if hazard.remaining == hazard.max_duration {
            tick_down(world, entity, &mut expired);
            continue;
        }

        match hazard.kind {
            HazardKind::Explosion => {
                if !hazard.applied {
                    apply_explosion(world, state, &hazard, x, y);
                    if let Ok(mut live) = world.get::<&mut Hazard>(entity) {
                        live.applied = true;
                    }
                }
            }
            HazardKind::Fire | HazardKind::Poison => {
                apply_dot_tick(world, state, &hazard, x, y);
            }
        }

        tick_down(world, entity, &mut expired);
    }

    for entity in expired {
        let _ = world.despawn(entity);
    }

    flush_player_dot_text(world, state);
}

fn tick_down(world: &mut World, entity: hecs::Entity, expired: &mut Vec<hecs::Entity>) {
    if let Ok(mut hazard) = world.get::<&mut Hazard>(entity) {
        hazard.remaining = hazard.remaining.saturating_sub(1);
        if hazard.remaining == 0 {
            expired.push(entity);
        }
    }
}

fn apply_explosion(world: &mut World, state: &mut SimState, hazard: &Hazard, x: f32, y: f32) {
    state.terrain.crumble_earth_walls_in_radius(x, y, hazard.radius);

    // Explosions hit everything in the blast regardless of who set
    // them off, so both branches run.
    let targets: Vec<hecs::Entity> = state
        .spatial
        .query(x, y, hazard.radius + 40.0)
        .into_iter()
        .filter(|&e| {
            if world.get::<&Dying>(e).is_ok() {
                return false;
            }
            let Ok(pos) = world.get::<&Position>(e) else {
                return false;
            };
            let radius = world.get::<&Collider>(e).map(|c| c.radius).unwrap_or(14.0);
            let dx = pos.x - x;
            let dy = pos.y - y;
            let reach = hazard.radius + radius;
            dx * dx + dy * dy <= reach * reach
        })
        .collect();

    if hazard.source == DamageSource::Player {
        let params = HitParams {
            damage: hazard.damage,
            element: hazard.element,
            crit_chance: hazard.crit_chance,
            knockback: hazard.knockback,
            shield_on_hit: 0.0,
            enchant: None,
        };
        for target in targets {
            apply_hit_to_enemy(world, state, target, &params);
        }
    }

    let dx = state.player.x - x;
    let dy = state.player.y - y;
    let reach = hazard.radius + state.player.width / 2.0;
    if hazard.source == DamageSource::Enemy && dx * dx + dy * dy <= reach * reach {
        damage_player(state, hazard.damage, hazard.element, None, false, false, 0.0);
    }
}

fn apply_dot_tick(world: &mut World, state: &mut SimState, hazard: &Hazard, x: f32, y: f32) {
    let tick_damage = hazard.damage / TICK_RATE as f32;
    let immune_terrain = match hazard.kind {
        HazardKind::Fire => TerrainKind::Water,
        HazardKind::Poison => TerrainKind::Mud,
        HazardKind::Explosion => unreachable!(),
    };

    let targets: Vec<hecs::Entity> = state
        .spatial
        .query(x, y, hazard.radius + 40.0)
        .into_iter()
        .filter(|&e| {
            if world.get::<&Dying>(e).is_ok() {
                return false;
            }
            // Shamblers wade through their own poison.
            if hazard.kind == HazardKind::Poison {
                if let Ok(arch) = world.get::<&Archetype>(e) {
                    if arch.kind == EnemyKind::Shambler {
                        return false;
                    }
                }
            }
            let Ok(pos) = world.get::<&Position>(e) else {
                return false;
            };
            if state.terrain.kind_at(pos.x, pos.y) == Some(immune_terrain) {
                return false;
            }
            let radius = world.get::<&Collider>(e).map(|c| c.radius).unwrap_or(14.0);
            let dx = pos.x - x;
            let dy = pos.y - y;
            let reach = hazard.radius + radius;
            dx * dx + dy * dy <= reach * reach
        })
        .collect();
    for target in targets {
        apply_raw_damage_to_enemy(world, target, tick_damage);
    }

    let dx = state.player.x - x;
    let dy = state.player.y - y;
    let reach = hazard.radius + state.player.width / 2.0;
    let player_inside = dx * dx + dy * dy <= reach * reach
        && state.terrain.kind_at(state.player.x, state.player.y) != Some(immune_terrain);
    if player_inside {
        damage_player(
            state,
            tick_damage,
            hazard.element,
            Some(hazard.kind),
            true,
            true,
            DOT_SLOW_INTENSITY,
        );
        state.dot_buffer += tick_damage;
    }
}

/// Buffered damage-over-time surfaces as one floating number per
/// threshold crossing instead of sixty tiny ones a second.
fn flush_player_dot_text(world: &mut World, state: &mut SimState) {
    if state.dot_buffer >= DOT_TEXT_THRESHOLD {
        world.spawn((
            FloatingText {
                text: format!("{}", state.dot_buffer.round() as i64),
                color: TextColor::White,
                crit: false,
                ttl: 45,
            },
            Position {
                x: state.player.x,
                y: state.player.y - 20.0,
            },
        ));
        state.dot_buffer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Enemy, Health};
    use crate::ecs::systems::spawn::spawn_enemy;
    use crate::ecs::world::create_world;
    use crate::game::terrain::TerrainTile;

    fn rebuild_spatial(world: &World, state: &mut SimState) {
        state.spatial.clear();
        for (e, pos) in world.query::<&Position>().with::<&Enemy>().iter() {
            state.spatial.insert(e, pos.x, pos.y);
        }
    }

    #[test]
    fn hazard_arms_one_tick_after_creation() {
        let (mut world, mut state) = create_world(41);
        state.terrain.tiles.clear();
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 500.0, 500.0, false);
        let hp = world.get::<&Health>(enemy).unwrap().current;
        rebuild_spatial(&world, &mut state);

        create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            60.0,
            30.0,
            HazardKind::Explosion,
            DamageSource::Player,
            Element::None,
            0.0,
            0.0,
            20,
        );

        hazard_system(&mut world, &mut state);
        assert_eq!(
            world.get::<&Health>(enemy).unwrap().current,
            hp,
            "no damage on the arming tick"
        );
        hazard_system(&mut world, &mut state);
        assert!(world.get::<&Health>(enemy).unwrap().current < hp);
    }

    #[test]
    fn explosion_applies_exactly_once() {
        let (mut world, mut state) = create_world(42);
        state.terrain.tiles.clear();
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 500.0, 500.0, false);
        let hp = world.get::<&Health>(enemy).unwrap().current;
        rebuild_spatial(&world, &mut state);

        create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            60.0,
            10.0,
            HazardKind::Explosion,
            DamageSource::Player,
            Element::None,
            0.0,
            0.0,
            20,
        );
        for _ in 0..10 {
            hazard_system(&mut world, &mut state);
        }
        let loss = hp - world.get::<&Health>(enemy).unwrap().current;
        assert_eq!(loss, 10.0);
    }

    #[test]
    fn fire_never_ignites_on_water() {
        let (mut world, mut state) = create_world(43);
        state.terrain.tiles.clear();
        state.terrain.tiles.push(TerrainTile {
            x: 480.0,
            y: 480.0,
            w: 40.0,
            h: 40.0,
            kind: TerrainKind::Water,
        });
        let spawned = create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            70.0,
            12.0,
            HazardKind::Fire,
            DamageSource::Enemy,
            Element::Fire,
            0.0,
            0.0,
            180,
        );
        assert!(spawned.is_none());
        assert_eq!(world.query::<&Hazard>().iter().count(), 0);
    }

    #[test]
    fn dot_skips_entities_on_immune_terrain() {
        let (mut world, mut state) = create_world(44);
        state.terrain.tiles.clear();
        // Wet ground under the enemy, dry ground under the hazard.
        state.terrain.tiles.push(TerrainTile {
            x: 520.0,
            y: 480.0,
            w: 40.0,
            h: 40.0,
            kind: TerrainKind::Water,
        });
        let enemy = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 540.0, 500.0, false);
        let hp = world.get::<&Health>(enemy).unwrap().current;
        rebuild_spatial(&world, &mut state);

        create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            70.0,
            60.0,
            HazardKind::Fire,
            DamageSource::Enemy,
            Element::Fire,
            0.0,
            0.0,
            180,
        );
        for _ in 0..5 {
            hazard_system(&mut world, &mut state);
        }
        assert_eq!(world.get::<&Health>(enemy).unwrap().current, hp);
    }

    #[test]
    fn shambler_is_immune_to_poison() {
        let (mut world, mut state) = create_world(45);
        state.terrain.tiles.clear();
        state.stage.number = 3;
        let shambler =
            spawn_enemy(&mut world, &mut state, EnemyKind::Shambler, 500.0, 500.0, false);
        let grunt = spawn_enemy(&mut world, &mut state, EnemyKind::Grunt, 510.0, 500.0, false);
        let shambler_hp = world.get::<&Health>(shambler).unwrap().current;
        let grunt_hp = world.get::<&Health>(grunt).unwrap().current;
        rebuild_spatial(&world, &mut state);

        create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            70.0,
            60.0,
            HazardKind::Poison,
            DamageSource::Enemy,
            Element::Grass,
            0.0,
            0.0,
            180,
        );
        for _ in 0..5 {
            hazard_system(&mut world, &mut state);
        }
        assert_eq!(
            world.get::<&Health>(shambler).unwrap().current,
            shambler_hp
        );
        assert!(world.get::<&Health>(grunt).unwrap().current < grunt_hp);
    }

    #[test]
    fn player_dot_is_buffered_until_threshold() {
        let (mut world, mut state) = create_world(46);
        state.terrain.tiles.clear();
        state.player.x = 500.0;
        state.player.y = 500.0;

        create_hazard(
            &mut world,
            &mut state,
            500.0,
            500.0,
            70.0,
            60.0,
            HazardKind::Fire,
            DamageSource::Enemy,
            Element::Fire,
            0.0,
            0.0,
            600,
        );
        // 60 dmg/s over 4 ticks (plus one arming tick) buffers 4.0,
        // under the flush threshold.
        for _ in 0..5 {
            hazard_system(&mut world, &mut state);
        }
        assert_eq!(world.query::<&FloatingText>().iter().count(), 0);
        assert!(state.dot_buffer > 0.0);

        hazard_system(&mut world, &mut state);
        assert_eq!(world.query::<&FloatingText>().iter().count(), 1);
        assert_eq!(state.dot_buffer, 0.0);
    }
}
