use hecs::World;

use crate::ecs::components::{
    BombKind, Collider, DamageSource, Dying, HazardKind, Position, Projectile, SimState,
};
use crate::ecs::systems::combat::{apply_hit_to_enemy, damage_player, HitParams};
use crate::ecs::systems::hazard::create_hazard;
use crate::game::stats::Element;

/// Advances every projectile one tick: move, expire (bombs detonate
/// into hazards), collide with walls (earth walls crumble to mud), and
/// resolve enemy/player contacts. Each target is hit at most once per
/// projectile; penetrating projectiles continue after a hit.
pub fn projectile_system(world: &mut World, state: &mut SimState) {
    // Length snapshot: hazard detonations and hit resolution must not
    // process projectiles spawned during this pass.
    let projectiles: Vec<hecs::Entity> = world
        .query::<(&Projectile, &Position)>()
        .iter()
        .map(|(e, _)| e)
        .collect();

    let mut to_despawn: Vec<hecs::Entity> = Vec::new();

    for entity in projectiles {
        // Advance and tick lifetime.
        let (x, y, expired, melee, bomb, source, radius) = {
            let Ok((proj, pos, vel)) = world.query_one_mut::<(
                &mut Projectile,
                &mut Position,
                &crate::ecs::components::Velocity,
            )>(entity) else {
                continue;
            };
            match proj.anchor {
                // Melee arcs stay glued to the player for their whole
                // swing.
                Some((ox, oy)) => {
                    pos.x = state.player.x + ox;
                    pos.y = state.player.y + oy;
                }
                None => {
                    pos.x += vel.x;
                    pos.y += vel.y;
                }
            }
            proj.lifetime = proj.lifetime.saturating_sub(1);
            (
                pos.x,
                pos.y,
                proj.lifetime == 0,
                proj.melee,
                proj.bomb,
                proj.source,
                proj.radius,
            )
        };

        if expired {
            if let Some(kind) = bomb {
                let Ok((damage, element, crit, kb)) = world
                    .get::<&Projectile>(entity)
                    .map(|p| (p.damage, p.element, p.crit_chance, p.knockback))
                else {
                    continue;
                };
                match kind {
                    BombKind::Incendiary => {
                        create_hazard(
                            world,
                            state,
                            x,
                            y,
                            70.0,
                            damage,
                            HazardKind::Fire,
                            source,
                            element,
                            crit,
                            0.0,
                            crate::consts::secs(3),
                        );
                    }
                    BombKind::Explosive => {
                        create_hazard(
                            world, state, x, y, 80.0, damage, HazardKind::Explosion, source,
                            element, crit, kb, 20,
                        );
                    }
                }
            }
            to_despawn.push(entity);
            continue;
        }

        // Wall contact destroys non-bomb, non-melee projectiles and
        // crumbles earth walls.
        if !melee && bomb.is_none() && state.terrain.blocked(x, y, radius, radius) {
            state.terrain.crumble_earth_wall(x, y);
            to_despawn.push(entity);
            continue;
        }

        // Lobbed bombs arc over anything in the way; they only act at
        // expiry, when they detonate into a hazard.
        if bomb.is_some() {
            continue;
        }

        match source {
            DamageSource::Player => {
                if resolve_player_projectile_hits(world, state, entity, x, y, radius) {
                    to_despawn.push(entity);
                }
            }
            DamageSource::Enemy => {
                if resolve_enemy_projectile_hit(world, state, entity, x, y, radius) {
                    to_despawn.push(entity);
                }
            }
        }
    }

    for entity in to_despawn {
        let _ = world.despawn(entity);
    }
}

/// Hit-tests a player projectile against nearby enemies via the spatial
/// broad phase. Returns true if the projectile should despawn.
fn resolve_player_projectile_hits(
    world: &mut World,
    state: &mut SimState,
    entity: hecs::Entity,
    x: f32,
    y: f32,
    radius: f32,
) -> bool {
    let candidates = state.spatial.query(x, y, radius + 40.0);

    for target in candidates {
        if world.get::<&Dying>(target).is_ok() {
            continue;
        }
        let Ok(pos) = world.get::<&Position>(target) else {
            continue;
        };
        let target_radius = world
            .get::<&Collider>(target)
            .map(|c| c.radius)
            .unwrap_or(14.0);
        let dx = pos.x - x;
        let dy = pos.y - y;
        let reach = radius + target_radius;
        if dx * dx + dy * dy > reach * reach {
            continue;
        }
        drop(pos);

        // Dedupe within this projectile's lifetime.
        let params = {
            let Ok(mut proj) = world.get::<&mut Projectile>(entity) else {
                return false;
            };
            if !proj.hit_ids.insert(target) {
                continue;
            }
            HitParams {
                damage: proj.damage,
                element: proj.element,
                crit_chance: proj.crit_chance,
                knockback: proj.knockback,
                shield_on_hit: proj.shield_on_hit,
                enchant: proj.enchant,
            }
        };
        apply_hit_to_enemy(world, state, target, &params);

        let penetrates = world
            .get::<&Projectile>(entity)
            .map(|p| p.penetrates)
            .unwrap_or(false);
        if !penetrates {
            return true;
        }
    }
    false
}

/// Contact test of an enemy projectile against the player. Enemy shots
/// never penetrate. Returns true if the projectile should despawn.
fn resolve_enemy_projectile_hit(
    world: &mut World,
    state: &mut SimState,
    entity: hecs::Entity,
    x: f32,
    y: f32,
    radius: f32,
) -> bool {
    let dx = state.player.x - x;
    let dy = state.player.y - y;
    let reach = radius + state.player.width / 2.0;
    if dx * dx + dy * dy > reach * reach {
        return false;
    }
    let (damage, element) = {
        let Ok(proj) = world.get::<&Projectile>(entity) else {
            return false;
        };
        (proj.damage, proj.element)
    };
    damage_player(state, damage, element, None, false, false, 0.0);
    true
}
