use hecs::World;
use rand::Rng;

use crate::consts::{
    BLEED_DAMAGE_MULT, BOSS_RESISTANCE, ELEMENT_ADVANTAGE_MULT, ELEMENT_DISADVANTAGE_MULT,
    PLAYER_HURT_FRAMES, TARGET_LEASH, ULT_CHARGE_PER_HIT,
};
use crate::ecs::components::{
    Affinity, Archetype, BombKind, BossState, Collider, Debuffs, DamageSource, Dying, EnchantProc,
    EnemyKind, FloatingText, Health, HazardKind, Position, Projectile, ShieldBuffer, SimState,
    Velocity,
};
use crate::game::items::{ArmorEnchant, Item, Subtype, TalentKind};
use crate::game::stats::{element_multiplier, Element};
use crate::protocol::{SimEvent, TextColor};

/// Speed and shape constants per weapon family.
const BOW_PROJECTILE_SPEED: f32 = 9.0;
const STAFF_PROJECTILE_SPEED: f32 = 6.0;
const GRENADE_FLIGHT_SPEED: f32 = 4.5;
const MELEE_ARC_LIFETIME: u32 = 8;

// ── Effective weapon stats ───────────────────────────────────────────

/// A weapon's stats combined with the player's base stats and any
/// category-scoped talent multipliers, resolved at fire time.
pub struct EffectiveWeapon {
    pub attack: f32,
    pub attacks_per_second: f32,
    pub range: f32,
    pub crit_chance: f32,
    pub knockback: f32,
    pub shield_on_hit: f32,
    pub element: Element,
    pub enchant: Option<EnchantProc>,
    pub subtype: Subtype,
}

pub fn effective_weapon(state: &SimState, weapon: &Item) -> EffectiveWeapon {
    let base = &state.player.permanent;
    let mut attack = base.attack + weapon.stats.attack;
    let mut aps = weapon.stats.attack_speed * base.attack_speed;
    let mut knockback = base.knockback + weapon.stats.knockback;

    if let Some(talent) = &state.player.talent {
        match talent.kind {
            TalentKind::RangedMastery if !weapon.subtype.is_melee() => {
                attack *= 1.0 + talent.values[0];
                aps *= 1.0 + talent.values[1];
            }
            TalentKind::MeleeMastery if weapon.subtype.is_melee() => {
                attack *= 1.0 + talent.values[0];
                knockback *= 1.0 + talent.values[1];
            }
            _ => {}
        }
    }

    EffectiveWeapon {
        attack,
        attacks_per_second: aps,
        range: base.range + weapon.stats.range,
        crit_chance: base.crit_chance + weapon.stats.crit_chance,
        knockback,
        shield_on_hit: base.armor_on_hit + weapon.stats.armor_on_hit,
        element: weapon.element,
        enchant: weapon.weapon_enchant.map(|e| EnchantProc {
            debuff: e.debuff,
            chance: e.chance,
            duration: e.duration,
        }),
        subtype: weapon.subtype,
    }
}

// ── Weapon firing ────────────────────────────────────────────────────

/// Ticks both weapon cooldowns and fires at the nearest live enemy in
/// range. Cooldown reset is `60 / max(0.1, aps)`, with the speed-boost
/// buff multiplying attack speed before the division.
pub fn weapon_fire_system(world: &mut World, state: &mut SimState) {
    if state.player.dead {
        return;
    }

    for slot in 0..2 {
        state.weapon_cooldowns[slot] -= 1.0;
        if state.weapon_cooldowns[slot] > 0.0 {
            continue;
        }

        let Some(weapon) = (if slot == 0 {
            state.player.weapon1.clone()
        } else {
            state.player.weapon2.clone()
        }) else {
            continue;
        };

        let eff = effective_weapon(state, &weapon);
        let reach = eff.range + TARGET_LEASH;

        let Some((tx, ty)) = nearest_enemy(world, state, reach) else {
            continue;
        };

        let mut aps = eff.attacks_per_second;
        if state.timers.speed_boost > 0 {
            aps *= crate::consts::SPEED_BOOST_MULT;
        }
        state.weapon_cooldowns[slot] = 60.0 / aps.max(0.1);

        let (px, py) = (state.player.x, state.player.y);
        state.player.facing = (ty - py).atan2(tx - px);
        fire_weapon(world, &eff, px, py, tx, ty);
    }
}

/// Nearest live enemy within `reach` of the player, via the spatial
/// broad phase plus an exact distance check.
fn nearest_enemy(world: &World, state: &SimState, reach: f32) -> Option<(f32, f32)> {
    let (px, py) = (state.player.x, state.player.y);
    let mut best: Option<(f32, f32, f32)> = None;
    for entity in state.spatial.query(px, py, reach) {
        if world.get::<&Dying>(entity).is_ok() {
            continue;
        }
        let Ok(pos) = world.get::<&Position>(entity) else {
            continue;
        };
        let dx = pos.x - px;
        let dy = pos.y - py;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > reach * reach {
            continue;
        }
        match best {
            Some((_, _, d)) if d <= dist_sq => {}
            _ => best = Some((pos.x, pos.y, dist_sq)),
        }
    }
    best.map(|(x, y, _)| (x, y))
}

/// Spawns the projectile (or melee arc) for one weapon activation.
fn fire_weapon(world: &mut World, eff: &EffectiveWeapon, px: f32, py: f32, tx: f32, ty: f32) {
    let dx = tx - px;
    let dy = ty - py;
    let dist = (dx * dx + dy * dy).sqrt().max(0.001);
    let (nx, ny) = (dx / dist, dy / dist);

    let common = Projectile {
        damage: eff.attack,
        radius: 6.0,
        lifetime: 0,
        source: DamageSource::Player,
        element: eff.element,
        penetrates: false,
        melee: false,
        bomb: None,
        knockback: eff.knockback,
        crit_chance: eff.crit_chance,
        shield_on_hit: eff.shield_on_hit,
        enchant: eff.enchant,
        anchor: None,
        hit_ids: Default::default(),
    };

    match eff.subtype {
        Subtype::Sword | Subtype::Axe => {
            let arc_radius = eff.range * 0.55;
            let (ox, oy) = (nx * eff.range * 0.5, ny * eff.range * 0.5);
            world.spawn((
                Projectile {
                    radius: arc_radius,
                    lifetime: MELEE_ARC_LIFETIME,
                    penetrates: true,
                    melee: true,
                    anchor: Some((ox, oy)),
                    ..common
                },
                Position {
                    x: px + ox,
                    y: py + oy,
                },
                Velocity::default(),
            ));
        }
        Subtype::Bow => {
            world.spawn((
                Projectile {
                    lifetime: ((eff.range + TARGET_LEASH) / BOW_PROJECTILE_SPEED) as u32,
                    ..common
                },
                Position { x: px, y: py },
                Velocity {
                    x: nx * BOW_PROJECTILE_SPEED,
                    y: ny * BOW_PROJECTILE_SPEED,
                },
            ));
        }
        Subtype::Staff => {
            world.spawn((
                Projectile {
                    radius: 10.0,
                    lifetime: ((eff.range + TARGET_LEASH) / STAFF_PROJECTILE_SPEED) as u32,
                    penetrates: true,
                    ..common
                },
                Position { x: px, y: py },
                Velocity {
                    x: nx * STAFF_PROJECTILE_SPEED,
                    y: ny * STAFF_PROJECTILE_SPEED,
                },
            ));
        }
        Subtype::Grenade => {
            // Lob at the target's current position: the flight time is
            // computed so the bomb lands exactly there.
            let flight = (dist / GRENADE_FLIGHT_SPEED).ceil() as u32;
            let bomb = if eff.element == Element::Fire {
                BombKind::Incendiary
            } else {
                BombKind::Explosive
            };
            world.spawn((
                Projectile {
                    lifetime: flight.max(1),
                    bomb: Some(bomb),
                    ..common
                },
                Position { x: px, y: py },
                Velocity {
                    x: dx / flight.max(1) as f32,
                    y: dy / flight.max(1) as f32,
                },
            ));
        }
        // Armor subtypes never reach fire_weapon.
        _ => {}
    }
}

// ── Hit resolution ───────────────────────────────────────────────────

pub struct HitParams {
    pub damage: f32,
    pub element: Element,
    pub crit_chance: f32,
    pub knockback: f32,
    pub shield_on_hit: f32,
    pub enchant: Option<EnchantProc>,
}

pub struct HitOutcome {
    pub hp_loss: f32,
    pub shield_loss: f32,
}

/// Resolves one player-sourced hit against an enemy: elemental
/// multiplier, bleed amplification, crit roll, enchantment proc,
/// shield-before-HP absorption, knockback, ultimate charge, and boss
/// phase-step bookkeeping. Returns `None` if the target can't be hit
/// (dying, despawned, or inside a boss invincibility window).
pub fn apply_hit_to_enemy(
    world: &mut World,
    state: &mut SimState,
    target: hecs::Entity,
    params: &HitParams,
) -> Option<HitOutcome> {
    if world.get::<&Dying>(target).is_ok() {
        return None;
    }
    let kind = world.get::<&Archetype>(target).ok()?.kind;
    let is_boss = kind == EnemyKind::Boss;

    if is_boss {
        if let Ok(boss) = world.get::<&BossState>(target) {
            if boss.invincible > 0 {
                return None;
            }
        }
    }

    let defender_element = world.get::<&Affinity>(target).ok()?.element;
    let (ex, ey) = {
        let pos = world.get::<&Position>(target).ok()?;
        (pos.x, pos.y)
    };

    // 1–2. Elemental multiplier; disadvantage is special-cased, while
    // advantage and neutral share the same branch.
    let mut mult = element_multiplier(params.element, defender_element);
    if state.timers.omni_force > 0 {
        mult = ELEMENT_ADVANTAGE_MULT;
    }
    let mut damage = if mult <= ELEMENT_DISADVANTAGE_MULT {
        params.damage * ELEMENT_DISADVANTAGE_MULT
    } else {
        params.damage * mult
    };

    // 3. Bleed amplification.
    let bleeding = world
        .get::<&Debuffs>(target)
        .map(|d| d.bleed > 0)
        .unwrap_or(false);
    if bleeding {
        damage *= BLEED_DAMAGE_MULT;
    }

    // 4. Crit.
    let crit = state.rng.gen::<f32>() < params.crit_chance;
    if crit {
        damage *= 2.0;
    }

    // 5. Enchantment proc.
    if let Some(enchant) = params.enchant {
        if state.rng.gen::<f32>() < enchant.chance {
            if let Ok(mut debuffs) = world.get::<&mut Debuffs>(target) {
                debuffs.apply(enchant.debuff, enchant.duration, is_boss);
            }
        }
    }

    // 6. Shield absorbs before HP.
    let (hp_loss, shield_loss, shield_after) = {
        let mut shield = world.get::<&mut ShieldBuffer>(target).ok()?;
        let absorbed = shield.value.min(damage);
        shield.value -= absorbed;
        (damage - absorbed, absorbed, shield.value)
    };
    if hp_loss > 0.0 {
        if let Ok(mut health) = world.get::<&mut Health>(target) {
            health.current -= hp_loss;
        }
        // 7. Splatter only when HP was actually reduced.
        state.events.push(SimEvent::Splatter {
            x: ex,
            y: ey,
            element: defender_element,
        });
    }

    // 8. Floating text color encodes the outcome.
    let color = if hp_loss <= 0.0 && shield_loss > 0.0 {
        TextColor::Silver
    } else if mult >= ELEMENT_ADVANTAGE_MULT && params.element != Element::None {
        TextColor::Element(params.element)
    } else if mult <= ELEMENT_DISADVANTAGE_MULT {
        TextColor::Gray
    } else {
        TextColor::White
    };
    world.spawn((
        FloatingText {
            text: format!("{}", damage.round() as i64),
            color,
            crit,
            ttl: 45,
        },
        Position { x: ex, y: ey - 10.0 },
    ));

    // 9. Ultimate charge and armor-on-hit shield gain.
    state.player.gain_ult_charge(ULT_CHARGE_PER_HIT);
    state.player.stats.shield += params.shield_on_hit;

    // 10. Knockback only once the shield is fully depleted, blocked
    // per-axis by walls.
    if shield_after <= 0.0 && params.knockback > 0.0 {
        let kb = if is_boss {
            params.knockback / BOSS_RESISTANCE
        } else {
            params.knockback
        };
        let dx = ex - state.player.x;
        let dy = ey - state.player.y;
        let dist = (dx * dx + dy * dy).sqrt().max(0.001);
        let radius = world.get::<&Collider>(target).map(|c| c.radius).unwrap_or(14.0);
        if let Ok(mut pos) = world.get::<&mut Position>(target) {
            let push_x = dx / dist * kb;
            let push_y = dy / dist * kb;
            if !state.terrain.blocked(pos.x + push_x, pos.y, radius * 2.0, radius * 2.0) {
                pos.x += push_x;
            }
            if !state.terrain.blocked(pos.x, pos.y + push_y, radius * 2.0, radius * 2.0) {
                pos.y += push_y;
            }
        }
    }

    // 11. Boss cumulative-damage phase steps.
    if is_boss {
        let mut triggered = Vec::new();
        if let Ok(mut boss) = world.get::<&mut BossState>(target) {
            boss.cumulative_damage += damage;
            let max_hp = world.get::<&Health>(target).map(|h| h.max).unwrap_or(1.0);
            for slot in 0..2 {
                let ability = boss.abilities[slot];
                let step = ability.damage_step() * max_hp;
                let boundary = (boss.cumulative_damage / step) as u32;
                while boss.fired_boundary[slot] < boundary {
                    boss.fired_boundary[slot] += 1;
                    triggered.push(ability);
                }
            }
        }
        for ability in triggered {
            super::enemy_ai::trigger_boss_ability(world, state, target, ability);
        }
    }

    Some(HitOutcome {
        hp_loss,
        shield_loss,
    })
}

/// Shield-first damage with none of the on-hit pipeline; used by
/// hazard damage-over-time ticks.
pub fn apply_raw_damage_to_enemy(world: &mut World, target: hecs::Entity, damage: f32) {
    if world.get::<&Dying>(target).is_ok() {
        return;
    }
    let remainder = match world.get::<&mut ShieldBuffer>(target) {
        Ok(mut shield) => {
            let absorbed = shield.value.min(damage);
            shield.value -= absorbed;
            damage - absorbed
        }
        Err(_) => damage,
    };
    if remainder > 0.0 {
        if let Ok(mut health) = world.get::<&mut Health>(target) {
            health.current -= remainder;
        }
    }
}

// ── Player damage hook ───────────────────────────────────────────────

/// Applies enemy-sourced damage to the player: dodge roll, armor
/// enchant resistances, flat defense, shield-before-HP, hurt window,
/// and the PlayerHit event for the presentation layer. Silent damage
/// (hazard ticks) skips dodge, defense, and the hurt window.
pub fn damage_player(
    state: &mut SimState,
    damage: f32,
    attack_element: Element,
    hazard: Option<HazardKind>,
    ignore_shield: bool,
    silent: bool,
    slow_intensity: f32,
) {
    if state.player.dead {
        return;
    }
    if !silent && (state.timers.hurt > 0 || state.timers.invincible > 0) {
        return;
    }
    if !silent && state.rng.gen::<f32>() < state.player.stats.dodge_chance {
        // A successful dodge grants a short grace window.
        state.timers.invincible = state.timers.invincible.max(10);
        return;
    }

    let mut damage = damage;
    for armor in [&state.player.armor1, &state.player.armor2]
        .into_iter()
        .flatten()
    {
        match armor.armor_enchant {
            Some(ArmorEnchant::Resist(element, value)) if element == attack_element => {
                damage *= 1.0 - value;
            }
            Some(ArmorEnchant::BurnWard(value)) if hazard == Some(HazardKind::Fire) => {
                damage *= 1.0 - value;
            }
            Some(ArmorEnchant::PoisonWard(value)) if hazard == Some(HazardKind::Poison) => {
                damage *= 1.0 - value;
            }
            _ => {}
        }
    }

    if !silent {
        damage = (damage - state.player.stats.defense).max(1.0);
    }

    let absorbed = if ignore_shield {
        0.0
    } else {
        let absorbed = state.player.stats.shield.min(damage);
        state.player.stats.shield -= absorbed;
        absorbed
    };
    let hp_loss = damage - absorbed;
    state.player.stats.hp = (state.player.stats.hp - hp_loss).max(0.0);

    if !silent {
        state.timers.hurt = PLAYER_HURT_FRAMES;
        state.player.gain_ult_charge(2.0);
    }
    if slow_intensity > 0.0 {
        let mut slow_frames = crate::consts::DOT_SLOW_FRAMES;
        for armor in [&state.player.armor1, &state.player.armor2]
            .into_iter()
            .flatten()
        {
            if let Some(ArmorEnchant::StatusWard(value)) = armor.armor_enchant {
                slow_frames = (slow_frames as f32 * (1.0 - value)) as u32;
            }
        }
        state.timers.slow = state.timers.slow.max(slow_frames);
        state.timers.slow_intensity = state.timers.slow_intensity.max(slow_intensity);
    }

    state.events.push(SimEvent::PlayerHit {
        damage,
        ignore_shield,
        silent,
        slow_intensity,
    });
}
