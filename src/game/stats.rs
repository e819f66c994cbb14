use serde::{Deserialize, Serialize};

use crate::consts::{ELEMENT_ADVANTAGE_MULT, ELEMENT_DISADVANTAGE_MULT};
use crate::ecs::components::PlayerState;
use crate::game::items::{ItemKind, TalentKind};

// ── Elements ────────────────────────────────────────────────────────

/// Elemental affinity. Advantage runs in a cycle:
/// Fire → Grass → Earth → Water → Fire. `None` is always neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Grass,
    Earth,
    Water,
    None,
}

impl Element {
    /// The element this one has advantage over, if any.
    pub fn prey(self) -> Option<Element> {
        match self {
            Element::Fire => Some(Element::Grass),
            Element::Grass => Some(Element::Earth),
            Element::Earth => Some(Element::Water),
            Element::Water => Some(Element::Fire),
            Element::None => None,
        }
    }
}

/// Damage multiplier for `attacker` hitting `defender`.
pub fn element_multiplier(attacker: Element, defender: Element) -> f32 {
    if attacker.prey() == Some(defender) {
        ELEMENT_ADVANTAGE_MULT
    } else if defender.prey() == Some(attacker) {
        ELEMENT_DISADVANTAGE_MULT
    } else {
        1.0
    }
}

// ── Stat bundles ────────────────────────────────────────────────────

/// The full derived stat sheet carried by the player (a subset is used
/// for enemies). All fields are additive contributions except `hp`,
/// which is the live value clamped to `[0, max_hp]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub defense: f32,
    pub attack: f32,
    pub attack_speed: f32,
    pub range: f32,
    pub move_speed: f32,
    pub dodge_chance: f32,
    pub knockback: f32,
    pub crit_chance: f32,
    pub armor_on_hit: f32,
    pub ult_charge_rate: f32,
}

impl Stats {
    /// Adds another bundle's contributions onto this one. `hp` and
    /// `shield` are live values and are not summed here.
    pub fn add(&mut self, other: &Stats) {
        self.max_hp += other.max_hp;
        self.defense += other.defense;
        self.attack += other.attack;
        self.attack_speed += other.attack_speed;
        self.range += other.range;
        self.move_speed += other.move_speed;
        self.dodge_chance += other.dodge_chance;
        self.knockback += other.knockback;
        self.crit_chance += other.crit_chance;
        self.armor_on_hit += other.armor_on_hit;
        self.ult_charge_rate += other.ult_charge_rate;
    }
}

// ── Derived stat recomputation ──────────────────────────────────────

/// Recomputes `player.stats` from permanent stats plus every equipped
/// item and the talent. Must be called after any equipment, talent, or
/// permanent-stat change. Calling it twice with no intervening change
/// yields identical results; live hp is preserved (clamped to the new
/// maximum) and live shield is carried over.
pub fn recalculate_player_stats(player: &mut PlayerState) {
    let live_hp = player.stats.hp;
    let live_shield = player.stats.shield;

    let mut stats = player.permanent.clone();

    for item in [&player.weapon1, &player.weapon2, &player.armor1, &player.armor2]
        .into_iter()
        .flatten()
    {
        stats.add(&item.stats);
    }

    if let Some(talent) = &player.talent {
        if talent.kind == TalentKind::Vitality {
            stats.max_hp += talent.values[0];
            stats.defense += talent.values[1];
        }
    }

    stats.hp = live_hp.clamp(0.0, stats.max_hp);
    stats.shield = live_shield.max(0.0);
    player.stats = stats;
}

/// Sum of `armor_on_hit`-style starting shield granted by equipped
/// armor pieces, reapplied at stage start.
pub fn armor_starting_shield(player: &PlayerState) -> f32 {
    [&player.armor1, &player.armor2]
        .into_iter()
        .flatten()
        .filter(|item| item.kind == ItemKind::Armor)
        .map(|item| item.stats.shield)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::items::Item;
    use crate::game::loot;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn element_table_is_antisymmetric() {
        let all = [
            Element::Fire,
            Element::Grass,
            Element::Earth,
            Element::Water,
            Element::None,
        ];
        for a in all {
            for b in all {
                let ab = element_multiplier(a, b);
                let ba = element_multiplier(b, a);
                if ab == ELEMENT_ADVANTAGE_MULT {
                    assert_eq!(ba, ELEMENT_DISADVANTAGE_MULT, "{a:?} vs {b:?}");
                }
                if a == Element::None || b == Element::None {
                    assert_eq!(ab, 1.0);
                }
            }
        }
    }

    #[test]
    fn fire_beats_grass_loses_to_water() {
        assert_eq!(element_multiplier(Element::Fire, Element::Grass), 3.0);
        assert_eq!(element_multiplier(Element::Fire, Element::Water), 0.5);
        assert_eq!(element_multiplier(Element::Fire, Element::Earth), 1.0);
    }

    fn equipped_player(weapon: Item) -> PlayerState {
        let mut player = PlayerState::new();
        player.weapon1 = Some(weapon);
        player
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut player = equipped_player(loot::generate_random_weapon(3, &mut rng));
        recalculate_player_stats(&mut player);
        let first = player.stats.clone();
        recalculate_player_stats(&mut player);
        assert_eq!(format!("{first:?}"), format!("{:?}", player.stats));
    }

    #[test]
    fn hp_is_clamped_to_new_max() {
        let mut player = PlayerState::new();
        player.stats.hp = 10_000.0;
        recalculate_player_stats(&mut player);
        assert!(player.stats.hp <= player.stats.max_hp);
        player.stats.hp = -5.0;
        recalculate_player_stats(&mut player);
        assert_eq!(player.stats.hp, 0.0);
    }
}
