//! Procedural equipment and talent generation.
//!
//! Rarity picks a percentile slice of a global 0–1 strength axis; every
//! rolled stat derives an expected value from base + per-level scaling,
//! spans a fluctuation band around it, and samples inside the slice of
//! that band matching the rolled rarity. Higher rarity therefore biases
//! deterministically toward the top of the band while keeping in-tier
//! randomness.

use rand::Rng;

use crate::game::items::{
    ArmorEnchant, DebuffKind, Item, ItemKind, Rarity, Subtype, Talent, TalentKind, UltimateKind,
    WeaponEnchant,
};
use crate::game::stats::{Element, Stats};

/// Fluctuation band for primary stats, as fractions of the expected value.
const STAT_BAND: (f32, f32) = (0.8, 1.4);
/// Narrower band for secondary stats (crit, dodge, durations).
const MINOR_BAND: (f32, f32) = (0.9, 1.4);

/// Melee weapons gain shield per hit calibrated to this rate.
const MELEE_SHIELD_PER_SECOND: f32 = 2.0;

// ── Weighted / percentile helpers ───────────────────────────────────

/// Picks one option by weight. Panics only if `options` is empty or all
/// weights are zero, which never happens for the static tables below.
pub fn pick_weighted<T: Copy>(rng: &mut impl Rng, options: &[(T, f32)]) -> T {
    let total: f32 = options.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen::<f32>() * total;
    for &(value, weight) in options {
        roll -= weight;
        if roll <= 0.0 {
            return value;
        }
    }
    options[options.len() - 1].0
}

pub fn roll_rarity(rng: &mut impl Rng) -> Rarity {
    let table: Vec<(Rarity, f32)> = Rarity::all().iter().map(|&r| (r, r.weight())).collect();
    pick_weighted(rng, &table)
}

/// Samples a stat value inside the rarity's percentile slice of the
/// fluctuation band around `expected`, then applies the flat rarity
/// multiplier.
pub fn roll_stat(rng: &mut impl Rng, expected: f32, band: (f32, f32), rarity: Rarity) -> f32 {
    let (lo, hi) = rarity.percentile_range();
    let percentile = rng.gen_range(lo..hi);
    let fraction = band.0 + (band.1 - band.0) * percentile;
    expected * fraction * rarity.stat_mult()
}

fn roll_element(rng: &mut impl Rng) -> Element {
    pick_weighted(
        rng,
        &[
            (Element::Fire, 22.0),
            (Element::Grass, 22.0),
            (Element::Earth, 22.0),
            (Element::Water, 22.0),
            (Element::None, 12.0),
        ],
    )
}

fn item_name(rarity: Rarity, element: Element, subtype: Subtype) -> String {
    let tier = match rarity {
        Rarity::Common => "Common",
        Rarity::Rare => "Rare",
        Rarity::Epic => "Epic",
        Rarity::Legendary => "Legendary",
    };
    match element {
        Element::None => format!("{tier} {}", subtype.display_name()),
        _ => format!("{tier} {element:?} {}", subtype.display_name()),
    }
}

// ── Weapons ─────────────────────────────────────────────────────────

fn weapon_range(subtype: Subtype) -> f32 {
    match subtype {
        Subtype::Sword => 70.0,
        Subtype::Axe => 85.0,
        Subtype::Bow => 320.0,
        Subtype::Staff => 260.0,
        Subtype::Grenade => 300.0,
        _ => 0.0,
    }
}

fn roll_weapon_enchant(rng: &mut impl Rng, rarity: Rarity) -> Option<WeaponEnchant> {
    if rng.gen::<f32>() >= rarity.enchant_chance() {
        return None;
    }
    let debuff = pick_weighted(
        rng,
        &[
            (DebuffKind::Slow, 45.0),
            (DebuffKind::Stun, 20.0),
            (DebuffKind::Bleed, 35.0),
        ],
    );
    let base_duration = match debuff {
        DebuffKind::Slow => 120.0,
        DebuffKind::Stun => 45.0,
        DebuffKind::Bleed => 180.0,
    };
    Some(WeaponEnchant {
        debuff,
        chance: roll_stat(rng, 0.12, MINOR_BAND, rarity).min(0.5),
        duration: roll_stat(rng, base_duration, MINOR_BAND, rarity) as u32,
    })
}

/// Generates a weapon scaled to `level`.
pub fn generate_random_weapon(level: u32, rng: &mut impl Rng) -> Item {
    let rarity = roll_rarity(rng);
    let subtype = pick_weighted(
        rng,
        &[
            (Subtype::Sword, 24.0),
            (Subtype::Axe, 20.0),
            (Subtype::Bow, 24.0),
            (Subtype::Staff, 20.0),
            (Subtype::Grenade, 12.0),
        ],
    );
    let element = roll_element(rng);

    let mut stats = Stats::default();
    stats.attack = roll_stat(rng, 8.0 + 2.5 * level as f32, STAT_BAND, rarity);
    stats.attack_speed = roll_stat(rng, 1.0 + 0.03 * level as f32, MINOR_BAND, rarity);
    stats.range = weapon_range(subtype);
    stats.crit_chance = roll_stat(rng, 0.06, MINOR_BAND, rarity);
    stats.knockback = roll_stat(rng, if subtype.is_melee() { 14.0 } else { 6.0 }, STAT_BAND, rarity);

    // Melee weapons trade reach for shield gain, calibrated to a fixed
    // gain per second at the rolled attack speed.
    if subtype.is_melee() {
        stats.armor_on_hit = MELEE_SHIELD_PER_SECOND / stats.attack_speed.max(0.1);
    }

    let ultimate = if rng.gen::<f32>() < rarity.ultimate_chance() {
        let options: Vec<(UltimateKind, f32)> =
            UltimateKind::all().iter().map(|&u| (u, 1.0)).collect();
        Some(pick_weighted(rng, &options))
    } else {
        None
    };

    Item {
        name: item_name(rarity, element, subtype),
        kind: ItemKind::Weapon,
        subtype,
        element,
        rarity,
        stats,
        ultimate,
        weapon_enchant: roll_weapon_enchant(rng, rarity),
        armor_enchant: None,
        durability: 100.0,
        level,
    }
}

// ── Armor ───────────────────────────────────────────────────────────

fn roll_armor_enchant(rng: &mut impl Rng, rarity: Rarity) -> Option<ArmorEnchant> {
    if rng.gen::<f32>() >= rarity.enchant_chance() {
        return None;
    }
    let value = roll_stat(rng, 0.25, MINOR_BAND, rarity).min(0.8);
    let pick: u32 = rng.gen_range(0..4);
    Some(match pick {
        0 => ArmorEnchant::Resist(roll_element(rng), value),
        1 => ArmorEnchant::BurnWard(value),
        2 => ArmorEnchant::PoisonWard(value),
        _ => ArmorEnchant::StatusWard(value),
    })
}

/// Generates an armor piece scaled to `level`.
pub fn generate_random_armor(level: u32, rng: &mut impl Rng) -> Item {
    let rarity = roll_rarity(rng);
    let subtype = pick_weighted(
        rng,
        &[
            (Subtype::Cloth, 35.0),
            (Subtype::Leather, 40.0),
            (Subtype::Plate, 25.0),
        ],
    );
    let element = roll_element(rng);

    let mut stats = Stats::default();
    stats.max_hp = roll_stat(rng, 15.0 + 4.0 * level as f32, STAT_BAND, rarity);
    stats.defense = roll_stat(rng, 2.0 + 0.8 * level as f32, STAT_BAND, rarity);
    // Starting shield reapplied at every stage start.
    stats.shield = roll_stat(rng, 8.0 + 2.0 * level as f32, STAT_BAND, rarity);
    match subtype {
        Subtype::Cloth => stats.dodge_chance = roll_stat(rng, 0.06, MINOR_BAND, rarity),
        Subtype::Leather => stats.move_speed = roll_stat(rng, 0.25, MINOR_BAND, rarity),
        Subtype::Plate => {
            stats.defense += roll_stat(rng, 2.0, STAT_BAND, rarity);
            stats.move_speed = -0.2;
        }
        _ => {}
    }

    Item {
        name: item_name(rarity, element, subtype),
        kind: ItemKind::Armor,
        subtype,
        element,
        rarity,
        stats,
        ultimate: None,
        weapon_enchant: None,
        armor_enchant: roll_armor_enchant(rng, rarity),
        durability: 100.0,
        level,
    }
}

// ── Talents ─────────────────────────────────────────────────────────

/// Generates a talent: independent rarity and weighted kind, with 1–3
/// values rolled through the same percentile interpolation.
pub fn generate_random_talent(rng: &mut impl Rng) -> Talent {
    let rarity = roll_rarity(rng);
    let table: Vec<(TalentKind, f32)> =
        TalentKind::all().iter().map(|&k| (k, k.weight())).collect();
    let kind = pick_weighted(rng, &table);

    let mut values = [0.0f32; 3];
    let description = match kind {
        TalentKind::RangedMastery => {
            values[0] = roll_stat(rng, 0.30, MINOR_BAND, rarity);
            values[1] = roll_stat(rng, 0.15, MINOR_BAND, rarity);
            format!(
                "Ranged weapons deal +{:.0}% damage and attack {:.0}% faster",
                values[0] * 100.0,
                values[1] * 100.0
            )
        }
        TalentKind::MeleeMastery => {
            values[0] = roll_stat(rng, 0.35, MINOR_BAND, rarity);
            values[1] = roll_stat(rng, 0.25, MINOR_BAND, rarity);
            format!(
                "Melee weapons deal +{:.0}% damage and +{:.0}% knockback",
                values[0] * 100.0,
                values[1] * 100.0
            )
        }
        TalentKind::Tinkerer => {
            values[0] = roll_stat(rng, 0.40, MINOR_BAND, rarity).min(0.9);
            format!(
                "Equipment loses {:.0}% less durability at stage end",
                values[0] * 100.0
            )
        }
        TalentKind::Greed => {
            values[0] = roll_stat(rng, 0.35, MINOR_BAND, rarity);
            format!("Gain +{:.0}% gold from all sources", values[0] * 100.0)
        }
        TalentKind::Vitality => {
            values[0] = roll_stat(rng, 30.0, STAT_BAND, rarity);
            values[1] = roll_stat(rng, 3.0, STAT_BAND, rarity);
            format!("+{:.0} max HP and +{:.1} defense", values[0], values[1])
        }
    };

    Talent {
        kind,
        rarity,
        values,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn rarity_weights_converge() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<Rarity, u32> = HashMap::new();
        let draws = 100_000;
        for _ in 0..draws {
            *counts.entry(roll_rarity(&mut rng)).or_default() += 1;
        }
        let total_weight: f32 = Rarity::all().iter().map(|r| r.weight()).sum();
        for rarity in Rarity::all() {
            let expected = rarity.weight() / total_weight;
            let observed = counts[&rarity] as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.01,
                "{rarity:?}: expected ~{expected:.3}, got {observed:.3}"
            );
        }
    }

    #[test]
    fn stat_rolls_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(1);
        for rarity in Rarity::all() {
            for _ in 0..2_000 {
                let value = roll_stat(&mut rng, 100.0, STAT_BAND, rarity);
                let min = 100.0 * STAT_BAND.0 * rarity.stat_mult();
                let max = 100.0 * STAT_BAND.1 * rarity.stat_mult();
                assert!(value >= min && value <= max, "{rarity:?} rolled {value}");
            }
        }
    }

    #[test]
    fn legendary_rolls_beat_common_rolls() {
        let mut rng = StdRng::seed_from_u64(2);
        // Common tops out at band 0.8 + 0.6*0.4 = 1.04; Legendary starts
        // at 0.8 + 0.6*0.9 = 1.34, times the 1.5 flat multiplier.
        let common_max = (0..5_000)
            .map(|_| roll_stat(&mut rng, 100.0, STAT_BAND, Rarity::Common))
            .fold(f32::MIN, f32::max);
        let legendary_min = (0..5_000)
            .map(|_| roll_stat(&mut rng, 100.0, STAT_BAND, Rarity::Legendary))
            .fold(f32::MAX, f32::min);
        assert!(legendary_min > common_max);
    }

    #[test]
    fn generated_items_start_at_full_durability() {
        let mut rng = StdRng::seed_from_u64(3);
        for level in [1, 5, 20] {
            let weapon = generate_random_weapon(level, &mut rng);
            let armor = generate_random_armor(level, &mut rng);
            assert_eq!(weapon.durability, 100.0);
            assert_eq!(armor.durability, 100.0);
            assert_eq!(weapon.kind, ItemKind::Weapon);
            assert_eq!(armor.kind, ItemKind::Armor);
        }
    }

    #[test]
    fn melee_weapons_gain_shield_per_hit() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let weapon = generate_random_weapon(3, &mut rng);
            if weapon.subtype.is_melee() {
                let per_second = weapon.stats.armor_on_hit * weapon.stats.attack_speed;
                assert!((per_second - MELEE_SHIELD_PER_SECOND).abs() < 0.01);
            } else {
                assert_eq!(weapon.stats.armor_on_hit, 0.0);
            }
        }
    }

    #[test]
    fn talent_kind_weights_converge() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut counts: HashMap<TalentKind, u32> = HashMap::new();
        let draws = 100_000;
        for _ in 0..draws {
            *counts.entry(generate_random_talent(&mut rng).kind).or_default() += 1;
        }
        let total_weight: f32 = TalentKind::all().iter().map(|k| k.weight()).sum();
        for kind in TalentKind::all() {
            let expected = kind.weight() / total_weight;
            let observed = counts[&kind] as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.01,
                "{kind:?}: expected ~{expected:.3}, got {observed:.3}"
            );
        }
    }

    #[test]
    fn enchant_debuff_weights_converge() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts: HashMap<DebuffKind, u32> = HashMap::new();
        let mut rolled = 0u32;
        // Legendary keeps the proc-chance gate from starving the sample.
        while rolled < 50_000 {
            if let Some(enchant) = roll_weapon_enchant(&mut rng, Rarity::Legendary) {
                *counts.entry(enchant.debuff).or_default() += 1;
                rolled += 1;
            }
        }
        let total = 45.0 + 20.0 + 35.0;
        for (debuff, weight) in [
            (DebuffKind::Slow, 45.0),
            (DebuffKind::Stun, 20.0),
            (DebuffKind::Bleed, 35.0),
        ] {
            let expected = weight / total;
            let observed = counts[&debuff] as f32 / rolled as f32;
            assert!(
                (observed - expected).abs() < 0.01,
                "{debuff:?}: expected ~{expected:.3}, got {observed:.3}"
            );
        }
    }

    #[test]
    fn talents_format_their_rolled_values() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let talent = generate_random_talent(&mut rng);
            assert!(!talent.description.is_empty());
            assert!(talent.values[0] > 0.0);
        }
    }
}
