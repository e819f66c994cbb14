use serde::{Deserialize, Serialize};

use crate::ecs::components::PlayerState;
use crate::game::stats::{recalculate_player_stats, Element, Stats};

// ── Rarity ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Weighted-random selection weight.
    pub fn weight(self) -> f32 {
        match self {
            Rarity::Common => 55.0,
            Rarity::Rare => 28.0,
            Rarity::Epic => 13.0,
            Rarity::Legendary => 4.0,
        }
    }

    /// The percentile slice of the global 0–1 strength axis this tier
    /// rolls inside of: higher tiers bias toward the top of the stat
    /// fluctuation band while keeping in-tier randomness.
    pub fn percentile_range(self) -> (f32, f32) {
        match self {
            Rarity::Common => (0.0, 0.40),
            Rarity::Rare => (0.40, 0.70),
            Rarity::Epic => (0.70, 0.90),
            Rarity::Legendary => (0.90, 1.0),
        }
    }

    /// Flat multiplier applied on top of the rolled stat value.
    pub fn stat_mult(self) -> f32 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.1,
            Rarity::Epic => 1.25,
            Rarity::Legendary => 1.5,
        }
    }

    /// Chance a weapon of this rarity carries an ultimate skill.
    pub fn ultimate_chance(self) -> f32 {
        match self {
            Rarity::Common => 0.05,
            Rarity::Rare => 0.15,
            Rarity::Epic => 0.35,
            Rarity::Legendary => 0.75,
        }
    }

    /// Chance an item of this rarity carries an enchantment.
    pub fn enchant_chance(self) -> f32 {
        match self {
            Rarity::Common => 0.08,
            Rarity::Rare => 0.20,
            Rarity::Epic => 0.40,
            Rarity::Legendary => 0.70,
        }
    }

    pub fn all() -> [Rarity; 4] {
        [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary]
    }
}

// ── Item subtypes ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subtype {
    // Weapons
    Sword,
    Axe,
    Bow,
    Staff,
    Grenade,
    // Armor
    Cloth,
    Leather,
    Plate,
}

impl Subtype {
    pub fn kind(self) -> ItemKind {
        match self {
            Subtype::Sword | Subtype::Axe | Subtype::Bow | Subtype::Staff | Subtype::Grenade => {
                ItemKind::Weapon
            }
            Subtype::Cloth | Subtype::Leather | Subtype::Plate => ItemKind::Armor,
        }
    }

    /// Melee weapons spawn attack arcs instead of projectiles and are
    /// the scope of melee-only talent bonuses.
    pub fn is_melee(self) -> bool {
        matches!(self, Subtype::Sword | Subtype::Axe)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Subtype::Sword => "Sword",
            Subtype::Axe => "Axe",
            Subtype::Bow => "Bow",
            Subtype::Staff => "Staff",
            Subtype::Grenade => "Grenade",
            Subtype::Cloth => "Cloth Garb",
            Subtype::Leather => "Leather Vest",
            Subtype::Plate => "Plate Mail",
        }
    }
}

// ── Debuffs & enchantments ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    Slow,
    Stun,
    Bleed,
}

/// On-hit debuff proc carried by a weapon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeaponEnchant {
    pub debuff: DebuffKind,
    pub chance: f32,
    pub duration: u32,
}

/// Incoming-damage reduction carried by an armor piece.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ArmorEnchant {
    /// Reduces damage from a specific attacking element.
    Resist(Element, f32),
    /// Reduces fire-hazard damage.
    BurnWard(f32),
    /// Reduces poison-hazard damage.
    PoisonWard(f32),
    /// Shortens debuff durations applied to the player.
    StatusWard(f32),
}

// ── Ultimates ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UltimateKind {
    Heal,
    TimeStop,
    SpeedBoost,
    OmniForce,
    Nova,
}

impl UltimateKind {
    pub fn display_name(self) -> &'static str {
        match self {
            UltimateKind::Heal => "Second Wind",
            UltimateKind::TimeStop => "Stasis Field",
            UltimateKind::SpeedBoost => "Overdrive",
            UltimateKind::OmniForce => "Omni Force",
            UltimateKind::Nova => "Nova Burst",
        }
    }

    pub fn all() -> [UltimateKind; 5] {
        [
            UltimateKind::Heal,
            UltimateKind::TimeStop,
            UltimateKind::SpeedBoost,
            UltimateKind::OmniForce,
            UltimateKind::Nova,
        ]
    }
}

// ── Items ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub subtype: Subtype,
    pub element: Element,
    pub rarity: Rarity,
    /// Partial stat bundle; unset contributions are zero.
    pub stats: Stats,
    pub ultimate: Option<UltimateKind>,
    pub weapon_enchant: Option<WeaponEnchant>,
    pub armor_enchant: Option<ArmorEnchant>,
    /// 0–100. The item is destroyed and unequipped at ≤ 0.
    pub durability: f32,
    pub level: u32,
}

// ── Talents ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TalentKind {
    /// Multiplies ranged weapon damage and attack speed.
    RangedMastery,
    /// Multiplies melee weapon damage and knockback.
    MeleeMastery,
    /// Mitigates stage-end durability loss.
    Tinkerer,
    /// Multiplies gold gained from kills and pickups.
    Greed,
    /// Flat max HP and defense.
    Vitality,
}

impl TalentKind {
    pub fn weight(self) -> f32 {
        match self {
            TalentKind::RangedMastery => 24.0,
            TalentKind::MeleeMastery => 24.0,
            TalentKind::Tinkerer => 18.0,
            TalentKind::Greed => 16.0,
            TalentKind::Vitality => 18.0,
        }
    }

    pub fn all() -> [TalentKind; 5] {
        [
            TalentKind::RangedMastery,
            TalentKind::MeleeMastery,
            TalentKind::Tinkerer,
            TalentKind::Greed,
            TalentKind::Vitality,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Talent {
    pub kind: TalentKind,
    pub rarity: Rarity,
    /// Up to three rolled values; unused slots stay zero. Meaning is
    /// per-kind (e.g. RangedMastery: [damage mult, attack-speed mult, _]).
    pub values: [f32; 3],
    pub description: String,
}

// ── Rewards ─────────────────────────────────────────────────────────

/// Permanent level-up stat bonus offered between stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum StatUpgrade {
    Attack(f32),
    MaxHp(f32),
    MoveSpeed(f32),
    CritChance(f32),
}

/// One selectable reward. Applied exhaustively by [`apply_reward`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reward {
    Weapon(Item),
    Armor(Item),
    Upgrade(StatUpgrade),
    Talent(Talent),
}

/// Applies a chosen reward to the player and recomputes derived stats.
pub fn apply_reward(player: &mut PlayerState, reward: Reward) {
    match reward {
        Reward::Weapon(item) => {
            if player.weapon1.is_none() {
                player.weapon1 = Some(item);
            } else {
                player.weapon2 = Some(item);
            }
        }
        Reward::Armor(item) => {
            if player.armor1.is_none() {
                player.armor1 = Some(item);
            } else {
                player.armor2 = Some(item);
            }
        }
        Reward::Upgrade(upgrade) => match upgrade {
            StatUpgrade::Attack(v) => player.permanent.attack += v,
            StatUpgrade::MaxHp(v) => {
                player.permanent.max_hp += v;
                player.stats.hp += v;
            }
            StatUpgrade::MoveSpeed(v) => player.permanent.move_speed += v,
            StatUpgrade::CritChance(v) => player.permanent.crit_chance += v,
        },
        Reward::Talent(talent) => player.talent = Some(talent),
    }
    recalculate_player_stats(player);
}
