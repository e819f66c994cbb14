use std::collections::HashSet;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::consts::{BOSS_RESISTANCE, MAP_HEIGHT, MAP_WIDTH, STAGE_TIME_LIMIT, ULT_CHARGE_MAX};
use crate::ecs::spatial::SpatialGrid;
use crate::game::items::{DebuffKind, Item, Talent};
use crate::game::stats::{Element, Stats};
use crate::game::terrain::Terrain;
use crate::protocol::{SimEvent, TextColor};

// ── Marker Components ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Enemy;

/// Boss-summoned minions never drop gold and don't count toward quota.
#[derive(Debug, Clone)]
pub struct Minion;

// ── Spatial ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub radius: f32,
}

// ── Enemy Components ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,
    Sprinter,
    Brute,
    Ranged,
    Bomber,
    Incinerator,
    Shambler,
    Support,
    Boss,
}

#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub kind: EnemyKind,
}

#[derive(Debug, Clone, Copy)]
pub struct Affinity {
    pub element: Element,
}

#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Armor buffer depleted before HP by every damage source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShieldBuffer {
    pub value: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub attack: f32,
    pub move_speed: f32,
}

/// Generic per-enemy cooldown, used archetype-specifically: shot
/// cooldown for ranged kinds, trail cadence for shamblers, shield-grant
/// cadence for support units.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackTimer {
    pub remaining: u32,
}

/// Timed debuff frame counters. Monotonically decreasing; reapplication
/// refreshes to `max(current, new)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Debuffs {
    pub slow: u32,
    pub stun: u32,
    pub bleed: u32,
}

impl Debuffs {
    pub fn apply(&mut self, kind: DebuffKind, duration: u32, is_boss: bool) {
        let duration = if is_boss {
            (duration as f32 / BOSS_RESISTANCE) as u32
        } else {
            duration
        };
        let slot = match kind {
            DebuffKind::Slow => &mut self.slow,
            DebuffKind::Stun => &mut self.stun,
            DebuffKind::Bleed => &mut self.bleed,
        };
        *slot = (*slot).max(duration);
    }

    pub fn tick(&mut self) {
        self.slow = self.slow.saturating_sub(1);
        self.stun = self.stun.saturating_sub(1);
        self.bleed = self.bleed.saturating_sub(1);
    }
}

/// Set once `Health.current` hits zero. A dying enemy no longer
/// participates in AI, movement, or collision; it only counts down to
/// removal.
#[derive(Debug, Clone, Copy)]
pub struct Dying {
    pub timer: u32,
}

// ── Boss Components ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAbility {
    Invincibility,
    Berserk,
    MassSummon,
    Blink,
    Clone,
}

impl BossAbility {
    pub fn name(self) -> &'static str {
        match self {
            BossAbility::Invincibility => "Bulwark",
            BossAbility::Berserk => "Frenzy",
            BossAbility::MassSummon => "Legion",
            BossAbility::Blink => "Phase Step",
            BossAbility::Clone => "Mitosis",
        }
    }

    /// Cumulative-damage step, as a fraction of max HP. The ability
    /// fires once each time total damage taken crosses a new multiple
    /// of this step.
    pub fn damage_step(self) -> f32 {
        match self {
            BossAbility::Blink => 0.10,
            BossAbility::MassSummon => 0.20,
            BossAbility::Invincibility => 0.30,
            BossAbility::Berserk => 0.30,
            BossAbility::Clone => 0.60,
        }
    }

    /// Periodic trigger interval in frames, for the abilities that also
    /// fire on fixed timers.
    pub fn period(self) -> Option<u32> {
        match self {
            BossAbility::Invincibility => Some(600),
            BossAbility::Berserk => Some(540),
            BossAbility::MassSummon => Some(480),
            BossAbility::Blink | BossAbility::Clone => None,
        }
    }

    pub fn all() -> [BossAbility; 5] {
        [
            BossAbility::Invincibility,
            BossAbility::Berserk,
            BossAbility::MassSummon,
            BossAbility::Blink,
            BossAbility::Clone,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct BossState {
    /// Two abilities assigned at spawn from the fixed pool.
    pub abilities: [BossAbility; 2],
    /// Last fired damage-step boundary index, per ability slot.
    pub fired_boundary: [u32; 2],
    /// Frames until the periodic trigger, per ability slot.
    pub ability_timer: [u32; 2],
    /// Running total of damage taken.
    pub cumulative_damage: f32,
    /// Frames until the next minion pair is summoned.
    pub summon_timer: u32,
    /// Frames until the next cone multi-shot.
    pub cone_timer: u32,
    /// Remaining invincibility-window frames.
    pub invincible: u32,
    /// Remaining berserk frames (double speed, boosted attack).
    pub berserk: u32,
}

// ── Projectiles ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Player,
    Enemy,
}

/// Bomb projectiles detonate into a hazard when their lifetime expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BombKind {
    Explosive,
    Incendiary,
}

/// On-hit debuff proc carried by an enchanted weapon's projectiles.
#[derive(Debug, Clone, Copy)]
pub struct EnchantProc {
    pub debuff: DebuffKind,
    pub chance: f32,
    pub duration: u32,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub damage: f32,
    pub radius: f32,
    /// Remaining frames before expiry.
    pub lifetime: u32,
    pub source: DamageSource,
    pub element: Element,
    /// Continue after hitting an enemy instead of despawning.
    pub penetrates: bool,
    /// Melee arcs are anchored attacks: they ignore wall collision.
    pub melee: bool,
    pub bomb: Option<BombKind>,
    pub knockback: f32,
    pub crit_chance: f32,
    /// Shield granted to the player per successful hit.
    pub shield_on_hit: f32,
    pub enchant: Option<EnchantProc>,
    /// Player-relative offset; melee arcs follow the player each tick.
    pub anchor: Option<(f32, f32)>,
    /// Entities already hit by this projectile (dedupe for penetration).
    pub hit_ids: HashSet<hecs::Entity>,
}

// ── Hazards ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Explosion,
    Fire,
    Poison,
}

#[derive(Debug, Clone)]
pub struct Hazard {
    pub kind: HazardKind,
    pub radius: f32,
    /// Full damage for explosions; damage per second for fire/poison.
    pub damage: f32,
    pub remaining: u32,
    pub max_duration: u32,
    pub source: DamageSource,
    pub element: Element,
    pub crit_chance: f32,
    pub knockback: f32,
    /// Explosions apply damage exactly once, on the tick after creation.
    pub applied: bool,
}

// ── Pickups & effects ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct GoldDrop {
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct FloatingText {
    pub text: String,
    pub color: TextColor,
    pub crit: bool,
    pub ttl: u32,
}

// ── Player (plain struct, lives on SimState) ─────────────────────────

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: f32,
    pub width: f32,
    pub height: f32,
    /// Derived stats; always a pure function of `permanent` plus
    /// equipped items and talent. Never hand-edited elsewhere.
    pub stats: Stats,
    /// Base stats plus permanent level-up bonuses.
    pub permanent: Stats,
    pub weapon1: Option<Item>,
    pub weapon2: Option<Item>,
    pub armor1: Option<Item>,
    pub armor2: Option<Item>,
    pub talent: Option<Talent>,
    /// 0–100, gained on hits dealt/taken and passively.
    pub ult_charge: f32,
    pub gold: i64,
    pub stage: u32,
    pub dead: bool,
}

impl PlayerState {
    pub fn new() -> Self {
        let permanent = Stats {
            hp: 100.0,
            max_hp: 100.0,
            shield: 0.0,
            defense: 0.0,
            attack: 5.0,
            attack_speed: 1.0,
            range: 0.0,
            move_speed: 3.0,
            dodge_chance: 0.0,
            knockback: 0.0,
            crit_chance: 0.02,
            armor_on_hit: 0.0,
            ult_charge_rate: 1.0,
        };
        let mut stats = permanent.clone();
        stats.hp = stats.max_hp;
        PlayerState {
            x: MAP_WIDTH / 2.0,
            y: MAP_HEIGHT / 2.0,
            vx: 0.0,
            vy: 0.0,
            facing: 0.0,
            width: 28.0,
            height: 28.0,
            stats,
            permanent,
            weapon1: None,
            weapon2: None,
            armor1: None,
            armor2: None,
            talent: None,
            ult_charge: 0.0,
            gold: 0,
            stage: 1,
            dead: false,
        }
    }

    pub fn gain_ult_charge(&mut self, amount: f32) {
        self.ult_charge = (self.ult_charge + amount).min(ULT_CHARGE_MAX);
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Input ────────────────────────────────────────────────────────────

/// Currently-held logical directions. Ultimate activation and pause are
/// discrete calls, not state.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    /// Direction vector from held keys, normalized if diagonal.
    pub fn direction(&self) -> (f32, f32) {
        let dx = (self.right as i32 - self.left as i32) as f32;
        let dy = (self.down as i32 - self.up as i32) as f32;
        if dx != 0.0 && dy != 0.0 {
            let inv = std::f32::consts::FRAC_1_SQRT_2;
            (dx * inv, dy * inv)
        } else {
            (dx, dy)
        }
    }
}

// ── Global timers ────────────────────────────────────────────────────

/// Frame counters for global buffs/windows. All decremented once at the
/// top of every tick, before any system runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalTimers {
    pub time_stop: u32,
    pub invincible: u32,
    pub hurt: u32,
    pub slow: u32,
    pub slow_intensity: f32,
    pub speed_boost: u32,
    pub omni_force: u32,
}

impl GlobalTimers {
    pub fn tick(&mut self) {
        self.time_stop = self.time_stop.saturating_sub(1);
        self.invincible = self.invincible.saturating_sub(1);
        self.hurt = self.hurt.saturating_sub(1);
        self.slow = self.slow.saturating_sub(1);
        if self.slow == 0 {
            self.slow_intensity = 0.0;
        }
        self.speed_boost = self.speed_boost.saturating_sub(1);
        self.omni_force = self.omni_force.saturating_sub(1);
    }
}

// ── Stage bookkeeping ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StageInfo {
    pub number: u32,
    pub total_enemies: u32,
    pub spawned: u32,
    pub kills: u32,
    /// One-shot latch; never re-armed within a stage.
    pub cleared: bool,
    pub boss_killed: bool,
    /// Grace frames rendered after the clear latch fires.
    pub clear_grace: u32,
    /// Countdown in frames; reaching zero clears a normal stage.
    pub timer: u32,
    /// Player HP when the stage started, for durability decay.
    pub hp_at_start: f32,
}

impl StageInfo {
    pub fn is_boss_stage(&self) -> bool {
        self.number % crate::consts::BOSS_STAGE_INTERVAL == 0
    }
}

impl Default for StageInfo {
    fn default() -> Self {
        StageInfo {
            number: 1,
            total_enemies: 0,
            spawned: 0,
            kills: 0,
            cleared: false,
            boss_killed: false,
            clear_grace: 0,
            timer: STAGE_TIME_LIMIT,
            hp_at_start: 0.0,
        }
    }
}

// ── Simulation context ───────────────────────────────────────────────

/// The single mutable state container advanced exactly once per
/// external tick call. Entities live in the accompanying `hecs::World`;
/// everything global lives here.
pub struct SimState {
    pub rng: StdRng,
    pub tick: u64,
    pub player: PlayerState,
    pub input: InputState,
    pub timers: GlobalTimers,
    pub stage: StageInfo,
    pub terrain: Terrain,
    pub spatial: SpatialGrid,
    /// Per-slot weapon cooldowns in frames (fractional for high APS).
    pub weapon_cooldowns: [f32; 2],
    pub spawn_timer: u32,
    /// Buffered player damage-over-time, flushed to one floating number
    /// per threshold crossing.
    pub dot_buffer: f32,
    pub events: Vec<SimEvent>,
    /// Terrain noise seed for the run.
    pub terrain_seed: u32,
}
