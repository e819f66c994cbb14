//! Tuning constants for the simulation core.
//!
//! All durations are expressed in frames at a fixed tick rate. The host is
//! expected to call `update` roughly [`TICK_RATE`] times per second; the
//! `secs` helper keeps second-based tuning readable at the call site.

/// Simulation ticks per second assumed by every frame-count duration.
pub const TICK_RATE: u32 = 60;

/// Converts a duration in seconds to a frame count at [`TICK_RATE`].
pub const fn secs(s: u32) -> u32 {
    s * TICK_RATE
}

// ── Map ─────────────────────────────────────────────────────────────

pub const MAP_WIDTH: f32 = 1600.0;
pub const MAP_HEIGHT: f32 = 1200.0;

/// Radius around the map center kept free of terrain obstacles.
pub const SAFE_ZONE_RADIUS: f32 = 180.0;

/// Side length of one spatial-index cell (world units).
pub const SPATIAL_CELL_SIZE: f32 = 150.0;

// ── Stage ───────────────────────────────────────────────────────────

/// Every Nth stage is a single-boss stage.
pub const BOSS_STAGE_INTERVAL: u32 = 6;

/// Enemy quota for a normal stage: BASE + GROWTH * stage number.
pub const STAGE_QUOTA_BASE: u32 = 8;
pub const STAGE_QUOTA_GROWTH: u32 = 3;

/// Normal-stage countdown before the timer clears the stage.
pub const STAGE_TIME_LIMIT: u32 = secs(60);

/// Grace period rendered after the clear latch fires.
pub const STAGE_CLEAR_GRACE: u32 = secs(2);

/// Frames between automatic spawn attempts.
pub const SPAWN_INTERVAL: u32 = 45;

/// Gold pickups scattered at stage start.
pub const INITIAL_GOLD_DROPS: u32 = 5;

// ── Combat ──────────────────────────────────────────────────────────

/// Extra targeting distance beyond weapon range before a weapon fires.
pub const TARGET_LEASH: f32 = 50.0;

/// Damage multiplier against a bleeding target.
pub const BLEED_DAMAGE_MULT: f32 = 1.5;

/// Boss targets divide incoming debuff durations and knockback by this.
pub const BOSS_RESISTANCE: f32 = 3.0;

/// Elemental advantage / disadvantage multipliers.
pub const ELEMENT_ADVANTAGE_MULT: f32 = 3.0;
pub const ELEMENT_DISADVANTAGE_MULT: f32 = 0.5;

/// Ultimate charge gained per successful weapon hit.
pub const ULT_CHARGE_PER_HIT: f32 = 1.0;
pub const ULT_CHARGE_MAX: f32 = 100.0;

/// Brief player invincibility window after taking a hit.
pub const PLAYER_HURT_FRAMES: u32 = 30;

/// Self-stun applied to an enemy after it lands contact damage.
pub const CONTACT_STUN_FRAMES: u32 = 45;

// ── Movement ────────────────────────────────────────────────────────

/// Low-pass filter constant for velocity while the player is on water.
pub const WATER_FRICTION: f32 = 0.05;

/// Speed multiplier while standing on mud.
pub const MUD_SPEED_MULT: f32 = 0.5;

/// Speed multiplier granted by the speed-boost ultimate buff.
pub const SPEED_BOOST_MULT: f32 = 1.5;

/// Radius within which wall tiles push enemies away.
pub const WALL_REPULSION_RADIUS: f32 = 60.0;

// ── Hazards ─────────────────────────────────────────────────────────

/// Player damage-over-time is buffered and emitted as one floating
/// number each time the buffer crosses this threshold.
pub const DOT_TEXT_THRESHOLD: f32 = 5.0;

/// Slow applied to the player while standing in a burning/poison zone.
pub const DOT_SLOW_FRAMES: u32 = 20;
pub const DOT_SLOW_INTENSITY: f32 = 0.3;

// ── Spawning ────────────────────────────────────────────────────────

/// Placement attempts with the full wall + distance constraints.
pub const SPAWN_ATTEMPTS: u32 = 20;
/// Fallback attempts without the player-distance constraint.
pub const SPAWN_FALLBACK_ATTEMPTS: u32 = 50;

pub const SPAWN_MIN_PLAYER_DIST: f32 = 250.0;
pub const SPAWN_MAX_PLAYER_DIST: f32 = 600.0;

// ── Economy ─────────────────────────────────────────────────────────

/// Chance a non-boss, non-minion kill drops gold.
pub const GOLD_DROP_CHANCE: f32 = 0.4;

/// Fixed payout for a boss kill, plus per-stage scaling.
pub const BOSS_GOLD_BASE: i64 = 100;
pub const BOSS_GOLD_PER_STAGE: i64 = 10;

/// Flat durability lost by every equipped item at stage end.
pub const DURABILITY_BASE_LOSS: f32 = 5.0;
/// Additional durability loss at 100% of max HP lost during the stage.
pub const DURABILITY_HP_LOSS_SCALE: f32 = 20.0;
