//! Types crossing the boundary to the presentation layer: domain events
//! drained once per tick, and serializable snapshots of simulation
//! state. The engine emits these fire-and-forget; rendering, audio, and
//! UI are entirely the consumer's concern.

use serde::{Deserialize, Serialize};

use crate::game::stats::Element;

// ── Geometry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

// ── Floating-text colors ────────────────────────────────────────────

/// Encodes the outcome of a hit for the damage-number renderer:
/// white for neutral, silver when the shield absorbed everything,
/// the attacking element's color on advantage, gray on disadvantage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TextColor {
    White,
    Silver,
    Gray,
    Element(Element),
}

// ── Domain events ───────────────────────────────────────────────────

/// One fire-and-forget event for the presentation layer. The queue on
/// `SimState` is drained by the caller after each `update`; events are
/// emit-only and never read back.
#[derive(Debug, Clone, Serialize)]
pub enum SimEvent {
    /// Blood-splatter effect; fires only when HP was actually reduced.
    Splatter { x: f32, y: f32, element: Element },
    /// The player took damage (post-dodge, post-shield).
    PlayerHit {
        damage: f32,
        ignore_shield: bool,
        /// Suppress hit flash/audio (buffered damage-over-time ticks).
        silent: bool,
        slow_intensity: f32,
    },
    /// Gold entered the player's purse (pickup or direct award).
    GoldPickup { amount: i64 },
    /// A boss ability activated.
    BossAbility { name: &'static str },
    /// The stage-clear latch fired.
    StageCleared { stage: u32 },
    /// Player HP reached zero; reported exactly once per run.
    PlayerDied,
}

// ── Snapshots ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub ult_charge: f32,
    pub gold: i64,
    pub stage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub position: Vec2,
    pub kind: String,
    pub element: Element,
    pub hp_pct: f32,
    pub is_boss: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub number: u32,
    pub kills: u32,
    pub total_enemies: u32,
    pub timer: u32,
    pub cleared: bool,
}
