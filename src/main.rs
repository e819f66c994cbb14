//! Headless driver: runs the simulation for a few stages with scripted
//! input and dumps a JSON summary. Useful for balancing passes and as a
//! smoke test of the whole tick pipeline.

use hecs::World;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use arena_engine::consts::{secs, ULT_CHARGE_MAX};
use arena_engine::ecs::components::SimState;
use arena_engine::ecs::systems::stage;
use arena_engine::ecs::world::create_world;
use arena_engine::game::items::{apply_reward, Reward};
use arena_engine::game::loot::{generate_random_armor, generate_random_weapon};
use arena_engine::protocol::SimEvent;
use arena_engine::sim;

const STAGES_TO_RUN: u32 = 8;
const MAX_TICKS_PER_STAGE: u32 = secs(120);

#[derive(Serialize)]
struct StageReport {
    stage: u32,
    ticks: u32,
    kills: u32,
    cleared: bool,
    gold: i64,
    hp: f32,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    stages: Vec<StageReport>,
    died: bool,
    total_gold: i64,
    events_seen: usize,
}

fn main() {
    tracing_subscriber::fmt::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xA12A);
    info!(seed, "starting headless run");

    let (mut world, mut state) = create_world(seed);
    let mut summary = RunSummary {
        seed,
        stages: Vec::new(),
        died: false,
        total_gold: 0,
        events_seen: 0,
    };

    for number in 1..=STAGES_TO_RUN {
        stage::initialize_stage(&mut world, &mut state, number);
        let ticks = run_stage(&mut world, &mut state, &mut summary);
        summary.stages.push(StageReport {
            stage: number,
            ticks,
            kills: state.stage.kills,
            cleared: state.stage.cleared,
            gold: state.player.gold,
            hp: state.player.stats.hp,
        });
        if state.player.dead {
            summary.died = true;
            break;
        }
        grant_reward(&mut state, number);
    }

    summary.total_gold = state.player.gold;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize summary: {err}"),
    }
}

/// Ticks one stage to completion, steering with a scripted drunkard's
/// walk and firing the ultimate whenever the bar fills.
fn run_stage(world: &mut World, state: &mut SimState, summary: &mut RunSummary) -> u32 {
    for tick in 0..MAX_TICKS_PER_STAGE {
        if tick % 30 == 0 {
            state.input.up = state.rng.gen_bool(0.5);
            state.input.down = !state.input.up && state.rng.gen_bool(0.5);
            state.input.left = state.rng.gen_bool(0.5);
            state.input.right = !state.input.left && state.rng.gen_bool(0.5);
        }
        if state.player.ult_charge >= ULT_CHARGE_MAX {
            if let Some(kind) = sim::activate_ultimate(world, state) {
                info!(?kind, "ultimate fired");
            }
        }

        sim::update(world, state);

        for event in state.events.drain(..) {
            summary.events_seen += 1;
            if let SimEvent::BossAbility { name } = event {
                info!(name, "boss ability");
            }
        }

        if state.player.dead || (state.stage.cleared && state.stage.clear_grace == 0) {
            return tick + 1;
        }
    }
    MAX_TICKS_PER_STAGE
}

/// Between stages, hand the player a simple scripted reward.
fn grant_reward(state: &mut SimState, number: u32) {
    let reward = if number % 2 == 1 {
        Reward::Weapon(generate_random_weapon(number, &mut state.rng))
    } else {
        Reward::Armor(generate_random_armor(number, &mut state.rng))
    };
    apply_reward(&mut state.player, reward);
}
