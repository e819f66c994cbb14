use hecs::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::components::{InputState, PlayerState, SimState, StageInfo};
use crate::ecs::spatial::SpatialGrid;
use crate::game::loot;
use crate::game::stats::recalculate_player_stats;
use crate::game::terrain::Terrain;

/// Creates an empty ECS world and the simulation context for a new run,
/// seeded for reproducibility. The player starts with one generated
/// level-1 weapon; the first stage still needs `initialize_stage`.
pub fn create_world(seed: u64) -> (World, SimState) {
    let world = World::new();

    let mut rng = StdRng::seed_from_u64(seed);
    let terrain_seed: u32 = rng.gen();

    let mut player = PlayerState::new();
    player.weapon1 = Some(loot::generate_random_weapon(1, &mut rng));
    recalculate_player_stats(&mut player);

    let state = SimState {
        rng,
        tick: 0,
        player,
        input: InputState::default(),
        timers: Default::default(),
        stage: StageInfo::default(),
        terrain: Terrain::default(),
        spatial: SpatialGrid::new(),
        weapon_cooldowns: [0.0; 2],
        spawn_timer: 0,
        dot_buffer: 0.0,
        events: Vec::new(),
        terrain_seed,
    };

    (world, state)
}
