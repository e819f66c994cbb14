use crate::consts::{MAP_HEIGHT, MAP_WIDTH, MUD_SPEED_MULT, SPEED_BOOST_MULT, WATER_FRICTION};
use crate::ecs::components::SimState;
use crate::game::terrain::{Terrain, TerrainKind};

/// Advances the player one tick from held-direction input. Speed is
/// scaled by the speed-boost buff, any active slow, and mud underfoot;
/// on water the velocity is low-pass filtered toward the target for a
/// sliding feel. Collision is resolved per axis so the player slides
/// along walls.
pub fn player_movement_system(state: &mut SimState) {
    if state.player.dead {
        return;
    }

    let (dx, dy) = state.input.direction();
    let under = state.terrain.kind_at(state.player.x, state.player.y);

    let mut speed = state.player.stats.move_speed;
    if state.timers.speed_boost > 0 {
        speed *= SPEED_BOOST_MULT;
    }
    if state.timers.slow > 0 {
        speed *= 1.0 - state.timers.slow_intensity;
    }
    if under == Some(TerrainKind::Mud) {
        speed *= MUD_SPEED_MULT;
    }

    let target_vx = dx * speed;
    let target_vy = dy * speed;

    if under == Some(TerrainKind::Water) {
        state.player.vx += (target_vx - state.player.vx) * WATER_FRICTION;
        state.player.vy += (target_vy - state.player.vy) * WATER_FRICTION;
    } else {
        state.player.vx = target_vx;
        state.player.vy = target_vy;
    }

    let (w, h) = (state.player.width, state.player.height);
    let (moved_x, moved_y) = move_axis_separated(
        &state.terrain,
        state.player.x,
        state.player.y,
        &mut state.player.vx,
        &mut state.player.vy,
        w,
        h,
    );
    state.player.x = moved_x.clamp(w / 2.0, MAP_WIDTH - w / 2.0);
    state.player.y = moved_y.clamp(h / 2.0, MAP_HEIGHT - h / 2.0);

    if dx != 0.0 || dy != 0.0 {
        state.player.facing = dy.atan2(dx);
    }
}

/// Tentatively applies each velocity axis, rejecting (and zeroing) any
/// axis whose move would overlap a blocking tile. Shared by player and
/// enemy movement.
pub fn move_axis_separated(
    terrain: &Terrain,
    x: f32,
    y: f32,
    vx: &mut f32,
    vy: &mut f32,
    w: f32,
    h: f32,
) -> (f32, f32) {
    let mut nx = x;
    let mut ny = y;

    if *vx != 0.0 {
        if terrain.blocked(nx + *vx, ny, w, h) {
            *vx = 0.0;
        } else {
            nx += *vx;
        }
    }
    if *vy != 0.0 {
        if terrain.blocked(nx, ny + *vy, w, h) {
            *vy = 0.0;
        } else {
            ny += *vy;
        }
    }

    (nx, ny)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::world::create_world;
    use crate::game::terrain::TerrainTile;

    fn wall(x: f32, y: f32, w: f32, h: f32) -> TerrainTile {
        TerrainTile {
            x,
            y,
            w,
            h,
            kind: TerrainKind::Wall,
        }
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let (_, mut state) = create_world(0);
        state.input.right = true;
        state.input.down = true;
        let (dx, dy) = state.input.direction();
        assert!((dx * dx + dy * dy - 1.0).abs() < 1e-5);
    }

    #[test]
    fn blocked_axis_is_zeroed_but_other_slides() {
        let (_, mut state) = create_world(1);
        state.terrain.tiles.clear();
        state.player.x = 100.0;
        state.player.y = 100.0;
        // Wall directly to the right of the player.
        state.terrain.tiles.push(wall(120.0, 0.0, 40.0, 400.0));

        state.input.right = true;
        state.input.down = true;
        player_movement_system(&mut state);

        assert_eq!(state.player.x, 100.0, "x move into wall rejected");
        assert!(state.player.y > 100.0, "y move still applies");
        assert_eq!(state.player.vx, 0.0);
    }

    #[test]
    fn mud_halves_speed() {
        let (_, mut state) = create_world(2);
        let start_x = state.player.x;
        state.input.right = true;
        player_movement_system(&mut state);
        let open_dx = state.player.x - start_x;

        let (_, mut muddy) = create_world(2);
        muddy.terrain.tiles.push(TerrainTile {
            x: 0.0,
            y: 0.0,
            w: MAP_WIDTH,
            h: MAP_HEIGHT,
            kind: TerrainKind::Mud,
        });
        let start_x = muddy.player.x;
        muddy.input.right = true;
        player_movement_system(&mut muddy);
        let mud_dx = muddy.player.x - start_x;

        assert!((mud_dx - open_dx * MUD_SPEED_MULT).abs() < 1e-4);
    }

    #[test]
    fn water_velocity_is_filtered() {
        let (_, mut state) = create_world(3);
        state.terrain.tiles.push(TerrainTile {
            x: 0.0,
            y: 0.0,
            w: MAP_WIDTH,
            h: MAP_HEIGHT,
            kind: TerrainKind::Water,
        });
        state.input.right = true;
        player_movement_system(&mut state);
        // One filtered step covers only a fraction of the target speed.
        let full = state.player.stats.move_speed;
        assert!(state.player.vx > 0.0 && state.player.vx < full * 0.1);
    }
}
