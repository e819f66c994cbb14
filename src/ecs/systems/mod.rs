pub mod combat;
pub mod enemy_ai;
pub mod hazard;
pub mod movement;
pub mod projectile;
pub mod spawn;
pub mod stage;
