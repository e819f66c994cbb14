pub mod consts;
pub mod ecs;
pub mod game;
pub mod protocol;
pub mod sim;
