pub mod components;
pub mod spatial;
pub mod systems;
pub mod world;
