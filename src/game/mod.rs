pub mod items;
pub mod loot;
pub mod stats;
pub mod terrain;
