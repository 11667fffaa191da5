pub mod enemy;
pub mod maze;
pub mod mover;
pub mod player;
pub mod tile;
