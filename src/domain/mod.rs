pub mod collision;
pub mod direction;
pub mod geometry;
pub mod movement;
pub mod pickup;
pub mod player;
pub mod pursuer;
