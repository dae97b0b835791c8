pub mod ai;
pub mod entity;
pub mod geom;
pub mod maze;
pub mod portal;
pub mod teleport;
pub mod tile;
pub mod timer;
