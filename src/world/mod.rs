/// Core world model for the isometric tile world
///
/// This module holds the tile map and its cells, the slope catalogue, the
/// entities standing on the terrain, and the world context that resolves
/// heights, depths and the per-frame draw traversal.

pub mod context;
pub mod entity;
pub mod picking;
pub mod slope;
pub mod terrain_gen;
pub mod tile;
pub mod tile_map;

pub use context::*;
pub use entity::*;
pub use slope::*;
pub use terrain_gen::*;
pub use tile::*;
pub use tile_map::*;
