/// Rendering for the isometric world
///
/// This module handles the world/screen projection, the draw list handed to
/// the renderer, and the bevy sprite renderer that consumes it.

pub mod draw_list;
pub mod isometric_projection;
pub mod isometric_tile_renderer;

pub use draw_list::*;
pub use isometric_projection::*;
pub use isometric_tile_renderer::*;
