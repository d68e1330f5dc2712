use bevy::prelude::*;

use crate::world::context::WorldContext;

impl WorldContext {
    /// Topmost cell whose stack top lies under a screen point.
    ///
    /// Walks the stack levels from the map's max height down, unprojecting
    /// the point onto each level and keeping the first cell whose riser count
    /// equals that level. Taller stacks in front therefore win over the
    /// ground behind them. Returns (row, col).
    pub fn pick_cell(&self, screen: Vec2) -> Option<(usize, usize)> {
        let map = self.map();
        for level in (0..=map.max_height()).rev() {
            let world = self.unproject(screen, level as f32);
            let Ok((row, col)) = self.cell_coords(world.x, world.y) else {
                continue;
            };
            if map.stack_height(row, col).ok() == Some(level) {
                return Some((row as usize, col as usize));
            }
        }
        None
    }

    /// Screen-space diamond outlining the top face of a cell, clockwise from
    /// the top corner. Used for hover highlights.
    pub fn cell_outline(&self, row: usize, col: usize) -> Option<[Vec2; 4]> {
        let level = self
            .map()
            .stack_height(row as i32, col as i32)
            .ok()? as f32;
        let projection = self.projection();
        Some([
            projection.cell_origin(col, row, level),
            projection.cell_origin(col + 1, row, level),
            projection.cell_origin(col + 1, row + 1, level),
            projection.cell_origin(col, row + 1, level),
        ])
    }
}
