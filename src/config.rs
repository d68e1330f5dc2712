use bevy::prelude::*;

use crate::error::{WorldError, WorldResult};
use crate::rendering::IsoProjection;

/// World-wide settings shared by the map, the depth function and the renderer
#[derive(Resource, Debug, Clone)]
pub struct IsoConfig {
    pub projection: IsoProjection,
    pub map_width: usize,
    pub map_height: usize,
    /// Tallest riser stack a cell may hold, also the depth normaliser's maxZ
    pub max_height: usize,
    /// Hidden risers still step the synthetic depth of the stack
    pub hidden_riser_advances_depth: bool,
    /// Sort the whole draw list by depth before it is handed to the renderer
    pub sort_draw_list: bool,
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self {
            projection: IsoProjection::default(),
            map_width: 50,
            map_height: 50,
            max_height: 8,
            hidden_riser_advances_depth: true,
            sort_draw_list: false,
        }
    }
}

impl IsoConfig {
    pub fn validate(&self) -> WorldResult<()> {
        if self.map_width == 0 || self.map_height == 0 || self.max_height == 0 {
            return Err(WorldError::InvalidConfiguration(format!(
                "map bounds must be non-zero, got {}x{}x{}",
                self.map_width, self.map_height, self.max_height
            )));
        }

        let IsoProjection {
            half_tile_width,
            quarter_tile_height,
            height_unit_pixels,
        } = self.projection;
        for (name, value) in [
            ("half_tile_width", half_tile_width),
            ("quarter_tile_height", quarter_tile_height),
            ("height_unit_pixels", height_unit_pixels),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(WorldError::InvalidConfiguration(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
