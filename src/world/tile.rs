use crate::error::{WorldError, WorldResult};

/// Index into a tileset sheet. Negative values are reserved for sentinels.
pub type TileId = i32;

/// Riser that occupies one unit of height but is never drawn
pub const HIDDEN_TILE: TileId = -1;

/// The three tile layers a cell carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayer {
    /// Ground, drawn flat under everything else in the cell
    Base,
    /// One discrete unit of height per tile
    Height,
    /// Decoration on top of the stack, no height
    Topper,
}

impl TileLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileLayer::Base => "base",
            TileLayer::Height => "height",
            TileLayer::Topper => "topper",
        }
    }

    /// Check that `tile` may be stored in this layer.
    ///
    /// Only the height layer accepts the hidden sentinel; any other negative
    /// id is rejected everywhere.
    pub fn validate(&self, tile: TileId) -> WorldResult<()> {
        match (self, tile) {
            (_, id) if id >= 0 => Ok(()),
            (TileLayer::Height, HIDDEN_TILE) => Ok(()),
            (layer, id) => Err(WorldError::InvalidConfiguration(format!(
                "tile id {id} is not allowed in the {} layer",
                layer.as_str()
            ))),
        }
    }
}

/// Whether a riser is skipped when drawing
#[inline]
pub fn is_hidden(tile: TileId) -> bool {
    tile == HIDDEN_TILE
}

/// Sheet frame for a visible tile id
#[inline]
pub fn sheet_index(tile: TileId) -> Option<usize> {
    usize::try_from(tile).ok()
}
