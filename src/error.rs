use std::fmt;

use crate::world::IsoEntityId;

/// Result type for world and map operations
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised by the tile map and the world context.
///
/// Grid lookups never clamp: an out-of-range cell is always reported so that
/// movement bugs show up here instead of as wrong terrain heights.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    /// Cell coordinates outside the map.
    OutOfBounds {
        col: i64,
        row: i64,
        width: usize,
        height: usize,
    },
    /// Index outside one of a cell's tile layers.
    StackOutOfBounds {
        row: usize,
        col: usize,
        index: usize,
        len: usize,
    },
    /// The entity handle is not registered in this world.
    UnknownEntity(IsoEntityId),
    /// Malformed map, cell or projection setup.
    InvalidConfiguration(String),
}

impl WorldError {
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            WorldError::OutOfBounds { .. } | WorldError::StackOutOfBounds { .. }
        )
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::OutOfBounds {
                col,
                row,
                width,
                height,
            } => write!(
                f,
                "Cell (col {col}, row {row}) is outside the {width}x{height} map"
            ),
            WorldError::StackOutOfBounds {
                row,
                col,
                index,
                len,
            } => write!(
                f,
                "Layer index {index} is outside the {len} tiles of cell (col {col}, row {row})"
            ),
            WorldError::UnknownEntity(id) => write!(f, "Unknown entity {id:?}"),
            WorldError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for WorldError {}
