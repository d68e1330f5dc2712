use bevy::prelude::*;

use crate::assets::AssetKey;
use crate::world::{IsoEntityId, SlopeKind};

/// Which sheet a draw command samples from
#[derive(Debug, Clone, PartialEq)]
pub enum SheetRef {
    /// The map's tileset
    Tiles,
    /// The map's slope sheet
    Slopes,
    /// An entity's drawable template
    Template(AssetKey),
}

/// What produced a draw command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawSource {
    Base { row: usize, col: usize },
    Riser { row: usize, col: usize, level: usize },
    Slope { row: usize, col: usize, kind: SlopeKind },
    Topper { row: usize, col: usize },
    Entity(IsoEntityId),
}

/// One sprite submission: screen position, tint, depth key and frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub sheet: SheetRef,
    /// Tile id or animation frame within the sheet
    pub index: usize,
    /// Anchor point in y-down screen pixels
    pub screen: Vec2,
    /// Sort key, ascending values are drawn first
    pub depth: f32,
    pub tint: Color,
    pub source: DrawSource,
}

/// Receiver for sprite submissions. The renderer sorts by depth; sinks do
/// not have to.
pub trait SpriteSink {
    fn submit(&mut self, command: DrawCommand);
}

/// Collected draw commands for one frame
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    /// Stable back-to-front sort; equal depths keep submission order
    pub fn sort_by_depth(&mut self) {
        self.commands.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }
}

impl SpriteSink for DrawList {
    fn submit(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}
