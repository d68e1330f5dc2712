use std::collections::HashSet;

use crate::assets::AssetKey;
use crate::error::{WorldError, WorldResult};
use crate::world::slope::SlopeKind;
use crate::world::tile::{TileId, TileLayer};

/// One grid unit of the map: ground, riser stack, toppers and an optional
/// continuous surface on top of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct MapCell {
    base_tiles: Vec<TileId>,
    height_tiles: Vec<TileId>,
    topper_tiles: Vec<TileId>,
    slope: Option<SlopeKind>,
}

impl Default for MapCell {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MapCell {
    pub fn new(tile_id: TileId) -> Self {
        Self {
            base_tiles: vec![tile_id],
            height_tiles: Vec::new(),
            topper_tiles: Vec::new(),
            slope: None,
        }
    }

    /// Primary ground tile, 0 when the base layer is empty
    pub fn tile_id(&self) -> TileId {
        self.base_tiles.first().copied().unwrap_or(0)
    }

    pub fn base_tiles(&self) -> &[TileId] {
        &self.base_tiles
    }

    pub fn height_tiles(&self) -> &[TileId] {
        &self.height_tiles
    }

    pub fn topper_tiles(&self) -> &[TileId] {
        &self.topper_tiles
    }

    pub fn slope(&self) -> Option<SlopeKind> {
        self.slope
    }

    /// Discrete height of the cell in whole units
    #[inline]
    pub fn stack_height(&self) -> usize {
        self.height_tiles.len()
    }

    /// Surface height at local (u, v): the stack plus the slope on top of it
    pub fn surface_height(&self, u: f32, v: f32) -> f32 {
        let slope = self.slope.map_or(0.0, |kind| kind.height(u, v));
        self.stack_height() as f32 + slope
    }

    pub fn layer(&self, layer: TileLayer) -> &[TileId] {
        match layer {
            TileLayer::Base => &self.base_tiles,
            TileLayer::Height => &self.height_tiles,
            TileLayer::Topper => &self.topper_tiles,
        }
    }

    fn layer_mut(&mut self, layer: TileLayer) -> &mut Vec<TileId> {
        match layer {
            TileLayer::Base => &mut self.base_tiles,
            TileLayer::Height => &mut self.height_tiles,
            TileLayer::Topper => &mut self.topper_tiles,
        }
    }
}

/// Fixed-size grid of [`MapCell`]s plus tile classification.
///
/// Cells are addressed by (row, col); row runs along world y and col along
/// world x. Bounds are fixed at construction.
#[derive(Debug, Clone)]
pub struct TileMap {
    width: usize,
    height: usize,
    max_height: usize,

    /// Cells stored row-major: row * width + col
    cells: Vec<MapCell>,

    impassable: HashSet<TileId>,

    /// Sheet the tile ids index into
    pub tileset: Option<AssetKey>,

    /// Sheet indexed by [`SlopeKind::sheet_index`]
    pub slope_tileset: Option<AssetKey>,
}

impl TileMap {
    /// Create an empty map. Every cell starts with ground tile 0.
    pub fn new(width: usize, height: usize, max_height: usize) -> WorldResult<Self> {
        if width == 0 || height == 0 || max_height == 0 {
            return Err(WorldError::InvalidConfiguration(format!(
                "map dimensions must be non-zero, got {width}x{height}x{max_height}"
            )));
        }

        Ok(Self {
            width,
            height,
            max_height,
            cells: vec![MapCell::default(); width * height],
            impassable: HashSet::new(),
            tileset: None,
            slope_tileset: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Upper bound on any cell's riser count
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    #[inline]
    fn index(&self, row: i32, col: i32) -> WorldResult<usize> {
        if !self.contains(row, col) {
            return Err(WorldError::OutOfBounds {
                col: col as i64,
                row: row as i64,
                width: self.width,
                height: self.height,
            });
        }
        Ok(row as usize * self.width + col as usize)
    }

    pub fn cell(&self, row: i32, col: i32) -> WorldResult<&MapCell> {
        let idx = self.index(row, col)?;
        Ok(&self.cells[idx])
    }

    fn cell_mut(&mut self, row: i32, col: i32) -> WorldResult<&mut MapCell> {
        let idx = self.index(row, col)?;
        Ok(&mut self.cells[idx])
    }

    /// All cells in row-major order as (row, col, cell)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &MapCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx / self.width, idx % self.width, cell))
    }

    pub fn stack_height(&self, row: i32, col: i32) -> WorldResult<usize> {
        Ok(self.cell(row, col)?.stack_height())
    }

    /// Replace the primary ground tile
    pub fn set_tile_id(&mut self, row: i32, col: i32, tile: TileId) -> WorldResult<()> {
        TileLayer::Base.validate(tile)?;
        let cell = self.cell_mut(row, col)?;
        match cell.base_tiles.first_mut() {
            Some(first) => *first = tile,
            None => cell.base_tiles.push(tile),
        }
        Ok(())
    }

    pub fn push_base_tile(&mut self, row: i32, col: i32, tile: TileId) -> WorldResult<()> {
        self.push_tile(row, col, TileLayer::Base, tile)
    }

    /// Stack one riser on the cell. Fails once the stack reaches `max_height`.
    pub fn push_height_tile(&mut self, row: i32, col: i32, tile: TileId) -> WorldResult<()> {
        self.push_tile(row, col, TileLayer::Height, tile)
    }

    pub fn push_topper_tile(&mut self, row: i32, col: i32, tile: TileId) -> WorldResult<()> {
        self.push_tile(row, col, TileLayer::Topper, tile)
    }

    pub fn push_tile(
        &mut self,
        row: i32,
        col: i32,
        layer: TileLayer,
        tile: TileId,
    ) -> WorldResult<()> {
        layer.validate(tile)?;
        let max_height = self.max_height;
        let cell = self.cell_mut(row, col)?;

        if layer == TileLayer::Height && cell.height_tiles.len() >= max_height {
            return Err(WorldError::InvalidConfiguration(format!(
                "riser stack at (col {col}, row {row}) is already at the max height of {max_height}"
            )));
        }

        cell.layer_mut(layer).push(tile);
        Ok(())
    }

    /// Read one tile of a layer
    pub fn layer_tile(
        &self,
        row: i32,
        col: i32,
        layer: TileLayer,
        index: usize,
    ) -> WorldResult<TileId> {
        let tiles = self.cell(row, col)?.layer(layer);
        tiles
            .get(index)
            .copied()
            .ok_or(WorldError::StackOutOfBounds {
                row: row as usize,
                col: col as usize,
                index,
                len: tiles.len(),
            })
    }

    /// Overwrite one tile of a layer in place
    pub fn set_layer_tile(
        &mut self,
        row: i32,
        col: i32,
        layer: TileLayer,
        index: usize,
        tile: TileId,
    ) -> WorldResult<()> {
        layer.validate(tile)?;
        let tiles = self.cell_mut(row, col)?.layer_mut(layer);
        let len = tiles.len();
        let slot = tiles.get_mut(index).ok_or(WorldError::StackOutOfBounds {
            row: row as usize,
            col: col as usize,
            index,
            len,
        })?;
        *slot = tile;
        Ok(())
    }

    /// Remove the top riser, if any
    pub fn pop_height_tile(&mut self, row: i32, col: i32) -> WorldResult<Option<TileId>> {
        Ok(self.cell_mut(row, col)?.height_tiles.pop())
    }

    /// Strip risers, toppers and slope, keeping the ground layer
    pub fn clear_stack(&mut self, row: i32, col: i32) -> WorldResult<()> {
        let cell = self.cell_mut(row, col)?;
        cell.height_tiles.clear();
        cell.topper_tiles.clear();
        cell.slope = None;
        Ok(())
    }

    pub fn set_slope(&mut self, row: i32, col: i32, slope: SlopeKind) -> WorldResult<()> {
        self.cell_mut(row, col)?.slope = Some(slope);
        Ok(())
    }

    pub fn clear_slope(&mut self, row: i32, col: i32) -> WorldResult<()> {
        self.cell_mut(row, col)?.slope = None;
        Ok(())
    }

    pub fn mark_impassable(&mut self, tile: TileId) {
        self.impassable.insert(tile);
    }

    pub fn is_impassable(&self, tile: TileId) -> bool {
        self.impassable.contains(&tile)
    }

    /// Whether any tile in any layer of the cell is classified impassable
    pub fn cell_blocks(&self, row: i32, col: i32) -> WorldResult<bool> {
        let cell = self.cell(row, col)?;
        Ok(cell
            .base_tiles
            .iter()
            .chain(&cell.height_tiles)
            .chain(&cell.topper_tiles)
            .any(|tile| self.is_impassable(*tile)))
    }
}
