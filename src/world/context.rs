use bevy::prelude::*;

use crate::config::IsoConfig;
use crate::error::{WorldError, WorldResult};
use crate::rendering::{DrawCommand, DrawList, DrawSource, IsoProjection, SheetRef, SpriteSink};
use crate::world::entity::{IsoEntity, IsoEntityId};
use crate::world::tile::{is_hidden, sheet_index};
use crate::world::tile_map::TileMap;

/// The isometric world: the tile map, the entities standing on it, and the
/// height, depth and draw services built on top of them.
#[derive(Resource, Debug, Clone)]
pub struct WorldContext {
    map: TileMap,
    /// Entities in insertion order
    entities: Vec<(IsoEntityId, IsoEntity)>,
    next_entity_id: u32,
    projection: IsoProjection,
    config: IsoConfig,
}

impl WorldContext {
    /// Build an empty world sized from the config
    pub fn from_config(config: IsoConfig) -> WorldResult<Self> {
        config.validate()?;
        let map = TileMap::new(config.map_width, config.map_height, config.max_height)?;
        Self::new(map, config)
    }

    /// Wrap an existing map. The map's bounds win over the config's.
    pub fn new(map: TileMap, config: IsoConfig) -> WorldResult<Self> {
        config.validate()?;
        let config = IsoConfig {
            map_width: map.width(),
            map_height: map.height(),
            max_height: map.max_height(),
            ..config
        };

        info!(
            "World context created: {}x{} cells, max height {}",
            map.width(),
            map.height(),
            map.max_height()
        );

        Ok(Self {
            map,
            entities: Vec::new(),
            next_entity_id: 0,
            projection: config.projection,
            config,
        })
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Map access for setup and editing. Not to be held across a draw.
    pub fn map_mut(&mut self) -> &mut TileMap {
        &mut self.map
    }

    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    pub fn config(&self) -> &IsoConfig {
        &self.config
    }

    #[inline]
    pub fn project(&self, world: Vec3) -> Vec2 {
        self.projection.project(world)
    }

    #[inline]
    pub fn unproject(&self, screen: Vec2, z: f32) -> Vec3 {
        self.projection.unproject(screen, z)
    }

    /// Grid cell (row, col) holding world point (x, y)
    pub fn cell_coords(&self, x: f32, y: f32) -> WorldResult<(i32, i32)> {
        let col = floor_index(x);
        let row = floor_index(y);
        match (i32::try_from(row), i32::try_from(col)) {
            (Ok(r), Ok(c)) if self.map.contains(r, c) => Ok((r, c)),
            _ => Err(WorldError::OutOfBounds {
                col,
                row,
                width: self.map.width(),
                height: self.map.height(),
            }),
        }
    }

    /// Terrain height at world (x, y): the cell's riser count plus its slope
    /// surface at the local offset inside the cell.
    pub fn height_at(&self, x: f32, y: f32) -> WorldResult<f32> {
        let (row, col) = self.cell_coords(x, y)?;
        let u = x - col as f32;
        let v = y - row as f32;
        Ok(self.map.cell(row, col)?.surface_height(u, v))
    }

    /// Painter's-algorithm sort key; smaller values are further away
    pub fn depth_of(&self, world: Vec3) -> f32 {
        let extent = (self.map.width() + self.map.height() + self.map.max_height()) as f32;
        (world.x + world.y + world.z) / extent
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Register an entity, snapping it onto the terrain at its (x, y)
    pub fn add_entity(&mut self, mut entity: IsoEntity) -> WorldResult<IsoEntityId> {
        entity.position.z = self.height_at(entity.position.x, entity.position.y)?;

        let id = IsoEntityId(self.next_entity_id);
        self.next_entity_id += 1;
        debug!("Entity {:?} ({}) added at {}", id, entity.template, entity.position);
        self.entities.push((id, entity));
        Ok(id)
    }

    pub fn remove_entity(&mut self, id: IsoEntityId) -> WorldResult<IsoEntity> {
        let idx = self
            .entities
            .iter()
            .position(|(entity_id, _)| *entity_id == id)
            .ok_or(WorldError::UnknownEntity(id))?;
        debug!("Entity {:?} removed", id);
        Ok(self.entities.remove(idx).1)
    }

    /// Drop every entity, keeping the map
    pub fn reset(&mut self) {
        self.entities.clear();
    }

    pub fn entity(&self, id: IsoEntityId) -> Option<&IsoEntity> {
        self.entities
            .iter()
            .find(|(entity_id, _)| *entity_id == id)
            .map(|(_, entity)| entity)
    }

    pub fn entity_mut(&mut self, id: IsoEntityId) -> Option<&mut IsoEntity> {
        self.entities
            .iter_mut()
            .find(|(entity_id, _)| *entity_id == id)
            .map(|(_, entity)| entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = (IsoEntityId, &IsoEntity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Move an entity to world (x, y) and snap it to the terrain there.
    /// On error the entity keeps its previous position.
    pub fn move_entity_to(&mut self, id: IsoEntityId, x: f32, y: f32) -> WorldResult<()> {
        let z = self.height_at(x, y)?;
        let entity = self.entity_mut(id).ok_or(WorldError::UnknownEntity(id))?;
        entity.position = Vec3::new(x, y, z);
        Ok(())
    }

    /// Snap one entity's z to the terrain under it
    pub fn resolve_height(&mut self, id: IsoEntityId) -> WorldResult<f32> {
        let position = self
            .entity(id)
            .ok_or(WorldError::UnknownEntity(id))?
            .position;
        let z = self.height_at(position.x, position.y)?;
        if let Some(entity) = self.entity_mut(id) {
            entity.position.z = z;
        }
        Ok(z)
    }

    /// Snap every entity to the terrain. Runs once per update, after movement
    /// and before the draw list is built.
    ///
    /// Entities off the map keep their z; every other entity is still
    /// resolved. Returns the first failure.
    pub fn resolve_heights(&mut self) -> WorldResult<()> {
        let mut first_err = None;
        for idx in 0..self.entities.len() {
            let position = self.entities[idx].1.position;
            match self.height_at(position.x, position.y) {
                Ok(z) => self.entities[idx].1.position.z = z,
                Err(err) => {
                    debug!("Entity {:?} not resolved: {}", self.entities[idx].0, err);
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Whether an entity may step to world (x, y). Moves within the cell it
    /// already stands on are always allowed, so an entity placed on a
    /// blocking cell can still walk off it.
    pub fn can_enter(&self, id: IsoEntityId, x: f32, y: f32) -> WorldResult<bool> {
        let position = self.entity(id).ok_or(WorldError::UnknownEntity(id))?.position;
        let target = self.cell_coords(x, y)?;
        if self.cell_coords(position.x, position.y).ok() == Some(target) {
            return Ok(true);
        }
        let (row, col) = target;
        Ok(!self.map.cell_blocks(row, col)?)
    }

    /// Entities whose bounding boxes intersect the given one
    pub fn overlapping(&self, id: IsoEntityId) -> WorldResult<Vec<IsoEntityId>> {
        let subject = self.entity(id).ok_or(WorldError::UnknownEntity(id))?;
        Ok(self
            .entities
            .iter()
            .filter(|(other_id, other)| *other_id != id && subject.overlaps(other))
            .map(|(other_id, _)| *other_id)
            .collect())
    }

    // ---------------------------------------------------------------------
    // Draw traversal
    // ---------------------------------------------------------------------

    /// Submit every cell layer in row-major order, then every entity.
    ///
    /// Within a cell the ground sits at the cell's flat depth and each
    /// following layer gets one more unit of synthetic height, so risers,
    /// the slope surface and toppers always sort above what lies under them.
    pub fn draw(&self, sink: &mut impl SpriteSink) {
        for (row, col, cell) in self.map.cells() {
            let x = col as f32;
            let y = row as f32;
            let stack_top = cell.stack_height() as f32;

            let base_screen = self.projection.cell_origin(col, row, 0.0);
            let base_depth = self.depth_of(Vec3::new(x, y, 0.0));
            for index in cell.base_tiles().iter().filter_map(|t| sheet_index(*t)) {
                sink.submit(DrawCommand {
                    sheet: SheetRef::Tiles,
                    index,
                    screen: base_screen,
                    depth: base_depth,
                    tint: Color::WHITE,
                    source: DrawSource::Base { row, col },
                });
            }

            let mut depth_z = 0.0;
            for (level, &tile) in cell.height_tiles().iter().enumerate() {
                if is_hidden(tile) {
                    if self.config.hidden_riser_advances_depth {
                        depth_z += 1.0;
                    }
                    continue;
                }
                depth_z += 1.0;
                let Some(index) = sheet_index(tile) else {
                    continue;
                };
                sink.submit(DrawCommand {
                    sheet: SheetRef::Tiles,
                    index,
                    screen: self.projection.cell_origin(col, row, (level + 1) as f32),
                    depth: self.depth_of(Vec3::new(x, y, depth_z)),
                    tint: Color::WHITE,
                    source: DrawSource::Riser { row, col, level },
                });
            }

            let top_screen = self.projection.cell_origin(col, row, stack_top);
            if let Some(kind) = cell.slope() {
                depth_z += 1.0;
                sink.submit(DrawCommand {
                    sheet: SheetRef::Slopes,
                    index: kind.sheet_index(),
                    screen: top_screen,
                    depth: self.depth_of(Vec3::new(x, y, depth_z)),
                    tint: Color::WHITE,
                    source: DrawSource::Slope { row, col, kind },
                });
            }

            if cell.topper_tiles().is_empty() {
                continue;
            }
            depth_z += 1.0;
            let topper_depth = self.depth_of(Vec3::new(x, y, depth_z));
            for index in cell.topper_tiles().iter().filter_map(|t| sheet_index(*t)) {
                sink.submit(DrawCommand {
                    sheet: SheetRef::Tiles,
                    index,
                    screen: top_screen,
                    depth: topper_depth,
                    tint: Color::WHITE,
                    source: DrawSource::Topper { row, col },
                });
            }
        }

        for (id, entity) in &self.entities {
            sink.submit(DrawCommand {
                sheet: SheetRef::Template(entity.template.clone()),
                index: entity.frame,
                screen: self.project(entity.position),
                depth: self.depth_of(entity.position),
                tint: entity.tint,
                source: DrawSource::Entity(*id),
            });
        }
    }

    /// Collect one frame of draw commands, globally sorted when configured
    pub fn build_draw_list(&self) -> DrawList {
        let mut list = DrawList::new();
        self.draw(&mut list);
        if self.config.sort_draw_list {
            list.sort_by_depth();
        }
        list
    }
}

/// Floor to a grid index. NaN maps to i64::MIN so it never lands on a cell.
#[inline]
fn floor_index(value: f32) -> i64 {
    if value.is_nan() {
        i64::MIN
    } else {
        value.floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKey;
    use crate::world::slope::SlopeKind;
    use crate::world::tile::HIDDEN_TILE;

    fn world(width: usize, height: usize, max_height: usize) -> WorldContext {
        let map = TileMap::new(width, height, max_height).unwrap();
        WorldContext::new(map, IsoConfig::default()).unwrap()
    }

    fn ball(x: f32, y: f32) -> IsoEntity {
        IsoEntity::new(AssetKey::new("Base", "ball"), x, y)
    }

    fn riser_depths(list: &DrawList, row: usize, col: usize) -> Vec<f32> {
        list.iter()
            .filter(|cmd| {
                matches!(cmd.source, DrawSource::Riser { row: r, col: c, .. } if r == row && c == col)
            })
            .map(|cmd| cmd.depth)
            .collect()
    }

    #[test]
    fn test_depth_reference_ordering() {
        let ctx = world(10, 10, 10);
        let a = ctx.depth_of(Vec3::new(0.0, 0.0, 0.0));
        let b = ctx.depth_of(Vec3::new(1.0, 0.0, 0.0));
        let c = ctx.depth_of(Vec3::new(1.0, 1.0, 0.0));
        let d = ctx.depth_of(Vec3::new(1.0, 1.0, 1.0));
        assert!(a < b && b < c && c < d);
        assert!((d - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_height_at_flat_and_stacked() {
        let mut ctx = world(8, 8, 4);
        ctx.map_mut().push_height_tile(2, 3, 54).unwrap();
        ctx.map_mut().push_height_tile(2, 3, 53).unwrap();

        assert_eq!(ctx.height_at(0.5, 0.5).unwrap(), 0.0);
        assert_eq!(ctx.height_at(3.0, 2.0).unwrap(), 2.0);
        assert_eq!(ctx.height_at(3.99, 2.99).unwrap(), 2.0);
        assert_eq!(ctx.height_at(4.0, 2.5).unwrap(), 0.0);
    }

    #[test]
    fn test_height_at_slope_on_stack() {
        let mut ctx = world(8, 8, 4);
        ctx.map_mut().push_height_tile(1, 1, 54).unwrap();
        ctx.map_mut().set_slope(1, 1, SlopeKind::TopRightRamp).unwrap();

        assert!((ctx.height_at(1.5, 1.0).unwrap() - 1.0).abs() < 1e-6);
        assert!((ctx.height_at(1.5, 1.25).unwrap() - 1.25).abs() < 1e-6);
        assert!((ctx.height_at(1.5, 1.999).unwrap() - 1.999).abs() < 1e-4);
    }

    #[test]
    fn test_height_at_out_of_bounds() {
        let ctx = world(5, 6, 4);
        for (x, y) in [(-0.01, 0.0), (5.0, 0.0), (0.0, 6.0), (0.0, -3.5), (f32::NAN, 1.0)] {
            let err = ctx.height_at(x, y).unwrap_err();
            assert!(err.is_out_of_bounds(), "({x}, {y})");
        }
        assert!(matches!(
            ctx.height_at(-0.5, 2.0),
            Err(WorldError::OutOfBounds { col: -1, row: 2, .. })
        ));
    }

    #[test]
    fn test_riser_depths_strictly_increase() {
        let mut ctx = world(6, 6, 5);
        for tile in [54, 54, 51, 62, 61] {
            ctx.map_mut().push_height_tile(4, 2, tile).unwrap();
        }
        ctx.map_mut().push_topper_tile(4, 2, 114).unwrap();

        let list = ctx.build_draw_list();
        let depths = riser_depths(&list, 4, 2);
        assert_eq!(depths.len(), 5);
        assert!(depths.windows(2).all(|w| w[0] < w[1]));

        let base = list
            .iter()
            .find(|c| c.source == DrawSource::Base { row: 4, col: 2 })
            .unwrap();
        let topper = list
            .iter()
            .find(|c| c.source == DrawSource::Topper { row: 4, col: 2 })
            .unwrap();
        assert!(base.depth < depths[0]);
        assert!(topper.depth > depths[4]);
    }

    #[test]
    fn test_riser_screen_positions_climb() {
        let mut ctx = world(4, 4, 4);
        ctx.map_mut().push_height_tile(1, 1, 54).unwrap();
        ctx.map_mut().push_height_tile(1, 1, 54).unwrap();

        let list = ctx.build_draw_list();
        let screens: Vec<Vec2> = list
            .iter()
            .filter(|c| matches!(c.source, DrawSource::Riser { .. }))
            .map(|c| c.screen)
            .collect();
        // (1 + 1) * 16 - level * 32
        assert_eq!(screens, vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, -32.0)]);
    }

    #[test]
    fn test_hidden_riser_depth_flag() {
        let mut ctx = world(4, 4, 4);
        ctx.map_mut().push_height_tile(0, 0, HIDDEN_TILE).unwrap();
        ctx.map_mut().push_height_tile(0, 0, 54).unwrap();

        let list = ctx.build_draw_list();
        assert_eq!(ctx.height_at(0.5, 0.5).unwrap(), 2.0);
        let depths = riser_depths(&list, 0, 0);
        assert_eq!(depths.len(), 1, "hidden riser is never submitted");
        assert!((depths[0] - ctx.depth_of(Vec3::new(0.0, 0.0, 2.0))).abs() < 1e-6);

        let config = IsoConfig {
            hidden_riser_advances_depth: false,
            ..default()
        };
        let ctx = WorldContext::new(ctx.map().clone(), config).unwrap();
        let depths = riser_depths(&ctx.build_draw_list(), 0, 0);
        assert!((depths[0] - ctx.depth_of(Vec3::new(0.0, 0.0, 1.0))).abs() < 1e-6);
    }

    #[test]
    fn test_draw_order_cells_then_entities() {
        let mut ctx = world(3, 3, 2);
        ctx.map_mut().set_slope(2, 2, SlopeKind::LeftCorner).unwrap();
        let id = ctx.add_entity(ball(0.5, 0.5)).unwrap();

        let list = ctx.build_draw_list();
        assert_eq!(list.len(), 9 + 1 + 1);

        let last = list.commands.last().unwrap();
        assert_eq!(last.source, DrawSource::Entity(id));
        assert_eq!(last.sheet, SheetRef::Template(AssetKey::new("Base", "ball")));

        let slope = list
            .iter()
            .find(|c| c.sheet == SheetRef::Slopes)
            .unwrap();
        assert_eq!(slope.index, SlopeKind::LeftCorner.sheet_index());
    }

    #[test]
    fn test_sorted_draw_list() {
        let mut ctx = world(3, 3, 2);
        ctx.add_entity(ball(0.1, 0.1)).unwrap();
        let unsorted = ctx.build_draw_list();
        assert!(unsorted.commands.windows(2).any(|w| w[0].depth > w[1].depth));

        let config = IsoConfig {
            sort_draw_list: true,
            ..default()
        };
        let mut sorted_ctx = WorldContext::new(ctx.map().clone(), config).unwrap();
        sorted_ctx.add_entity(ball(0.1, 0.1)).unwrap();
        let sorted = sorted_ctx.build_draw_list();
        assert!(sorted.commands.windows(2).all(|w| w[0].depth <= w[1].depth));
    }

    #[test]
    fn test_entity_lifecycle() {
        let mut ctx = world(8, 8, 4);
        ctx.map_mut().push_height_tile(3, 3, 54).unwrap();

        let a = ctx.add_entity(ball(3.5, 3.5)).unwrap();
        let b = ctx.add_entity(ball(1.0, 1.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(ctx.entity(a).unwrap().position.z, 1.0);
        assert_eq!(ctx.entity_count(), 2);

        let ids: Vec<IsoEntityId> = ctx.entities().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);

        assert!(ctx.add_entity(ball(8.0, 1.0)).unwrap_err().is_out_of_bounds());
        assert_eq!(ctx.entity_count(), 2);

        ctx.remove_entity(a).unwrap();
        assert_eq!(ctx.remove_entity(a), Err(WorldError::UnknownEntity(a)));
        ctx.reset();
        assert_eq!(ctx.entity_count(), 0);
    }

    #[test]
    fn test_move_entity_snaps_to_terrain() {
        let mut ctx = world(8, 8, 4);
        ctx.map_mut().push_height_tile(2, 2, 54).unwrap();
        ctx.map_mut().push_height_tile(2, 2, 54).unwrap();
        let id = ctx.add_entity(ball(0.5, 0.5)).unwrap();

        ctx.move_entity_to(id, 2.5, 2.5).unwrap();
        assert_eq!(ctx.entity(id).unwrap().position, Vec3::new(2.5, 2.5, 2.0));

        let err = ctx.move_entity_to(id, -1.0, 2.5).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert_eq!(ctx.entity(id).unwrap().position, Vec3::new(2.5, 2.5, 2.0));
    }

    #[test]
    fn test_resolve_heights_after_edit() {
        let mut ctx = world(8, 8, 4);
        let id = ctx.add_entity(ball(4.5, 4.5)).unwrap();
        assert_eq!(ctx.entity(id).unwrap().position.z, 0.0);

        ctx.map_mut().push_height_tile(4, 4, 54).unwrap();
        ctx.map_mut().set_slope(4, 4, SlopeKind::TopLeftRamp).unwrap();
        ctx.resolve_heights().unwrap();
        assert!((ctx.entity(id).unwrap().position.z - 1.5).abs() < 1e-6);

        ctx.entity_mut(id).unwrap().position.x = 20.0;
        assert!(ctx.resolve_height(id).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_resolve_heights_skips_entities_off_the_map() {
        let mut ctx = world(8, 8, 4);
        let a = ctx.add_entity(ball(1.5, 1.5)).unwrap();
        let b = ctx.add_entity(ball(2.5, 2.5)).unwrap();
        let c = ctx.add_entity(ball(3.5, 3.5)).unwrap();

        ctx.entity_mut(b).unwrap().position.x = 20.0;
        ctx.map_mut().push_height_tile(1, 1, 54).unwrap();
        ctx.map_mut().push_height_tile(3, 3, 54).unwrap();

        let err = ctx.resolve_heights().unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { col: 20, row: 2, .. }));
        assert_eq!(ctx.entity(a).unwrap().position.z, 1.0);
        assert_eq!(ctx.entity(b).unwrap().position.z, 0.0);
        assert_eq!(ctx.entity(c).unwrap().position.z, 1.0);
    }

    #[test]
    fn test_can_enter_leaves_blocking_cell() {
        let mut ctx = world(8, 8, 4);
        ctx.map_mut().push_topper_tile(2, 2, 125).unwrap();
        ctx.map_mut().push_topper_tile(2, 3, 125).unwrap();
        ctx.map_mut().mark_impassable(125);
        let id = ctx.add_entity(ball(2.5, 2.5)).unwrap();

        // Standing on a blocked cell still allows moving inside and out of it.
        assert!(ctx.can_enter(id, 2.9, 2.1).unwrap());
        assert!(ctx.can_enter(id, 1.5, 2.5).unwrap());
        assert!(!ctx.can_enter(id, 3.5, 2.5).unwrap());
        assert!(ctx.can_enter(id, -0.5, 2.5).unwrap_err().is_out_of_bounds());
        assert_eq!(
            ctx.can_enter(IsoEntityId(42), 1.5, 1.5),
            Err(WorldError::UnknownEntity(IsoEntityId(42)))
        );
    }

    #[test]
    fn test_overlapping_entities() {
        let mut ctx = world(8, 8, 4);
        let a = ctx.add_entity(ball(2.0, 2.0)).unwrap();
        let b = ctx.add_entity(ball(2.2, 2.1)).unwrap();
        let c = ctx.add_entity(ball(6.0, 6.0)).unwrap();

        assert_eq!(ctx.overlapping(a).unwrap(), vec![b]);
        assert!(ctx.overlapping(c).unwrap().is_empty());
        assert!(ctx.overlapping(IsoEntityId(99)).is_err());
    }

    #[test]
    fn test_map_bounds_override_config() {
        let map = TileMap::new(7, 9, 3).unwrap();
        let ctx = WorldContext::new(map, IsoConfig::default()).unwrap();
        assert_eq!(ctx.config().map_width, 7);
        assert_eq!(ctx.config().map_height, 9);
        assert_eq!(ctx.config().max_height, 3);
    }
}
