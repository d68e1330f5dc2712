use std::collections::HashMap;

use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::assets::AssetKey;
use crate::rendering::draw_list::{DrawCommand, DrawList, DrawSource, SheetRef};
use crate::rendering::isometric_projection::to_bevy_translation;
use crate::world::WorldContext;

/// Spread of depth keys along bevy's z axis
pub const DEPTH_Z_SCALE: f32 = 100.0;

/// Lift of entity sprites over cell layers with the same depth key. Well
/// below the z gap between two stack levels.
pub const ENTITY_Z_BIAS: f32 = 1e-3;

/// Per-frame phases of the isometric world, run in this order
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum IsoFrameSet {
    /// Entity positions and map edits
    Movement,
    /// Entities snap to the terrain
    ResolveHeights,
    /// Draw list rebuild and sprite sync
    Draw,
}

/// A loaded atlas: image, grid layout and frame count
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: Handle<Image>,
    pub layout: Handle<TextureAtlasLayout>,
    pub frames: usize,
}

/// Sprite sheets resolved by [`AssetKey`]
#[derive(Resource, Default)]
pub struct SpriteSheets {
    sheets: HashMap<AssetKey, SpriteSheet>,
}

impl SpriteSheets {
    pub fn insert(&mut self, key: AssetKey, sheet: SpriteSheet) {
        self.sheets.insert(key, sheet);
    }

    pub fn get(&self, key: &AssetKey) -> Option<&SpriteSheet> {
        self.sheets.get(key)
    }

    /// Load an image laid out as a uniform grid of frames
    pub fn load_grid(
        &mut self,
        asset_server: &AssetServer,
        layouts: &mut Assets<TextureAtlasLayout>,
        key: AssetKey,
        path: &str,
        tile_size: UVec2,
        columns: u32,
        rows: u32,
    ) {
        let image = asset_server.load(path.to_string());
        let layout = layouts.add(TextureAtlasLayout::from_grid(tile_size, columns, rows, None, None));
        debug!("Sprite sheet {} loaded from {}", key, path);
        self.insert(
            key,
            SpriteSheet {
                image,
                layout,
                frames: (columns * rows) as usize,
            },
        );
    }

    /// Sheet a draw command samples from
    pub fn resolve(&self, world: &WorldContext, command: &DrawCommand) -> Option<&SpriteSheet> {
        let key = match &command.sheet {
            SheetRef::Tiles => world.map().tileset.as_ref()?,
            SheetRef::Slopes => world.map().slope_tileset.as_ref()?,
            SheetRef::Template(key) => key,
        };
        self.get(key)
    }
}

/// Marker component for sprites spawned from the draw list
#[derive(Component)]
pub struct IsometricTileSprite;

/// Plugin for rendering the isometric world as depth-keyed sprites
pub struct IsometricTileRendererPlugin;

impl Plugin for IsometricTileRendererPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteSheets>()
            .init_resource::<DrawList>()
            .configure_sets(
                Update,
                (
                    IsoFrameSet::Movement,
                    IsoFrameSet::ResolveHeights,
                    IsoFrameSet::Draw,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                resolve_entity_heights
                    .in_set(IsoFrameSet::ResolveHeights)
                    .run_if(resource_exists::<WorldContext>),
            )
            .add_systems(
                Update,
                (
                    rebuild_draw_list,
                    render_draw_list.run_if(resource_changed::<DrawList>),
                )
                    .chain()
                    .in_set(IsoFrameSet::Draw)
                    .run_if(resource_exists::<WorldContext>),
            );
    }
}

/// Snap every entity onto the terrain once per update
fn resolve_entity_heights(mut world: ResMut<WorldContext>) {
    if let Err(err) = world.resolve_heights() {
        warn!("Entity height resolve failed: {}", err);
    }
}

/// Recompute the frame's draw list, touching the resource only on change
fn rebuild_draw_list(world: Res<WorldContext>, mut draw_list: ResMut<DrawList>) {
    let next = world.build_draw_list();
    draw_list.set_if_neq(next);
}

/// Sprite z for a draw command. Entities win depth ties against the tiles
/// of the cell they stand on.
pub fn sprite_z(command: &DrawCommand) -> f32 {
    let z = command.depth * DEPTH_Z_SCALE;
    match command.source {
        DrawSource::Entity(_) => z + ENTITY_Z_BIAS,
        _ => z,
    }
}

/// Replace the spawned sprites with the current draw list
fn render_draw_list(
    mut commands: Commands,
    draw_list: Res<DrawList>,
    world: Res<WorldContext>,
    sheets: Res<SpriteSheets>,
    existing_sprites: Query<Entity, With<IsometricTileSprite>>,
) {
    for entity in existing_sprites.iter() {
        commands.entity(entity).despawn();
    }

    let mut unresolved = 0;
    for command in draw_list.iter() {
        let Some(sheet) = sheets.resolve(&world, command) else {
            unresolved += 1;
            continue;
        };
        if command.index >= sheet.frames {
            unresolved += 1;
            continue;
        }

        let mut sprite = Sprite::from_atlas_image(
            sheet.image.clone(),
            TextureAtlas {
                layout: sheet.layout.clone(),
                index: command.index,
            },
        );
        sprite.color = command.tint;
        // Tiles hang from their top corner, entities stand on their feet.
        sprite.anchor = match command.source {
            DrawSource::Entity(_) => Anchor::BottomCenter,
            _ => Anchor::TopCenter,
        };

        commands.spawn((
            sprite,
            Transform::from_translation(to_bevy_translation(command.screen, sprite_z(command))),
            IsometricTileSprite,
        ));
    }

    if unresolved > 0 {
        warn!("{} draw commands had no sprite sheet or frame", unresolved);
    }
}
