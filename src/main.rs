use bevy::{color::palettes::css::*, prelude::*, window::PrimaryWindow};

use isometric_tiles::{
    AssetKey, IsoConfig, WorldResult,
    rendering::{
        IsoFrameSet, IsometricCamera, IsometricProjectionPlugin, IsometricTileRendererPlugin,
        SpriteSheets, from_bevy_world, to_bevy_translation,
    },
    world::{
        IsoEntity, IsoEntityId, TerrainGenerationParams, WorldContext, apply_auto_slopes,
        generate_terrain, place_landmarks,
    },
};

/// World units per second
const PLAYER_SPEED: f32 = 2.0;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(ImagePlugin::default_nearest()))
        .add_plugins((IsometricProjectionPlugin, IsometricTileRendererPlugin))
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                move_player
                    .in_set(IsoFrameSet::Movement)
                    .run_if(resource_exists::<Player>),
                pan_camera,
                highlight_hovered_cell.run_if(resource_exists::<WorldContext>),
            ),
        )
        .run();
}

/// The entity driven by WASD
#[derive(Resource)]
struct Player(IsoEntityId);

fn setup(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
    mut sheets: ResMut<SpriteSheets>,
    mut exit: EventWriter<AppExit>,
) {
    sheets.load_grid(
        &asset_server,
        &mut layouts,
        AssetKey::new("Base", "forest_tiles"),
        "forest_tiles.png",
        UVec2::splat(64),
        10,
        13,
    );
    sheets.load_grid(
        &asset_server,
        &mut layouts,
        AssetKey::new("Base", "slope_tiles"),
        "slope_tiles.png",
        UVec2::splat(64),
        8,
        1,
    );
    sheets.load_grid(
        &asset_server,
        &mut layouts,
        AssetKey::new("Base", "ball"),
        "ball.png",
        UVec2::splat(32),
        1,
        1,
    );

    match build_world() {
        Ok((world, player)) => {
            commands.insert_resource(world);
            commands.insert_resource(Player(player));
        }
        Err(err) => {
            error!("World setup failed: {}", err);
            exit.write(AppExit::error());
        }
    }
}

fn build_world() -> WorldResult<(WorldContext, IsoEntityId)> {
    let mut world = WorldContext::from_config(IsoConfig::default())?;

    let map = world.map_mut();
    map.tileset = Some(AssetKey::new("Base", "forest_tiles"));
    map.slope_tileset = Some(AssetKey::new("Base", "slope_tiles"));
    generate_terrain(map, &TerrainGenerationParams::default())?;
    place_landmarks(map)?;
    apply_auto_slopes(map)?;

    let player = world.add_entity(IsoEntity::new(AssetKey::new("Base", "ball"), 9.5, 9.5))?;
    Ok((world, player))
}

fn move_player(
    time: Res<Time>,
    keyboard_input: Res<ButtonInput<KeyCode>>,
    player: Res<Player>,
    mut world: ResMut<WorldContext>,
) {
    let mut direction = Vec2::ZERO;
    if keyboard_input.pressed(KeyCode::KeyA) {
        direction.x -= 1.0;
    }
    if keyboard_input.pressed(KeyCode::KeyD) {
        direction.x += 1.0;
    }
    if keyboard_input.pressed(KeyCode::KeyW) {
        direction.y -= 1.0;
    }
    if keyboard_input.pressed(KeyCode::KeyS) {
        direction.y += 1.0;
    }
    if direction == Vec2::ZERO {
        return;
    }

    let Some(entity) = world.entity(player.0) else {
        return;
    };
    let map = world.map();
    // Stay strictly inside the last cell on each axis.
    let upper = Vec2::new(map.width() as f32, map.height() as f32) - Vec2::splat(0.001);
    let target = (entity.position.truncate() + direction * PLAYER_SPEED * time.delta_secs())
        .clamp(Vec2::ZERO, upper);

    match world.can_enter(player.0, target.x, target.y) {
        Ok(false) => {
            debug!("Player blocked at {}", target);
            return;
        }
        Ok(true) => {}
        Err(err) => {
            warn!("Player move rejected: {}", err);
            return;
        }
    }

    if let Err(err) = world.move_entity_to(player.0, target.x, target.y) {
        warn!("Player move rejected: {}", err);
    }
}

fn pan_camera(
    time: Res<Time>,
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut query: Query<(&IsometricCamera, &mut Transform)>,
) {
    if let Ok((camera, mut transform)) = query.single_mut() {
        let step = camera.pan_speed * time.delta_secs();

        if keyboard_input.pressed(KeyCode::ArrowUp) {
            transform.translation.y += step;
        }
        if keyboard_input.pressed(KeyCode::ArrowDown) {
            transform.translation.y -= step;
        }
        if keyboard_input.pressed(KeyCode::ArrowLeft) {
            transform.translation.x -= step;
        }
        if keyboard_input.pressed(KeyCode::ArrowRight) {
            transform.translation.x += step;
        }
    }
}

/// Outline the top face of the cell under the cursor
fn highlight_hovered_cell(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<IsometricCamera>>,
    world: Res<WorldContext>,
    mut gizmos: Gizmos,
) {
    if let Ok(window) = windows.single()
        && let Some(cursor) = window.cursor_position()
        && let Ok((camera, camera_transform)) = cameras.single()
        && let Ok(point) = camera.viewport_to_world_2d(camera_transform, cursor)
        && let Some((row, col)) = world.pick_cell(from_bevy_world(point))
        && let Some(outline) = world.cell_outline(row, col)
    {
        let points = outline
            .iter()
            .chain(outline.first())
            .map(|corner| to_bevy_translation(*corner, 0.0).truncate());
        gizmos.linestrip_2d(points, YELLOW);
    }
}
