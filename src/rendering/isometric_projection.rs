use bevy::prelude::*;

/// World <-> screen mapping for a 2:1 isometric tile grid.
///
/// World space is (x, y, height) in cell units. Screen space is in pixels with
/// y pointing down, the way sprite sheets are authored; the renderer flips it
/// when building bevy transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjection {
    /// Horizontal pixels per unit of (x - y)
    pub half_tile_width: f32,
    /// Vertical pixels per unit of (x + y)
    pub quarter_tile_height: f32,
    /// Vertical pixels per unit of height
    pub height_unit_pixels: f32,
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self {
            half_tile_width: 32.0,
            quarter_tile_height: 16.0,
            height_unit_pixels: 32.0,
        }
    }
}

impl IsoProjection {
    pub fn new(half_tile_width: f32, quarter_tile_height: f32, height_unit_pixels: f32) -> Self {
        Self {
            half_tile_width,
            quarter_tile_height,
            height_unit_pixels,
        }
    }

    /// Project a world position to screen pixels
    #[inline]
    pub fn project(&self, world: Vec3) -> Vec2 {
        Vec2::new(
            (world.x - world.y) * self.half_tile_width,
            (world.x + world.y) * self.quarter_tile_height - world.z * self.height_unit_pixels,
        )
    }

    /// Inverse of [`IsoProjection::project`] on the plane at height `z`
    #[inline]
    pub fn unproject(&self, screen: Vec2, z: f32) -> Vec3 {
        let diff = screen.x / self.half_tile_width;
        let sum = (screen.y + z * self.height_unit_pixels) / self.quarter_tile_height;
        Vec3::new((sum + diff) * 0.5, (sum - diff) * 0.5, z)
    }

    /// Screen position of the top corner of cell (col, row) at a stack level
    #[inline]
    pub fn cell_origin(&self, col: usize, row: usize, level: f32) -> Vec2 {
        self.project(Vec3::new(col as f32, row as f32, level))
    }
}

/// Convert y-down screen pixels plus a depth key into a bevy 2D translation.
#[inline]
pub fn to_bevy_translation(screen: Vec2, depth: f32) -> Vec3 {
    Vec3::new(screen.x, -screen.y, depth)
}

/// Inverse of [`to_bevy_translation`] for cursor picking
#[inline]
pub fn from_bevy_world(point: Vec2) -> Vec2 {
    Vec2::new(point.x, -point.y)
}

/// Camera setup for the isometric view
#[derive(Component)]
pub struct IsometricCamera {
    /// Orthographic scale; below 1.0 zooms in
    pub zoom: f32,

    /// Pan speed in screen pixels per second
    pub pan_speed: f32,

    /// Screen-space point the camera starts at
    pub look_at: Vec2,
}

impl Default for IsometricCamera {
    fn default() -> Self {
        Self {
            zoom: 0.5,
            pan_speed: 100.0,
            look_at: Vec2::ZERO,
        }
    }
}

/// Plugin for the isometric camera
pub struct IsometricProjectionPlugin;

impl Plugin for IsometricProjectionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_isometric_camera);
    }
}

fn setup_isometric_camera(mut commands: Commands) {
    let iso_cam = IsometricCamera::default();
    let translation = to_bevy_translation(iso_cam.look_at, 0.0);

    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: iso_cam.zoom,
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_xyz(translation.x, translation.y, 0.0),
        iso_cam,
    ));

    info!("Isometric camera spawned");
}
