use bevy::prelude::*;

use crate::assets::AssetKey;

/// Handle to an entity registered in a [`crate::world::WorldContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoEntityId(pub u32);

/// Axis-aligned box in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y &&
        self.min.z < other.max.z && self.max.z > other.min.z
    }
}

/// A freely positioned drawable standing on the terrain
#[derive(Debug, Clone, PartialEq)]
pub struct IsoEntity {
    /// World position; z is rewritten from the terrain on every height resolve
    pub position: Vec3,

    /// Footprint width (x), depth (y) and height (z), centred on the position
    pub size: Vec3,

    /// Drawable template in the external content store
    pub template: AssetKey,

    pub tint: Color,

    /// Frame of the template to draw, chosen by the animation collaborator
    pub frame: usize,
}

impl IsoEntity {
    pub fn new(template: AssetKey, x: f32, y: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            size: Vec3::new(0.5, 0.5, 1.0),
            template,
            tint: Color::WHITE,
            frame: 0,
        }
    }

    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    /// Box occupied in world space. The footprint is centred on (x, y),
    /// the box rises from the entity's feet.
    pub fn bounds(&self) -> BoundingBox {
        let half = Vec3::new(self.size.x * 0.5, self.size.y * 0.5, 0.0);
        let min = self.position - half;
        let max = self.position + half + Vec3::new(0.0, 0.0, self.size.z);
        BoundingBox::new(min, max)
    }

    pub fn overlaps(&self, other: &IsoEntity) -> bool {
        self.bounds().intersects(&other.bounds())
    }
}
