//! Isometric tile world: projection, terrain heights with slopes, and
//! painter's-algorithm depth keys for stacked tiles and free entities.

pub mod assets;
pub mod config;
pub mod error;
pub mod rendering;
pub mod world;

pub use assets::AssetKey;
pub use config::IsoConfig;
pub use error::{WorldError, WorldResult};
