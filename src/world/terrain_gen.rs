use bevy::prelude::*;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::error::WorldResult;
use crate::world::slope::SlopeKind;
use crate::world::tile::TileId;
use crate::world::tile_map::TileMap;

/// Ground tiles of the forest sheet
pub const GROUND_TILES: [TileId; 18] = [
    0, 1, 2, 3, 4, 5, 6, 10, 11, 12, 13, 14, 15, 16, 17, 20, 21, 22,
];

/// Riser faces of the forest sheet
pub const RISER_TILES: [TileId; 6] = [50, 51, 52, 53, 54, 55];

/// Grass tufts, walkable
pub const GRASS_TOPPERS: [TileId; 8] = [110, 111, 112, 113, 114, 115, 116, 117];

/// Trees and rocks, marked impassable by [`generate_terrain`]
pub const DECORATION_TOPPERS: [TileId; 10] = [70, 119, 120, 121, 124, 125, 126, 127, 128, 129];

/// Parameters for procedural terrain generation
#[derive(Clone, Debug)]
pub struct TerrainGenerationParams {
    pub seed: u32,
    /// Noise features across the whole map
    pub scale: f32,
    pub octaves: usize,
    pub lacunarity: f32,
    pub persistence: f32,
    /// Noise value below which the ground stays flat, in [-1, 1)
    pub sea_level: f32,
    /// Tallest generated stack, further capped by the map's max height
    pub height_levels: usize,
    /// Chance of a grass tuft on a flat cell
    pub grass_chance: f32,
    /// Chance of a tree or rock on a flat cell without grass
    pub decoration_chance: f32,
    /// Put ramps and corners next to cells one unit higher
    pub auto_slopes: bool,
}

impl Default for TerrainGenerationParams {
    fn default() -> Self {
        Self {
            seed: 42,
            scale: 3.0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            sea_level: 0.1,
            height_levels: 3,
            grass_chance: 0.33,
            decoration_chance: 0.13,
            auto_slopes: true,
        }
    }
}

/// Counts of what a generation pass placed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TerrainSummary {
    pub risers: usize,
    pub slopes: usize,
    pub toppers: usize,
}

/// Fill a map with noise-driven hills, ground variety and toppers.
///
/// Existing layers are replaced; ground tiles are overwritten.
pub fn generate_terrain(map: &mut TileMap, params: &TerrainGenerationParams) -> WorldResult<TerrainSummary> {
    let fbm = Fbm::<Perlin>::new(params.seed)
        .set_octaves(params.octaves)
        .set_lacunarity(params.lacunarity as f64)
        .set_persistence(params.persistence as f64);

    let width = map.width();
    let height = map.height();
    let levels = params.height_levels.min(map.max_height());
    let span = (1.0 - params.sea_level).max(f32::EPSILON);

    let mut summary = TerrainSummary::default();

    for row in 0..height {
        for col in 0..width {
            let (r, c) = (row as i32, col as i32);
            map.clear_stack(r, c)?;

            let ground = pick(&GROUND_TILES, cell_hash(params.seed, row, col, 0));
            map.set_tile_id(r, c, ground)?;

            let sample = [
                (col as f32 / width as f32 * params.scale) as f64,
                (row as f32 / height as f32 * params.scale) as f64,
            ];
            let n = fbm.get(sample) as f32;
            let raised = ((n - params.sea_level) / span).max(0.0);
            let level = ((raised * (levels + 1) as f32).floor() as usize).min(levels);

            for step in 0..level {
                let riser = pick(&RISER_TILES, cell_hash(params.seed, row, col, 1 + step as u32));
                map.push_height_tile(r, c, riser)?;
            }
            summary.risers += level;
        }
    }

    if params.auto_slopes {
        summary.slopes = apply_auto_slopes(map)?;
    }

    for tile in DECORATION_TOPPERS {
        map.mark_impassable(tile);
    }

    for row in 0..height {
        for col in 0..width {
            let (r, c) = (row as i32, col as i32);
            if map.cell(r, c)?.slope().is_some() {
                continue;
            }

            let roll = cell_hash(params.seed, row, col, 100);
            let choice = cell_hash(params.seed, row, col, 101);
            let topper = if roll < params.grass_chance {
                Some(pick(&GRASS_TOPPERS, choice))
            } else if roll < params.grass_chance + params.decoration_chance {
                Some(pick(&DECORATION_TOPPERS, choice))
            } else {
                None
            };

            if let Some(tile) = topper {
                map.push_topper_tile(r, c, tile)?;
                summary.toppers += 1;
            }
        }
    }

    info!(
        "Generated terrain (seed {}): {} risers, {} slopes, {} toppers",
        params.seed, summary.risers, summary.slopes, summary.toppers
    );

    Ok(summary)
}

/// Give every topper-free cell the slope that meets a neighbour exactly one
/// unit higher, or clear it when there is none. Returns the number of sloped
/// cells.
///
/// A single higher edge neighbour gives a ramp; with no higher edge
/// neighbour, a single higher diagonal neighbour gives a corner.
pub fn apply_auto_slopes(map: &mut TileMap) -> WorldResult<usize> {
    let mut assignments = Vec::new();

    for (row, col, cell) in map.cells() {
        if !cell.topper_tiles().is_empty() {
            continue;
        }
        let level = cell.stack_height();
        let (r, c) = (row as i32, col as i32);
        let one_higher = |dr: i32, dc: i32| {
            map.stack_height(r + dr, c + dc)
                .is_ok_and(|neighbour| neighbour == level + 1)
        };

        let ramps: Vec<SlopeKind> = [
            (0, -1, SlopeKind::BottomRightRamp),
            (0, 1, SlopeKind::TopLeftRamp),
            (-1, 0, SlopeKind::BottomLeftRamp),
            (1, 0, SlopeKind::TopRightRamp),
        ]
        .into_iter()
        .filter(|(dr, dc, _)| one_higher(*dr, *dc))
        .map(|(_, _, kind)| kind)
        .collect();

        let corners: Vec<SlopeKind> = [
            (-1, -1, SlopeKind::TopCorner),
            (-1, 1, SlopeKind::RightCorner),
            (1, -1, SlopeKind::LeftCorner),
            (1, 1, SlopeKind::BottomCorner),
        ]
        .into_iter()
        .filter(|(dr, dc, _)| one_higher(*dr, *dc))
        .map(|(_, _, kind)| kind)
        .collect();

        let slope = match (ramps.as_slice(), corners.as_slice()) {
            ([ramp], _) => Some(*ramp),
            ([], [corner]) => Some(*corner),
            _ => None,
        };
        assignments.push((r, c, slope));
    }

    let mut sloped = 0;
    for (r, c, slope) in assignments {
        match slope {
            Some(kind) => {
                map.set_slope(r, c, kind)?;
                sloped += 1;
            }
            None => map.clear_slope(r, c)?,
        }
    }
    Ok(sloped)
}

/// Hand-built cluster of stacks and toppers around rows 14-19, columns 3-6.
/// The cells are cleared first; the map needs at least 20 rows and 7 columns.
pub fn place_landmarks(map: &mut TileMap) -> WorldResult<()> {
    const STACKS: [(i32, i32, &[TileId]); 11] = [
        (16, 4, &[54]),
        (17, 3, &[54]),
        (15, 3, &[54]),
        (16, 3, &[53]),
        (15, 4, &[54, 54, 51]),
        (18, 3, &[51]),
        (19, 3, &[50]),
        (18, 4, &[55]),
        (14, 4, &[54]),
        (14, 5, &[62, 61, 63]),
        (17, 4, &[]),
    ];
    const TOPPERS: [(i32, i32, TileId); 5] = [
        (17, 4, 114),
        (16, 5, 115),
        (14, 4, 125),
        (15, 5, 91),
        (16, 6, 94),
    ];

    for (row, col, _) in STACKS {
        map.clear_stack(row, col)?;
    }
    for (row, col, _) in TOPPERS {
        map.clear_stack(row, col)?;
    }

    for (row, col, tiles) in STACKS {
        for tile in tiles {
            map.push_height_tile(row, col, *tile)?;
        }
    }
    for (row, col, tile) in TOPPERS {
        map.push_topper_tile(row, col, tile)?;
    }

    debug!("Placed {} landmark stacks", STACKS.len());
    Ok(())
}

#[inline]
fn pick(tiles: &[TileId], roll: f32) -> TileId {
    let idx = ((roll * tiles.len() as f32) as usize).min(tiles.len() - 1);
    tiles[idx]
}

/// Stateless per-cell random value in [0, 1)
fn cell_hash(seed: u32, row: usize, col: usize, salt: u32) -> f32 {
    let mut h = seed ^ salt.wrapping_mul(0x9E37_79B9);
    h ^= (row as u32).wrapping_mul(0x85EB_CA6B);
    h = h.rotate_left(13) ^ (col as u32).wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MapCell;

    fn snapshot(map: &TileMap) -> Vec<MapCell> {
        map.cells().map(|(_, _, cell)| cell.clone()).collect()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let params = TerrainGenerationParams::default();
        let mut a = TileMap::new(32, 24, 8).unwrap();
        let mut b = TileMap::new(32, 24, 8).unwrap();
        let summary_a = generate_terrain(&mut a, &params).unwrap();
        let summary_b = generate_terrain(&mut b, &params).unwrap();
        assert_eq!(summary_a, summary_b);
        assert_eq!(snapshot(&a), snapshot(&b));
    }

    #[test]
    fn test_generated_stacks_respect_levels() {
        let params = TerrainGenerationParams {
            height_levels: 5,
            sea_level: -1.0,
            ..Default::default()
        };
        let mut map = TileMap::new(40, 40, 2).unwrap();
        let summary = generate_terrain(&mut map, &params).unwrap();

        assert!(map.cells().all(|(_, _, cell)| cell.stack_height() <= 2));
        let total: usize = map.cells().map(|(_, _, cell)| cell.stack_height()).sum();
        assert_eq!(total, summary.risers);
        assert!(map.cells().all(|(_, _, cell)| GROUND_TILES.contains(&cell.tile_id())));
    }

    #[test]
    fn test_sloped_cells_carry_no_toppers() {
        let mut map = TileMap::new(40, 40, 8).unwrap();
        let summary = generate_terrain(&mut map, &TerrainGenerationParams::default()).unwrap();

        let sloped = map.cells().filter(|(_, _, cell)| cell.slope().is_some()).count();
        assert_eq!(sloped, summary.slopes);
        assert!(
            map.cells()
                .filter(|(_, _, cell)| cell.slope().is_some())
                .all(|(_, _, cell)| cell.topper_tiles().is_empty())
        );
        for tile in DECORATION_TOPPERS {
            assert!(map.is_impassable(tile));
        }
    }

    #[test]
    fn test_auto_slopes_around_single_block() {
        let mut map = TileMap::new(5, 5, 4).unwrap();
        map.push_height_tile(2, 2, 54).unwrap();

        assert_eq!(apply_auto_slopes(&mut map).unwrap(), 8);
        let slope = |row, col| map.cell(row, col).unwrap().slope();
        assert_eq!(slope(2, 1), Some(SlopeKind::TopLeftRamp));
        assert_eq!(slope(2, 3), Some(SlopeKind::BottomRightRamp));
        assert_eq!(slope(1, 2), Some(SlopeKind::TopRightRamp));
        assert_eq!(slope(3, 2), Some(SlopeKind::BottomLeftRamp));
        assert_eq!(slope(1, 1), Some(SlopeKind::BottomCorner));
        assert_eq!(slope(1, 3), Some(SlopeKind::LeftCorner));
        assert_eq!(slope(3, 1), Some(SlopeKind::RightCorner));
        assert_eq!(slope(3, 3), Some(SlopeKind::TopCorner));
        assert_eq!(slope(2, 2), None);
        assert_eq!(slope(0, 0), None);
    }

    #[test]
    fn test_auto_slopes_skip_ambiguous_cells() {
        let mut map = TileMap::new(3, 1, 4).unwrap();
        map.push_height_tile(0, 0, 54).unwrap();
        map.push_height_tile(0, 2, 54).unwrap();

        // Raised on both sides: no single ramp fits.
        assert_eq!(apply_auto_slopes(&mut map).unwrap(), 0);
        assert_eq!(map.cell(0, 1).unwrap().slope(), None);
    }

    #[test]
    fn test_landmarks() {
        let mut map = TileMap::new(50, 50, 8).unwrap();
        map.push_height_tile(15, 4, 50).unwrap();
        place_landmarks(&mut map).unwrap();

        assert_eq!(map.cell(15, 4).unwrap().height_tiles(), &[54, 54, 51]);
        assert_eq!(map.cell(14, 5).unwrap().height_tiles(), &[62, 61, 63]);
        assert_eq!(map.cell(17, 4).unwrap().topper_tiles(), &[114]);
        assert!(map.cell(17, 4).unwrap().height_tiles().is_empty());

        let mut small = TileMap::new(10, 10, 8).unwrap();
        assert!(place_landmarks(&mut small).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_cell_hash_range() {
        for row in 0..64 {
            for col in 0..64 {
                let h = cell_hash(7, row, col, 3);
                assert!((0.0..1.0).contains(&h));
            }
        }
        assert_ne!(cell_hash(7, 1, 2, 0), cell_hash(7, 2, 1, 0));
    }
}
