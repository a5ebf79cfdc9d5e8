//! Atlas Tile Layout
//!
//! Splits a square atlas into a uniform power-of-two grid. The grid is chosen
//! from the tile count alone (1 → 1×1, ≤4 → 2×2, otherwise 4×4), so placement
//! is plain row/column arithmetic with no packing search.

use glam::Vec2;
use serde::{Serialize, Deserialize};

/// Hard cap on tiles per atlas (4×4 grid)
pub const MAX_TILES_PER_ATLAS: usize = 16;

/// Pixel rectangle inside an atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where a tile lives in the atlas
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileViewport {
    /// Viewport in atlas pixels
    pub rect: PixelRect,
    /// Grid coordinates `(col, row)`, not yet divided by the split
    pub offset: Vec2,
}

/// Grid layout of one atlas for the current frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {
    /// Tiles per row and per column
    pub split: u32,
    /// Edge length of one tile in pixels
    pub tile_size: u32,
}

impl TileLayout {
    /// Grid split for a number of tiles
    pub fn split_for(tile_count: usize) -> u32 {
        match tile_count {
            0..=1 => 1,
            2..=4 => 2,
            _ => 4,
        }
    }

    /// Layout for `tile_count` tiles in an atlas of `atlas_size` pixels.
    ///
    /// The atlas size must be a multiple of the split; `AtlasSize` guarantees
    /// that for every configured atlas.
    pub fn new(atlas_size: u32, tile_count: usize) -> Self {
        let split = Self::split_for(tile_count);
        Self {
            split,
            tile_size: atlas_size / split,
        }
    }

    /// Reciprocal of the split, the scale of one tile in atlas UV space
    pub fn tile_scale(&self) -> f32 {
        1.0 / self.split as f32
    }

    /// Viewport of the tile at `tile_index`
    pub fn viewport(&self, tile_index: usize) -> TileViewport {
        let split = self.split as usize;
        let col = (tile_index % split) as u32;
        let row = (tile_index / split) as u32;

        TileViewport {
            rect: PixelRect {
                x: col * self.tile_size,
                y: row * self.tile_size,
                width: self.tile_size,
                height: self.tile_size,
            },
            offset: Vec2::new(col as f32, row as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_for() {
        assert_eq!(TileLayout::split_for(0), 1);
        assert_eq!(TileLayout::split_for(1), 1);
        assert_eq!(TileLayout::split_for(2), 2);
        assert_eq!(TileLayout::split_for(4), 2);
        assert_eq!(TileLayout::split_for(5), 4);
        assert_eq!(TileLayout::split_for(16), 4);
    }

    #[test]
    fn test_tile_size_covers_atlas() {
        for atlas_size in [256u32, 512, 1024, 2048, 4096, 8192] {
            for tiles in 1..=MAX_TILES_PER_ATLAS {
                let layout = TileLayout::new(atlas_size, tiles);
                assert_eq!(layout.tile_size * layout.split, atlas_size);
            }
        }
    }

    #[test]
    fn test_viewport_placement() {
        let layout = TileLayout::new(1024, 12);
        assert_eq!(layout.split, 4);
        assert_eq!(layout.tile_size, 256);

        let tile = layout.viewport(5);
        assert_eq!(tile.offset, Vec2::new(1.0, 1.0));
        assert_eq!(tile.rect, PixelRect { x: 256, y: 256, width: 256, height: 256 });

        let tile = layout.viewport(11);
        assert_eq!(tile.offset, Vec2::new(3.0, 2.0));
        assert_eq!(tile.rect.x, 768);
        assert_eq!(tile.rect.y, 512);
    }

    #[test]
    fn test_single_tile_fills_atlas() {
        let layout = TileLayout::new(2048, 1);
        let tile = layout.viewport(0);
        assert_eq!(tile.rect, PixelRect { x: 0, y: 0, width: 2048, height: 2048 });
        assert_eq!(layout.tile_scale(), 1.0);
    }

    #[test]
    fn test_tiles_do_not_overlap() {
        let layout = TileLayout::new(512, 16);
        let mut seen = [[false; 4]; 4];
        for i in 0..16 {
            let offset = layout.viewport(i).offset;
            let (c, r) = (offset.x as usize, offset.y as usize);
            assert!(!seen[r][c]);
            seen[r][c] = true;
        }
    }
}
