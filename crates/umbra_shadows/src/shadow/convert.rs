//! Atlas-Space Matrix Conversion
//!
//! Folds the clip → texture remap and the tile placement into the shadow
//! matrix, so shading goes from world space straight to atlas UV + depth
//! with a single multiply.

use glam::{Mat4, Vec2};

use super::config::DepthConvention;

/// Convert a world → clip matrix (OpenGL clip conventions, all axes in
/// `[-1, 1]`) into a world → atlas matrix for the tile at `offset` in a grid
/// of `split × split` tiles.
///
/// x/y land in `[offset / split, (offset + 1) / split]`, z in `[0, 1]`.
pub fn atlas_matrix(clip_from_world: Mat4, offset: Vec2, split: u32, depth: DepthConvention) -> Mat4 {
    let scale = 1.0 / split as f32;

    // Work on rows; glam stores columns
    let mut rows = clip_from_world.transpose();

    if depth == DepthConvention::ReversedZ {
        rows.z_axis = -rows.z_axis;
    }

    let w = rows.w_axis;
    rows.x_axis = ((rows.x_axis + w) * 0.5 + w * offset.x) * scale;
    rows.y_axis = ((rows.y_axis + w) * 0.5 + w * offset.y) * scale;
    rows.z_axis = (rows.z_axis + w) * 0.5;

    rows.transpose()
}
