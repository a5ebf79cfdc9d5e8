//! Spot and Point Light Shadow Cameras
//!
//! Perspective shadow cameras for lights with a position. A spot light gets
//! one camera along its cone axis; a point light gets six, one per cube face,
//! each rendered into its own atlas tile.

use core::f32::consts::SQRT_2;

use glam::{Mat4, Vec3, Vec4};
use serde::{Serialize, Deserialize};

use super::config::FilterMode;

/// Closest allowed shadow near plane
const MIN_NEAR_PLANE: f32 = 0.01;

/// Cube faces in tile order (+X, -X, +Y, -Y, +Z, -Z).
///
/// Side faces use the conventional cube-map up vector of -Y, so they are
/// stored upside down the way cube maps are sampled.
pub const CUBE_FACES: [CubeFace; 6] = [
    CubeFace { forward: Vec3::X, up: Vec3::NEG_Y },
    CubeFace { forward: Vec3::NEG_X, up: Vec3::NEG_Y },
    CubeFace { forward: Vec3::Y, up: Vec3::Z },
    CubeFace { forward: Vec3::NEG_Y, up: Vec3::NEG_Z },
    CubeFace { forward: Vec3::Z, up: Vec3::NEG_Y },
    CubeFace { forward: Vec3::NEG_Z, up: Vec3::NEG_Y },
];

/// Orientation of one cube-map face
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeFace {
    pub forward: Vec3,
    pub up: Vec3,
}

/// View and projection of one perspective shadow tile
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectivePlan {
    pub view: Mat4,
    pub projection: Mat4,
}

impl PerspectivePlan {
    pub fn clip_from_world(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Shadow camera for a spot light.
///
/// `angle` is the full cone angle in degrees.
pub fn spot_matrices(position: Vec3, direction: Vec3, angle: f32, range: f32, near_plane: f32) -> PerspectivePlan {
    let direction = direction.normalize_or_zero();
    let direction = if direction == Vec3::ZERO { Vec3::NEG_Z } else { direction };
    let up = if direction.y.abs() > 0.9 { Vec3::Z } else { Vec3::Y };
    let near = near_plane.max(MIN_NEAR_PLANE);

    PerspectivePlan {
        view: Mat4::look_at_rh(position, position + direction, up),
        projection: Mat4::perspective_rh_gl(angle.clamp(1.0, 179.0).to_radians(), 1.0, near, range.max(near * 2.0)),
    }
}

/// Normal bias for a spot light tile.
///
/// The world-space texel size at unit distance follows from the projection's
/// horizontal scale, `2 / (tileSize * proj[0][0])`.
pub fn spot_normal_bias(projection: &Mat4, tile_size: u32, filter: FilterMode, normal_bias: f32) -> f32 {
    let texel_size = 2.0 / (tile_size as f32 * projection.x_axis.x);
    let filter_size = filter.filter_size(texel_size);
    normal_bias * filter_size * SQRT_2
}

/// Bias terms shared by all six faces of a point light
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointBias {
    /// Receiver normal offset
    pub normal_bias: f32,
    /// Degrees added to the 90° face field of view
    pub fov_bias: f32,
}

/// Normal bias and field-of-view inflation for a point light.
///
/// With a 90° face the texel size at unit distance is `2 / tileSize`. The
/// face frustum is widened until the tile spans `1 + bias + filterSize` at
/// unit distance, so filtering near tile edges still reads this face.
pub fn point_bias(tile_size: u32, filter: FilterMode, normal_bias: f32) -> PointBias {
    let texel_size = 2.0 / tile_size as f32;
    let filter_size = filter.filter_size(texel_size);
    let bias = normal_bias * filter_size * SQRT_2;
    let fov_bias = (1.0 + bias + filter_size).atan().to_degrees() * 2.0 - 90.0;

    PointBias {
        normal_bias: bias,
        fov_bias,
    }
}

/// Shadow camera for one face of a point light.
///
/// Cube-face projections carry a clip-space y flip, which inverts triangle
/// winding. Negating the view's second row cancels it for every face, so
/// point tiles cull with the same winding as spot tiles.
pub fn point_face_matrices(position: Vec3, face: usize, fov_bias: f32, range: f32, near_plane: f32) -> PerspectivePlan {
    let CubeFace { forward, up } = CUBE_FACES[face % CUBE_FACES.len()];
    let near = near_plane.max(MIN_NEAR_PLANE);

    let view = Mat4::look_at_rh(position, position + forward, up);
    let mut rows = view.transpose();
    rows.y_axis = -rows.y_axis;
    let view = rows.transpose();

    PerspectivePlan {
        view,
        projection: cube_face_projection((90.0 + fov_bias).to_radians(), near, range.max(near * 2.0)),
    }
}

/// Square perspective with the cube-map clip-space y flip applied
pub fn cube_face_projection(fov_y_radians: f32, near: f32, far: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * Mat4::perspective_rh_gl(fov_y_radians, 1.0, near, far)
}

/// Tile bounds vector for an other-light tile:
/// `(offset.x * scale + border, offset.y * scale + border, scale - 2 * border, normalBias)`
/// with `border` half an atlas texel. Shading clamps samples to this rect.
pub fn other_tile_data(offset: glam::Vec2, scale: f32, atlas_texel: f32, normal_bias: f32) -> Vec4 {
    let border = atlas_texel * 0.5;
    Vec4::new(
        offset.x * scale + border,
        offset.y * scale + border,
        scale - border - border,
        normal_bias,
    )
}
