//! Cascaded Shadow Map Planning
//!
//! Fits one orthographic shadow camera per cascade of a directional light.
//! Each cascade covers a slice of the camera frustum, bounded by a sphere so
//! the projection does not change size as the camera rotates. Cascade split
//! distances come from configuration ratios; nothing here picks them.
//!
//! The first shadowed directional light's spheres are the ones published to
//! shading (`cascade_culling_data`); other directional lights reuse them.

use core::f32::consts::SQRT_2;

use glam::{Mat4, Vec3, Vec4};
use serde::{Serialize, Deserialize};

use super::config::{FilterMode, ShadowSettings};
use crate::culling::CameraView;

/// Maximum supported cascade count
pub const MAX_CASCADES: usize = 4;

/// Shadow camera for one cascade
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadePlan {
    /// Light view matrix
    pub view: Mat4,
    /// Orthographic projection (OpenGL clip conventions)
    pub projection: Mat4,
    /// World-space culling sphere: xyz = center, w = radius
    pub culling_sphere: Vec4,
    /// World-space size of one shadow-map texel
    pub texel_size: f32,
}

impl CascadePlan {
    pub fn clip_from_world(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Camera view depths bounding each cascade.
///
/// `[0]` is the camera near plane, `[i + 1]` the far end of cascade `i`.
/// Entries past `cascade_count` repeat the shadow distance.
pub fn cascade_distances(
    camera: &CameraView,
    max_distance: f32,
    cascade_count: u32,
    ratios: [f32; 3],
) -> [f32; MAX_CASCADES + 1] {
    let count = cascade_count.clamp(1, MAX_CASCADES as u32) as usize;
    let shadow_distance = max_distance.min(camera.far).max(camera.near);

    let mut distances = [shadow_distance; MAX_CASCADES + 1];
    distances[0] = camera.near;

    for i in 1..count {
        distances[i] = (ratios[i - 1] * shadow_distance).max(distances[i - 1]);
    }

    distances
}

/// Plan the shadow camera for one cascade of a directional light.
///
/// # Arguments
/// * `light_direction` - Normalized direction the light travels in
/// * `tile_size` - Edge length of the cascade's atlas tile in pixels
/// * `near_plane_offset` - Extra distance the shadow near plane is pulled
///   back towards the light
pub fn plan_cascade(
    camera: &CameraView,
    light_direction: Vec3,
    cascade_index: usize,
    distances: &[f32; MAX_CASCADES + 1],
    tile_size: u32,
    near_plane_offset: f32,
) -> CascadePlan {
    let cascade_index = cascade_index.min(MAX_CASCADES - 1);
    let corners = camera.slice_corners(distances[cascade_index], distances[cascade_index + 1]);
    let (center, radius) = bounding_sphere(&corners);

    // Quantize the radius so sub-texel float noise does not resize the cascade
    let radius = (radius * 16.0).ceil() / 16.0;
    let texel_size = 2.0 * radius / tile_size as f32;

    let direction = light_direction.normalize_or_zero();
    let direction = if direction == Vec3::ZERO { Vec3::NEG_Y } else { direction };
    let up = find_up_vector(direction);
    let center = snap_to_texel(center, direction, up, texel_size);

    let pull_back = radius + near_plane_offset.max(0.0);
    let eye = center - direction * pull_back;
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh_gl(-radius, radius, -radius, radius, 0.0, pull_back + radius);

    CascadePlan {
        view,
        projection,
        culling_sphere: center.extend(radius),
        texel_size,
    }
}

/// Shading data for one cascade.
///
/// Returns the culling sphere with its radius shrunk by the filter footprint
/// and squared (`center, radius²`), and the cascade data vector
/// `(1 / radius², filterSize * √2, 0, 0)`.
pub fn cascade_culling_data(culling_sphere: Vec4, tile_size: u32, filter: FilterMode) -> (Vec4, Vec4) {
    let texel_size = 2.0 * culling_sphere.w / tile_size as f32;
    let filter_size = filter.filter_size(texel_size);

    // Keep filter taps inside the cascade
    let radius = culling_sphere.w - filter_size;
    let radius_sq = radius * radius;

    (
        culling_sphere.truncate().extend(radius_sq),
        Vec4::new(1.0 / radius_sq, filter_size * SQRT_2, 0.0, 0.0),
    )
}

/// Factor for culling casters already covered by a smaller cascade
pub fn cascade_blend_culling_factor(cascade_fade: f32) -> f32 {
    (0.8 - cascade_fade).max(0.0)
}

/// Distance fade vector `(1/maxDistance, 1/distanceFade, 1/(1 - f²), 0)`
/// with `f = 1 - cascadeFade`
pub fn distance_fade(settings: &ShadowSettings) -> Vec4 {
    let f = 1.0 - settings.directional.cascade_fade;
    Vec4::new(
        1.0 / settings.max_distance,
        1.0 / settings.distance_fade,
        1.0 / (1.0 - f * f),
        0.0,
    )
}

/// Bounding sphere of a set of points (centroid + max distance)
fn bounding_sphere(points: &[Vec3; 8]) -> (Vec3, f32) {
    let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    let radius = points
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0f32, f32::max);

    (center, radius)
}

/// Up vector that is never parallel to the light direction
fn find_up_vector(light_direction: Vec3) -> Vec3 {
    if light_direction.y.abs() > 0.9 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Snap the cascade center to the shadow-map texel grid so that camera
/// translation moves the projection in whole texels (no shimmering)
fn snap_to_texel(center: Vec3, direction: Vec3, up: Vec3, texel_size: f32) -> Vec3 {
    if texel_size <= 0.0 {
        return center;
    }

    let light_from_world = Mat4::look_at_rh(Vec3::ZERO, direction, up);
    let mut local = light_from_world.transform_point3(center);
    local.x = (local.x / texel_size).floor() * texel_size;
    local.y = (local.y / texel_size).floor() * texel_size;

    light_from_world.inverse().transform_point3(local)
}
