//! Camera Culling Results
//!
//! What the frame orchestrator hands to `setup`: the camera the frame is
//! rendered from and the lights that survived culling, in culling order.

use glam::{Mat4, Vec3};
use serde::{Serialize, Deserialize};

use crate::light::VisibleLight;

/// Perspective camera the cascades are fitted to
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    /// Camera-to-world transform (camera looks down its local -Z)
    pub world_from_view: Mat4,

    /// Vertical field of view in radians
    pub fov_y: f32,

    /// Width / height
    pub aspect: f32,

    pub near: f32,

    pub far: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            world_from_view: Mat4::IDENTITY,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

impl CameraView {
    /// Camera at `eye` looking at `target`
    pub fn looking_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            world_from_view: Mat4::look_at_rh(eye, target, Vec3::Y).inverse(),
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.world_from_view.w_axis.truncate()
    }

    /// World-space corners of the frustum slice between two view depths.
    ///
    /// Order: near plane (bl, br, tl, tr), then far plane in the same order.
    pub fn slice_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let tan_y = (self.fov_y * 0.5).tan();
        let tan_x = tan_y * self.aspect;
        let mut corners = [Vec3::ZERO; 8];

        for (plane, depth) in [near, far].into_iter().enumerate() {
            let (x, y) = (depth * tan_x, depth * tan_y);
            let local = [
                Vec3::new(-x, -y, -depth),
                Vec3::new(x, -y, -depth),
                Vec3::new(-x, y, -depth),
                Vec3::new(x, y, -depth),
            ];
            for (i, p) in local.into_iter().enumerate() {
                corners[plane * 4 + i] = self.world_from_view.transform_point3(p);
            }
        }

        corners
    }
}

/// Output of camera culling for one frame
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CullingResults {
    pub camera: CameraView,

    /// Visible lights; a light's position in this list is its visible index
    pub visible_lights: Vec<VisibleLight>,
}

impl CullingResults {
    pub fn new(camera: CameraView) -> Self {
        Self {
            camera,
            visible_lights: Vec::new(),
        }
    }

    pub fn with_light(mut self, light: VisibleLight) -> Self {
        self.visible_lights.push(light);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_corners_identity_camera() {
        let camera = CameraView {
            fov_y: 90f32.to_radians(),
            aspect: 1.0,
            ..Default::default()
        };

        let corners = camera.slice_corners(1.0, 10.0);

        // tan(45°) = 1, so half extents equal depth
        assert!((corners[0] - Vec3::new(-1.0, -1.0, -1.0)).length() < 1e-4);
        assert!((corners[3] - Vec3::new(1.0, 1.0, -1.0)).length() < 1e-4);
        assert!((corners[7] - Vec3::new(10.0, 10.0, -10.0)).length() < 1e-3);
    }

    #[test]
    fn test_camera_position() {
        let camera = CameraView::looking_at(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, 1.0, 1.0, 0.1, 100.0);
        assert!((camera.position() - Vec3::new(0.0, 5.0, 10.0)).length() < 1e-4);

        // Slice centers lie along the view direction
        let corners = camera.slice_corners(1.0, 1.0);
        let center = corners[..4].iter().copied().sum::<Vec3>() / 4.0;
        let forward = (Vec3::ZERO - camera.position()).normalize();
        assert!(((center - camera.position()).normalize() - forward).length() < 1e-4);
    }
}
