//! Shader-Facing Shadow Data
//!
//! Plain-old-data blocks published to shading once per frame. All GPU
//! structures are bytemuck Pod/Zeroable for direct upload, with 16-byte
//! aligned sizes.

use glam::{Mat4, Vec4};
use serde::{Serialize, Deserialize};

use super::cascade::MAX_CASCADES;
use super::layout::MAX_TILES_PER_ATLAS;
use super::ledger::ShadowReservation;

/// Directional lights with a shading-side data slot
pub const MAX_DIRECTIONAL_LIGHT_DATA: usize = 4;

/// Other lights with a shading-side data slot
pub const MAX_OTHER_LIGHT_DATA: usize = 64;

/// Global shadow bindings shared by all receivers
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowGlobals {
    /// World → directional atlas, indexed `light * cascadeCount + cascade`
    pub directional_matrices: [[[f32; 4]; 4]; MAX_TILES_PER_ATLAS],

    /// World → other atlas, indexed by tile
    pub other_matrices: [[[f32; 4]; 4]; MAX_TILES_PER_ATLAS],

    /// Per other tile: `(minU, minV, extent, normalBias)`
    pub other_tiles: [[f32; 4]; MAX_TILES_PER_ATLAS],

    /// Per cascade: `(center.xyz, radius²)`
    pub cascade_culling_spheres: [[f32; 4]; MAX_CASCADES],

    /// Per cascade: `(1 / radius², filterSize * √2, 0, 0)`
    pub cascade_data: [[f32; 4]; MAX_CASCADES],

    /// `(dirSize, 1 / dirSize, otherSize, 1 / otherSize)`
    pub atlas_size: [f32; 4],

    /// `(1 / maxDistance, 1 / distanceFade, 1 / (1 - f²), 0)`
    pub distance_fade: [f32; 4],

    /// Active cascades, 0 when no directional light is shadowed
    pub cascade_count: u32,

    pub _pad: [u32; 3],
}

impl ShadowGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_directional_matrix(&mut self, tile: usize, matrix: Mat4) {
        if let Some(slot) = self.directional_matrices.get_mut(tile) {
            *slot = matrix.to_cols_array_2d();
        }
    }

    pub fn set_other_matrix(&mut self, tile: usize, matrix: Mat4) {
        if let Some(slot) = self.other_matrices.get_mut(tile) {
            *slot = matrix.to_cols_array_2d();
        }
    }

    pub fn set_other_tile(&mut self, tile: usize, data: Vec4) {
        if let Some(slot) = self.other_tiles.get_mut(tile) {
            *slot = data.to_array();
        }
    }

    pub fn set_cascade(&mut self, cascade: usize, culling_sphere: Vec4, data: Vec4) {
        if cascade < MAX_CASCADES {
            self.cascade_culling_spheres[cascade] = culling_sphere.to_array();
            self.cascade_data[cascade] = data.to_array();
        }
    }

    pub fn directional_matrix(&self, tile: usize) -> Mat4 {
        Mat4::from_cols_array_2d(&self.directional_matrices[tile])
    }

    pub fn other_matrix(&self, tile: usize) -> Mat4 {
        Mat4::from_cols_array_2d(&self.other_matrices[tile])
    }

    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Encoded per-light shadow vectors for the lighting uploader.
///
/// Capacity matches the lighting buffers (4 directional, 64 other). Lights
/// past capacity get no slot, and their reservations are not recorded.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShadowDataTable {
    directional: Vec<[f32; 4]>,
    other: Vec<[f32; 4]>,
}

impl ShadowDataTable {
    pub fn new() -> Self {
        Self {
            directional: Vec::with_capacity(MAX_DIRECTIONAL_LIGHT_DATA),
            other: Vec::with_capacity(MAX_OTHER_LIGHT_DATA),
        }
    }

    /// Clear for a new frame; capacity is kept
    pub fn clear(&mut self) {
        self.directional.clear();
        self.other.clear();
    }

    /// Record a directional reservation, returning its slot
    pub fn push_directional(&mut self, reservation: &ShadowReservation) -> Option<usize> {
        Self::push(&mut self.directional, MAX_DIRECTIONAL_LIGHT_DATA, reservation)
    }

    /// Record a spot or point reservation, returning its slot
    pub fn push_other(&mut self, reservation: &ShadowReservation) -> Option<usize> {
        Self::push(&mut self.other, MAX_OTHER_LIGHT_DATA, reservation)
    }

    fn push(slots: &mut Vec<[f32; 4]>, capacity: usize, reservation: &ShadowReservation) -> Option<usize> {
        if slots.len() >= capacity {
            return None;
        }
        slots.push(reservation.encode());
        Some(slots.len() - 1)
    }

    pub fn directional(&self) -> &[[f32; 4]] {
        &self.directional
    }

    pub fn other(&self) -> &[[f32; 4]] {
        &self.other
    }

    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directional)
    }

    pub fn other_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.other)
    }
}

/// Per-atlas numbers for one rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasPassStats {
    /// Atlas edge in pixels (1 for the placeholder)
    pub atlas_size: u32,
    pub tiles: u32,
    pub split: u32,
    pub tile_size: u32,
    pub draw_calls: u32,
}

/// Statistics returned by `ShadowAtlasRenderer::render`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowFrameStats {
    pub directional: AtlasPassStats,
    pub other: AtlasPassStats,
    /// No directional light was shadowed; a 1×1 atlas was bound instead
    pub directional_placeholder: bool,
    /// No other light was shadowed; the other binding aliases the directional atlas
    pub other_aliased: bool,
}

impl ShadowFrameStats {
    pub fn total_draw_calls(&self) -> u32 {
        self.directional.draw_calls + self.other.draw_calls
    }
}
