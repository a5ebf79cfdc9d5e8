//! Shadow Reservation Ledger
//!
//! Per-frame, first-come-first-served bookkeeping of which lights get a live
//! shadow map and where their tiles start. Capacity is fixed: 4 directional
//! lights (each with `cascade_count` tiles) and 16 other-light tiles, where a
//! point light takes 6 consecutive tiles and a spot light takes 1.
//!
//! Reservations never fail. A light that cannot get a shadow map degrades to
//! either no shadow or a baked-mask-only reservation; the frame always renders.

use glam::Vec3;
use serde::{Serialize, Deserialize};

use super::cascade::MAX_CASCADES;
use super::layout::MAX_TILES_PER_ATLAS;
use crate::light::{LightHandle, LightKind, VisibleLight};

/// Maximum shadowed directional lights per frame
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Maximum other-light tiles per frame
pub const MAX_SHADOWED_OTHER_TILES: usize = MAX_TILES_PER_ATLAS;

/// Tiles used by one point light (one per cube face)
pub const POINT_LIGHT_TILES: usize = 6;

/// Result of reserving shadow capacity for a light.
///
/// Shading receives this flattened to a four-float vector (`encode`); the
/// sign of the strength field tells live shadows from baked-mask-only ones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShadowReservation {
    /// The light contributes no shadows
    NoShadow,

    /// No live shadow map; shading samples the baked shadow mask only
    MaskOnly {
        strength: f32,
        mask_channel: Option<u8>,
    },

    /// Live cascaded shadow map for a directional light
    Directional {
        strength: f32,
        /// First tile in the flattened `light × cascade` tile space
        tile_offset: u32,
        normal_bias: f32,
        mask_channel: Option<u8>,
    },

    /// Live shadow map for a spot or point light
    Other {
        strength: f32,
        /// First tile in the other-light atlas
        tile_index: u32,
        is_point: bool,
        mask_channel: Option<u8>,
    },
}

impl ShadowReservation {
    /// Flatten to the shading-side vector.
    ///
    /// - `NoShadow` → `(0, 0, 0, 0)`
    /// - `MaskOnly` → `(-strength, 0, 0, channel)`
    /// - `Directional` → `(strength, tileOffset, normalBias, channel)`
    /// - `Other` → `(strength, tileIndex, isPoint, channel)`
    ///
    /// A missing mask channel is encoded as `-1`.
    pub fn encode(&self) -> [f32; 4] {
        fn channel(c: Option<u8>) -> f32 {
            c.map_or(-1.0, f32::from)
        }

        match *self {
            Self::NoShadow => [0.0; 4],
            Self::MaskOnly { strength, mask_channel } => [-strength, 0.0, 0.0, channel(mask_channel)],
            Self::Directional { strength, tile_offset, normal_bias, mask_channel } => {
                [strength, tile_offset as f32, normal_bias, channel(mask_channel)]
            }
            Self::Other { strength, tile_index, is_point, mask_channel } => {
                [strength, tile_index as f32, if is_point { 1.0 } else { 0.0 }, channel(mask_channel)]
            }
        }
    }

    /// Whether a live shadow map was granted
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Directional { .. } | Self::Other { .. })
    }

    pub fn mask_channel(&self) -> Option<u8> {
        match *self {
            Self::NoShadow => None,
            Self::MaskOnly { mask_channel, .. }
            | Self::Directional { mask_channel, .. }
            | Self::Other { mask_channel, .. } => mask_channel,
        }
    }
}

/// A directional light granted a live shadow map this frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowedDirectionalLight {
    pub handle: LightHandle,
    pub visible_index: usize,
    pub direction: Vec3,
    pub depth_bias: f32,
    pub slope_scale_bias: f32,
    pub near_plane_offset: f32,
}

/// A spot or point light granted live shadow tiles this frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowedOtherLight {
    pub handle: LightHandle,
    pub visible_index: usize,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    /// Full cone angle in degrees (spot lights)
    pub spot_angle: f32,
    pub near_plane: f32,
    pub depth_bias: f32,
    pub slope_scale_bias: f32,
    pub normal_bias: f32,
    pub is_point: bool,
}

impl ShadowedOtherLight {
    /// Atlas tiles this light occupies
    pub fn tile_count(&self) -> usize {
        if self.is_point { POINT_LIGHT_TILES } else { 1 }
    }
}

/// Fixed-capacity reservation tables for one frame
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShadowLedger {
    directional: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    directional_count: usize,

    /// Indexed by first tile; a point light fills six consecutive slots
    other: [ShadowedOtherLight; MAX_SHADOWED_OTHER_TILES],
    other_tile_count: usize,

    use_shadow_mask: bool,
}

impl ShadowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all reservations; slots are overwritten in place next frame
    pub fn reset(&mut self) {
        self.directional_count = 0;
        self.other_tile_count = 0;
        self.use_shadow_mask = false;
    }

    /// Reserve cascaded shadow tiles for a directional light.
    ///
    /// `cascade_count` determines the tile offset returned to shading.
    pub fn reserve_directional(&mut self, light: &VisibleLight, visible_index: usize, cascade_count: u32) -> ShadowReservation {
        if !light.kind.is_directional() {
            log::warn!("{:?} light {} passed to reserve_directional, ignoring", light.kind, light.handle);
            return ShadowReservation::NoShadow;
        }
        if self.directional_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS || !light.shadows.casts_shadows() {
            return ShadowReservation::NoShadow;
        }

        let mask_channel = self.note_shadow_mask(light);
        let strength = light.shadows.strength;

        if !light.has_shadow_casters() {
            log::debug!("Directional light {} has no shadow casters, mask only", light.handle);
            return ShadowReservation::MaskOnly { strength, mask_channel };
        }

        let slot = self.directional_count;
        self.directional[slot] = ShadowedDirectionalLight {
            handle: light.handle,
            visible_index,
            direction: light.direction,
            depth_bias: light.shadows.depth_bias,
            slope_scale_bias: light.shadows.slope_bias,
            near_plane_offset: light.shadows.near_plane,
        };
        self.directional_count += 1;

        let cascade_count = cascade_count.clamp(1, MAX_CASCADES as u32);
        ShadowReservation::Directional {
            strength,
            tile_offset: cascade_count * slot as u32,
            normal_bias: light.shadows.normal_bias,
            mask_channel,
        }
    }

    /// Reserve shadow tiles for a spot (1 tile) or point (6 tiles) light.
    ///
    /// Allocation is all-or-nothing: a point light that does not fit is
    /// never granted a partial set of faces.
    pub fn reserve_other(&mut self, light: &VisibleLight, visible_index: usize) -> ShadowReservation {
        if !light.shadows.casts_shadows() {
            return ShadowReservation::NoShadow;
        }

        let mask_channel = self.note_shadow_mask(light);
        let strength = light.shadows.strength;

        let (is_point, spot_angle) = match light.kind {
            LightKind::Point => (true, 90.0),
            LightKind::Spot { angle } => (false, angle),
            LightKind::Directional => {
                log::warn!("Directional light {} passed to reserve_other, ignoring", light.handle);
                return ShadowReservation::NoShadow;
            }
        };

        let tiles = if is_point { POINT_LIGHT_TILES } else { 1 };
        let first_tile = self.other_tile_count;

        if first_tile + tiles > MAX_SHADOWED_OTHER_TILES {
            log::debug!(
                "Other shadow atlas full ({} + {} > {}), light {} falls back to mask only",
                first_tile,
                tiles,
                MAX_SHADOWED_OTHER_TILES,
                light.handle
            );
            return ShadowReservation::MaskOnly { strength, mask_channel };
        }

        if !light.has_shadow_casters() {
            log::debug!("Light {} has no shadow casters, mask only", light.handle);
            return ShadowReservation::MaskOnly { strength, mask_channel };
        }

        self.other[first_tile] = ShadowedOtherLight {
            handle: light.handle,
            visible_index,
            position: light.position,
            direction: light.direction,
            range: light.range,
            spot_angle,
            near_plane: light.shadows.near_plane,
            depth_bias: light.shadows.depth_bias,
            slope_scale_bias: light.shadows.slope_bias,
            normal_bias: light.shadows.normal_bias,
            is_point,
        };
        self.other_tile_count += tiles;

        ShadowReservation::Other {
            strength,
            tile_index: first_tile as u32,
            is_point,
            mask_channel,
        }
    }

    /// Record shadow-mask use; happens whether or not a live map is granted
    fn note_shadow_mask(&mut self, light: &VisibleLight) -> Option<u8> {
        let channel = light.baking.shadow_mask_channel();
        if channel.is_some() {
            self.use_shadow_mask = true;
        }
        channel
    }

    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    /// Other-light tiles in use (point lights count 6)
    pub fn other_tile_count(&self) -> usize {
        self.other_tile_count
    }

    pub fn use_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    /// Directional lights reserved this frame, in reservation order
    pub fn directional_lights(&self) -> &[ShadowedDirectionalLight] {
        &self.directional[..self.directional_count]
    }

    /// Other lights reserved this frame with their first tile index
    pub fn other_lights(&self) -> OtherLights<'_> {
        OtherLights {
            slots: &self.other[..self.other_tile_count],
            tile: 0,
        }
    }
}

/// Iterator over reserved other lights, skipping the slots covered by the
/// extra faces of point lights
#[derive(Debug)]
pub struct OtherLights<'a> {
    slots: &'a [ShadowedOtherLight],
    tile: usize,
}

impl<'a> Iterator for OtherLights<'a> {
    type Item = (usize, &'a ShadowedOtherLight);

    fn next(&mut self) -> Option<Self::Item> {
        let light = self.slots.get(self.tile)?;
        let tile = self.tile;
        self.tile += light.tile_count();
        Some((tile, light))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{CasterBounds, LightBaking};
    use crate::shadow::config::LightShadowSettings;

    fn bounds() -> CasterBounds {
        CasterBounds::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn sun(handle: u64) -> VisibleLight {
        VisibleLight::directional(handle, Vec3::NEG_Y)
            .with_shadows(LightShadowSettings::soft())
            .with_caster_bounds(bounds())
    }

    fn spot(handle: u64) -> VisibleLight {
        VisibleLight::spot(handle, Vec3::Y, Vec3::NEG_Y, 10.0, 60.0)
            .with_shadows(LightShadowSettings::hard())
            .with_caster_bounds(bounds())
    }

    fn point(handle: u64) -> VisibleLight {
        VisibleLight::point(handle, Vec3::Y, 10.0)
            .with_shadows(LightShadowSettings::hard())
            .with_caster_bounds(bounds())
    }

    #[test]
    fn test_directional_offsets() {
        let mut ledger = ShadowLedger::new();

        for i in 0..3 {
            let reservation = ledger.reserve_directional(&sun(i), i as usize, 4);
            match reservation {
                ShadowReservation::Directional { tile_offset, strength, .. } => {
                    assert_eq!(tile_offset, 4 * i as u32);
                    assert_eq!(strength, 1.0);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        assert_eq!(ledger.directional_count(), 3);
    }

    #[test]
    fn test_directional_capacity() {
        let mut ledger = ShadowLedger::new();

        for i in 0..6 {
            let reservation = ledger.reserve_directional(&sun(i), i as usize, 2);
            assert_eq!(reservation.is_live(), i < 4);
            if i >= 4 {
                assert_eq!(reservation, ShadowReservation::NoShadow);
            }
        }

        assert_eq!(ledger.directional_count(), MAX_SHADOWED_DIRECTIONAL_LIGHTS);
    }

    #[test]
    fn test_reserve_rejects_wrong_kind() {
        let mut ledger = ShadowLedger::new();

        assert_eq!(ledger.reserve_directional(&spot(1), 0, 4), ShadowReservation::NoShadow);
        assert_eq!(ledger.reserve_directional(&point(2), 1, 4), ShadowReservation::NoShadow);
        assert_eq!(ledger.reserve_other(&sun(3), 2), ShadowReservation::NoShadow);

        assert_eq!(ledger.directional_count(), 0);
        assert_eq!(ledger.other_tile_count(), 0);
        assert!(ledger.reserve_directional(&sun(4), 3, 4).is_live());
    }

    #[test]
    fn test_zero_strength_is_no_shadow() {
        let mut ledger = ShadowLedger::new();
        let light = sun(1).with_shadows(LightShadowSettings::soft().with_strength(0.0));

        let reservation = ledger.reserve_directional(&light, 0, 4);
        assert_eq!(reservation.encode(), [0.0; 4]);

        let light = spot(2).with_shadows(LightShadowSettings::hard().with_strength(0.0));
        assert_eq!(ledger.reserve_other(&light, 1).encode(), [0.0; 4]);

        let light = point(3).with_shadows(LightShadowSettings::default());
        assert_eq!(ledger.reserve_other(&light, 2).encode(), [0.0; 4]);
    }

    #[test]
    fn test_empty_bounds_is_mask_only() {
        let mut ledger = ShadowLedger::new();
        let mut light = sun(1)
            .with_shadows(LightShadowSettings::soft().with_strength(0.7))
            .with_baking(LightBaking::MixedShadowmask { channel: 2 });
        light.caster_bounds = None;

        let reservation = ledger.reserve_directional(&light, 0, 4);
        assert_eq!(reservation.encode(), [-0.7, 0.0, 0.0, 2.0]);
        assert!(ledger.use_shadow_mask());
        assert_eq!(ledger.directional_count(), 0);
    }

    #[test]
    fn test_shadow_mask_recorded_for_live_light() {
        let mut ledger = ShadowLedger::new();
        let light = spot(1).with_baking(LightBaking::MixedShadowmask { channel: 0 });

        let reservation = ledger.reserve_other(&light, 0);
        assert!(reservation.is_live());
        assert_eq!(reservation.mask_channel(), Some(0));
        assert!(ledger.use_shadow_mask());

        ledger.reset();
        assert!(!ledger.use_shadow_mask());
        assert_eq!(ledger.other_tile_count(), 0);
    }

    #[test]
    fn test_point_light_takes_six_tiles() {
        let mut ledger = ShadowLedger::new();

        let first = ledger.reserve_other(&point(1), 0);
        let second = ledger.reserve_other(&spot(2), 1);

        assert_eq!(first.encode(), [1.0, 0.0, 1.0, -1.0]);
        assert_eq!(second.encode(), [1.0, 6.0, 0.0, -1.0]);
        assert_eq!(ledger.other_tile_count(), 7);
    }

    #[test]
    fn test_other_capacity_first_come_first_served() {
        let mut ledger = ShadowLedger::new();

        assert!(ledger.reserve_other(&point(1), 0).is_live());
        assert!(ledger.reserve_other(&point(2), 1).is_live());
        for i in 0..4 {
            assert!(ledger.reserve_other(&spot(10 + i), 2 + i as usize).is_live());
        }

        // 12 + 4 = 16 tiles used; the fifth spot light does not fit
        let rejected = ledger.reserve_other(&spot(20), 6);
        assert_eq!(rejected, ShadowReservation::MaskOnly { strength: 1.0, mask_channel: None });
        assert_eq!(rejected.encode(), [-1.0, 0.0, 0.0, -1.0]);
        assert_eq!(ledger.other_tile_count(), 16);
    }

    #[test]
    fn test_point_light_never_partially_granted() {
        let mut ledger = ShadowLedger::new();
        for i in 0..11 {
            assert!(ledger.reserve_other(&spot(i), i as usize).is_live());
        }

        // 11 + 6 = 17: rejected, but a spot light still fits afterwards
        assert!(!ledger.reserve_other(&point(50), 11).is_live());
        assert_eq!(ledger.other_tile_count(), 11);
        assert!(ledger.reserve_other(&spot(51), 12).is_live());
        assert_eq!(ledger.other_tile_count(), 12);
    }

    #[test]
    fn test_other_lights_iteration() {
        let mut ledger = ShadowLedger::new();
        ledger.reserve_other(&spot(1), 0);
        ledger.reserve_other(&point(2), 1);
        ledger.reserve_other(&spot(3), 2);

        let tiles: Vec<(usize, u64, bool)> = ledger
            .other_lights()
            .map(|(tile, light)| (tile, light.handle, light.is_point))
            .collect();

        assert_eq!(tiles, vec![(0, 1, false), (1, 2, true), (7, 3, false)]);
    }

    #[test]
    fn test_counts_bounded_for_any_sequence() {
        let mut ledger = ShadowLedger::new();
        // Deterministic pseudo-random mix of light types
        let mut seed = 0x2545_f491u32;
        for i in 0..200u64 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            match seed % 3 {
                0 => { ledger.reserve_directional(&sun(i), i as usize, 4); }
                1 => { ledger.reserve_other(&spot(i), i as usize); }
                _ => { ledger.reserve_other(&point(i), i as usize); }
            }
            assert!(ledger.directional_count() <= MAX_SHADOWED_DIRECTIONAL_LIGHTS);
            assert!(ledger.other_tile_count() <= MAX_SHADOWED_OTHER_TILES);
        }
    }
}
