//! Visible Light Input
//!
//! The per-frame view of a light as produced by the external culling step.
//! The shadow subsystem never culls on its own: it trusts the orchestrator to
//! hand over visible lights together with the bounds of the shadow casters
//! each light can see.

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::shadow::config::LightShadowSettings;

/// Stable identifier of a light across frames (entity ID or similar)
pub type LightHandle = u64;

/// Light type, with type-specific shape parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    /// Full cone angle in degrees
    Spot { angle: f32 },
    Point,
}

impl LightKind {
    pub fn is_directional(&self) -> bool {
        matches!(self, Self::Directional)
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Self::Point)
    }
}

/// How a light was baked, if at all
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightBaking {
    /// Fully realtime
    #[default]
    Realtime,
    /// Mixed lighting with baked shadows in a shadow-mask channel
    MixedShadowmask { channel: u8 },
    /// Mixed lighting without a shadow mask (subtractive, baked indirect)
    MixedOther,
    /// Fully baked
    Baked,
}

impl LightBaking {
    /// Shadow-mask channel if the light's shadows were baked into a mask
    pub fn shadow_mask_channel(&self) -> Option<u8> {
        match self {
            Self::MixedShadowmask { channel } => Some(*channel),
            _ => None,
        }
    }
}

/// World-space bounds of the shadow casters a light affects
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CasterBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl CasterBounds {
    /// Bounds containing nothing
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create from a set of points
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |bounds, &p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        })
    }

    /// Inverted bounds contain no casters
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A light that survived camera culling this frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibleLight {
    pub handle: LightHandle,

    pub kind: LightKind,

    /// World position (unused for directional lights)
    pub position: Vec3,

    /// Normalized direction the light travels in (unused for point lights)
    pub direction: Vec3,

    /// Attenuation range (unused for directional lights)
    pub range: f32,

    pub shadows: LightShadowSettings,

    pub baking: LightBaking,

    /// Casters inside the light's influence, `None` when nothing was found
    pub caster_bounds: Option<CasterBounds>,
}

impl VisibleLight {
    /// Directional light shining along `direction`
    pub fn directional(handle: LightHandle, direction: Vec3) -> Self {
        Self {
            handle,
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            range: f32::INFINITY,
            shadows: LightShadowSettings::default(),
            baking: LightBaking::Realtime,
            caster_bounds: None,
        }
    }

    /// Spot light at `position` pointing along `direction`
    pub fn spot(handle: LightHandle, position: Vec3, direction: Vec3, range: f32, angle: f32) -> Self {
        Self {
            kind: LightKind::Spot { angle },
            position,
            range,
            ..Self::directional(handle, direction)
        }
    }

    /// Point light at `position`
    pub fn point(handle: LightHandle, position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            range,
            ..Self::directional(handle, Vec3::NEG_Z)
        }
    }

    pub fn with_shadows(mut self, shadows: LightShadowSettings) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn with_baking(mut self, baking: LightBaking) -> Self {
        self.baking = baking;
        self
    }

    pub fn with_caster_bounds(mut self, bounds: CasterBounds) -> Self {
        self.caster_bounds = Some(bounds);
        self
    }

    /// Whether any shadow caster needs a live shadow map for this light
    pub fn has_shadow_casters(&self) -> bool {
        self.caster_bounds.is_some_and(|b| !b.is_empty())
    }
}
