//! Shadow Configuration
//!
//! Global shadow settings consumed once per frame at `setup`, plus the
//! per-light shadow parameters carried by each visible light. Everything is
//! serde-serializable so settings can be loaded from disk and hot-reloaded.

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Square atlas resolution. Always a power of two, so every tile split
/// (1, 2 or 4) divides it exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtlasSize {
    #[serde(rename = "256")]
    _256,
    #[serde(rename = "512")]
    _512,
    #[default]
    #[serde(rename = "1024")]
    _1024,
    #[serde(rename = "2048")]
    _2048,
    #[serde(rename = "4096")]
    _4096,
    #[serde(rename = "8192")]
    _8192,
}

impl AtlasSize {
    /// Size in texels along one edge
    pub fn texels(self) -> u32 {
        match self {
            Self::_256 => 256,
            Self::_512 => 512,
            Self::_1024 => 1024,
            Self::_2048 => 2048,
            Self::_4096 => 4096,
            Self::_8192 => 8192,
        }
    }

    /// Nearest supported size at or above `texels` (clamped to 8192)
    pub fn from_texels(texels: u32) -> Self {
        match texels.clamp(256, 8192).next_power_of_two() {
            256 => Self::_256,
            512 => Self::_512,
            1024 => Self::_1024,
            2048 => Self::_2048,
            4096 => Self::_4096,
            _ => Self::_8192,
        }
    }
}

/// PCF filter kernel used when sampling an atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    Pcf2x2,
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterMode {
    /// Ordinal used by the bias math (`filterSize = texelSize * (ordinal + 1)`)
    pub fn ordinal(self) -> u32 {
        match self {
            Self::Pcf2x2 => 0,
            Self::Pcf3x3 => 1,
            Self::Pcf5x5 => 2,
            Self::Pcf7x7 => 3,
        }
    }

    /// World-space filter footprint for a given texel size
    pub fn filter_size(self, texel_size: f32) -> f32 {
        texel_size * (self.ordinal() as f32 + 1.0)
    }
}

/// How shading transitions between adjacent cascades
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    #[default]
    Hard,
    Soft,
    Dither,
}

/// How baked shadow masks combine with realtime shadows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMaskMode {
    /// Baked mask is always used for static casters
    Shadowmask,
    /// Realtime shadows up to the max distance, mask beyond it
    #[default]
    DistanceShadowmask,
}

/// Clip-space depth convention of the target platform
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthConvention {
    #[default]
    Standard,
    /// Near plane maps to 1, far plane to 0
    ReversedZ,
}

/// Directional light (cascaded) atlas settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    /// Atlas resolution
    pub atlas_size: AtlasSize,

    /// PCF filter
    pub filter: FilterMode,

    /// Cascade count (1-4)
    pub cascade_count: u32,

    /// Split ratios as fractions of the max shadow distance
    pub cascade_ratio1: f32,
    pub cascade_ratio2: f32,
    pub cascade_ratio3: f32,

    /// Fraction of the last cascade used to fade out
    pub cascade_fade: f32,

    /// Blend between cascades
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::_1024,
            filter: FilterMode::Pcf2x2,
            cascade_count: 4,
            cascade_ratio1: 0.1,
            cascade_ratio2: 0.25,
            cascade_ratio3: 0.5,
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    /// The three inner split ratios
    pub fn cascade_ratios(&self) -> [f32; 3] {
        [self.cascade_ratio1, self.cascade_ratio2, self.cascade_ratio3]
    }
}

/// Spot and point light atlas settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    pub atlas_size: AtlasSize,
    pub filter: FilterMode,
}

impl Default for OtherShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::_1024,
            filter: FilterMode::Pcf2x2,
        }
    }
}

/// Global shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Maximum distance from the camera that receives realtime shadows
    pub max_distance: f32,

    /// Fraction of `max_distance` over which shadows fade out
    pub distance_fade: f32,

    pub directional: DirectionalShadowSettings,

    pub other: OtherShadowSettings,

    pub shadow_mask_mode: ShadowMaskMode,

    pub depth: DepthConvention,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
            shadow_mask_mode: ShadowMaskMode::DistanceShadowmask,
            depth: DepthConvention::Standard,
        }
    }
}

impl ShadowSettings {
    /// Create a high-quality shadow configuration
    pub fn high_quality() -> Self {
        Self {
            max_distance: 150.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::_4096,
                filter: FilterMode::Pcf5x5,
                cascade_blend: CascadeBlendMode::Soft,
                ..Default::default()
            },
            other: OtherShadowSettings {
                atlas_size: AtlasSize::_2048,
                filter: FilterMode::Pcf5x5,
            },
            ..Default::default()
        }
    }

    /// Create a low-quality shadow configuration for performance
    pub fn low_quality() -> Self {
        Self {
            max_distance: 50.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::_1024,
                cascade_count: 2,
                cascade_ratio1: 0.3,
                ..Default::default()
            },
            other: OtherShadowSettings {
                atlas_size: AtlasSize::_512,
                filter: FilterMode::Pcf2x2,
            },
            ..Default::default()
        }
    }

    /// Parse settings from JSON and clamp them to valid ranges
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.validate();
        Ok(settings)
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.max_distance = self.max_distance.max(0.001);
        self.distance_fade = self.distance_fade.clamp(0.001, 1.0);

        let dir = &mut self.directional;
        dir.cascade_count = dir.cascade_count.clamp(1, 4);
        dir.cascade_fade = dir.cascade_fade.clamp(0.001, 1.0);

        let mut ratios = dir.cascade_ratios().map(|r| r.clamp(0.0, 1.0));
        ratios.sort_by(f32::total_cmp);
        [dir.cascade_ratio1, dir.cascade_ratio2, dir.cascade_ratio3] = ratios;
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    Low,
    Medium,
    High,
    Ultra,
}

impl ShadowQuality {
    /// Convert to settings
    pub fn to_settings(self) -> ShadowSettings {
        match self {
            Self::Low => ShadowSettings::low_quality(),
            Self::Medium => ShadowSettings::default(),
            Self::High => ShadowSettings::high_quality(),
            Self::Ultra => ShadowSettings {
                max_distance: 200.0,
                directional: DirectionalShadowSettings {
                    atlas_size: AtlasSize::_8192,
                    filter: FilterMode::Pcf7x7,
                    cascade_blend: CascadeBlendMode::Dither,
                    ..Default::default()
                },
                other: OtherShadowSettings {
                    atlas_size: AtlasSize::_4096,
                    filter: FilterMode::Pcf7x7,
                },
                ..Default::default()
            },
        }
    }
}

/// Whether and how a light casts realtime shadows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMode {
    #[default]
    None,
    Hard,
    Soft,
}

/// Per-light shadow settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightShadowSettings {
    pub mode: ShadowMode,

    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub strength: f32,

    /// Constant depth bias applied while drawing casters
    pub depth_bias: f32,

    /// Slope-scaled depth bias
    pub slope_bias: f32,

    /// Normal-based receiver offset
    pub normal_bias: f32,

    /// Near plane for the shadow camera. For directional lights this pulls
    /// the near plane back to catch casters in front of the cascade.
    pub near_plane: f32,
}

impl Default for LightShadowSettings {
    fn default() -> Self {
        Self {
            mode: ShadowMode::None,
            strength: 1.0,
            depth_bias: 0.0,
            slope_bias: 0.05,
            normal_bias: 0.4,
            near_plane: 0.2,
        }
    }
}

impl LightShadowSettings {
    /// Hard shadows with default biases
    pub fn hard() -> Self {
        Self {
            mode: ShadowMode::Hard,
            ..Default::default()
        }
    }

    /// Soft shadows with default biases
    pub fn soft() -> Self {
        Self {
            mode: ShadowMode::Soft,
            ..Default::default()
        }
    }

    /// Set shadow strength
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Set depth biases
    pub fn with_bias(mut self, depth_bias: f32, slope_bias: f32, normal_bias: f32) -> Self {
        self.depth_bias = depth_bias;
        self.slope_bias = slope_bias;
        self.normal_bias = normal_bias;
        self
    }

    /// Set shadow camera near plane
    pub fn with_near_plane(mut self, near_plane: f32) -> Self {
        self.near_plane = near_plane;
        self
    }

    /// Casts shadows with a positive strength
    pub fn casts_shadows(&self) -> bool {
        self.mode != ShadowMode::None && self.strength > 0.0
    }
}
