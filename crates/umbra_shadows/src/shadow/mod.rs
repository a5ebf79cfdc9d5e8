//! Shadow Atlas Scheduling
//!
//! Backend-agnostic scheduling and rendering of realtime shadow maps for
//! directional, spot and point lights, packed into two shared atlases.
//!
//! # Architecture
//!
//! - **Config**: Global and per-light shadow settings
//! - **Ledger**: Per-frame, fixed-capacity shadow reservations
//! - **Layout**: Uniform power-of-two tile grid for each atlas
//! - **Cascade**: Cascade fitting for directional lights
//! - **Punctual**: Spot and cube-face shadow cameras
//! - **Convert**: Clip → atlas matrix folding
//! - **Data / Keywords**: What gets published to shading
//! - **Backend**: Command stream consumed by a graphics backend
//! - **Renderer**: Frame orchestration over all of the above
//!
//! # Usage
//!
//! ```ignore
//! use umbra_shadows::shadow::*;
//!
//! let mut renderer = ShadowAtlasRenderer::new();
//! let mut table = ShadowDataTable::new();
//!
//! // Per frame
//! renderer.setup(&culling, &settings);
//! renderer.reserve_visible_lights(&culling.visible_lights, &mut table);
//! let stats = renderer.render(&mut backend);
//!
//! // ... main pass samples the atlases ...
//!
//! renderer.cleanup(&mut backend);
//! ```

pub mod config;
pub mod state;
pub mod layout;
pub mod ledger;
pub mod cascade;
pub mod punctual;
pub mod convert;
pub mod data;
pub mod keywords;
pub mod backend;
pub mod renderer;

// Re-exports
pub use config::{
    AtlasSize,
    FilterMode,
    CascadeBlendMode,
    ShadowMaskMode,
    DepthConvention,
    DirectionalShadowSettings,
    OtherShadowSettings,
    ShadowSettings,
    ShadowQuality,
    ShadowMode,
    LightShadowSettings,
};

pub use state::{FrameOp, FrameState, FrameStateError};

pub use layout::{TileLayout, TileViewport, PixelRect, MAX_TILES_PER_ATLAS};

pub use ledger::{
    ShadowLedger,
    ShadowReservation,
    ShadowedDirectionalLight,
    ShadowedOtherLight,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS,
    MAX_SHADOWED_OTHER_TILES,
    POINT_LIGHT_TILES,
};

pub use cascade::{CascadePlan, MAX_CASCADES};

pub use punctual::{PerspectivePlan, PointBias, CUBE_FACES};

pub use convert::atlas_matrix;

pub use data::{
    ShadowGlobals,
    ShadowDataTable,
    ShadowFrameStats,
    AtlasPassStats,
    MAX_DIRECTIONAL_LIGHT_DATA,
    MAX_OTHER_LIGHT_DATA,
};

pub use keywords::{KeywordGroup, ShadowKeywords};

pub use backend::{
    AtlasKind,
    ShadowBackend,
    ShadowCommand,
    ShadowDrawRequest,
    ShadowSplitData,
    RecordingBackend,
};

pub use renderer::{ShadowAtlasRenderer, PLACEHOLDER_ATLAS_SIZE};
