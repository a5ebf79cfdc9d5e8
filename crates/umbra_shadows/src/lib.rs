//! # umbra_shadows - Shadow Atlas Scheduler
//!
//! Decides every frame which lights cast realtime shadows, packs their shadow
//! maps into two fixed-size atlases and encodes each tile's projection so
//! shading can sample the atlas directly:
//! - Directional lights: up to 4, each with 1-4 cascades
//! - Spot lights: 1 tile each
//! - Point lights: 6 tiles each (one per cube face)
//!
//! Budget exhaustion never fails a frame. Lights that do not fit fall back to
//! baked shadow masks or no shadows at all.
//!
//! ## Example
//!
//! ```ignore
//! use umbra_shadows::prelude::*;
//!
//! let settings = ShadowSettings::from_json(&json)?;
//! let mut renderer = ShadowAtlasRenderer::new();
//!
//! renderer.setup(&culling, &settings);
//! for (index, light) in culling.visible_lights.iter().enumerate() {
//!     let reservation = if light.kind.is_directional() {
//!         renderer.reserve_directional(light, index)
//!     } else {
//!         renderer.reserve_other(light, index)
//!     };
//!     upload_light_shadow_data(index, reservation.encode());
//! }
//! renderer.render(&mut backend);
//! renderer.cleanup(&mut backend);
//! ```

pub mod error;
pub mod light;
pub mod culling;
pub mod shadow;

pub use error::{ShadowError, Result};
pub use light::{LightHandle, LightKind, LightBaking, CasterBounds, VisibleLight};
pub use culling::{CameraView, CullingResults};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::ShadowError;
    pub use crate::light::*;
    pub use crate::culling::*;
    pub use crate::shadow::*;
}
