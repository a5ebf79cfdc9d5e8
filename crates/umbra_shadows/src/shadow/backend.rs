//! Shadow Command Stream
//!
//! The renderer never touches a graphics API. It emits an ordered stream of
//! `ShadowCommand`s to a `ShadowBackend`, which owns the render targets and
//! issues the actual caster draws. Published globals and keywords are handed
//! over once per frame at the end of `render`.

use glam::{Mat4, Vec4};
use serde::{Serialize, Deserialize};

use super::data::ShadowGlobals;
use super::keywords::ShadowKeywords;
use super::layout::PixelRect;
use crate::light::LightHandle;

/// The two shadow atlases bound for shading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtlasKind {
    Directional,
    Other,
}

/// Per-draw culling data handed to the caster draw
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowSplitData {
    /// World-space culling sphere (center, radius); zero for non-cascaded tiles
    pub culling_sphere: Vec4,
    /// Fraction of a caster's extent already covered by a smaller cascade
    /// before it may be culled from this one
    pub cascade_blend_culling_factor: f32,
}

/// Caster draw for one atlas tile
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowDrawRequest {
    pub atlas: AtlasKind,
    pub light: LightHandle,
    /// Index into the frame's visible-light list
    pub visible_index: usize,
    pub tile_index: u32,
    pub split_data: ShadowSplitData,
}

/// A single backend operation, in submission order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShadowCommand {
    /// Get a square depth target for an atlas
    AcquireAtlas { atlas: AtlasKind, size: u32 },

    /// Bind `atlas` to the same target as `target` instead of allocating one
    AliasAtlas { atlas: AtlasKind, target: AtlasKind },

    /// Make the atlas the current depth target and clear it
    BindAndClear(AtlasKind),

    /// Clamp casters in front of the near plane onto it
    SetPancaking(bool),

    SetViewport(PixelRect),

    SetViewProjection { view: Mat4, projection: Mat4 },

    /// Rasterizer depth bias; both zero resets it
    SetDepthBias { constant: f32, slope_scale: f32 },

    DrawShadows(ShadowDrawRequest),

    ReleaseAtlas(AtlasKind),
}

impl ShadowCommand {
    /// Create a depth bias reset command
    pub fn reset_depth_bias() -> Self {
        Self::SetDepthBias { constant: 0.0, slope_scale: 0.0 }
    }

    /// Check if this is a caster draw
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawShadows(_))
    }
}

/// Receiver of the renderer's command stream
pub trait ShadowBackend {
    /// Execute one command
    fn execute(&mut self, command: ShadowCommand);

    /// Publish the frame's shader-facing globals and keyword selection
    fn publish(&mut self, globals: &ShadowGlobals, keywords: &ShadowKeywords);
}

/// Backend that records everything it is given
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordingBackend {
    pub commands: Vec<ShadowCommand>,
    pub globals: Option<ShadowGlobals>,
    pub keywords: Option<ShadowKeywords>,
    acquired: Vec<AtlasKind>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recorded commands and published data; live atlases are kept
    pub fn clear(&mut self) {
        self.commands.clear();
        self.globals = None;
        self.keywords = None;
    }

    /// Recorded caster draws
    pub fn draws(&self) -> impl Iterator<Item = &ShadowDrawRequest> {
        self.commands.iter().filter_map(|command| match command {
            ShadowCommand::DrawShadows(draw) => Some(draw),
            _ => None,
        })
    }

    /// Recorded viewports, in order
    pub fn viewports(&self) -> impl Iterator<Item = &PixelRect> {
        self.commands.iter().filter_map(|command| match command {
            ShadowCommand::SetViewport(rect) => Some(rect),
            _ => None,
        })
    }

    /// Atlases acquired and not yet released
    pub fn live_atlases(&self) -> &[AtlasKind] {
        &self.acquired
    }
}

impl ShadowBackend for RecordingBackend {
    fn execute(&mut self, command: ShadowCommand) {
        match command {
            ShadowCommand::AcquireAtlas { atlas, .. } => self.acquired.push(atlas),
            ShadowCommand::ReleaseAtlas(atlas) => {
                if let Some(i) = self.acquired.iter().position(|a| *a == atlas) {
                    self.acquired.swap_remove(i);
                } else {
                    log::warn!("Released {:?} atlas that was never acquired", atlas);
                }
            }
            _ => {}
        }

        self.commands.push(command);
    }

    fn publish(&mut self, globals: &ShadowGlobals, keywords: &ShadowKeywords) {
        self.globals = Some(*globals);
        self.keywords = Some(*keywords);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_backend_tracks_atlases() {
        let mut backend = RecordingBackend::new();

        backend.execute(ShadowCommand::AcquireAtlas { atlas: AtlasKind::Directional, size: 1024 });
        backend.execute(ShadowCommand::AcquireAtlas { atlas: AtlasKind::Other, size: 512 });
        assert_eq!(backend.live_atlases().len(), 2);

        backend.execute(ShadowCommand::ReleaseAtlas(AtlasKind::Directional));
        assert_eq!(backend.live_atlases(), &[AtlasKind::Other]);

        backend.clear();
        assert!(backend.commands.is_empty());
        assert_eq!(backend.live_atlases().len(), 1);
    }

    #[test]
    fn test_recording_backend_draws() {
        let mut backend = RecordingBackend::new();
        let draw = ShadowDrawRequest {
            atlas: AtlasKind::Other,
            light: 7,
            visible_index: 2,
            tile_index: 3,
            split_data: ShadowSplitData::default(),
        };

        backend.execute(ShadowCommand::SetViewport(PixelRect { x: 0, y: 0, width: 256, height: 256 }));
        backend.execute(ShadowCommand::DrawShadows(draw));
        backend.execute(ShadowCommand::reset_depth_bias());

        assert_eq!(backend.draws().count(), 1);
        assert_eq!(backend.draws().next(), Some(&draw));
        assert_eq!(backend.viewports().count(), 1);
        assert!(backend.commands[1].is_draw());
        assert!(!backend.commands[2].is_draw());
    }

    #[test]
    fn test_publish_keeps_copy() {
        let mut backend = RecordingBackend::new();
        let mut globals = ShadowGlobals::new();
        globals.cascade_count = 2;

        backend.publish(&globals, &ShadowKeywords::default());

        assert_eq!(backend.globals.map(|g| g.cascade_count), Some(2));
        assert_eq!(backend.keywords, Some(ShadowKeywords::default()));
    }
}
