//! Shadow Atlas Renderer
//!
//! Owns the per-frame shadow state and drives both atlases end to end:
//!
//! 1. `setup` resets reservations and captures camera + settings
//! 2. `reserve_directional` / `reserve_other` once per visible light
//! 3. `render` draws every reserved tile through a `ShadowBackend` and
//!    publishes the shader globals
//! 4. `cleanup` releases the atlases
//!
//! Call order is tracked by `FrameState`. A violation is logged and asserted
//! in debug builds; release builds carry on as described on each method and
//! never keep an atlas past the next `render` or `cleanup`.

use glam::Mat4;

use super::backend::{AtlasKind, ShadowBackend, ShadowCommand, ShadowDrawRequest, ShadowSplitData};
use super::cascade::{self, MAX_CASCADES};
use super::config::ShadowSettings;
use super::convert::atlas_matrix;
use super::data::{AtlasPassStats, ShadowDataTable, ShadowFrameStats, ShadowGlobals};
use super::keywords::ShadowKeywords;
use super::layout::{TileLayout, TileViewport};
use super::ledger::{ShadowLedger, ShadowReservation, ShadowedOtherLight};
use super::punctual;
use super::state::{FrameOp, FrameState, FrameStateError};
use crate::culling::{CameraView, CullingResults};
use crate::error::ShadowError;
use crate::light::VisibleLight;

/// Size of the stand-in directional atlas when no directional light is shadowed
pub const PLACEHOLDER_ATLAS_SIZE: u32 = 1;

/// Schedules and renders the directional and other-light shadow atlases
#[derive(Clone, Debug, Default)]
pub struct ShadowAtlasRenderer {
    state: FrameState,
    settings: ShadowSettings,
    camera: CameraView,
    ledger: ShadowLedger,
    globals: ShadowGlobals,
    keywords: ShadowKeywords,
    other_atlas_acquired: bool,
    /// Atlases of an abandoned frame, released before the next draw
    pending_release: Vec<AtlasKind>,
    stats: ShadowFrameStats,
}

impl ShadowAtlasRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a frame: forget last frame's reservations and capture inputs.
    ///
    /// Settings are clamped to valid ranges on the renderer's copy. If the
    /// previous frame was rendered but never cleaned up, its atlases are
    /// released at the start of the next `render` or `cleanup`.
    pub fn setup(&mut self, culling: &CullingResults, settings: &ShadowSettings) {
        if let Err(err) = self.state.transition(FrameOp::Setup) {
            self.report(err);
        }

        if self.state.holds_atlases() {
            self.pending_release.push(AtlasKind::Directional);
            if self.other_atlas_acquired {
                self.pending_release.push(AtlasKind::Other);
            }
        }

        self.settings = settings.clone();
        self.settings.validate();
        self.camera = culling.camera;
        self.ledger.reset();
        self.other_atlas_acquired = false;
        self.state = FrameState::Setup;

        log::trace!("Shadow setup: {} visible lights", culling.visible_lights.len());
    }

    /// Reserve cascaded tiles for a directional light.
    ///
    /// Outside the reservation window the light gets `NoShadow`.
    pub fn reserve_directional(&mut self, light: &VisibleLight, visible_index: usize) -> ShadowReservation {
        if !self.enter_reserve() {
            return ShadowReservation::NoShadow;
        }
        self.ledger.reserve_directional(light, visible_index, self.settings.directional.cascade_count)
    }

    /// Reserve tiles for a spot or point light.
    ///
    /// Outside the reservation window the light gets `NoShadow`.
    pub fn reserve_other(&mut self, light: &VisibleLight, visible_index: usize) -> ShadowReservation {
        if !self.enter_reserve() {
            return ShadowReservation::NoShadow;
        }
        self.ledger.reserve_other(light, visible_index)
    }

    /// Reserve every visible light in culling order and record the encoded
    /// results, the way the lighting uploader walks the culling results.
    ///
    /// Returns one reservation per light. Outside the reservation window the
    /// violation is reported once and every light gets `NoShadow`.
    pub fn reserve_visible_lights(&mut self, lights: &[VisibleLight], table: &mut ShadowDataTable) -> Vec<ShadowReservation> {
        table.clear();

        let accepting = self.state.accepts_reservations();
        if !accepting {
            if let Err(err) = self.state.transition(FrameOp::Reserve) {
                self.report(err);
            }
        }

        let mut reservations = Vec::with_capacity(lights.len());
        for (visible_index, light) in lights.iter().enumerate() {
            let directional = light.kind.is_directional();
            let reservation = match (accepting, directional) {
                (false, _) => ShadowReservation::NoShadow,
                (true, true) => self.reserve_directional(light, visible_index),
                (true, false) => self.reserve_other(light, visible_index),
            };

            let slot = if directional {
                table.push_directional(&reservation)
            } else {
                table.push_other(&reservation)
            };
            if slot.is_none() {
                log::trace!("No shading slot for light {}", light.handle);
            }
            reservations.push(reservation);
        }
        reservations
    }

    /// Draw all reserved tiles and publish the shader globals.
    ///
    /// Rendering twice without a cleanup in between does nothing and returns
    /// the previous statistics, so held atlases are never acquired again.
    pub fn render(&mut self, backend: &mut impl ShadowBackend) -> ShadowFrameStats {
        if let Err(err) = self.state.transition(FrameOp::Render) {
            self.report(err);
            if self.state.holds_atlases() {
                return self.stats;
            }
        }
        self.release_pending(backend);
        self.state = FrameState::Rendering;

        self.globals = ShadowGlobals::new();
        let mut stats = ShadowFrameStats::default();

        if self.ledger.directional_count() > 0 {
            stats.directional = self.render_directional(backend);
            let size = stats.directional.atlas_size as f32;
            self.globals.atlas_size[0] = size;
            self.globals.atlas_size[1] = 1.0 / size;
            self.globals.cascade_count = self.settings.directional.cascade_count;
        } else {
            // Shading always samples a directional atlas
            backend.execute(ShadowCommand::AcquireAtlas {
                atlas: AtlasKind::Directional,
                size: PLACEHOLDER_ATLAS_SIZE,
            });
            stats.directional.atlas_size = PLACEHOLDER_ATLAS_SIZE;
            stats.directional_placeholder = true;
        }

        if self.ledger.other_tile_count() > 0 {
            stats.other = self.render_other(backend);
            let size = stats.other.atlas_size as f32;
            self.globals.atlas_size[2] = size;
            self.globals.atlas_size[3] = 1.0 / size;
            self.other_atlas_acquired = true;
        } else {
            backend.execute(ShadowCommand::AliasAtlas {
                atlas: AtlasKind::Other,
                target: AtlasKind::Directional,
            });
            stats.other_aliased = true;
        }

        self.globals.distance_fade = cascade::distance_fade(&self.settings).to_array();
        self.keywords = ShadowKeywords::select(&self.settings, self.ledger.use_shadow_mask());
        backend.publish(&self.globals, &self.keywords);

        log::debug!(
            "Shadows rendered: {} directional tiles (split {}), {} other tiles (split {}), {} draws",
            stats.directional.tiles,
            stats.directional.split,
            stats.other.tiles,
            stats.other.split,
            stats.total_draw_calls()
        );

        self.stats = stats;
        self.state = FrameState::Rendered;
        stats
    }

    /// Release the frame's atlases and return to idle.
    ///
    /// Without a preceding `render` there is nothing to release.
    pub fn cleanup(&mut self, backend: &mut impl ShadowBackend) {
        let holds_atlases = self.state.holds_atlases();
        if let Err(err) = self.state.transition(FrameOp::Cleanup) {
            self.report(err);
        }
        self.release_pending(backend);

        if holds_atlases {
            backend.execute(ShadowCommand::ReleaseAtlas(AtlasKind::Directional));
            if self.other_atlas_acquired {
                backend.execute(ShadowCommand::ReleaseAtlas(AtlasKind::Other));
            }
        }

        self.other_atlas_acquired = false;
        self.state = FrameState::Idle;
    }

    fn render_directional(&mut self, backend: &mut impl ShadowBackend) -> AtlasPassStats {
        let Self { settings, camera, ledger, globals, .. } = self;
        let dir = &settings.directional;

        let atlas_size = dir.atlas_size.texels();
        backend.execute(ShadowCommand::AcquireAtlas { atlas: AtlasKind::Directional, size: atlas_size });
        backend.execute(ShadowCommand::BindAndClear(AtlasKind::Directional));
        backend.execute(ShadowCommand::SetPancaking(true));

        let cascade_count = dir.cascade_count.clamp(1, MAX_CASCADES as u32) as usize;
        let tiles = ledger.directional_count() * cascade_count;
        let layout = TileLayout::new(atlas_size, tiles);
        let distances = cascade::cascade_distances(camera, settings.max_distance, dir.cascade_count, dir.cascade_ratios());
        let culling_factor = cascade::cascade_blend_culling_factor(dir.cascade_fade);

        let mut draw_calls = 0;
        for (index, light) in ledger.directional_lights().iter().enumerate() {
            let tile_offset = index * cascade_count;

            for cascade_index in 0..cascade_count {
                let plan = cascade::plan_cascade(
                    camera,
                    light.direction,
                    cascade_index,
                    &distances,
                    layout.tile_size,
                    light.near_plane_offset,
                );

                // Shading uses the first light's cascades for every directional light
                if index == 0 {
                    let (sphere, data) = cascade::cascade_culling_data(plan.culling_sphere, layout.tile_size, dir.filter);
                    globals.set_cascade(cascade_index, sphere, data);
                }

                let tile_index = tile_offset + cascade_index;
                let viewport = layout.viewport(tile_index);
                globals.set_directional_matrix(
                    tile_index,
                    atlas_matrix(plan.clip_from_world(), viewport.offset, layout.split, settings.depth),
                );

                log::trace!("Directional light {} cascade {} -> tile {}", light.handle, cascade_index, tile_index);

                draw_tile(
                    backend,
                    &viewport,
                    plan.view,
                    plan.projection,
                    (light.depth_bias, light.slope_scale_bias),
                    ShadowDrawRequest {
                        atlas: AtlasKind::Directional,
                        light: light.handle,
                        visible_index: light.visible_index,
                        tile_index: tile_index as u32,
                        split_data: ShadowSplitData {
                            culling_sphere: plan.culling_sphere,
                            cascade_blend_culling_factor: culling_factor,
                        },
                    },
                );
                draw_calls += 1;
            }
        }

        AtlasPassStats {
            atlas_size,
            tiles: tiles as u32,
            split: layout.split,
            tile_size: layout.tile_size,
            draw_calls,
        }
    }

    fn render_other(&mut self, backend: &mut impl ShadowBackend) -> AtlasPassStats {
        let Self { settings, ledger, globals, .. } = self;

        let atlas_size = settings.other.atlas_size.texels();
        backend.execute(ShadowCommand::AcquireAtlas { atlas: AtlasKind::Other, size: atlas_size });
        backend.execute(ShadowCommand::BindAndClear(AtlasKind::Other));
        backend.execute(ShadowCommand::SetPancaking(false));

        let tiles = ledger.other_tile_count();
        let layout = TileLayout::new(atlas_size, tiles);
        let pass = OtherPass {
            layout,
            atlas_texel: 1.0 / atlas_size as f32,
            settings,
        };

        let mut draw_calls = 0;
        for (tile, light) in ledger.other_lights() {
            draw_calls += if light.is_point {
                pass.render_point(backend, globals, tile, light)
            } else {
                pass.render_spot(backend, globals, tile, light)
            };
        }

        AtlasPassStats {
            atlas_size,
            tiles: tiles as u32,
            split: layout.split,
            tile_size: layout.tile_size,
            draw_calls,
        }
    }

    /// Move into the reservation window, reporting if that is not allowed
    fn enter_reserve(&mut self) -> bool {
        match self.state.transition(FrameOp::Reserve) {
            Ok(next) => {
                self.state = next;
                true
            }
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    fn release_pending(&mut self, backend: &mut impl ShadowBackend) {
        for atlas in self.pending_release.drain(..) {
            log::warn!("Releasing {:?} atlas left over from an unfinished frame", atlas);
            backend.execute(ShadowCommand::ReleaseAtlas(atlas));
        }
    }

    fn report(&self, err: FrameStateError) {
        let err = ShadowError::from(err);
        log::error!("{}", err);
        debug_assert!(false, "{err}");
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Settings captured at `setup`, after clamping
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &ShadowLedger {
        &self.ledger
    }

    /// Globals published by the last `render`
    pub fn globals(&self) -> &ShadowGlobals {
        &self.globals
    }

    pub fn keywords(&self) -> &ShadowKeywords {
        &self.keywords
    }

    /// Statistics of the last `render`
    pub fn stats(&self) -> &ShadowFrameStats {
        &self.stats
    }
}

/// Shared inputs for drawing the tiles of the other-light atlas
struct OtherPass<'a> {
    layout: TileLayout,
    atlas_texel: f32,
    settings: &'a ShadowSettings,
}

impl OtherPass<'_> {
    fn render_spot(
        &self,
        backend: &mut impl ShadowBackend,
        globals: &mut ShadowGlobals,
        tile: usize,
        light: &ShadowedOtherLight,
    ) -> u32 {
        let plan = punctual::spot_matrices(light.position, light.direction, light.spot_angle, light.range, light.near_plane);
        let normal_bias = punctual::spot_normal_bias(
            &plan.projection,
            self.layout.tile_size,
            self.settings.other.filter,
            light.normal_bias,
        );

        let viewport = self.layout.viewport(tile);
        self.publish_tile(globals, tile, &viewport, plan.clip_from_world(), normal_bias);

        log::trace!("Spot light {} -> tile {}", light.handle, tile);

        draw_tile(
            backend,
            &viewport,
            plan.view,
            plan.projection,
            (light.depth_bias, light.slope_scale_bias),
            self.draw_request(light, tile),
        );
        1
    }

    fn render_point(
        &self,
        backend: &mut impl ShadowBackend,
        globals: &mut ShadowGlobals,
        first_tile: usize,
        light: &ShadowedOtherLight,
    ) -> u32 {
        let bias = punctual::point_bias(self.layout.tile_size, self.settings.other.filter, light.normal_bias);
        let mut draw_calls = 0;

        for face in 0..punctual::CUBE_FACES.len() {
            let tile = first_tile + face;
            let plan = punctual::point_face_matrices(light.position, face, bias.fov_bias, light.range, light.near_plane);

            let viewport = self.layout.viewport(tile);
            self.publish_tile(globals, tile, &viewport, plan.clip_from_world(), bias.normal_bias);

            log::trace!("Point light {} face {} -> tile {}", light.handle, face, tile);

            draw_tile(
                backend,
                &viewport,
                plan.view,
                plan.projection,
                (light.depth_bias, light.slope_scale_bias),
                self.draw_request(light, tile),
            );
            draw_calls += 1;
        }

        draw_calls
    }

    fn publish_tile(
        &self,
        globals: &mut ShadowGlobals,
        tile: usize,
        viewport: &TileViewport,
        clip_from_world: Mat4,
        normal_bias: f32,
    ) {
        let scale = self.layout.tile_scale();
        globals.set_other_tile(
            tile,
            punctual::other_tile_data(viewport.offset, scale, self.atlas_texel, normal_bias),
        );
        globals.set_other_matrix(
            tile,
            atlas_matrix(clip_from_world, viewport.offset, self.layout.split, self.settings.depth),
        );
    }

    fn draw_request(&self, light: &ShadowedOtherLight, tile: usize) -> ShadowDrawRequest {
        ShadowDrawRequest {
            atlas: AtlasKind::Other,
            light: light.handle,
            visible_index: light.visible_index,
            tile_index: tile as u32,
            split_data: ShadowSplitData::default(),
        }
    }
}

/// Emit the commands for one tile: viewport, camera, biased draw, bias reset
fn draw_tile(
    backend: &mut impl ShadowBackend,
    viewport: &TileViewport,
    view: Mat4,
    projection: Mat4,
    (depth_bias, slope_bias): (f32, f32),
    request: ShadowDrawRequest,
) {
    backend.execute(ShadowCommand::SetViewport(viewport.rect));
    backend.execute(ShadowCommand::SetViewProjection { view, projection });
    backend.execute(ShadowCommand::SetDepthBias { constant: depth_bias, slope_scale: slope_bias });
    backend.execute(ShadowCommand::DrawShadows(request));
    backend.execute(ShadowCommand::reset_depth_bias());
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    use crate::light::{CasterBounds, LightBaking};
    use crate::shadow::backend::RecordingBackend;
    use crate::shadow::config::{AtlasSize, LightShadowSettings};
    use crate::shadow::layout::PixelRect;

    fn bounds() -> CasterBounds {
        CasterBounds::new(Vec3::splat(-5.0), Vec3::splat(5.0))
    }

    fn sun(handle: u64) -> VisibleLight {
        VisibleLight::directional(handle, Vec3::new(0.3, -1.0, 0.2))
            .with_shadows(LightShadowSettings::soft().with_bias(0.5, 2.0, 0.4))
            .with_caster_bounds(bounds())
    }

    fn spot(handle: u64) -> VisibleLight {
        VisibleLight::spot(handle, Vec3::new(0.0, 4.0, 0.0), Vec3::NEG_Y, 15.0, 50.0)
            .with_shadows(LightShadowSettings::hard())
            .with_caster_bounds(bounds())
    }

    fn point(handle: u64) -> VisibleLight {
        VisibleLight::point(handle, Vec3::new(2.0, 3.0, 1.0), 8.0)
            .with_shadows(LightShadowSettings::hard())
            .with_caster_bounds(bounds())
    }

    fn culling() -> CullingResults {
        CullingResults::new(CameraView::looking_at(
            Vec3::new(0.0, 5.0, 10.0),
            Vec3::ZERO,
            60f32.to_radians(),
            16.0 / 9.0,
            0.3,
            500.0,
        ))
    }

    #[test]
    fn test_empty_frame_uses_placeholder_and_alias() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();

        renderer.setup(&culling(), &ShadowSettings::default());
        let stats = renderer.render(&mut backend);

        assert!(stats.directional_placeholder);
        assert!(stats.other_aliased);
        assert_eq!(stats.total_draw_calls(), 0);
        assert_eq!(
            backend.commands,
            vec![
                ShadowCommand::AcquireAtlas { atlas: AtlasKind::Directional, size: 1 },
                ShadowCommand::AliasAtlas { atlas: AtlasKind::Other, target: AtlasKind::Directional },
            ]
        );

        let globals = backend.globals.unwrap();
        assert_eq!(globals.cascade_count, 0);
        assert_eq!(globals.atlas_size, [0.0; 4]);

        renderer.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
        assert_eq!(renderer.state(), FrameState::Idle);
    }

    #[test]
    fn test_directional_pass_commands() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 2;

        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();

        renderer.setup(&culling(), &settings);
        renderer.reserve_directional(&sun(1), 0);
        let stats = renderer.render(&mut backend);

        assert_eq!(stats.directional.tiles, 2);
        assert_eq!(stats.directional.split, 2);
        assert_eq!(stats.directional.tile_size, 512);

        assert_eq!(backend.commands[0], ShadowCommand::AcquireAtlas { atlas: AtlasKind::Directional, size: 1024 });
        assert_eq!(backend.commands[1], ShadowCommand::BindAndClear(AtlasKind::Directional));
        assert_eq!(backend.commands[2], ShadowCommand::SetPancaking(true));
        assert_eq!(backend.commands[3], ShadowCommand::SetViewport(PixelRect { x: 0, y: 0, width: 512, height: 512 }));
        assert_eq!(backend.commands[5], ShadowCommand::SetDepthBias { constant: 0.5, slope_scale: 2.0 });
        assert!(backend.commands[6].is_draw());
        assert_eq!(backend.commands[7], ShadowCommand::reset_depth_bias());

        let viewports: Vec<_> = backend.viewports().map(|r| (r.x, r.y)).collect();
        assert_eq!(viewports, vec![(0, 0), (512, 0)]);

        let factor = cascade::cascade_blend_culling_factor(settings.directional.cascade_fade);
        for draw in backend.draws() {
            assert_eq!(draw.atlas, AtlasKind::Directional);
            assert!(draw.split_data.culling_sphere.w > 0.0);
            assert_eq!(draw.split_data.cascade_blend_culling_factor, factor);
        }

        let globals = backend.globals.unwrap();
        assert_eq!(globals.cascade_count, 2);
        assert_eq!(globals.atlas_size, [1024.0, 1.0 / 1024.0, 0.0, 0.0]);
        assert!(globals.cascade_culling_spheres[1][3] > globals.cascade_culling_spheres[0][3]);
        assert_eq!(globals.cascade_culling_spheres[2], [0.0; 4]);
    }

    #[test]
    fn test_first_light_owns_cascade_spheres() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();

        let mut frame = |second: VisibleLight| {
            backend.clear();
            renderer.setup(&culling(), &ShadowSettings::default());
            renderer.reserve_directional(&sun(1), 0);
            renderer.reserve_directional(&second, 1);
            renderer.render(&mut backend);
            renderer.cleanup(&mut backend);
            backend.globals.unwrap()
        };

        let a = frame(
            VisibleLight::directional(2, Vec3::new(-1.0, -0.2, 0.0))
                .with_shadows(LightShadowSettings::soft())
                .with_caster_bounds(bounds()),
        );
        let b = frame(
            VisibleLight::directional(3, Vec3::new(0.0, -0.5, 1.0))
                .with_shadows(LightShadowSettings::soft())
                .with_caster_bounds(bounds()),
        );

        // Only the first light shapes the shared cascade data
        assert_eq!(a.cascade_culling_spheres, b.cascade_culling_spheres);
        assert_eq!(a.cascade_data, b.cascade_data);
        assert_ne!(a.directional_matrices[4], b.directional_matrices[4]);
        assert!(Vec4::from_array(a.cascade_culling_spheres[3]).w > 0.0);
    }

    #[test]
    fn test_other_pass_spot_and_point() {
        let mut settings = ShadowSettings::default();
        settings.other.atlas_size = AtlasSize::_2048;

        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();

        renderer.setup(&culling(), &settings);
        assert!(renderer.reserve_other(&spot(1), 0).is_live());
        assert!(renderer.reserve_other(&point(2), 1).is_live());
        let stats = renderer.render(&mut backend);

        assert!(stats.directional_placeholder);
        assert!(!stats.other_aliased);
        assert_eq!(stats.other.tiles, 7);
        assert_eq!(stats.other.split, 4);
        assert_eq!(stats.other.tile_size, 512);
        assert_eq!(stats.other.draw_calls, 7);

        assert!(backend.commands.contains(&ShadowCommand::SetPancaking(false)));

        let tiles: Vec<(u64, u32)> = backend.draws().map(|d| (d.light, d.tile_index)).collect();
        assert_eq!(tiles, vec![(1, 0), (2, 1), (2, 2), (2, 3), (2, 4), (2, 5), (2, 6)]);

        let globals = backend.globals.unwrap();
        assert_eq!(globals.atlas_size[2], 2048.0);
        assert_eq!(globals.atlas_size[0], 0.0);

        // Tile 5 sits at (1, 1) in a 4×4 grid
        let border = 0.5 / 2048.0;
        let tile = globals.other_tiles[5];
        assert!((tile[0] - (0.25 + border)).abs() < 1e-6);
        assert!((tile[1] - (0.25 + border)).abs() < 1e-6);
        assert!((tile[2] - (0.25 - 2.0 * border)).abs() < 1e-6);
        assert!(tile[3] > 0.0);

        renderer.cleanup(&mut backend);
        assert!(backend.live_atlases().is_empty());
    }

    #[test]
    fn test_reserve_visible_lights_fills_table() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut table = ShadowDataTable::new();
        let lights = [
            sun(1),
            spot(2).with_baking(LightBaking::MixedShadowmask { channel: 3 }),
            point(3),
        ];

        renderer.setup(&culling(), &ShadowSettings::default());
        renderer.reserve_visible_lights(&lights, &mut table);

        assert_eq!(table.directional(), &[[1.0, 0.0, 0.4, -1.0]]);
        assert_eq!(table.other(), &[[1.0, 0.0, 0.0, 3.0], [1.0, 1.0, 1.0, -1.0]]);
        assert!(renderer.ledger().use_shadow_mask());
        assert_eq!(renderer.state(), FrameState::Reserving);
    }

    #[test]
    fn test_settings_clamped_at_setup() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 9;

        let mut renderer = ShadowAtlasRenderer::new();
        renderer.setup(&culling(), &settings);

        assert_eq!(renderer.settings().directional.cascade_count, 4);
        let reservation = renderer.reserve_directional(&sun(1), 0);
        let reservation2 = renderer.reserve_directional(&sun(2), 1);
        assert!(reservation.is_live());
        assert_eq!(reservation2.encode()[1], 4.0);
    }

    #[test]
    fn test_frames_are_independent() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();

        renderer.setup(&culling(), &ShadowSettings::default());
        renderer.reserve_other(&point(1), 0);
        renderer.reserve_other(&point(2), 1);
        renderer.render(&mut backend);
        renderer.cleanup(&mut backend);

        renderer.setup(&culling(), &ShadowSettings::default());
        assert_eq!(renderer.ledger().other_tile_count(), 0);
        let reservation = renderer.reserve_other(&spot(3), 0);
        assert_eq!(reservation.encode()[1], 0.0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "Reserve is not valid while the frame is Idle")]
    fn test_reserve_before_setup_panics_in_debug() {
        let mut renderer = ShadowAtlasRenderer::new();
        renderer.reserve_other(&spot(1), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "Frame call order violated: Reserve is not valid while the frame is Idle")]
    fn test_reserve_visible_lights_before_setup_panics_in_debug() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut table = ShadowDataTable::new();
        renderer.reserve_visible_lights(&[spot(1), sun(2)], &mut table);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "Cleanup is not valid while the frame is Reserving")]
    fn test_cleanup_before_render_panics_in_debug() {
        let mut renderer = ShadowAtlasRenderer::new();
        let mut backend = RecordingBackend::new();
        renderer.setup(&culling(), &ShadowSettings::default());
        renderer.reserve_directional(&sun(1), 0);
        renderer.cleanup(&mut backend);
    }
}
