//! Shadow Atlas Trace
//!
//! Plays the frame orchestrator for a scene description: runs setup,
//! reservation, rendering and cleanup against a recording backend, then logs
//! the reservations, the command stream and the published shader globals.
//!
//! Usage: cargo run -p atlas-trace [scene.json] [frames]
//!
//! Set `RUST_LOG=debug` to see every backend command.

use std::error::Error;
use std::fs;

use glam::Vec3;
use serde::{Serialize, Deserialize};

use umbra_shadows::prelude::*;

/// Camera as written in scene files
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SceneCamera {
    eye: Vec3,
    target: Vec3,
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 25.0),
            target: Vec3::ZERO,
            fov_y_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Scene {
    #[serde(default)]
    camera: SceneCamera,
    #[serde(default)]
    settings: ShadowSettings,
    lights: Vec<VisibleLight>,
}

impl Scene {
    fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let json = fs::read_to_string(path)?;
        let mut scene: Scene = serde_json::from_str(&json)?;
        scene.settings.validate();
        Ok(scene)
    }

    /// Two suns, a point light and more spot lights than the atlas holds
    fn builtin() -> Self {
        let bounds = CasterBounds::new(Vec3::new(-30.0, 0.0, -30.0), Vec3::new(30.0, 10.0, 30.0));

        let mut lights = vec![
            VisibleLight::directional(1, Vec3::new(0.4, -1.0, 0.25))
                .with_shadows(LightShadowSettings::soft().with_bias(0.0, 2.0, 0.5))
                .with_caster_bounds(bounds),
            VisibleLight::directional(2, Vec3::new(-0.6, -0.7, 0.1))
                .with_shadows(LightShadowSettings::hard().with_strength(0.5))
                .with_caster_bounds(bounds),
            VisibleLight::point(3, Vec3::new(2.0, 4.0, 0.0), 12.0)
                .with_shadows(LightShadowSettings::hard())
                .with_caster_bounds(bounds)
                .with_baking(LightBaking::MixedShadowmask { channel: 1 }),
        ];

        for i in 0..12u64 {
            let angle = i as f32 * 0.5;
            let position = Vec3::new(angle.cos() * 15.0, 6.0, angle.sin() * 15.0);
            lights.push(
                VisibleLight::spot(10 + i, position, Vec3::NEG_Y, 20.0, 40.0 + i as f32 * 2.0)
                    .with_shadows(LightShadowSettings::soft())
                    .with_caster_bounds(bounds),
            );
        }

        Self {
            camera: SceneCamera::default(),
            settings: ShadowSettings::default(),
            lights,
        }
    }

    fn culling(&self) -> CullingResults {
        let c = &self.camera;
        CullingResults {
            camera: CameraView::looking_at(c.eye, c.target, c.fov_y_degrees.to_radians(), c.aspect, c.near, c.far),
            visible_lights: self.lights.clone(),
        }
    }
}

fn describe(reservation: &ShadowReservation) -> String {
    match reservation {
        ShadowReservation::NoShadow => "no shadow".to_string(),
        ShadowReservation::MaskOnly { mask_channel, .. } => format!("baked mask only (channel {:?})", mask_channel),
        ShadowReservation::Directional { tile_offset, .. } => format!("cascades from tile {}", tile_offset),
        ShadowReservation::Other { tile_index, is_point: true, .. } => {
            format!("cube faces in tiles {}..{}", tile_index, tile_index + POINT_LIGHT_TILES as u32)
        }
        ShadowReservation::Other { tile_index, .. } => format!("tile {}", tile_index),
    }
}

fn run_frame(
    renderer: &mut ShadowAtlasRenderer,
    backend: &mut RecordingBackend,
    table: &mut ShadowDataTable,
    scene: &Scene,
    culling: &CullingResults,
) -> (ShadowFrameStats, Vec<ShadowReservation>) {
    backend.clear();
    renderer.setup(culling, &scene.settings);
    let reservations = renderer.reserve_visible_lights(&culling.visible_lights, table);
    let stats = renderer.render(backend);

    for command in &backend.commands {
        log::debug!("{:?}", command);
    }

    renderer.cleanup(backend);
    (stats, reservations)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scene = match args.next() {
        Some(path) => {
            log::info!("Loading scene from {}", path);
            Scene::load(&path)?
        }
        None => {
            log::info!("No scene given, using the built-in scene");
            Scene::builtin()
        }
    };
    let frames: u32 = match args.next() {
        Some(n) => n.parse()?,
        None => 1,
    };

    let culling = scene.culling();
    let mut renderer = ShadowAtlasRenderer::new();
    let mut backend = RecordingBackend::new();
    let mut table = ShadowDataTable::new();

    let mut stats = ShadowFrameStats::default();
    let mut reservations = Vec::new();
    for _ in 0..frames {
        (stats, reservations) = run_frame(&mut renderer, &mut backend, &mut table, &scene, &culling);
    }

    log::info!("");
    log::info!("=== Reservations ===");
    for (light, reservation) in scene.lights.iter().zip(&reservations) {
        log::info!(
            "Light {:>3} {:?}: {} {:?}",
            light.handle,
            light.kind,
            describe(reservation),
            reservation.encode()
        );
    }
    log::info!(
        "Shading slots used: {} directional, {} other",
        table.directional().len(),
        table.other().len()
    );

    log::info!("");
    log::info!("=== Atlases ===");
    if stats.directional_placeholder {
        log::info!("Directional: 1x1 placeholder");
    } else {
        log::info!(
            "Directional: {}px, {} tiles in a {}x{} grid of {}px",
            stats.directional.atlas_size,
            stats.directional.tiles,
            stats.directional.split,
            stats.directional.split,
            stats.directional.tile_size
        );
    }
    if stats.other_aliased {
        log::info!("Other: aliased to the directional atlas");
    } else {
        log::info!(
            "Other: {}px, {} tiles in a {}x{} grid of {}px",
            stats.other.atlas_size,
            stats.other.tiles,
            stats.other.split,
            stats.other.split,
            stats.other.tile_size
        );
    }
    log::info!("Draw calls: {}", stats.total_draw_calls());

    log::info!("");
    log::info!("=== Shader globals ===");
    let globals = renderer.globals();
    log::info!("Cascade count: {}", globals.cascade_count);
    log::info!("Atlas size: {:?}", globals.atlas_size);
    log::info!("Distance fade: {:?}", globals.distance_fade);
    for cascade in 0..globals.cascade_count as usize {
        log::info!(
            "Cascade {}: sphere {:?}, data {:?}",
            cascade,
            globals.cascade_culling_spheres[cascade],
            globals.cascade_data[cascade]
        );
    }
    log::info!("Uniform block: {} bytes", globals.as_bytes().len());

    let keywords = renderer.keywords();
    log::info!("Keywords: {:?}", keywords.enabled());
    log::debug!("Shader header:\n{}", keywords.generate_header());

    Ok(())
}
