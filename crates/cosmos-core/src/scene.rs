//! Interactive 3D scene: globe, constellation, lights and click glows.
//!
//! [`SceneState`] is plain data advanced by the frame clock. [`SceneRenderer`]
//! pairs it with an optional [`RenderBackend`]; without one the renderer is
//! inert and every call is a cheap no-op.

use crate::camera::{pixel_to_ndc, ray_sphere, OrbitCamera};
use crate::constants::*;
use crate::easing::Easing;
use crate::error::{CosmosError, Result};
use crate::particles::{Bounds, Constellation};
use crate::timeline::{Position, Property, TargetId, Timeline, TimelineEngine, Tween};
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;
use smallvec::SmallVec;
use std::f32::consts::{PI, TAU};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    pub globe_radius: f32,
    pub globe_segments: u32,
    pub star_count: usize,
    pub edge_attempts: usize,
    pub shell_variance: f32,
    /// Idle spin in radians per second.
    pub globe_spin: f32,
    pub constellation_spin: f32,
    pub glow_radius: f32,
    pub glow_duration_sec: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            globe_radius: GLOBE_RADIUS,
            globe_segments: GLOBE_SEGMENTS,
            star_count: CONSTELLATION_STARS,
            edge_attempts: CONSTELLATION_EDGES,
            shell_variance: CONSTELLATION_SHELL_VARIANCE,
            globe_spin: per_second(GLOBE_SPIN_PER_FRAME),
            constellation_spin: per_second(CONSTELLATION_SPIN_PER_FRAME),
            glow_radius: GLOW_RADIUS,
            glow_duration_sec: GLOW_DURATION_SEC,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Globe {
    pub radius: f32,
    pub segments: u32,
    pub rotation_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    Point { position: Vec3, intensity: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlowId(pub u32);

const GLOW_TARGET: TargetId = TargetId(0);

/// Transient highlight at a picked point, animated by a one-shot timeline.
#[derive(Clone, Debug)]
pub struct Glow {
    pub id: GlowId,
    pub position: Vec3,
    pub radius: f32,
    engine: TimelineEngine,
}

impl Glow {
    pub fn scale(&self) -> f32 {
        self.engine
            .timeline()
            .evaluate(self.engine.cursor())
            .get(GLOW_TARGET, Property::Scale)
            .unwrap_or(1.0)
    }

    pub fn opacity(&self) -> f32 {
        self.engine
            .timeline()
            .evaluate(self.engine.cursor())
            .get(GLOW_TARGET, Property::Opacity)
            .unwrap_or(0.0)
    }

    pub fn is_finished(&self) -> bool {
        self.engine.complete()
    }
}

/// Scale 1→2 and fade 0.5→0, both `power2.out`.
pub fn glow_timeline(duration_sec: f32) -> Result<Timeline> {
    let tween = Tween::new(duration_sec).ease(Easing::POWER2_OUT);
    Timeline::builder()
        .from_to(
            &[GLOW_TARGET],
            &[
                (Property::Scale, 1.0, GLOW_END_SCALE),
                (Property::Opacity, GLOW_START_OPACITY, 0.0),
            ],
            tween,
            Position::At(0.0),
        )
        .build()
}

/// Ray hit on the primary mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    pub distance: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub globe_model: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub globe_color: [f32; 4],
    pub edge_color: [f32; 4],
    /// x = ambient intensity, y = point intensity.
    pub lights: [f32; 4],
    pub light_pos: [f32; 4],
}

/// Camera-facing disc: constellation stars and glows.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

/// Line-list vertex; `model` 0 = globe space, 1 = already in world space.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub model: f32,
}

/// Everything a backend needs to draw one frame.
pub struct SceneFrame<'a> {
    pub uniforms: SceneUniforms,
    pub sprites: &'a [SpriteInstance],
    pub edges: &'a [LineVertex],
}

/// Latitude rings and meridians of a sphere, as a line list in globe space.
pub fn wireframe_sphere(radius: f32, segments: u32) -> Vec<LineVertex> {
    let n = segments.max(3);
    let point = |polar: f32, azimuth: f32| LineVertex {
        position: [
            radius * polar.sin() * azimuth.cos(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.sin(),
        ],
        model: 0.0,
    };
    let mut out = Vec::with_capacity((n * n * 4) as usize);
    for ring in 1..n {
        let polar = PI * ring as f32 / n as f32;
        for s in 0..n {
            let a0 = TAU * s as f32 / n as f32;
            let a1 = TAU * (s + 1) as f32 / n as f32;
            out.push(point(polar, a0));
            out.push(point(polar, a1));
        }
    }
    for s in 0..n {
        let azimuth = TAU * s as f32 / n as f32;
        for ring in 0..n {
            out.push(point(PI * ring as f32 / n as f32, azimuth));
            out.push(point(PI * (ring + 1) as f32 / n as f32, azimuth));
        }
    }
    out
}

/// Scene graph owned by the frame clock.
#[derive(Clone, Debug)]
pub struct SceneState {
    config: SceneConfig,
    camera: OrbitCamera,
    lights: SmallVec<[Light; 2]>,
    globe: Option<Globe>,
    constellation: Constellation,
    constellation_rotation_y: f32,
    glows: Vec<Glow>,
    glow_template: Option<Timeline>,
    next_glow: u32,
}

impl SceneState {
    /// Camera and lights only; nothing to pick.
    pub fn empty(config: SceneConfig) -> Self {
        let glow_template = match glow_timeline(config.glow_duration_sec) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("[scene] glow disabled: {e}");
                None
            }
        };
        Self {
            config,
            camera: OrbitCamera::default(),
            lights: SmallVec::from_buf([
                Light::Ambient {
                    intensity: AMBIENT_INTENSITY,
                },
                Light::Point {
                    position: POINT_LIGHT_POSITION,
                    intensity: POINT_LIGHT_INTENSITY,
                },
            ]),
            globe: None,
            constellation: Constellation::default(),
            constellation_rotation_y: 0.0,
            glows: Vec::new(),
            glow_template,
            next_glow: 0,
        }
    }

    /// Globe plus a seeded constellation shell around it.
    pub fn build(config: SceneConfig, rng: &mut impl Rng) -> Result<Self> {
        let mut scene = Self::empty(config);
        scene.constellation = Constellation::seed(
            config.star_count,
            config.edge_attempts,
            Bounds::Shell {
                radius: config.globe_radius,
                variance: config.shell_variance,
            },
            rng,
        )?;
        scene.set_globe(Some(Globe {
            radius: config.globe_radius,
            segments: config.globe_segments,
            rotation_y: 0.0,
        }));
        Ok(scene)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn globe(&self) -> Option<&Globe> {
        self.globe.as_ref()
    }

    pub fn set_globe(&mut self, globe: Option<Globe>) {
        self.globe = globe;
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    pub fn constellation_mut(&mut self) -> &mut Constellation {
        &mut self.constellation
    }

    pub fn constellation_rotation(&self) -> f32 {
        self.constellation_rotation_y
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn orbit_drag(&mut self, delta_px: Vec2, surface_height: f32) {
        self.camera.drag(delta_px, surface_height);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.camera.camera.set_viewport(width, height);
    }

    pub fn glows(&self) -> &[Glow] {
        &self.glows
    }

    /// Advance idle spin, orbit damping and glow timelines; returns the
    /// glows reaped this frame.
    pub fn advance(&mut self, dt: Duration) -> SmallVec<[GlowId; 2]> {
        let dt_sec = dt.as_secs_f32();
        if let Some(globe) = self.globe.as_mut() {
            globe.rotation_y =
                (globe.rotation_y + self.config.globe_spin * dt_sec).rem_euclid(TAU);
        }
        let spin = self.config.constellation_spin * dt_sec;
        self.constellation_rotation_y = (self.constellation_rotation_y + spin).rem_euclid(TAU);
        self.camera.update(dt_sec);

        for glow in &mut self.glows {
            glow.engine.advance(dt);
        }
        let mut reaped = SmallVec::new();
        self.glows.retain(|g| {
            if g.is_finished() {
                reaped.push(g.id);
                false
            } else {
                true
            }
        });
        reaped
    }

    /// Ray-cast from NDC against the globe. No globe, no hit.
    pub fn pick(&self, ndc: Vec2) -> Option<Hit> {
        let globe = self.globe.as_ref()?;
        if !(ndc.is_finite()) {
            return None;
        }
        let (ro, rd) = self.camera.camera.ray(ndc);
        if rd == Vec3::ZERO {
            return None;
        }
        let t = ray_sphere(ro, rd, Vec3::ZERO, globe.radius)?;
        Some(Hit {
            point: ro + rd * t,
            distance: t,
        })
    }

    pub fn spawn_glow(&mut self, point: Vec3) -> Option<GlowId> {
        let timeline = self.glow_template.clone()?;
        let id = GlowId(self.next_glow);
        self.next_glow = self.next_glow.wrapping_add(1);
        self.glows.push(Glow {
            id,
            position: point,
            radius: self.config.glow_radius,
            engine: TimelineEngine::once(timeline),
        });
        Some(id)
    }

    /// Fill per-frame instance data and return the uniforms.
    pub fn frame_data(
        &self,
        sprites: &mut Vec<SpriteInstance>,
        edges: &mut Vec<LineVertex>,
    ) -> SceneUniforms {
        sprites.clear();
        edges.clear();
        let stars_model = Mat4::from_rotation_y(self.constellation_rotation_y);
        for (_, star) in self.constellation.stars().iter() {
            sprites.push(SpriteInstance {
                center: stars_model.transform_point3(star.position).to_array(),
                radius: star.size,
                color: [1.0, 1.0, 1.0, star.base_opacity],
            });
        }
        for glow in &self.glows {
            sprites.push(SpriteInstance {
                center: glow.position.to_array(),
                radius: glow.radius * glow.scale(),
                color: [1.0, 1.0, 1.0, glow.opacity()],
            });
        }
        for (a, b) in self.constellation.segments() {
            for p in [a, b] {
                edges.push(LineVertex {
                    position: stars_model.transform_point3(p).to_array(),
                    model: 1.0,
                });
            }
        }

        let cam = &self.camera.camera;
        let view = cam.view_matrix();
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        let globe_rot = self.globe.map(|g| g.rotation_y).unwrap_or(0.0);
        let (mut ambient, mut point, mut light_pos) = (0.0, 0.0, Vec3::ZERO);
        for light in &self.lights {
            match *light {
                Light::Ambient { intensity } => ambient += intensity,
                Light::Point {
                    position,
                    intensity,
                } => {
                    point += intensity;
                    light_pos = position;
                }
            }
        }
        let [r, g, b] = GLOBE_COLOR;
        SceneUniforms {
            view_proj: cam.view_proj().to_cols_array_2d(),
            globe_model: Mat4::from_rotation_y(globe_rot).to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            globe_color: [r, g, b, GLOBE_OPACITY],
            edge_color: [r, g, b, CONSTELLATION_EDGE_OPACITY],
            lights: [ambient, point, 0.0, 0.0],
            light_pos: light_pos.extend(1.0).to_array(),
        }
    }
}

/// GPU side of the scene renderer.
pub trait RenderBackend {
    fn resize(&mut self, width: u32, height: u32);
    /// `Err(FrameSkipped)` drops one frame; any other error retires the backend.
    fn render(&mut self, frame: &SceneFrame<'_>) -> Result<()>;
    /// Free the surface and every buffer. Called exactly once.
    fn release(&mut self);
}

/// Scene state plus an optional backend and the frame-loop switch.
pub struct SceneRenderer<B: RenderBackend> {
    state: SceneState,
    backend: Option<B>,
    running: bool,
    width: u32,
    height: u32,
    sprites: Vec<SpriteInstance>,
    edges: Vec<LineVertex>,
}

impl<B: RenderBackend> SceneRenderer<B> {
    /// A failed backend leaves the renderer inert instead of failing the section.
    pub fn new(state: SceneState, backend: Result<B>) -> Self {
        let backend = match backend {
            Ok(b) => Some(b),
            Err(e) => {
                log::warn!("[scene] rendering disabled: {e}");
                None
            }
        };
        Self {
            state,
            backend,
            running: false,
            width: 0,
            height: 0,
            sprites: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.backend.is_none()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn start(&mut self) {
        if self.backend.is_some() {
            self.running = true;
        }
    }

    /// Halt the loop and free the surface. Later calls do nothing.
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(mut backend) = self.backend.take() {
            backend.release();
            log::info!("[scene] renderer released");
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.state.set_viewport(width as f32, height as f32);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
    }

    /// One tick of the render clock.
    pub fn frame(&mut self, dt: Duration) {
        if !self.running {
            return;
        }
        self.state.advance(dt);
        let uniforms = self.state.frame_data(&mut self.sprites, &mut self.edges);
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let frame = SceneFrame {
            uniforms,
            sprites: &self.sprites,
            edges: &self.edges,
        };
        match backend.render(&frame) {
            Ok(()) => {}
            Err(CosmosError::FrameSkipped(reason)) => {
                log::debug!("[scene] frame skipped: {reason}");
            }
            Err(e) => {
                log::warn!("[scene] backend failed, going inert: {e}");
                self.stop();
            }
        }
    }

    /// Pick at a pixel on the render surface; a hit spawns a glow.
    pub fn pick(&mut self, px: f32, py: f32) -> Option<Hit> {
        if self.is_inert() || self.width == 0 || self.height == 0 {
            return None;
        }
        let ndc = pixel_to_ndc(Vec2::new(px, py), self.width as f32, self.height as f32);
        let hit = self.state.pick(ndc)?;
        self.state.spawn_glow(hit.point);
        log::debug!("[pick] hit at {:?}", hit.point);
        Some(hit)
    }
}

impl<B: RenderBackend> Drop for SceneRenderer<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
