//! Pointer-driven effects: parallax, orbit drag, click picking and the
//! cursor follower.

use crate::constants::*;
use crate::easing::Easing;
use crate::progress::Viewport;
use crate::queue::{FrameInput, HoverId};
use crate::scene::{Hit, RenderBackend, SceneRenderer};
use crate::timeline::{Position, Property, TargetId, Timeline, TimelineEngine, Tween, Values};
use glam::Vec2;
use smallvec::SmallVec;
use std::time::Duration;

/// Offset proportional to the pointer's distance from the viewport centre;
/// `±strength / 2` at the edges.
#[inline]
pub fn parallax_offset(pointer: Vec2, viewport: Viewport, strength: f32) -> Vec2 {
    if !(viewport.width > 0.0 && viewport.height > 0.0) || !pointer.is_finite() {
        return Vec2::ZERO;
    }
    Vec2::new(
        (pointer.x / viewport.width - 0.5) * strength,
        (pointer.y / viewport.height - 0.5) * strength,
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxConfig {
    pub strength_px: f32,
    pub duration_sec: f32,
    pub floating_factor: f32,
    pub floating_duration_sec: f32,
    pub floating_stagger_sec: f32,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            strength_px: PARALLAX_STRENGTH_PX,
            duration_sec: PARALLAX_DURATION_SEC,
            floating_factor: PARALLAX_FLOATING_FACTOR,
            floating_duration_sec: PARALLAX_FLOATING_DURATION_SEC,
            floating_stagger_sec: PARALLAX_FLOATING_STAGGER_SEC,
        }
    }
}

/// Pointer parallax for one primary element and a set of floating ones.
///
/// Each pointer sample replaces the running tween with a fresh one that
/// starts from the current values, so motion never jumps.
#[derive(Debug)]
pub struct Parallax {
    config: ParallaxConfig,
    primary: TargetId,
    floating: SmallVec<[TargetId; 2]>,
    current: Values,
    engine: Option<TimelineEngine>,
}

impl Parallax {
    pub fn new(config: ParallaxConfig, primary: TargetId, floating: &[TargetId]) -> Self {
        Self {
            config,
            primary,
            floating: SmallVec::from_slice(floating),
            current: Values::new(),
            engine: None,
        }
    }

    pub fn values(&self) -> &Values {
        &self.current
    }

    fn current_of(&self, target: TargetId, property: Property) -> f32 {
        self.current.get(target, property).unwrap_or(0.0)
    }

    pub fn on_pointer(&mut self, pointer: Vec2, viewport: Viewport) {
        let offset = parallax_offset(pointer, viewport, self.config.strength_px);
        let far = offset * self.config.floating_factor;
        let mut builder = Timeline::builder().default_easing(Easing::POWER2_OUT);
        for &t in std::iter::once(&self.primary).chain(self.floating.iter()) {
            builder = builder.set(
                &[t],
                &[
                    (Property::X, self.current_of(t, Property::X)),
                    (Property::Y, self.current_of(t, Property::Y)),
                ],
            );
        }
        builder = builder.to(
            &[self.primary],
            &[(Property::X, offset.x), (Property::Y, offset.y)],
            Tween::new(self.config.duration_sec),
            Position::At(0.0),
        );
        if !self.floating.is_empty() {
            builder = builder.to(
                &self.floating,
                &[(Property::X, far.x), (Property::Y, far.y)],
                Tween::new(self.config.floating_duration_sec)
                    .stagger(self.config.floating_stagger_sec),
                Position::At(0.0),
            );
        }
        let built = builder.build();
        match built {
            Ok(timeline) => self.engine = Some(TimelineEngine::once(timeline)),
            Err(e) => log::debug!("[parallax] {e}"),
        }
    }

    /// Advance the running tween; returns whether values changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        engine.advance(dt);
        engine.evaluate_into(&mut self.current);
        if engine.complete() {
            self.engine = None;
        }
        true
    }
}

/// Hover state from enter/leave events on registered elements.
#[derive(Debug, Default)]
pub struct HoverTracker {
    hovered: SmallVec<[HoverId; 4]>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, id: HoverId) {
        if !self.hovered.contains(&id) {
            self.hovered.push(id);
        }
    }

    pub fn leave(&mut self, id: HoverId) {
        self.hovered.retain(|h| *h != id);
    }

    /// Drop everything, e.g. when the pointer leaves the window.
    pub fn clear(&mut self) {
        self.hovered.clear();
    }

    pub fn is_hovering(&self) -> bool {
        !self.hovered.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub hover_scale: f32,
    pub click_pulse_sec: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            stiffness: CURSOR_STIFFNESS,
            damping: CURSOR_DAMPING,
            hover_scale: CURSOR_HOVER_SCALE,
            click_pulse_sec: CURSOR_CLICK_PULSE_SEC,
        }
    }
}

/// Unit-mass spring toward `target`, substepped for stiff constants.
#[inline]
pub fn spring_step(pos: &mut f32, vel: &mut f32, target: f32, k: f32, c: f32, dt_sec: f32) {
    let steps = ((dt_sec * 240.0).ceil() as u32).clamp(1, 16);
    let h = dt_sec / steps as f32;
    for _ in 0..steps {
        let a = k * (target - *pos) - c * *vel;
        *vel += a * h;
        *pos += *vel * h;
    }
}

/// Dot that chases the pointer, grows over interactive elements and pulses
/// on click. Hidden while the pointer is outside the window.
#[derive(Debug)]
pub struct CursorFollower {
    config: CursorConfig,
    pub hover: HoverTracker,
    target: Vec2,
    position: Vec2,
    velocity: Vec2,
    scale: f32,
    scale_velocity: f32,
    pulse_left: f32,
    visible: bool,
    initialized: bool,
}

impl CursorFollower {
    pub fn new(config: CursorConfig) -> Self {
        Self {
            config,
            hover: HoverTracker::new(),
            target: Vec2::ZERO,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            scale: 1.0,
            scale_velocity: 0.0,
            pulse_left: 0.0,
            visible: false,
            initialized: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_enlarged(&self) -> bool {
        self.hover.is_hovering() || self.pulse_left > 0.0
    }

    pub fn pointer(&mut self, p: Vec2) {
        self.target = p;
        self.visible = true;
        if !self.initialized {
            self.position = p;
            self.initialized = true;
        }
    }

    pub fn set_inside(&mut self, inside: bool) {
        self.visible = inside;
        if !inside {
            self.hover.clear();
        }
    }

    pub fn click(&mut self) {
        self.pulse_left = self.config.click_pulse_sec;
    }

    pub fn step(&mut self, dt_sec: f32) {
        let (k, c) = (self.config.stiffness, self.config.damping);
        spring_step(&mut self.position.x, &mut self.velocity.x, self.target.x, k, c, dt_sec);
        spring_step(&mut self.position.y, &mut self.velocity.y, self.target.y, k, c, dt_sec);
        self.pulse_left = (self.pulse_left - dt_sec).max(0.0);
        let scale_target = if self.is_enlarged() {
            self.config.hover_scale
        } else {
            1.0
        };
        spring_step(&mut self.scale, &mut self.scale_velocity, scale_target, k, c, dt_sec);
    }
}

/// Client-space rectangle of the render surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left
            && p.y >= self.top
            && p.x <= self.left + self.width
            && p.y <= self.top + self.height
    }

    /// Client point → surface backing pixels of a `backing_w × backing_h` surface.
    pub fn to_backing(&self, p: Vec2, backing_w: u32, backing_h: u32) -> Option<Vec2> {
        if !(self.width > 0.0 && self.height > 0.0) || !self.contains(p) {
            return None;
        }
        Some(Vec2::new(
            (p.x - self.left) / self.width * backing_w as f32,
            (p.y - self.top) / self.height * backing_h as f32,
        ))
    }
}

/// What one frame of pointer input produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionOutcome {
    pub parallax_changed: bool,
    pub hits: SmallVec<[Hit; 1]>,
}

/// Routes coalesced pointer input to parallax, orbit drag, picking and the
/// cursor follower.
#[derive(Debug, Default)]
pub struct InteractionController {
    parallax: Option<Parallax>,
    cursor: Option<CursorFollower>,
    drag_from: Option<Vec2>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallax(mut self, parallax: Parallax) -> Self {
        self.parallax = Some(parallax);
        self
    }

    pub fn with_cursor(mut self, cursor: CursorFollower) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn parallax(&self) -> Option<&Parallax> {
        self.parallax.as_ref()
    }

    pub fn cursor(&self) -> Option<&CursorFollower> {
        self.cursor.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Handle one frame of input. `scene` is `None` for sections without a
    /// 3D scene.
    pub fn frame<B: RenderBackend>(
        &mut self,
        input: &FrameInput,
        viewport: Viewport,
        scene: Option<(&mut SceneRenderer<B>, SurfaceRect)>,
        dt: Duration,
    ) -> InteractionOutcome {
        let mut out = InteractionOutcome::default();

        if let Some(cursor) = self.cursor.as_mut() {
            for &(id, entered) in &input.hover {
                if entered {
                    cursor.hover.enter(id);
                } else {
                    cursor.hover.leave(id);
                }
            }
            if let Some(p) = input.pointer {
                cursor.pointer(p);
            }
            if let Some(inside) = input.inside {
                cursor.set_inside(inside);
            }
            if !input.clicks.is_empty() {
                cursor.click();
            }
            cursor.step(dt.as_secs_f32());
        }

        if let (Some(parallax), Some(p)) = (self.parallax.as_mut(), input.pointer) {
            parallax.on_pointer(p, viewport);
        }
        if let Some(parallax) = self.parallax.as_mut() {
            out.parallax_changed = parallax.advance(dt);
        }

        if let Some((renderer, rect)) = scene {
            if let Some(down) = input.pointer_down {
                if rect.contains(down) {
                    self.drag_from = Some(down);
                }
            }
            if let (Some(from), Some(p)) = (self.drag_from, input.pointer) {
                let delta = p - from;
                if delta != Vec2::ZERO {
                    let (_, backing_h) = renderer.size();
                    let scale = backing_h as f32 / rect.height.max(1.0);
                    renderer
                        .state_mut()
                        .orbit_drag(delta * scale, backing_h as f32);
                }
                self.drag_from = Some(p);
            }
            if input.pointer_up.is_some() {
                self.drag_from = None;
            }
            let (w, h) = renderer.size();
            for &click in &input.clicks {
                if let Some(px) = rect.to_backing(click, w, h) {
                    if let Some(hit) = renderer.pick(px.x, px.y) {
                        out.hits.push(hit);
                    }
                }
            }
        }
        if input.inside == Some(false) {
            self.drag_from = None;
        }
        out
    }
}
