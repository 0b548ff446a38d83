//! The closed set of per-section effects and the set that drives them.
//!
//! Every visual section is some mix of timeline, scene and particle effects.
//! They share one capability, evaluate per frame and tear down once, so a
//! section owns an [`EffectSet`] instead of hand-written per-section loops.

use crate::lifecycle::Liveness;
use crate::particles::{Emitter, EmitterTick, ParticleField, ParticleId};
use crate::progress::{ElementMetrics, Viewport};
use crate::scene::{RenderBackend, SceneRenderer};
use crate::scroll::{ScrollBinding, TriggerId};
use crate::timeline::{TimelineEngine, Values};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(pub u32);

/// A timeline driven either by scroll or by the frame clock.
#[derive(Debug)]
pub enum TimelineEffect {
    Scroll(ScrollBinding),
    Clock {
        engine: TimelineEngine,
        values: Values,
    },
}

impl TimelineEffect {
    pub fn clock(engine: TimelineEngine) -> Self {
        TimelineEffect::Clock {
            engine,
            values: Values::new(),
        }
    }
}

#[derive(Debug)]
pub enum ParticleEffect {
    /// Fixed population; animated in CSS or by a scroll timeline.
    Field(ParticleField),
    Emitter(Emitter),
}

pub enum Effect<B: RenderBackend> {
    Timeline(TimelineEffect),
    Scene(SceneRenderer<B>),
    Particles(ParticleEffect),
}

/// Per-frame result handed to the front-end.
pub enum EffectOutput<'a> {
    Values(&'a Values),
    Particles(&'a EmitterTick),
    Rendered,
}

/// Inputs shared by every effect for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EffectFrame {
    /// Scroll offset if it changed since the last frame.
    pub scroll: Option<f32>,
    pub dt: Duration,
}

impl<B: RenderBackend> Effect<B> {
    /// Advance by one frame.
    fn evaluate<'a>(
        &'a mut self,
        frame: EffectFrame,
        rng: &mut StdRng,
        tick: &'a mut EmitterTick,
    ) -> Option<EffectOutput<'a>> {
        match self {
            Effect::Timeline(TimelineEffect::Scroll(binding)) => {
                if let Some(offset) = frame.scroll {
                    binding.on_scroll(offset);
                }
                binding.step(frame.dt).map(EffectOutput::Values)
            }
            Effect::Timeline(TimelineEffect::Clock { engine, values }) => {
                engine.advance(frame.dt);
                values.clear();
                engine.evaluate_into(values);
                Some(EffectOutput::Values(values))
            }
            Effect::Scene(renderer) => {
                renderer.frame(frame.dt);
                renderer.is_running().then_some(EffectOutput::Rendered)
            }
            Effect::Particles(ParticleEffect::Emitter(emitter)) => {
                *tick = emitter.tick(frame.dt, rng);
                Some(EffectOutput::Particles(tick))
            }
            Effect::Particles(ParticleEffect::Field(_)) => None,
        }
    }

    /// Release whatever the effect holds. Returns particles that were dropped.
    fn teardown(&mut self) -> Vec<ParticleId> {
        match self {
            Effect::Timeline(TimelineEffect::Clock { engine, .. }) => {
                engine.pause();
                Vec::new()
            }
            Effect::Timeline(TimelineEffect::Scroll(_)) => Vec::new(),
            Effect::Scene(renderer) => {
                renderer.stop();
                Vec::new()
            }
            Effect::Particles(ParticleEffect::Emitter(emitter)) => emitter.cancel(),
            Effect::Particles(ParticleEffect::Field(field)) => field.clear(),
        }
    }
}

/// Effects of one mounted section, sharing its liveness flag.
///
/// All effects see the same [`EffectFrame`], so every binding derived from a
/// region maps the same scroll snapshot.
pub struct EffectSet<B: RenderBackend> {
    liveness: Liveness,
    effects: Vec<(EffectId, Effect<B>)>,
    next_id: u32,
    rng: StdRng,
    tick: EmitterTick,
    torn_down: bool,
}

impl<B: RenderBackend> EffectSet<B> {
    pub fn new(liveness: Liveness, seed: u64) -> Self {
        Self {
            liveness,
            effects: Vec::new(),
            next_id: 0,
            rng: StdRng::seed_from_u64(seed),
            tick: EmitterTick::default(),
            torn_down: false,
        }
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn add(&mut self, effect: Effect<B>) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        self.effects.push((id, effect));
        id
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get(&self, id: EffectId) -> Option<&Effect<B>> {
        self.effects.iter().find(|(e, _)| *e == id).map(|(_, e)| e)
    }

    pub fn scene_mut(&mut self, id: EffectId) -> Option<&mut SceneRenderer<B>> {
        self.effects.iter_mut().find_map(|(e, effect)| match effect {
            Effect::Scene(r) if *e == id => Some(r),
            _ => None,
        })
    }

    pub fn field(&self, id: EffectId) -> Option<&ParticleField> {
        match self.get(id)? {
            Effect::Particles(ParticleEffect::Field(f)) => Some(f),
            Effect::Particles(ParticleEffect::Emitter(e)) => Some(e.field()),
            _ => None,
        }
    }

    /// Tear down and forget one effect, e.g. a finished intro whose end
    /// values are already on the page.
    pub fn remove(&mut self, id: EffectId) -> Vec<ParticleId> {
        let Some(at) = self.effects.iter().position(|(e, _)| *e == id) else {
            return Vec::new();
        };
        let (_, mut effect) = self.effects.remove(at);
        effect.teardown()
    }

    /// Recompute region bounds after a layout change.
    pub fn resize(
        &mut self,
        viewport: Viewport,
        mut measure: impl FnMut(TriggerId) -> Option<ElementMetrics>,
    ) {
        if !self.liveness.is_alive() {
            return;
        }
        for (_, effect) in &mut self.effects {
            if let Effect::Timeline(TimelineEffect::Scroll(binding)) = effect {
                if let Some(metrics) = measure(binding.trigger()) {
                    binding.resize(metrics, viewport);
                }
            }
        }
    }

    /// Evaluate every effect once and hand outputs to `apply`.
    pub fn frame(&mut self, frame: EffectFrame, mut apply: impl FnMut(EffectId, EffectOutput<'_>)) {
        if !self.liveness.is_alive() {
            return;
        }
        for (id, effect) in &mut self.effects {
            if let Some(out) = effect.evaluate(frame, &mut self.rng, &mut self.tick) {
                apply(*id, out);
            }
        }
    }

    /// Tear down newest-first; later calls do nothing.
    pub fn teardown(&mut self) -> Vec<ParticleId> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        let mut dropped = Vec::new();
        while let Some((_, mut effect)) = self.effects.pop() {
            dropped.extend(effect.teardown());
        }
        dropped
    }
}

impl<B: RenderBackend> Drop for EffectSet<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
