// Host-side tests for scroll bindings, the per-frame update queue and the
// effect set that drives a section.

use cosmos_core::effect::*;
use cosmos_core::error::Result;
use cosmos_core::lifecycle::{LifecycleManager, Liveness};
use cosmos_core::particles::{Bounds, EmitterConfig, Emitter, FieldConfig, ParticleField};
use cosmos_core::progress::{ElementMetrics, Region, Scrub, Viewport};
use cosmos_core::queue::{HoverId, Input, UpdateQueue};
use cosmos_core::scene::{RenderBackend, SceneFrame};
use cosmos_core::scroll::{smooth_toward, ScrollBinding, TriggerId};
use cosmos_core::timeline::*;
use cosmos_core::easing::Easing;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

const T: TargetId = TargetId(9);
const TRIGGER: TriggerId = TriggerId(1);
const ELEMENT: ElementMetrics = ElementMetrics {
    top: 0.0,
    height: 1000.0,
};
const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 500.0,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// X: 0 → 100, linear.
fn ramp() -> Timeline {
    Timeline::builder()
        .to(
            &[T],
            &[(Property::X, 100.0)],
            Tween::new(1.0).ease(Easing::Linear),
            Position::End,
        )
        .build()
        .unwrap()
}

fn binding(scrub: Scrub, liveness: Liveness) -> ScrollBinding {
    // element top at viewport top → element bottom at viewport top
    let region = Region::parse("top top", "bottom top", scrub).unwrap();
    let mut b = ScrollBinding::new(TRIGGER, region, ramp(), liveness);
    b.resize(ELEMENT, VIEWPORT);
    b
}

fn x_of(values: Option<&Values>) -> f32 {
    values.and_then(|v| v.get(T, Property::X)).unwrap()
}

#[test]
fn snap_binding_maps_progress_straight_to_the_cursor() {
    let mut b = binding(Scrub::Snap, Liveness::new());
    assert!(approx_eq(b.on_scroll(250.0), 0.25));
    assert!(approx_eq(x_of(b.step(ms(16))), 25.0));
    b.on_scroll(2000.0);
    // overshoot is clamped by the timeline
    assert!(approx_eq(x_of(b.step(ms(16))), 100.0));
}

#[test]
fn smoothed_binding_snaps_first_then_eases_toward_scroll() {
    let mut b = binding(Scrub::Smooth(1.0), Liveness::new());
    b.on_scroll(250.0);
    assert!(approx_eq(x_of(b.step(ms(16))), 25.0));

    b.on_scroll(500.0);
    let x = x_of(b.step(ms(100)));
    assert!(x > 25.0 && x < 30.0, "got {x}");
    for _ in 0..600 {
        b.step(ms(16));
    }
    assert!(approx_eq(b.applied_progress(), 0.5));

    // A layout change re-snaps instead of easing across the jump.
    b.resize(
        ElementMetrics {
            top: 0.0,
            height: 2000.0,
        },
        VIEWPORT,
    );
    b.on_scroll(1500.0);
    b.step(ms(16));
    assert!(approx_eq(b.applied_progress(), 0.75));
}

#[test]
fn resize_without_a_new_scroll_recomputes_progress() {
    let mut b = binding(Scrub::Snap, Liveness::new());
    b.on_scroll(500.0);
    assert!(approx_eq(x_of(b.step(ms(16))), 50.0));

    // The element doubles in height while the page stays put.
    b.resize(
        ElementMetrics {
            top: 0.0,
            height: 2000.0,
        },
        VIEWPORT,
    );
    assert!(approx_eq(x_of(b.step(ms(16))), 25.0));
}

#[test]
fn resize_before_any_scroll_keeps_progress_at_zero() {
    let mut b = binding(Scrub::Smooth(0.5), Liveness::new());
    b.resize(
        ElementMetrics {
            top: -300.0,
            height: 600.0,
        },
        VIEWPORT,
    );
    assert!(approx_eq(x_of(b.step(ms(16))), 0.0));
}

#[test]
fn resize_can_trigger_a_one_shot_the_page_already_scrolled_past() {
    let region = Region::parse("top 80%", "bottom top", Scrub::Off).unwrap();
    let mut b = ScrollBinding::new(TRIGGER, region, ramp(), Liveness::new());
    b.resize(
        ElementMetrics {
            top: 1000.0,
            height: 400.0,
        },
        VIEWPORT,
    );
    b.on_scroll(300.0);
    assert!(!b.engine().is_playing());

    // Content above collapses and the element moves up past the offset.
    b.resize(
        ElementMetrics {
            top: 500.0,
            height: 400.0,
        },
        VIEWPORT,
    );
    assert!(b.engine().is_playing());
}

#[test]
fn smoothing_is_an_exponential_catch_up() {
    assert_eq!(smooth_toward(0.0, 1.0, 0.0, 0.016), 1.0);
    let one_tau = smooth_toward(0.0, 1.0, 0.5, 0.5);
    assert!(approx_eq(one_tau, 1.0 - (-1.0f32).exp()));
    assert_eq!(smooth_toward(0.3, 0.3, 1.0, 0.016), 0.3);
}

#[test]
fn one_shot_binding_plays_once_on_entry() {
    let region = Region::parse("top 80%", "bottom top", Scrub::Off).unwrap();
    let mut b = ScrollBinding::new(TRIGGER, region, ramp(), Liveness::new());
    b.resize(
        ElementMetrics {
            top: 1000.0,
            height: 400.0,
        },
        VIEWPORT,
    );
    // start = 1000 - 0.8 * 500 = 600
    b.on_scroll(100.0);
    assert!(approx_eq(x_of(b.step(ms(500))), 0.0));
    assert!(!b.engine().is_playing());

    b.on_scroll(650.0);
    assert!(b.engine().is_playing());
    assert!(approx_eq(x_of(b.step(ms(500))), 50.0));
    assert!(approx_eq(x_of(b.step(ms(600))), 100.0));
    assert!(b.engine().complete());

    // Scrolling back above the start does not rewind a finished reveal.
    b.on_scroll(0.0);
    b.on_scroll(700.0);
    assert!(approx_eq(x_of(b.step(ms(16))), 100.0));
}

#[test]
fn binding_is_a_no_op_after_its_scope_is_released() {
    let manager = LifecycleManager::new();
    let mut scope = manager.acquire("space");
    let mut b = binding(Scrub::Snap, scope.liveness());
    b.on_scroll(250.0);
    assert!(b.step(ms(16)).is_some());

    scope.release();
    assert!(!b.is_live());
    assert!(approx_eq(b.on_scroll(900.0), 0.25));
    assert!(b.step(ms(16)).is_none());
    b.resize(ELEMENT, Viewport::new(10.0, 10.0));
    let region = Region::parse("top top", "bottom top", Scrub::Snap).unwrap();
    assert_eq!(b.bounds(), region.resolve(ELEMENT, VIEWPORT));
}

#[test]
fn malformed_region_degrades_to_a_step() {
    let mut b = binding(Scrub::Snap, Liveness::new());
    b.resize(
        ElementMetrics {
            top: 0.0,
            height: 0.0,
        },
        VIEWPORT,
    );
    b.on_scroll(-1.0);
    assert_eq!(x_of(b.step(ms(16))), 0.0);
    b.on_scroll(0.0);
    assert_eq!(x_of(b.step(ms(16))), 100.0);
}

#[test]
fn queue_coalesces_a_frame_of_events() {
    let mut q = UpdateQueue::new();
    q.push(Input::Scroll(10.0));
    q.push(Input::PointerMove(Vec2::new(1.0, 1.0)));
    q.push(Input::Scroll(20.0));
    q.push(Input::Scroll(f32::NAN));
    q.push(Input::Click(Vec2::new(5.0, 5.0)));
    q.push(Input::PointerDown(Vec2::new(2.0, 2.0)));
    q.push(Input::PointerDown(Vec2::new(3.0, 3.0)));
    q.push(Input::Click(Vec2::new(6.0, 6.0)));
    q.push(Input::Resize(Viewport::new(100.0, 50.0)));
    q.push(Input::Resize(Viewport::new(200.0, 80.0)));
    q.push(Input::PointerLeave);
    q.push(Input::PointerEnter);
    q.push(Input::HoverEnter(HoverId(4)));
    q.push(Input::HoverLeave(HoverId(4)));
    assert_eq!(q.len(), 14);

    let f = q.drain();
    assert!(q.is_empty());
    assert_eq!(f.scroll, Some(20.0));
    assert_eq!(f.resize, Some(Viewport::new(200.0, 80.0)));
    assert_eq!(f.pointer, Some(Vec2::new(3.0, 3.0)));
    assert_eq!(f.pointer_down, Some(Vec2::new(2.0, 2.0)));
    assert_eq!(f.clicks.as_slice(), &[Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0)]);
    assert_eq!(f.inside, Some(true));
    assert_eq!(f.hover.as_slice(), &[(HoverId(4), true), (HoverId(4), false)]);

    assert!(q.drain().is_empty());
}

struct NoGpu;

impl RenderBackend for NoGpu {
    fn resize(&mut self, _: u32, _: u32) {}
    fn render(&mut self, _: &SceneFrame<'_>) -> Result<()> {
        Ok(())
    }
    fn release(&mut self) {}
}

#[test]
fn every_binding_of_a_frame_sees_the_same_scroll() {
    let mut set: EffectSet<NoGpu> = EffectSet::new(Liveness::new(), 1);
    let a = set.add(Effect::Timeline(TimelineEffect::Scroll(binding(Scrub::Snap, set.liveness()))));
    let b = set.add(Effect::Timeline(TimelineEffect::Scroll(binding(Scrub::Snap, set.liveness()))));
    set.resize(VIEWPORT, |_| Some(ELEMENT));

    let mut seen = Vec::new();
    set.frame(
        EffectFrame {
            scroll: Some(400.0),
            dt: ms(16),
        },
        |id, out| {
            if let EffectOutput::Values(v) = out {
                seen.push((id, v.get(T, Property::X).unwrap()));
            }
        },
    );
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, a);
    assert_eq!(seen[1].0, b);
    assert!(approx_eq(seen[0].1, 40.0));
    assert_eq!(seen[0].1, seen[1].1);
}

#[test]
fn effect_set_resize_applies_on_the_next_frame_without_scroll() {
    let mut set: EffectSet<NoGpu> = EffectSet::new(Liveness::new(), 1);
    set.add(Effect::Timeline(TimelineEffect::Scroll(binding(Scrub::Snap, set.liveness()))));
    set.resize(VIEWPORT, |_| Some(ELEMENT));
    set.frame(
        EffectFrame {
            scroll: Some(500.0),
            dt: ms(16),
        },
        |_, _| {},
    );

    set.resize(VIEWPORT, |_| {
        Some(ElementMetrics {
            top: 0.0,
            height: 2000.0,
        })
    });
    let mut x = None;
    set.frame(
        EffectFrame {
            scroll: None,
            dt: ms(16),
        },
        |_, out| {
            if let EffectOutput::Values(v) = out {
                x = v.get(T, Property::X);
            }
        },
    );
    assert!(approx_eq(x.unwrap(), 25.0));
}

#[test]
fn clock_and_particle_effects_run_on_the_frame() {
    let live = Liveness::new();
    let mut set: EffectSet<NoGpu> = EffectSet::new(live, 2);
    let looped = TimelineEngine::looping(ramp(), true);
    let clock = set.add(Effect::Timeline(TimelineEffect::clock(looped)));
    let emitter = set.add(Effect::Particles(ParticleEffect::Emitter(
        Emitter::new(EmitterConfig::default()).unwrap(),
    )));

    let mut clock_x = None;
    let mut spawned = 0;
    for _ in 0..5 {
        set.frame(
            EffectFrame {
                scroll: None,
                dt: ms(500),
            },
            |id, out| match out {
                EffectOutput::Values(v) if id == clock => clock_x = v.get(T, Property::X),
                EffectOutput::Particles(tick) if id == emitter => spawned += tick.spawned.len(),
                _ => {}
            },
        );
    }
    // 2.5 s into a 1 s yoyo loop: third cycle, forward, halfway
    assert!(approx_eq(clock_x.unwrap(), 50.0));
    assert_eq!(spawned, 1);
    assert_eq!(set.field(emitter).map(|f| f.len()), Some(1));
}

#[test]
fn removed_effect_stops_producing_output() {
    let mut set: EffectSet<NoGpu> = EffectSet::new(Liveness::new(), 4);
    let intro = set.add(Effect::Timeline(TimelineEffect::clock(TimelineEngine::once(ramp()))));
    let emitter = set.add(Effect::Particles(ParticleEffect::Emitter(
        Emitter::new(EmitterConfig::default()).unwrap(),
    )));
    set.frame(
        EffectFrame {
            scroll: None,
            dt: ms(2000),
        },
        |_, _| {},
    );
    assert_eq!(set.field(emitter).map(|f| f.len()), Some(1));

    assert!(set.remove(intro).is_empty());
    assert_eq!(set.remove(emitter).len(), 1);
    assert!(set.remove(emitter).is_empty());
    assert!(set.is_empty());

    let mut calls = 0;
    set.frame(
        EffectFrame {
            scroll: None,
            dt: ms(16),
        },
        |_, _| calls += 1,
    );
    assert_eq!(calls, 0);
}

#[test]
fn teardown_drops_particles_once_and_silences_the_set() {
    let manager = LifecycleManager::new();
    let mut scope = manager.acquire("black-hole");
    let mut set: EffectSet<NoGpu> = EffectSet::new(scope.liveness(), 3);
    let mut rng = StdRng::seed_from_u64(5);
    let field =
        ParticleField::seed(12, Bounds::PERCENT, &FieldConfig::black_hole(), &mut rng).unwrap();
    set.add(Effect::Particles(ParticleEffect::Field(field)));
    set.add(Effect::Timeline(TimelineEffect::Scroll(binding(Scrub::Snap, scope.liveness()))));
    assert_eq!(set.len(), 2);

    scope.release();
    let mut calls = 0;
    set.frame(
        EffectFrame {
            scroll: Some(100.0),
            dt: ms(16),
        },
        |_, _| calls += 1,
    );
    assert_eq!(calls, 0);

    assert_eq!(set.teardown().len(), 12);
    assert!(set.teardown().is_empty());
    assert!(set.is_empty());
}
