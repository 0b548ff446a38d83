// Host-side tests for timeline authoring, evaluation and playback.

use cosmos_core::easing::Easing;
use cosmos_core::error::CosmosError;
use cosmos_core::timeline::*;
use std::time::Duration;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

const A: TargetId = TargetId(1);
const B: TargetId = TargetId(2);
const C: TargetId = TargetId(3);

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

/// X: 0 → 100 over the first half, 100 → 300 over the second.
fn two_step() -> Timeline {
    Timeline::builder()
        .default_easing(Easing::Linear)
        .to(&[A], &[(Property::X, 100.0)], Tween::new(1.0), Position::At(0.0))
        .to(&[A], &[(Property::X, 300.0)], Tween::new(1.0), Position::End)
        .build()
        .unwrap()
}

#[test]
fn consecutive_keyframes_only_interpolate_their_own_span() {
    let tl = two_step();
    let offsets: Vec<f32> = tl.keyframes().iter().map(|k| k.offset).collect();
    assert_eq!(offsets, vec![0.0, 0.5]);
    assert!(tl.keyframes().iter().all(|k| approx_eq(k.duration, 0.5)));

    let x = |c| tl.evaluate(c).get(A, Property::X).unwrap();
    assert!(approx_eq(x(0.25), 50.0));
    assert!(approx_eq(x(0.75), 200.0));
    assert!(approx_eq(x(0.0), 0.0));
    assert!(approx_eq(x(1.0), 300.0));
}

#[test]
fn evaluate_is_idempotent() {
    let tl = two_step();
    for c in [0.0, 0.1, 0.33, 0.5, 0.9, 1.0] {
        assert_eq!(tl.evaluate(c), tl.evaluate(c));
    }
    let mut reused = Values::new();
    tl.evaluate_into(0.6, &mut reused);
    tl.evaluate_into(0.6, &mut reused);
    assert_eq!(reused, tl.evaluate(0.6));
}

#[test]
fn cursor_outside_unit_span_is_clamped() {
    let tl = two_step();
    assert_eq!(tl.evaluate(-3.0), tl.evaluate(0.0));
    assert_eq!(tl.evaluate(7.0), tl.evaluate(1.0));
    assert_eq!(tl.evaluate(f32::NAN), tl.evaluate(0.0));
}

#[test]
fn stagger_spaces_targets_evenly() {
    let tl = Timeline::builder()
        .to(
            &[A, B, C],
            &[(Property::Opacity, 0.0)],
            Tween::new(1.0).stagger(0.5),
            Position::End,
        )
        .build()
        .unwrap();
    assert!(approx_eq(tl.duration_sec(), 2.0));
    let offset_of = |t| {
        tl.keyframes()
            .iter()
            .find(|k| k.target == t)
            .map(|k| k.offset)
            .unwrap()
    };
    assert!(approx_eq(offset_of(A), 0.0));
    assert!(approx_eq(offset_of(B), 0.25));
    assert!(approx_eq(offset_of(C), 0.5));

    // C has not started at 0.4; it holds its starting opacity.
    let v = tl.evaluate(0.4);
    assert_eq!(v.get(C, Property::Opacity), Some(1.0));
    assert!(v.get(A, Property::Opacity).unwrap() < 1.0);
}

#[test]
fn from_tweens_end_at_the_current_value() {
    let tl = Timeline::builder()
        .default_easing(Easing::Linear)
        .from(
            &[A],
            &[(Property::Y, 100.0), (Property::Opacity, 0.0)],
            Tween::new(1.0),
            Position::End,
        )
        .build()
        .unwrap();
    assert_eq!(tl.evaluate(0.0).get(A, Property::Y), Some(100.0));
    assert_eq!(tl.evaluate(1.0).get(A, Property::Y), Some(0.0));
    assert_eq!(tl.evaluate(1.0).get(A, Property::Opacity), Some(1.0));
}

#[test]
fn set_values_seed_later_tweens() {
    let tl = Timeline::builder()
        .default_easing(Easing::Linear)
        .set(&[A], &[(Property::Scale, 0.5)])
        .to(&[A], &[(Property::Scale, 1.5)], Tween::new(1.0), Position::End)
        .build()
        .unwrap();
    assert_eq!(tl.evaluate(0.0).get(A, Property::Scale), Some(0.5));
    assert!(approx_eq(tl.evaluate(0.5).get(A, Property::Scale).unwrap(), 1.0));
}

#[test]
fn set_only_channels_are_held_for_the_whole_span() {
    let tl = Timeline::builder()
        .set(&[B], &[(Property::Opacity, 0.2)])
        .to(&[A], &[(Property::X, 10.0)], Tween::new(1.0), Position::End)
        .build()
        .unwrap();
    for c in [0.0, 0.5, 1.0] {
        assert_eq!(tl.evaluate(c).get(B, Property::Opacity), Some(0.2));
    }
}

#[test]
fn position_parameters_place_tweens() {
    let tl = Timeline::builder()
        .to(&[A], &[(Property::X, 1.0)], Tween::new(2.0), Position::End)
        .to(&[B], &[(Property::X, 1.0)], Tween::new(1.0), "<".parse().unwrap())
        .to(&[C], &[(Property::X, 1.0)], Tween::new(1.0), ">-=0.5".parse().unwrap())
        .build()
        .unwrap();
    // A: 0..2, B: 0..1, C: 0.5..1.5
    assert!(approx_eq(tl.duration_sec(), 2.0));
    let start = |t| tl.keyframes().iter().find(|k| k.target == t).unwrap().offset;
    assert!(approx_eq(start(B), 0.0));
    assert!(approx_eq(start(C), 0.25));
}

#[test]
fn nested_timeline_is_rescaled_into_its_slot() {
    let sub = Timeline::builder()
        .default_easing(Easing::Linear)
        .to(&[B], &[(Property::X, 50.0)], Tween::new(1.0), Position::End)
        .build()
        .unwrap();
    let tl = Timeline::builder()
        .to(&[A], &[(Property::X, 10.0)], Tween::new(1.0), Position::At(0.0))
        .nest(&sub, Position::End)
        .build()
        .unwrap();
    assert!(approx_eq(tl.duration_sec(), 2.0));
    let x = tl.evaluate(0.75).get(B, Property::X).unwrap();
    assert!(approx_eq(x, 25.0), "got {x}");
    assert_eq!(tl.evaluate(0.25).get(B, Property::X), Some(0.0));
}

#[test]
fn empty_timeline_is_rejected() {
    assert!(matches!(
        Timeline::builder().build(),
        Err(CosmosError::EmptyTimeline)
    ));
}

#[test]
fn run_once_completes_exactly_once() {
    let tl = two_step();
    let mut engine = TimelineEngine::once(tl);
    assert_eq!(engine.advance(secs(1.0)), Step::Running);
    assert!(approx_eq(engine.cursor(), 0.5));
    assert!(!engine.complete());
    assert_eq!(engine.advance(secs(1.5)), Step::Completed);
    assert_eq!(engine.cursor(), 1.0);
    assert!(engine.complete());
    assert_eq!(engine.advance(secs(1.0)), Step::Idle);

    // Finished run-once timelines stay finished until restarted.
    engine.play();
    assert_eq!(engine.advance(secs(0.1)), Step::Idle);
    engine.restart();
    assert_eq!(engine.cursor(), 0.0);
    assert_eq!(engine.advance(secs(0.5)), Step::Running);
}

#[test]
fn delayed_start_holds_at_zero() {
    let mut engine = TimelineEngine::new(two_step(), Playback::Once);
    assert_eq!(engine.advance(secs(1.0)), Step::Idle);
    engine.play_after(0.1);
    assert_eq!(engine.advance(secs(0.05)), Step::Running);
    assert_eq!(engine.cursor(), 0.0);
    engine.advance(secs(1.05));
    assert!(approx_eq(engine.cursor(), 0.5));
}

#[test]
fn yoyo_loop_reverses_every_other_cycle() {
    let tl = Timeline::builder()
        .default_easing(Easing::Linear)
        .from_to(&[A], &[(Property::Scale, 1.0, 1.2)], Tween::new(1.0), Position::At(0.0))
        .build()
        .unwrap();
    let mut engine = TimelineEngine::looping(tl.clone(), true);
    engine.advance(secs(0.25));
    assert!(approx_eq(engine.cursor(), 0.25));
    engine.advance(secs(1.0));
    assert!(approx_eq(engine.cursor(), 0.75));
    assert!(!engine.complete());

    let mut plain = TimelineEngine::looping(tl, false);
    plain.advance(secs(1.25));
    assert!(approx_eq(plain.cursor(), 0.25));
}

#[test]
fn scrub_engine_only_moves_by_seek() {
    let mut engine = TimelineEngine::scrub(two_step());
    engine.play();
    assert_eq!(engine.advance(secs(1.0)), Step::Idle);
    assert_eq!(engine.cursor(), 0.0);
    engine.seek(0.75);
    assert!(approx_eq(engine.evaluate().get(A, Property::X).unwrap(), 200.0));
    engine.seek(4.0);
    assert_eq!(engine.cursor(), 1.0);
    assert!(engine.complete());
    engine.seek(f32::NAN);
    assert_eq!(engine.cursor(), 0.0);
}

#[test]
fn easing_names_parse() {
    assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
    assert_eq!("power3.out".parse::<Easing>().unwrap(), Easing::POWER3_OUT);
    assert_eq!("sine.inOut".parse::<Easing>().unwrap(), Easing::SINE_IN_OUT);
    assert_eq!(
        "elastic.out(1, 0.8)".parse::<Easing>().unwrap(),
        Easing::ElasticOut {
            amplitude: 1.0,
            period: 0.8
        }
    );
    assert!(matches!(
        "bounce.out".parse::<Easing>(),
        Err(CosmosError::UnknownEasing(_))
    ));
}
