// Host-side tests for the section recipes: regions and timeline endpoints.

use cosmos_core::lifecycle::Liveness;
use cosmos_core::progress::{ElementMetrics, Scrub, Viewport};
use cosmos_core::recipes::*;
use cosmos_core::scroll::TriggerId;
use cosmos_core::timeline::{Playback, Property, TargetId};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

const SECTION: TriggerId = TriggerId(1);

fn ids(range: std::ops::Range<u32>) -> Vec<TargetId> {
    range.map(TargetId).collect()
}

#[test]
fn hero_intro_starts_hidden_and_ends_at_rest() {
    let blobs = ids(0..3);
    let heading = ids(3..5);
    let text = TargetId(5);
    let buttons = ids(6..8);
    let tl = hero_intro(&blobs, &heading, Some(text), &buttons).unwrap();
    // blobs 1.9 s, heading at -1 s, text at -0.6 s, buttons at -0.4 s
    assert!(approx_eq(tl.duration_sec(), 2.5));

    let start = tl.evaluate(0.0);
    for b in &blobs {
        assert_eq!(start.get(*b, Property::Scale), Some(0.0));
        assert_eq!(start.get(*b, Property::Opacity), Some(0.0));
    }
    assert_eq!(start.get(heading[0], Property::Y), Some(100.0));
    assert_eq!(start.get(text, Property::Y), Some(50.0));
    assert_eq!(start.get(buttons[1], Property::X), Some(-30.0));

    let end = tl.evaluate(1.0);
    for (_, property, value) in end.iter() {
        assert!(approx_eq(value, property.identity()), "{property:?} = {value}");
    }
}

#[test]
fn hero_intro_tolerates_missing_groups() {
    let tl = hero_intro(&[], &ids(0..2), None, &[]).unwrap();
    assert!(approx_eq(tl.duration_sec(), 1.0));
    assert!(hero_intro(&[], &[], None, &[]).is_err());
}

#[test]
fn idle_loops_breathe_between_rest_and_peak() {
    let blobs = ids(0..2);
    let tl = blob_float(&blobs).unwrap();
    assert!(approx_eq(tl.duration_sec(), 2.5));
    assert_eq!(tl.evaluate(0.0).get(blobs[0], Property::Scale), Some(1.0));
    assert!(approx_eq(tl.evaluate(1.0).get(blobs[1], Property::Scale).unwrap(), 1.2));

    let pulse = indicator_pulse(TargetId(9)).unwrap();
    assert!(approx_eq(pulse.evaluate(1.0).get(TargetId(9), Property::Scale).unwrap(), 1.1));
}

#[test]
fn hero_scroll_recipes_use_their_regions() {
    let p = hero_scroll_parallax(SECTION, TargetId(1)).unwrap();
    assert_eq!(p.region.scrub, Scrub::Smooth(1.0));
    let y = p.timeline.evaluate(1.0).get(TargetId(1), Property::Y).unwrap();
    assert!(approx_eq(y, HERO_SCROLL_PARALLAX_PX));

    let el = ElementMetrics {
        top: 0.0,
        height: 900.0,
    };
    let vp = Viewport::new(1200.0, 900.0);
    let bg = hero_background(SECTION, TargetId(2)).unwrap();
    let b = bg.region.resolve(el, vp);
    assert_eq!((b.start, b.end), (0.0, 900.0));
    assert_eq!(bg.timeline.evaluate(1.0).get(TargetId(2), HERO_BG_MIX), Some(1.0));

    let ind = hero_scroll_indicator(SECTION, TargetId(3)).unwrap();
    let op = |c| ind.timeline.evaluate(c).get(TargetId(3), Property::Opacity).unwrap();
    assert_eq!(op(0.0), 1.0);
    assert!(approx_eq(op(0.25), 0.5));
    assert_eq!(op(0.75), 0.0);
}

#[test]
fn space_drift_moves_every_star_up_by_its_own_height() {
    let stars = ids(0..40);
    let content = TargetId(100);
    let r = space_drift(SECTION, &stars, Some(content), &mut StdRng::seed_from_u64(2)).unwrap();
    let end = r.timeline.evaluate(1.0);
    let mut distinct = 0;
    for s in &stars {
        let x = end.get(*s, Property::XPercent).unwrap();
        assert!((-100.0..=100.0).contains(&x));
        if x != 0.0 {
            distinct += 1;
        }
        assert_eq!(end.get(*s, Property::YPercent), Some(-100.0));
    }
    assert!(distinct > 30);
    assert!(approx_eq(end.get(content, Property::Y).unwrap(), SPACE_CONTENT_DRIFT_PX));
    assert_eq!(r.region.scrub, Scrub::Smooth(1.0));
}

#[test]
fn black_hole_collapse_pulls_stars_into_the_centre() {
    let hole = TargetId(0);
    let stars = ids(1..4);
    let container = TargetId(10);
    let r = black_hole_collapse(SECTION, hole, &stars, container, 720.0).unwrap();
    assert!(approx_eq(r.timeline.duration_sec(), 1.002));

    let start = r.timeline.evaluate(0.0);
    assert_eq!(start.get(hole, Property::Scale), Some(0.5));
    assert_eq!(start.get(hole, Property::Opacity), Some(0.4));
    assert_eq!(start.get(container, VOID_MIX), Some(0.0));

    let end = r.timeline.evaluate(1.0);
    assert!(approx_eq(end.get(hole, Property::Scale).unwrap(), 1.5));
    assert!(approx_eq(end.get(hole, Property::RotationZ).unwrap(), 180.0));
    for s in &stars {
        assert!(approx_eq(end.get(*s, Property::Y).unwrap(), -360.0));
        assert!(approx_eq(end.get(*s, Property::Opacity).unwrap(), 0.0));
        assert!(approx_eq(end.get(*s, Property::Scale).unwrap(), 2.0));
    }
    assert!(approx_eq(end.get(container, VOID_MIX).unwrap(), 1.0));
    // The fade to black starts in the second half only.
    assert_eq!(r.timeline.evaluate(0.4).get(container, VOID_MIX), Some(0.0));
}

#[test]
fn black_hole_collapse_rebuilt_for_a_taller_viewport_travels_further() {
    let stars = ids(1..3);
    let el = ElementMetrics {
        top: 1000.0,
        height: 1000.0,
    };
    let star_y = |height: f32| {
        let r = black_hole_collapse(SECTION, TargetId(0), &stars, TargetId(10), height).unwrap();
        let mut binding = r.bind(Liveness::new());
        binding.resize(el, Viewport::new(800.0, height));
        binding.on_scroll(2500.0);
        let values = binding.step(std::time::Duration::from_millis(16)).unwrap();
        values.get(stars[1], Property::Y).unwrap()
    };
    assert!(approx_eq(star_y(720.0), -360.0));
    assert!(approx_eq(star_y(1080.0), -540.0));
}

#[test]
fn black_hole_text_rises_in_the_lower_half() {
    let lines = ids(0..2);
    let r = black_hole_text(SECTION, &lines).unwrap();
    assert_eq!(r.region.scrub, Scrub::Smooth(0.5));
    let start = r.timeline.evaluate(0.0);
    assert_eq!(start.get(lines[1], Property::Opacity), Some(0.0));
    assert_eq!(start.get(lines[1], Property::Y), Some(50.0));
    let end = r.timeline.evaluate(1.0);
    assert!(approx_eq(end.get(lines[1], Property::Opacity).unwrap(), 1.0));
}

#[test]
fn chroma_dimmer_lights_one_item_at_a_time() {
    let items = ids(0..3);
    let r = chroma_dimmer(SECTION, &items).unwrap();
    let opacities = |c: f32| -> Vec<f32> {
        let v = r.timeline.evaluate(c);
        items.iter().map(|i| v.get(*i, Property::Opacity).unwrap()).collect()
    };
    let lit = |c: f32| {
        opacities(c)
            .iter()
            .map(|o| {
                if approx_eq(*o, 1.0) {
                    1
                } else if approx_eq(*o, CHROMA_DIM_OPACITY) {
                    0
                } else {
                    9
                }
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(lit(0.0), vec![1, 0, 0]);
    assert_eq!(lit(0.5), vec![0, 1, 0]);
    assert_eq!(lit(1.0), vec![0, 0, 1]);
}

#[test]
fn single_item_dimmer_holds_it_lit() {
    let r = chroma_dimmer(SECTION, &[TargetId(4)]).unwrap();
    assert_eq!(r.timeline.evaluate(0.7).get(TargetId(4), Property::Opacity), Some(1.0));
}

#[test]
fn chroma_aberration_peaks_at_the_section_centre() {
    let root = TargetId(0);
    let r = chroma_aberration(SECTION, root).unwrap();
    let at = |c| r.timeline.evaluate(c).get(root, CHROMA_ABERRATION).unwrap();
    assert_eq!(at(0.0), 0.0);
    assert!(approx_eq(at(0.25), CHROMA_ABERRATION_PEAK / 2.0));
    assert!(approx_eq(at(0.5), CHROMA_ABERRATION_PEAK));
    assert!(approx_eq(at(0.75), CHROMA_ABERRATION_PEAK / 2.0));
    assert!(approx_eq(at(1.0), 0.0));

    // The midpoint of the region is where the element centre meets the viewport centre.
    let el = ElementMetrics {
        top: 3000.0,
        height: 1200.0,
    };
    let vp = Viewport::new(1440.0, 900.0);
    let b = r.region.resolve(el, vp);
    let centre = el.top + el.height / 2.0 - vp.height / 2.0;
    assert!(approx_eq((b.start + b.end) / 2.0, centre));
    assert!(approx_eq(centre - b.start, el.height / 2.0 + 40.0));

    let hue = chroma_hue(SECTION, root).unwrap();
    assert!(approx_eq(hue.timeline.evaluate(0.5).get(root, CHROMA_HUE).unwrap(), 150.0));
    assert_eq!(hue.region.scrub, Scrub::Smooth(0.2));
}

#[test]
fn mission_heading_plays_once_when_it_enters() {
    let chars = ids(0..10);
    let r = mission_heading(SECTION, &chars).unwrap();
    assert_eq!(r.region.scrub, Scrub::Off);
    assert!(approx_eq(r.timeline.duration_sec(), 0.8 + 0.03 * 9.0));
    let start = r.timeline.evaluate(0.0);
    assert_eq!(start.get(chars[0], Property::Opacity), Some(0.0));
    assert_eq!(start.get(chars[9], Property::Y), Some(20.0));

    let binding = r.bind(Liveness::new());
    assert_eq!(binding.engine().playback(), Playback::Once);
    assert!(!binding.engine().is_playing());
}

#[test]
fn mission_cards_slide_up_in_sequence() {
    let cards = ids(0..3);
    let r = mission_cards(SECTION, &cards).unwrap();
    assert!(approx_eq(r.timeline.duration_sec(), 0.9));
    let v = r.timeline.evaluate(0.3);
    // card 0 has started, card 2 has not
    assert!(v.get(cards[0], Property::Y).unwrap() < 50.0);
    assert_eq!(v.get(cards[2], Property::Y), Some(50.0));
}
