// Host-side tests for scroll progress mapping.

use cosmos_core::error::CosmosError;
use cosmos_core::progress::*;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

const ELEMENT: ElementMetrics = ElementMetrics {
    top: 1000.0,
    height: 800.0,
};
const VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 720.0,
};

#[test]
fn quarter_of_element_into_half_height_region_is_half_progress() {
    // start: element top meets viewport top; end: 50% of the element meets viewport top
    let region = Region::parse("top top", "50% top", Scrub::Off).unwrap();
    let bounds = region.resolve(ELEMENT, VIEWPORT);
    assert_eq!(bounds.start, 1000.0);
    assert_eq!(bounds.end, 1400.0);
    // 25% of the element height past its top
    let p = progress(1200.0, &region, ELEMENT, VIEWPORT);
    assert!(approx_eq(p, 0.5), "got {p}");
}

#[test]
fn before_start_is_zero_and_after_end_saturates_without_scrub() {
    let region = Region::parse("top center", "bottom center", Scrub::Off).unwrap();
    let b = region.resolve(ELEMENT, VIEWPORT);
    assert_eq!(b.progress(0.0), 0.0);
    assert_eq!(b.progress(b.start - 0.01), 0.0);
    assert_eq!(b.progress(b.end + 0.01), 1.0);
    assert_eq!(b.progress(b.end + 10_000.0), 1.0);
}

#[test]
fn scrub_region_overshoots_past_end() {
    let region = Region::parse("top top", "50% top", Scrub::Snap).unwrap();
    let b = region.resolve(ELEMENT, VIEWPORT);
    assert!(approx_eq(b.progress(1800.0), 2.0));
    assert_eq!(b.progress(500.0), 0.0);
}

#[test]
fn progress_is_monotonic_in_scroll_offset() {
    for scrub in [Scrub::Off, Scrub::Snap, Scrub::Smooth(1.0)] {
        let region = Region::parse("top bottom", "bottom top", scrub).unwrap();
        let b = region.resolve(ELEMENT, VIEWPORT);
        let mut last = f32::NEG_INFINITY;
        let mut y = -500.0;
        while y < 4000.0 {
            let p = b.progress(y);
            assert!(p >= last, "{scrub:?}: progress fell from {last} to {p} at {y}");
            last = p;
            y += 7.0;
        }
    }
}

#[test]
fn resize_and_restore_reproduces_progress() {
    let region = Region::parse("top center", "center center", Scrub::Snap).unwrap();
    let before = region.resolve(ELEMENT, VIEWPORT);
    let p = before.progress(900.0);

    let narrow = Viewport::new(400.0, 900.0);
    let reflowed = ElementMetrics {
        top: 1600.0,
        height: 1400.0,
    };
    let during = region.resolve(reflowed, narrow);
    assert_ne!(during, before);

    let after = region.resolve(ELEMENT, VIEWPORT);
    assert_eq!(after, before);
    assert_eq!(after.progress(900.0), p);
}

#[test]
fn anchors_track_layout_fractions() {
    // The element top meeting the viewport centre is progress 0 in any layout.
    let region = Region::parse("top center", "bottom center", Scrub::Off).unwrap();
    for (el, vp) in [
        (ELEMENT, VIEWPORT),
        (
            ElementMetrics {
                top: 2500.0,
                height: 300.0,
            },
            Viewport::new(390.0, 844.0),
        ),
    ] {
        let at_start = el.top - vp.height / 2.0;
        assert_eq!(progress(at_start, &region, el, vp), 0.0);
        let midway = at_start + el.height / 2.0;
        assert!(approx_eq(progress(midway, &region, el, vp), 0.5));
    }
}

#[test]
fn pixel_offsets_shift_the_viewport_point() {
    let a: Anchor = "top center+=40".parse().unwrap();
    assert_eq!(a.resolve(ELEMENT, VIEWPORT), 1000.0 - (360.0 + 40.0));
    let b: Anchor = "bottom center-=40".parse().unwrap();
    assert_eq!(b.resolve(ELEMENT, VIEWPORT), 1800.0 - (360.0 - 40.0));
}

#[test]
fn inverted_region_is_a_step_not_nan() {
    let region = Region::parse("bottom top", "top top", Scrub::Snap).unwrap();
    let b = region.resolve(ELEMENT, VIEWPORT);
    assert!(b.is_malformed());
    assert!(matches!(b.validate(), Err(CosmosError::MalformedRegion { .. })));
    assert_eq!(b.progress(500.0), 0.0);
    assert_eq!(b.progress(1500.0), 0.0);
    assert_eq!(b.progress(1800.0), 1.0);
    assert_eq!(b.progress(9000.0), 1.0);
}

#[test]
fn zero_height_region_never_produces_nan() {
    let flat = ElementMetrics {
        top: 1000.0,
        height: 0.0,
    };
    let region = Region::parse("top top", "bottom top", Scrub::Smooth(0.5)).unwrap();
    let b = region.resolve(flat, VIEWPORT);
    assert!(b.is_malformed());
    let mut y = 0.0;
    while y < 2000.0 {
        let p = b.progress(y);
        assert!(p.is_finite());
        assert!(p == 0.0 || p == 1.0);
        y += 50.0;
    }
    assert_eq!(b.progress(1000.0), 1.0);
}

#[test]
fn non_finite_scroll_maps_to_zero() {
    let region = Region::parse("top top", "bottom top", Scrub::Snap).unwrap();
    let b = region.resolve(ELEMENT, VIEWPORT);
    assert_eq!(b.progress(f32::NAN), 0.0);
    assert_eq!(b.progress(f32::INFINITY), 0.0);
    assert!(!b.is_entered(f32::NAN));
}

#[test]
fn rejects_unknown_anchor_terms() {
    assert!(matches!(
        "middle center".parse::<Anchor>(),
        Err(CosmosError::MalformedAnchor(_))
    ));
    assert!("top center bottom".parse::<Anchor>().is_err());
    assert!("top center+=abc".parse::<Anchor>().is_err());
    assert!(Region::parse("top", "", Scrub::Off).is_err());
}
