//! Regions and timelines of each visual section.
//!
//! Pure builders: callers pass the [`TargetId`]s they assigned to DOM nodes
//! and get back timelines (plus a region for scroll-driven ones). The web
//! front-end binds them and writes the evaluated values to styles.

use crate::easing::Easing;
use crate::error::Result;
use crate::lifecycle::Liveness;
use crate::progress::{Region, Scrub};
use crate::scroll::{ScrollBinding, TriggerId};
use crate::timeline::{Position, PropTween, Property, TargetId, Timeline, Tween};
use rand::Rng;
use smallvec::smallvec;

pub const HERO_INTRO_DELAY_SEC: f32 = 0.1; // let layout settle before the reveal
pub const HERO_SCROLL_PARALLAX_PX: f32 = 100.0;
pub const HERO_BG_MIX: Property = Property::Custom("--hero-bg-mix");
pub const CHROMA_HUE: Property = Property::Custom("--hue");
pub const CHROMA_ABERRATION: Property = Property::Custom("--chroma");
pub const CHROMA_HUE_RANGE: (f32, f32) = (0.0, 300.0);
pub const CHROMA_ABERRATION_PEAK: f32 = 0.3;
pub const CHROMA_DIM_OPACITY: f32 = 0.2;
pub const VOID_MIX: Property = Property::Custom("--void");
pub const SPACE_CONTENT_DRIFT_PX: f32 = 100.0;

/// A scroll-driven timeline with the region that drives it.
#[derive(Clone, Debug)]
pub struct Recipe {
    pub name: &'static str,
    pub trigger: TriggerId,
    pub region: Region,
    pub timeline: Timeline,
}

impl Recipe {
    pub fn bind(self, liveness: Liveness) -> ScrollBinding {
        log::debug!("[scroll] binding {}", self.name);
        ScrollBinding::new(self.trigger, self.region, self.timeline, liveness)
    }
}

/// Staggered entrance of the hero: blobs, heading lines, copy, buttons.
pub fn hero_intro(
    blobs: &[TargetId],
    heading: &[TargetId],
    text: Option<TargetId>,
    buttons: &[TargetId],
) -> Result<Timeline> {
    let mut tl = Timeline::builder().default_easing(Easing::POWER3_OUT);
    if !blobs.is_empty() {
        tl = tl.from(
            blobs,
            &[(Property::Scale, 0.0), (Property::Opacity, 0.0)],
            Tween::new(1.5).stagger(0.2).ease(Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.8,
            }),
            Position::End,
        );
    }
    if !heading.is_empty() {
        tl = tl.from(
            heading,
            &[(Property::Y, 100.0), (Property::Opacity, 0.0)],
            Tween::new(0.8).stagger(0.2),
            Position::FromEnd(-1.0),
        );
    }
    if let Some(text) = text {
        tl = tl.from(
            &[text],
            &[(Property::Y, 50.0), (Property::Opacity, 0.0)],
            Tween::new(0.8),
            Position::FromEnd(-0.6),
        );
    }
    if !buttons.is_empty() {
        tl = tl.from(
            buttons,
            &[(Property::X, -30.0), (Property::Opacity, 0.0)],
            Tween::new(0.6).stagger(0.2),
            Position::FromEnd(-0.4),
        );
    }
    tl.build()
}

/// Breathing background blobs; loop with yoyo.
pub fn blob_float(blobs: &[TargetId]) -> Result<Timeline> {
    Timeline::builder()
        .from_to(
            blobs,
            &[(Property::Scale, 1.0, 1.2)],
            Tween::new(2.0).stagger(0.5).ease(Easing::SINE_IN_OUT),
            Position::At(0.0),
        )
        .build()
}

/// Pulse of the scroll indicator; loop with yoyo.
pub fn indicator_pulse(target: TargetId) -> Result<Timeline> {
    Timeline::builder()
        .from_to(
            &[target],
            &[(Property::Scale, 1.0, 1.1)],
            Tween::new(1.5).ease(Easing::SINE_IN_OUT),
            Position::At(0.0),
        )
        .build()
}

/// The hero visual sinks as the hero scrolls away.
pub fn hero_scroll_parallax(trigger: TriggerId, visual: TargetId) -> Result<Recipe> {
    Ok(Recipe {
        name: "hero-parallax",
        trigger,
        region: Region::parse("top top", "bottom top", Scrub::Smooth(1.0))?,
        timeline: Timeline::builder()
            .to(
                &[visual],
                &[(Property::Y, HERO_SCROLL_PARALLAX_PX)],
                Tween::new(0.5),
                Position::End,
            )
            .build()?,
    })
}

/// Page background shifts to the deeper gradient in the lower hero.
pub fn hero_background(trigger: TriggerId, root: TargetId) -> Result<Recipe> {
    Ok(Recipe {
        name: "hero-background",
        trigger,
        region: Region::parse("center center", "bottom top", Scrub::Snap)?,
        timeline: Timeline::builder()
            .from_to(&[root], &[(HERO_BG_MIX, 0.0, 1.0)], Tween::new(0.5), Position::End)
            .build()?,
    })
}

/// Scroll indicator fades out over the first half of the hero.
pub fn hero_scroll_indicator(trigger: TriggerId, indicator: TargetId) -> Result<Recipe> {
    Ok(Recipe {
        name: "hero-indicator",
        trigger,
        region: Region::parse("top top", "bottom top", Scrub::Snap)?,
        timeline: Timeline::builder()
            .from_to(
                &[indicator],
                &[(Property::Opacity, 1.0, 0.0)],
                Tween::new(0.5).ease(Easing::Linear),
                Position::At(0.0),
            )
            // holds at 0 for the second half
            .to(&[indicator], &[(Property::Opacity, 0.0)], Tween::new(0.5), Position::End)
            .build()?,
    })
}

/// Stars drift sideways and upward through the space section; the content
/// sinks with the same region.
pub fn space_drift(
    trigger: TriggerId,
    stars: &[TargetId],
    content: Option<TargetId>,
    rng: &mut impl Rng,
) -> Result<Recipe> {
    let mut tl = Timeline::builder().default_easing(Easing::Linear);
    if !stars.is_empty() {
        let drifts: Vec<f32> = stars.iter().map(|_| rng.gen_range(-100.0..100.0)).collect();
        tl = tl.tween_each(stars, Tween::new(0.5), Position::At(0.0), |i| {
            smallvec![
                PropTween::to(Property::XPercent, drifts[i]),
                PropTween::to(Property::YPercent, -100.0),
            ]
        });
    }
    if let Some(content) = content {
        tl = tl.from_to(
            &[content],
            &[(Property::Y, 0.0, SPACE_CONTENT_DRIFT_PX)],
            Tween::new(0.5).ease(Easing::default()),
            Position::At(0.0),
        );
    }
    Ok(Recipe {
        name: "space-drift",
        trigger,
        region: Region::parse("top bottom", "bottom top", Scrub::Smooth(1.0))?,
        timeline: tl.build()?,
    })
}

/// Black hole grows and spins while its stars fall in, then the section
/// fades to black.
pub fn black_hole_collapse(
    trigger: TriggerId,
    hole: TargetId,
    stars: &[TargetId],
    container: TargetId,
    viewport_height: f32,
) -> Result<Recipe> {
    let timeline = Timeline::builder()
        .set(&[hole], &[(Property::Scale, 0.5), (Property::Opacity, 0.4)])
        .to(
            &[hole],
            &[
                (Property::Scale, 1.5),
                (Property::Opacity, 0.8),
                (Property::RotationZ, 180.0),
            ],
            Tween::new(1.0),
            Position::End,
        )
        .to(
            stars,
            &[
                (Property::Scale, 2.0),
                (Property::Opacity, 0.0),
                (Property::X, 0.0),
                (Property::Y, -viewport_height / 2.0),
            ],
            Tween::new(1.0).stagger(0.001).ease(Easing::POWER3_IN),
            Position::WithPrevious(0.0),
        )
        .from_to(
            &[container],
            &[(VOID_MIX, 0.0, 1.0)],
            Tween::new(0.5),
            Position::AfterPrevious(-0.5),
        )
        .build()?;
    Ok(Recipe {
        name: "black-hole-collapse",
        trigger,
        region: Region::parse("top center", "center center", Scrub::Snap)?,
        timeline,
    })
}

/// Copy rises out of the black hole in the lower half of the section.
pub fn black_hole_text(trigger: TriggerId, lines: &[TargetId]) -> Result<Recipe> {
    Ok(Recipe {
        name: "black-hole-text",
        trigger,
        region: Region::parse("center center", "bottom center", Scrub::Smooth(0.5))?,
        timeline: Timeline::builder()
            .set(lines, &[(Property::Y, 50.0), (Property::Opacity, 0.0)])
            .to(
                lines,
                &[(Property::Y, 0.0), (Property::Opacity, 1.0)],
                Tween::new(0.5).stagger(0.2).ease(Easing::POWER3_OUT),
                Position::End,
            )
            .build()?,
    })
}

/// Each list item lights up in turn while the previous one dims.
pub fn chroma_dimmer(trigger: TriggerId, items: &[TargetId]) -> Result<Recipe> {
    let mut tl = Timeline::builder();
    for (i, &item) in items.iter().enumerate() {
        let initial = if i == 0 { 1.0 } else { CHROMA_DIM_OPACITY };
        tl = tl.set(&[item], &[(Property::Opacity, initial)]);
    }
    if items.len() > 1 {
        tl = tl
            .to(
                &items[1..],
                &[(Property::Opacity, 1.0)],
                Tween::new(0.5).stagger(0.5),
                Position::End,
            )
            .to(
                &items[..items.len() - 1],
                &[(Property::Opacity, CHROMA_DIM_OPACITY)],
                Tween::new(0.5).stagger(0.5),
                Position::At(0.0),
            );
    }
    Ok(Recipe {
        name: "chroma-dimmer",
        trigger,
        region: Region::parse("top center", "bottom center", Scrub::Smooth(0.2))?,
        timeline: tl.build()?,
    })
}

/// Global hue rotation across the chroma section.
pub fn chroma_hue(trigger: TriggerId, root: TargetId) -> Result<Recipe> {
    let (from, to) = CHROMA_HUE_RANGE;
    Ok(Recipe {
        name: "chroma-hue",
        trigger,
        region: Region::parse("top center", "bottom center", Scrub::Smooth(0.2))?,
        timeline: Timeline::builder()
            .from_to(
                &[root],
                &[(CHROMA_HUE, from, to)],
                Tween::new(0.5).ease(Easing::Linear),
                Position::End,
            )
            .build()?,
    })
}

/// Chromatic aberration rises into the section centre and falls away after.
///
/// Entry (`top center+=40` → `center center`) and exit (`center center` →
/// `bottom center-=40`) are mirror images around the centre anchor, so one
/// region split into two equal halves covers both.
pub fn chroma_aberration(trigger: TriggerId, root: TargetId) -> Result<Recipe> {
    Ok(Recipe {
        name: "chroma-aberration",
        trigger,
        region: Region::parse("top center+=40", "bottom center-=40", Scrub::Smooth(0.2))?,
        timeline: Timeline::builder()
            .default_easing(Easing::Linear)
            .from_to(
                &[root],
                &[(CHROMA_ABERRATION, 0.0, CHROMA_ABERRATION_PEAK)],
                Tween::new(0.5),
                Position::At(0.0),
            )
            .from_to(
                &[root],
                &[(CHROMA_ABERRATION, CHROMA_ABERRATION_PEAK, 0.0)],
                Tween::new(0.5),
                Position::At(0.5),
            )
            .build()?,
    })
}

/// Per-character heading reveal, played once when the heading enters.
pub fn mission_heading(trigger: TriggerId, chars: &[TargetId]) -> Result<Recipe> {
    Ok(Recipe {
        name: "mission-heading",
        trigger,
        region: Region::parse("top 80%", "bottom top", Scrub::Off)?,
        timeline: Timeline::builder()
            .set(chars, &[(Property::Opacity, 0.0), (Property::Y, 20.0)])
            .to(
                chars,
                &[(Property::Opacity, 1.0), (Property::Y, 0.0)],
                Tween::new(0.8).stagger(0.03).ease(Easing::POWER3_OUT),
                Position::End,
            )
            .build()?,
    })
}

/// Mission cards slide up one after another once in view.
pub fn mission_cards(trigger: TriggerId, cards: &[TargetId]) -> Result<Recipe> {
    Ok(Recipe {
        name: "mission-cards",
        trigger,
        region: Region::parse("top bottom", "bottom top", Scrub::Off)?,
        timeline: Timeline::builder()
            .from(
                cards,
                &[(Property::Y, 50.0), (Property::Opacity, 0.0)],
                Tween::new(0.5)
                    .stagger(0.2)
                    .ease(Easing::CubicBezier(0.25, 0.1, 0.25, 1.0)),
                Position::End,
            )
            .build()?,
    })
}
