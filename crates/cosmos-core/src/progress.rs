//! Scroll progress mapping.
//!
//! A [`Region`] names two scroll anchors, each pairing a point on the trigger
//! element with a point on the viewport (`"top center"`, `"bottom top"`,
//! `"center center+=40"`). Anchors are kept as fractions and only turned into
//! absolute pixels by [`Region::resolve`], so a resize followed by a fresh
//! resolve reproduces the same progress for the same scroll offset.

use crate::error::{CosmosError, Result};
use std::str::FromStr;

/// Document-space position and size of the trigger element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementMetrics {
    pub top: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One side of a region boundary: "element point meets viewport point".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    /// Fraction of the element height (0 = top, 1 = bottom).
    pub element: f32,
    pub element_offset_px: f32,
    /// Fraction of the viewport height (0 = top, 1 = bottom).
    pub viewport: f32,
    pub viewport_offset_px: f32,
}

impl Anchor {
    pub const fn new(element: f32, viewport: f32) -> Self {
        Self {
            element,
            element_offset_px: 0.0,
            viewport,
            viewport_offset_px: 0.0,
        }
    }

    pub const fn with_viewport_offset(mut self, px: f32) -> Self {
        self.viewport_offset_px = px;
        self
    }

    /// Scroll offset at which the element point reaches the viewport point.
    pub fn resolve(&self, element: ElementMetrics, viewport: Viewport) -> f32 {
        let element_y = element.top + self.element * element.height + self.element_offset_px;
        let viewport_y = self.viewport * viewport.height + self.viewport_offset_px;
        element_y - viewport_y
    }
}

fn parse_term(term: &str, full: &str) -> Result<(f32, f32)> {
    let bad = || CosmosError::MalformedAnchor(full.to_string());
    let (head, offset) = match term.find("+=").or_else(|| term.find("-=")) {
        Some(i) => {
            let sign = if term[i..].starts_with('-') { -1.0 } else { 1.0 };
            let px: f32 = term[i + 2..]
                .trim_end_matches("px")
                .parse()
                .map_err(|_| bad())?;
            (&term[..i], sign * px)
        }
        None => (term, 0.0),
    };
    let frac = match head {
        "top" | "start" => 0.0,
        "center" => 0.5,
        "bottom" | "end" => 1.0,
        pct if pct.ends_with('%') => {
            pct.trim_end_matches('%').parse::<f32>().map_err(|_| bad())? / 100.0
        }
        _ => return Err(bad()),
    };
    Ok((frac, offset))
}

impl FromStr for Anchor {
    type Err = CosmosError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (element, element_offset_px) = match parts.next() {
            Some(t) => parse_term(t, s)?,
            None => return Err(CosmosError::MalformedAnchor(s.to_string())),
        };
        // A lone element term means "element point meets viewport top".
        let (viewport, viewport_offset_px) = match parts.next() {
            Some(t) => parse_term(t, s)?,
            None => (0.0, 0.0),
        };
        if parts.next().is_some() {
            return Err(CosmosError::MalformedAnchor(s.to_string()));
        }
        Ok(Self {
            element,
            element_offset_px,
            viewport,
            viewport_offset_px,
        })
    }
}

/// How a region drives its timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scrub {
    /// One-shot: crossing the start anchor plays the timeline once.
    Off,
    /// Continuous, applied immediately.
    Snap,
    /// Continuous, smoothed with the given catch-up time in seconds.
    Smooth(f32),
}

impl Scrub {
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Scrub::Off)
    }

    pub fn damping_sec(&self) -> f32 {
        match self {
            Scrub::Smooth(sec) => sec.max(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub start: Anchor,
    pub end: Anchor,
    pub scrub: Scrub,
}

impl Region {
    pub fn new(start: Anchor, end: Anchor, scrub: Scrub) -> Self {
        Self { start, end, scrub }
    }

    /// Build a region from anchor strings, e.g. `("top center", "center center")`.
    pub fn parse(start: &str, end: &str, scrub: Scrub) -> Result<Self> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
            scrub,
        })
    }

    pub fn resolve(&self, element: ElementMetrics, viewport: Viewport) -> RegionBounds {
        RegionBounds {
            start: self.start.resolve(element, viewport),
            end: self.end.resolve(element, viewport),
            scrub: self.scrub,
        }
    }
}

/// Absolute pixel bounds of a region for one layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionBounds {
    pub start: f32,
    pub end: f32,
    pub scrub: Scrub,
}

impl RegionBounds {
    pub fn is_malformed(&self) -> bool {
        let span = self.end - self.start;
        !(span.is_finite() && span > 0.0)
    }

    /// Validate the bounds, reporting a zero-height or inverted region.
    pub fn validate(&self) -> Result<()> {
        if self.is_malformed() {
            return Err(CosmosError::MalformedRegion {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Whether the scroll offset has reached the start anchor.
    pub fn is_entered(&self, scroll_offset: f32) -> bool {
        scroll_offset.is_finite() && scroll_offset >= self.start
    }

    /// Map a scroll offset to progress.
    ///
    /// Offsets before the start anchor map to 0. Past the end anchor a
    /// one-shot region saturates at 1 while a scrub region keeps growing; the
    /// consuming timeline clamps. A malformed region degrades to a step at its
    /// start anchor instead of dividing by a zero or negative span.
    pub fn progress(&self, scroll_offset: f32) -> f32 {
        if !scroll_offset.is_finite() {
            return 0.0;
        }
        if scroll_offset < self.start {
            return 0.0;
        }
        if self.is_malformed() {
            return 1.0;
        }
        let raw = (scroll_offset - self.start) / (self.end - self.start);
        if self.scrub.is_continuous() {
            raw.max(0.0)
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}

/// Progress of `region` for a scroll offset, resolving anchors against the
/// current element layout and viewport.
pub fn progress(
    scroll_offset: f32,
    region: &Region,
    element: ElementMetrics,
    viewport: Viewport,
) -> f32 {
    region.resolve(element, viewport).progress(scroll_offset)
}
