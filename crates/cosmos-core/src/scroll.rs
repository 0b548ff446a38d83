//! Scroll bindings: region progress → timeline cursor.

use crate::lifecycle::Liveness;
use crate::progress::{ElementMetrics, Region, RegionBounds, Scrub, Viewport};
use crate::timeline::{Playback, Step, Timeline, TimelineEngine, Values};
use std::time::Duration;

/// Opaque handle to the DOM element a region is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerId(pub u32);

/// Exponential approach of `current` toward `target` with catch-up time `tau`.
#[inline]
pub fn smooth_toward(current: f32, target: f32, tau_sec: f32, dt_sec: f32) -> f32 {
    if tau_sec <= 0.0 || !current.is_finite() {
        return target;
    }
    let alpha = 1.0 - (-dt_sec.max(0.0) / tau_sec).exp();
    current + (target - current) * alpha
}

/// Live association of one region with one timeline.
#[derive(Debug)]
pub struct ScrollBinding {
    trigger: TriggerId,
    region: Region,
    bounds: RegionBounds,
    engine: TimelineEngine,
    liveness: Liveness,
    target: f32,
    smoothed: f32,
    primed: bool,
    /// Most recent offset fed through `on_scroll`, replayed on resize.
    last_scroll: Option<f32>,
    values: Values,
}

impl ScrollBinding {
    pub fn new(trigger: TriggerId, region: Region, timeline: Timeline, liveness: Liveness) -> Self {
        let playback = if region.scrub.is_continuous() {
            Playback::Scrub
        } else {
            Playback::Once
        };
        let bounds = region.resolve(ElementMetrics::default(), Viewport::default());
        Self {
            trigger,
            region,
            bounds,
            engine: TimelineEngine::new(timeline, playback),
            liveness,
            target: 0.0,
            smoothed: 0.0,
            primed: false,
            last_scroll: None,
            values: Values::new(),
        }
    }

    pub fn trigger(&self) -> TriggerId {
        self.trigger
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn bounds(&self) -> RegionBounds {
        self.bounds
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Recompute absolute bounds from the fractional anchors and re-derive
    /// progress for the last known scroll offset.
    pub fn resize(&mut self, element: ElementMetrics, viewport: Viewport) {
        if !self.is_live() {
            return;
        }
        self.bounds = self.region.resolve(element, viewport);
        if let Err(e) = self.bounds.validate() {
            log::warn!("[scroll] {e}, treating as a step");
        }
        // Re-snap after a layout change instead of easing across the jump.
        self.primed = false;
        if let Some(offset) = self.last_scroll {
            self.retarget(offset);
        }
    }

    /// Feed a scroll offset; returns the raw (unsmoothed) progress.
    pub fn on_scroll(&mut self, scroll_offset: f32) -> f32 {
        if !self.is_live() {
            return self.target;
        }
        self.last_scroll = Some(scroll_offset);
        self.retarget(scroll_offset)
    }

    fn retarget(&mut self, scroll_offset: f32) -> f32 {
        self.target = self.bounds.progress(scroll_offset);
        if self.region.scrub == Scrub::Off && self.bounds.is_entered(scroll_offset) {
            self.engine.play();
        }
        self.target
    }

    /// Advance smoothing or playback by one frame and evaluate.
    /// Returns `None` once the owning section has been released.
    pub fn step(&mut self, dt: Duration) -> Option<&Values> {
        if !self.is_live() {
            return None;
        }
        match self.region.scrub {
            Scrub::Off => {
                if self.engine.advance(dt) == Step::Completed {
                    log::debug!("[scroll] one-shot timeline finished");
                }
            }
            scrub => {
                self.smoothed = if self.primed {
                    smooth_toward(self.smoothed, self.target, scrub.damping_sec(), dt.as_secs_f32())
                } else {
                    self.primed = true;
                    self.target
                };
                self.engine.seek(self.smoothed);
            }
        }
        self.values.clear();
        self.engine.evaluate_into(&mut self.values);
        Some(&self.values)
    }

    /// Smoothed progress as last applied to the timeline.
    pub fn applied_progress(&self) -> f32 {
        match self.region.scrub {
            Scrub::Off => self.engine.cursor(),
            _ => self.smoothed,
        }
    }
}
