//! Keyframe timelines evaluated on a normalized 0..1 span.
//!
//! Timelines are authored in seconds through [`TimelineBuilder`] and frozen
//! by [`TimelineBuilder::build`], which rescales every keyframe into the
//! timeline's own 0..1 span. Evaluation is a pure function of the cursor;
//! playback state lives in [`TimelineEngine`].
//!
//! Stagger and nesting are authoring conveniences only: they emit ordinary
//! keyframes with increasing offsets, so evaluation has a single code path.

use crate::easing::{lerp, Easing};
use crate::error::{CosmosError, Result};
use fnv::FnvHashMap;
use smallvec::SmallVec;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Animatable property of a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// Translation in pixels.
    X,
    Y,
    /// Translation in percent of the target's own size.
    XPercent,
    YPercent,
    Scale,
    Opacity,
    /// Rotation in degrees.
    RotationZ,
    /// A CSS custom property such as `--hue`.
    Custom(&'static str),
}

impl Property {
    /// Value a property holds when nothing has set it.
    pub fn identity(&self) -> f32 {
        match self {
            Property::Scale | Property::Opacity => 1.0,
            _ => 0.0,
        }
    }
}

/// One interpolation of a single property over `[offset, offset + duration]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub target: TargetId,
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    pub offset: f32,
    pub duration: f32,
}

impl Keyframe {
    fn local_progress(&self, at: f32) -> f32 {
        if self.duration <= 0.0 {
            return if at >= self.offset { 1.0 } else { 0.0 };
        }
        ((at - self.offset) / self.duration).clamp(0.0, 1.0)
    }

    /// Value at `at`, holding the boundary value outside the keyframe span.
    pub fn value_at(&self, at: f32) -> f32 {
        lerp(self.from, self.to, self.easing.apply(self.local_progress(at)))
    }
}

/// Evaluated output: target → property → value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values {
    entries: FnvHashMap<TargetId, SmallVec<[(Property, f32); 4]>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, target: TargetId, property: Property, value: f32) {
        let props = self.entries.entry(target).or_default();
        match props.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => props.push((property, value)),
        }
    }

    pub fn get(&self, target: TargetId, property: Property) -> Option<f32> {
        self.entries
            .get(&target)?
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }

    /// Properties of one target, in first-written order.
    pub fn target(&self, target: TargetId) -> &[(Property, f32)] {
        self.entries.get(&target).map(|p| p.as_slice()).unwrap_or(&[])
    }

    pub fn targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetId, Property, f32)> + '_ {
        self.entries
            .iter()
            .flat_map(|(t, props)| props.iter().map(move |(p, v)| (*t, *p, *v)))
    }

    /// Overwrite entries with those of `other`.
    pub fn merge(&mut self, other: &Values) {
        for (t, p, v) in other.iter() {
            self.set(t, p, v);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Clone, Debug)]
struct Channel {
    target: TargetId,
    property: Property,
    /// Indices into `keyframes`, ordered by offset then authoring order.
    keys: SmallVec<[u32; 4]>,
}

/// Immutable, normalized keyframe sequence.
#[derive(Clone, Debug)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
    channels: Vec<Channel>,
    duration_sec: f32,
}

impl Timeline {
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder::new()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Authored length in seconds; drives run-once and looping playback.
    pub fn duration_sec(&self) -> f32 {
        self.duration_sec
    }

    pub fn targets(&self) -> impl Iterator<Item = TargetId> + '_ {
        let mut seen: SmallVec<[TargetId; 16]> = SmallVec::new();
        self.channels.iter().filter_map(move |c| {
            if seen.contains(&c.target) {
                None
            } else {
                seen.push(c.target);
                Some(c.target)
            }
        })
    }

    /// Evaluate every channel at `cursor` (clamped to 0..1).
    pub fn evaluate(&self, cursor: f32) -> Values {
        let mut out = Values::new();
        self.evaluate_into(cursor, &mut out);
        out
    }

    pub fn evaluate_into(&self, cursor: f32, out: &mut Values) {
        let at = if cursor.is_nan() {
            0.0
        } else {
            cursor.clamp(0.0, 1.0)
        };
        for channel in &self.channels {
            let keys = channel.keys.iter().map(|&i| &self.keyframes[i as usize]);
            let value = channel_value(keys, at);
            if let Some(v) = value {
                out.set(channel.target, channel.property, v);
            }
        }
    }
}

/// The active keyframe is the latest one that has started; before any has
/// started the channel holds the first keyframe's `from`.
fn channel_value<'a>(keys: impl Iterator<Item = &'a Keyframe>, at: f32) -> Option<f32> {
    let mut first: Option<&Keyframe> = None;
    let mut active: Option<&Keyframe> = None;
    for k in keys {
        if first.is_none() {
            first = Some(k);
        }
        if k.offset <= at {
            active = Some(k);
        }
    }
    match (active, first) {
        (Some(k), _) => Some(k.value_at(at)),
        (None, Some(k)) => Some(k.from),
        (None, None) => None,
    }
}

/// Where a tween is placed on the timeline being built.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Position {
    /// Append at the current end of the timeline.
    #[default]
    End,
    /// Absolute time in seconds.
    At(f32),
    /// Relative to the end of the timeline (`"+=1"`, `"-=0.6"`).
    FromEnd(f32),
    /// Relative to the start of the previously added tween (`"<"`, `"<0.2"`).
    WithPrevious(f32),
    /// Relative to the end of the previously added tween (`">"`, `">-=0.5"`).
    AfterPrevious(f32),
}

fn parse_signed(s: &str) -> Option<f32> {
    if s.is_empty() {
        return Some(0.0);
    }
    if let Some(rest) = s.strip_prefix("+=") {
        return rest.parse().ok();
    }
    if let Some(rest) = s.strip_prefix("-=") {
        return rest.parse::<f32>().ok().map(|v| -v);
    }
    s.parse().ok()
}

impl FromStr for Position {
    type Err = CosmosError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || CosmosError::InvalidPosition(s.to_string());
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('<') {
            return parse_signed(rest).map(Position::WithPrevious).ok_or_else(bad);
        }
        if let Some(rest) = s.strip_prefix('>') {
            return parse_signed(rest).map(Position::AfterPrevious).ok_or_else(bad);
        }
        if s.starts_with("+=") || s.starts_with("-=") {
            return parse_signed(s).map(Position::FromEnd).ok_or_else(bad);
        }
        s.parse::<f32>().map(Position::At).map_err(|_| bad())
    }
}

/// Timing of one authored tween.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub duration: f32,
    pub easing: Option<Easing>,
    /// Delay in seconds between consecutive targets.
    pub stagger: f32,
}

impl Tween {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            easing: None,
            stagger: 0.0,
        }
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn stagger(mut self, each: f32) -> Self {
        self.stagger = each;
        self
    }
}

/// Start and/or end value of one property in a tween; a missing side is
/// taken from the property's value at the tween's start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropTween {
    pub property: Property,
    pub from: Option<f32>,
    pub to: Option<f32>,
}

impl PropTween {
    pub fn to(property: Property, to: f32) -> Self {
        Self {
            property,
            from: None,
            to: Some(to),
        }
    }

    pub fn from(property: Property, from: f32) -> Self {
        Self {
            property,
            from: Some(from),
            to: None,
        }
    }

    pub fn from_to(property: Property, from: f32, to: f32) -> Self {
        Self {
            property,
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Authoring-time keyframe, in seconds.
#[derive(Clone, Copy, Debug)]
struct RawKey {
    key: Keyframe,
}

pub struct TimelineBuilder {
    keys: Vec<RawKey>,
    initial: FnvHashMap<(TargetId, Property), f32>,
    default_easing: Easing,
    end: f32,
    last_start: f32,
    last_end: f32,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            initial: FnvHashMap::default(),
            default_easing: Easing::default(),
            end: 0.0,
            last_start: 0.0,
            last_end: 0.0,
        }
    }

    /// Easing used by tweens that do not name one.
    pub fn default_easing(mut self, easing: Easing) -> Self {
        self.default_easing = easing;
        self
    }

    fn resolve(&self, position: Position) -> f32 {
        let t = match position {
            Position::End => self.end,
            Position::At(t) => t,
            Position::FromEnd(d) => self.end + d,
            Position::WithPrevious(d) => self.last_start + d,
            Position::AfterPrevious(d) => self.last_end + d,
        };
        t.max(0.0)
    }

    /// Value of a channel at `at` seconds given the keys authored so far.
    fn current_value(&self, target: TargetId, property: Property, at: f32) -> f32 {
        let mut keys: SmallVec<[&Keyframe; 8]> = self
            .keys
            .iter()
            .map(|r| &r.key)
            .filter(|k| k.target == target && k.property == property)
            .collect();
        keys.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        // Only keys that have started matter here; an unstarted later key
        // must not leak its `from` backwards.
        let started = keys.iter().copied().filter(|k| k.offset <= at);
        channel_value(started, at).unwrap_or_else(|| {
            self.initial
                .get(&(target, property))
                .copied()
                .unwrap_or_else(|| property.identity())
        })
    }

    /// Set initial values without adding duration.
    pub fn set(mut self, targets: &[TargetId], values: &[(Property, f32)]) -> Self {
        for &target in targets {
            for &(property, value) in values {
                self.initial.insert((target, property), value);
            }
        }
        self
    }

    /// Add a tween whose property values may differ per target.
    pub fn tween_each(
        mut self,
        targets: &[TargetId],
        tween: Tween,
        position: Position,
        mut values: impl FnMut(usize) -> SmallVec<[PropTween; 4]>,
    ) -> Self {
        let start = self.resolve(position);
        let easing = tween.easing.unwrap_or(self.default_easing);
        let mut group_end = start + tween.duration;
        for (i, &target) in targets.iter().enumerate() {
            let offset = (start + i as f32 * tween.stagger).max(0.0);
            for pt in values(i) {
                let current = self.current_value(target, pt.property, offset);
                let key = Keyframe {
                    target,
                    property: pt.property,
                    from: pt.from.unwrap_or(current),
                    to: pt.to.unwrap_or(current),
                    easing,
                    offset,
                    duration: tween.duration,
                };
                self.keys.push(RawKey { key });
            }
            group_end = group_end.max(offset + tween.duration);
        }
        self.last_start = start;
        self.last_end = group_end;
        self.end = self.end.max(group_end);
        self
    }

    /// Animate from the current values to `values`.
    pub fn to(
        self,
        targets: &[TargetId],
        values: &[(Property, f32)],
        tween: Tween,
        position: Position,
    ) -> Self {
        self.tween_each(targets, tween, position, |_| {
            values.iter().map(|&(p, v)| PropTween::to(p, v)).collect()
        })
    }

    /// Animate from `values` to the current values.
    pub fn from(
        self,
        targets: &[TargetId],
        values: &[(Property, f32)],
        tween: Tween,
        position: Position,
    ) -> Self {
        self.tween_each(targets, tween, position, |_| {
            values.iter().map(|&(p, v)| PropTween::from(p, v)).collect()
        })
    }

    pub fn from_to(
        self,
        targets: &[TargetId],
        values: &[(Property, f32, f32)],
        tween: Tween,
        position: Position,
    ) -> Self {
        self.tween_each(targets, tween, position, |_| {
            values
                .iter()
                .map(|&(p, from, to)| PropTween::from_to(p, from, to))
                .collect()
        })
    }

    /// Place a built timeline as a sub-sequence; its keyframes are rescaled
    /// into `[start, start + sub.duration_sec()]`.
    pub fn nest(mut self, sub: &Timeline, position: Position) -> Self {
        let start = self.resolve(position);
        let span = sub.duration_sec;
        for k in &sub.keyframes {
            let mut key = *k;
            key.offset = start + k.offset * span;
            key.duration = k.duration * span;
            self.keys.push(RawKey { key });
        }
        self.last_start = start;
        self.last_end = start + span;
        self.end = self.end.max(start + span);
        self
    }

    pub fn build(self) -> Result<Timeline> {
        let mut keyframes: Vec<Keyframe> = self.keys.into_iter().map(|r| r.key).collect();
        // Channels only touched by `set` become zero-length keyframes at 0.
        let mut initial: Vec<_> = self.initial.into_iter().collect();
        initial.sort_by_key(|((t, _), _)| *t);
        for ((target, property), value) in initial {
            let animated = keyframes
                .iter()
                .any(|k| k.target == target && k.property == property);
            if !animated {
                keyframes.push(Keyframe {
                    target,
                    property,
                    from: value,
                    to: value,
                    easing: Easing::Linear,
                    offset: 0.0,
                    duration: 0.0,
                });
            }
        }
        if keyframes.is_empty() {
            return Err(CosmosError::EmptyTimeline);
        }
        let total = self.end;
        for k in &mut keyframes {
            if total > 0.0 {
                k.offset = (k.offset / total).clamp(0.0, 1.0);
                k.duration = (k.duration / total).clamp(0.0, 1.0 - k.offset);
            } else {
                k.offset = 0.0;
                k.duration = 0.0;
            }
        }
        keyframes.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        let mut channels: Vec<Channel> = Vec::new();
        let mut lookup: FnvHashMap<(TargetId, Property), usize> = FnvHashMap::default();
        for (i, k) in keyframes.iter().enumerate() {
            let slot = *lookup.entry((k.target, k.property)).or_insert_with(|| {
                channels.push(Channel {
                    target: k.target,
                    property: k.property,
                    keys: SmallVec::new(),
                });
                channels.len() - 1
            });
            channels[slot].keys.push(i as u32);
        }
        Ok(Timeline {
            keyframes,
            channels,
            duration_sec: total,
        })
    }
}

/// How a [`TimelineEngine`] moves its cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Playback {
    /// Cursor supplied externally (scroll bindings, pointer drivers).
    Scrub,
    /// Advance 0→1 over the timeline's duration once triggered.
    Once,
    /// Repeat forever, optionally reversing every other cycle.
    Loop { yoyo: bool },
}

/// Result of advancing a timeline by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Idle,
    Running,
    /// Returned exactly once, on the frame a run-once timeline finishes.
    Completed,
}

/// Playback cursor over an immutable [`Timeline`].
#[derive(Clone, Debug)]
pub struct TimelineEngine {
    timeline: Timeline,
    playback: Playback,
    cursor: f32,
    playing: bool,
    completed: bool,
    elapsed_sec: f32,
}

impl TimelineEngine {
    pub fn new(timeline: Timeline, playback: Playback) -> Self {
        Self {
            timeline,
            playback,
            cursor: 0.0,
            playing: false,
            completed: false,
            elapsed_sec: 0.0,
        }
    }

    pub fn scrub(timeline: Timeline) -> Self {
        Self::new(timeline, Playback::Scrub)
    }

    /// Run-once engine, already playing.
    pub fn once(timeline: Timeline) -> Self {
        let mut engine = Self::new(timeline, Playback::Once);
        engine.play();
        engine
    }

    /// Looping engine, already playing.
    pub fn looping(timeline: Timeline, yoyo: bool) -> Self {
        let mut engine = Self::new(timeline, Playback::Loop { yoyo });
        engine.play();
        engine
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start wall-clock playback. A finished run-once timeline stays finished.
    pub fn play(&mut self) {
        if self.playback == Playback::Scrub || self.completed {
            return;
        }
        self.playing = true;
    }

    /// Start wall-clock playback after `delay_sec`.
    pub fn play_after(&mut self, delay_sec: f32) {
        if self.playback == Playback::Scrub || self.completed || self.playing {
            return;
        }
        self.elapsed_sec = -delay_sec.max(0.0);
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Rewind to 0 and clear completion.
    pub fn restart(&mut self) {
        self.cursor = 0.0;
        self.elapsed_sec = 0.0;
        self.completed = false;
        self.playing = self.playback != Playback::Scrub;
    }

    /// Set the cursor directly; values outside 0..1 are clamped.
    pub fn seek(&mut self, cursor: f32) {
        self.cursor = if cursor.is_nan() {
            0.0
        } else {
            cursor.clamp(0.0, 1.0)
        };
    }

    pub fn advance(&mut self, dt: Duration) -> Step {
        if !self.playing {
            return Step::Idle;
        }
        self.elapsed_sec += dt.as_secs_f32();
        if self.elapsed_sec < 0.0 {
            return Step::Running;
        }
        let total = self.timeline.duration_sec;
        match self.playback {
            Playback::Scrub => Step::Idle,
            Playback::Once => {
                let t = if total > 0.0 {
                    self.elapsed_sec / total
                } else {
                    1.0
                };
                self.cursor = t.clamp(0.0, 1.0);
                if t >= 1.0 {
                    self.playing = false;
                    self.completed = true;
                    Step::Completed
                } else {
                    Step::Running
                }
            }
            Playback::Loop { yoyo } => {
                if total <= 0.0 {
                    self.cursor = 1.0;
                    return Step::Running;
                }
                let cycles = self.elapsed_sec / total;
                let phase = cycles.fract();
                let reversed = yoyo && (cycles.floor() as u64) % 2 == 1;
                self.cursor = if reversed { 1.0 - phase } else { phase };
                Step::Running
            }
        }
    }

    /// Whether a run-once sequence has finished (or a scrubbed one reached 1).
    pub fn complete(&self) -> bool {
        match self.playback {
            Playback::Once => self.completed,
            Playback::Scrub => self.cursor >= 1.0,
            Playback::Loop { .. } => false,
        }
    }

    pub fn evaluate(&self) -> Values {
        self.timeline.evaluate(self.cursor)
    }

    pub fn evaluate_into(&self, out: &mut Values) {
        self.timeline.evaluate_into(self.cursor, out);
    }
}
