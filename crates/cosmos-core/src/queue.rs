//! Messages from event listeners, drained once per animation frame.
//!
//! Listeners never touch scene or timeline state directly; they push an
//! [`Input`] and return. The frame callback drains the queue into a
//! [`FrameInput`], so scroll mapping and pointer handling run at most once
//! per frame no matter how many events the browser delivered.

use crate::progress::Viewport;
use glam::Vec2;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Opaque id of a hoverable element registered by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HoverId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    Scroll(f32),
    Resize(Viewport),
    /// Client (viewport) coordinates in CSS pixels.
    PointerMove(Vec2),
    PointerDown(Vec2),
    PointerUp(Vec2),
    Click(Vec2),
    PointerLeave,
    PointerEnter,
    HoverEnter(HoverId),
    HoverLeave(HoverId),
}

/// Coalesced input for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub scroll: Option<f32>,
    pub resize: Option<Viewport>,
    pub pointer: Option<Vec2>,
    pub pointer_down: Option<Vec2>,
    pub pointer_up: Option<Vec2>,
    /// Discrete clicks in arrival order.
    pub clicks: SmallVec<[Vec2; 2]>,
    /// Last enter/leave transition of the window, `true` = inside.
    pub inside: Option<bool>,
    pub hover: SmallVec<[(HoverId, bool); 2]>,
}

impl FrameInput {
    pub fn is_empty(&self) -> bool {
        *self == FrameInput::default()
    }
}

#[derive(Debug, Default)]
pub struct UpdateQueue {
    pending: VecDeque<Input>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: Input) {
        self.pending.push_back(input);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empty the queue, keeping only the latest continuous samples.
    pub fn drain(&mut self) -> FrameInput {
        let mut out = FrameInput::default();
        for input in self.pending.drain(..) {
            match input {
                Input::Scroll(offset) if offset.is_finite() => out.scroll = Some(offset),
                Input::Scroll(_) => {}
                Input::Resize(vp) => out.resize = Some(vp),
                Input::PointerMove(p) => out.pointer = Some(p),
                Input::PointerDown(p) => {
                    out.pointer = Some(p);
                    out.pointer_down.get_or_insert(p);
                }
                Input::PointerUp(p) => {
                    out.pointer = Some(p);
                    out.pointer_up = Some(p);
                }
                Input::Click(p) => out.clicks.push(p),
                Input::PointerLeave => out.inside = Some(false),
                Input::PointerEnter => out.inside = Some(true),
                Input::HoverEnter(id) => out.hover.push((id, true)),
                Input::HoverLeave(id) => out.hover.push((id, false)),
            }
        }
        out
    }
}
