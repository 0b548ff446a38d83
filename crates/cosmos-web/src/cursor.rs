use crate::constants::{CURSOR_ENLARGED_CLASS, CURSOR_ID, CURSOR_VISIBLE_CLASS};
use crate::render::GpuState;
use cosmos_core::interaction::{CursorConfig, CursorFollower, InteractionController};
use cosmos_core::progress::Viewport;
use cosmos_core::queue::FrameInput;
use std::time::Duration;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Custom cursor element driven by a spring follower.
pub struct CursorView {
    el: web::HtmlElement,
    controller: InteractionController,
    visible: bool,
    enlarged: bool,
}

impl CursorView {
    /// `None` when the page has no cursor element.
    pub fn mount(document: &web::Document) -> Option<Self> {
        let el = document
            .get_element_by_id(CURSOR_ID)?
            .dyn_into::<web::HtmlElement>()
            .ok()?;
        Some(Self {
            el,
            controller: InteractionController::new()
                .with_cursor(CursorFollower::new(CursorConfig::default())),
            visible: false,
            enlarged: false,
        })
    }

    pub fn frame(&mut self, input: &FrameInput, viewport: Viewport, dt: Duration) {
        self.controller
            .frame::<GpuState>(input, viewport, None, dt);
        let Some(cursor) = self.controller.cursor() else {
            return;
        };
        let p = cursor.position();
        _ = self.el.style().set_property(
            "transform",
            &format!(
                "translate3d({:.1}px, {:.1}px, 0) translate(-50%, -50%) scale({:.3})",
                p.x,
                p.y,
                cursor.scale()
            ),
        );
        let (visible, enlarged) = (cursor.is_visible(), cursor.is_enlarged());
        if visible != self.visible {
            self.visible = visible;
            _ = self
                .el
                .class_list()
                .toggle_with_force(CURSOR_VISIBLE_CLASS, visible);
        }
        if enlarged != self.enlarged {
            self.enlarged = enlarged;
            _ = self
                .el
                .class_list()
                .toggle_with_force(CURSOR_ENLARGED_CLASS, enlarged);
        }
    }

    /// Hand the element back to the stylesheet.
    pub fn clear(&mut self) {
        _ = self.el.style().remove_property("transform");
        _ = self
            .el
            .class_list()
            .remove_2(CURSOR_VISIBLE_CLASS, CURSOR_ENLARGED_CLASS);
        self.visible = false;
        self.enlarged = false;
    }
}
