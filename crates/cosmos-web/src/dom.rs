use crate::constants::{PART_ATTR, SECTION_ATTR};
use cosmos_core::progress::{ElementMetrics, Viewport};
use cosmos_core::timeline::{Property, TargetId, Values};
use fnv::FnvHashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    let Some(w) = web::window() else {
        return (canvas.width(), canvas.height());
    };
    let dpr = w.device_pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    let w_px = ((rect.width() * dpr) as u32).max(1);
    let h_px = ((rect.height() * dpr) as u32).max(1);
    if canvas.width() != w_px {
        canvas.set_width(w_px);
    }
    if canvas.height() != h_px {
        canvas.set_height(h_px);
    }
    (w_px, h_px)
}

pub fn viewport() -> Viewport {
    let Some(w) = web::window() else {
        return Viewport::default();
    };
    Viewport::new(js_px(w.inner_width()), js_px(w.inner_height()))
}

fn js_px(v: Result<JsValue, JsValue>) -> f32 {
    v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

pub fn scroll_y() -> f32 {
    web::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0) as f32
}

/// Document-space top and height of an element.
pub fn element_metrics(el: &web::Element) -> ElementMetrics {
    let rect = el.get_bounding_client_rect();
    ElementMetrics {
        top: rect.top() as f32 + scroll_y(),
        height: rect.height() as f32,
    }
}

/// `<html>`, where page-wide custom properties live.
pub fn document_root(document: &web::Document) -> Option<web::HtmlElement> {
    document
        .document_element()
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
}

pub fn section(document: &web::Document, name: &str) -> Option<web::HtmlElement> {
    document
        .query_selector(&format!("[{SECTION_ATTR}=\"{name}\"]"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
}

pub fn part(root: &web::Element, name: &str) -> Option<web::HtmlElement> {
    root.query_selector(&format!("[{PART_ATTR}=\"{name}\"]"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
}

/// Direct children of a part, e.g. the lines of a heading.
pub fn part_children(root: &web::Element, name: &str) -> Vec<web::HtmlElement> {
    let Some(container) = part(root, name) else {
        return Vec::new();
    };
    children(&container)
}

pub fn children(el: &web::Element) -> Vec<web::HtmlElement> {
    let list = el.children();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|el| el.dyn_into::<web::HtmlElement>().ok())
        .collect()
}

pub fn query_all(root: &web::Document, selector: &str) -> Vec<web::Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|n| n.dyn_into::<web::Element>().ok())
        .collect()
}

pub fn create_div(document: &web::Document, class: &str) -> Option<web::HtmlElement> {
    let el = document
        .create_element("div")
        .ok()?
        .dyn_into::<web::HtmlElement>()
        .ok()?;
    el.set_class_name(class);
    Some(el)
}

/// Accumulated transform of one element; timelines write single properties
/// and the whole `transform` string is rebuilt from this.
#[derive(Clone, Copy, Debug)]
struct Transform {
    x: f32,
    y: f32,
    x_percent: f32,
    y_percent: f32,
    scale: f32,
    rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            x_percent: 0.0,
            y_percent: 0.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    fn css(&self) -> String {
        format!(
            "translate({:.2}%, {:.2}%) translate3d({:.2}px, {:.2}px, 0) rotate({:.2}deg) scale({:.4})",
            self.x_percent, self.y_percent, self.x, self.y, self.rotation, self.scale
        )
    }
}

struct Target {
    el: web::HtmlElement,
    transform: Transform,
    /// Inline transform from before registration, restored on release.
    base_transform: String,
    customs: Vec<&'static str>,
    dirty: bool,
}

/// DOM nodes addressed by [`TargetId`], plus the style writer for evaluated
/// values.
#[derive(Default)]
pub struct TargetRegistry {
    targets: FnvHashMap<TargetId, Target>,
    next: u32,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, el: &web::HtmlElement) -> TargetId {
        let id = TargetId(self.next);
        self.next += 1;
        let base_transform = el
            .style()
            .get_property_value("transform")
            .unwrap_or_default();
        self.targets.insert(
            id,
            Target {
                el: el.clone(),
                transform: Transform::default(),
                base_transform,
                customs: Vec::new(),
                dirty: false,
            },
        );
        id
    }

    pub fn register_all(&mut self, els: &[web::HtmlElement]) -> Vec<TargetId> {
        els.iter().map(|el| self.register(el)).collect()
    }

    /// Write evaluated values to inline styles.
    pub fn apply(&mut self, values: &Values) {
        for (id, property, value) in values.iter() {
            let Some(target) = self.targets.get_mut(&id) else {
                continue;
            };
            let t = &mut target.transform;
            match property {
                Property::X => t.x = value,
                Property::Y => t.y = value,
                Property::XPercent => t.x_percent = value,
                Property::YPercent => t.y_percent = value,
                Property::Scale => t.scale = value,
                Property::RotationZ => t.rotation = value,
                Property::Opacity => {
                    _ = target.el.style().set_property("opacity", &format!("{value:.3}"));
                    continue;
                }
                Property::Custom(name) => {
                    if !target.customs.contains(&name) {
                        target.customs.push(name);
                    }
                    _ = target.el.style().set_property(name, &format!("{value:.4}"));
                    continue;
                }
            }
            target.dirty = true;
        }
        for target in self.targets.values_mut() {
            if target.dirty {
                target.dirty = false;
                _ = target.el.style().set_property("transform", &target.transform.css());
            }
        }
    }

    /// Drop inline animation styles and forget every node.
    pub fn clear(&mut self) {
        for (_, target) in self.targets.drain() {
            let style = target.el.style();
            if target.base_transform.is_empty() {
                _ = style.remove_property("transform");
            } else {
                _ = style.set_property("transform", &target.base_transform);
            }
            _ = style.remove_property("opacity");
            for name in target.customs {
                _ = style.remove_property(name);
            }
        }
    }
}
