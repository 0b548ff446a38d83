use cosmos_core::interaction::SurfaceRect;
use glam::Vec2;
use web_sys as web;

/// Client (viewport) coordinates in CSS pixels.
#[inline]
pub fn client_point(ev: &web::MouseEvent) -> Vec2 {
    Vec2::new(ev.client_x() as f32, ev.client_y() as f32)
}

/// Where the canvas currently sits in client space.
#[inline]
pub fn surface_rect(el: &web::Element) -> SurfaceRect {
    let rect = el.get_bounding_client_rect();
    SurfaceRect {
        left: rect.left() as f32,
        top: rect.top() as f32,
        width: rect.width() as f32,
        height: rect.height() as f32,
    }
}
