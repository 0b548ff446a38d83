use cosmos_core::constants::MAX_FRAME_DT_SEC;
use cosmos_core::lifecycle::ResourceScope;
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type TickSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request(slot: &TickSlot) -> Option<i32> {
    let w = web::window()?;
    let slot = slot.borrow();
    let closure = slot.as_ref()?;
    w.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

/// Drive `tick` from `requestAnimationFrame` until `scope` is released.
///
/// `tick` receives the wall-clock delta since the previous frame, clamped so
/// a background tab resumes with one ordinary step. Release cancels the
/// pending frame and drops the closure, which breaks its self-reference.
pub fn start_loop(scope: &mut ResourceScope, mut tick: impl FnMut(Duration) + 'static) {
    let slot: TickSlot = Rc::new(RefCell::new(None));
    let handle = Rc::new(Cell::new(None::<i32>));
    let live = scope.liveness();
    let max_dt = Duration::from_secs_f32(MAX_FRAME_DT_SEC);
    let mut last = Instant::now();

    let slot_tick = slot.clone();
    let handle_tick = handle.clone();
    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        handle_tick.set(None);
        if !live.is_alive() {
            return;
        }
        let now = Instant::now();
        let dt = (now - last).min(max_dt);
        last = now;
        tick(dt);
        if live.is_alive() {
            handle_tick.set(request(&slot_tick));
        }
    }) as Box<dyn FnMut()>));
    handle.set(request(&slot));

    scope.defer("animation frame", move || {
        if let (Some(id), Some(w)) = (handle.take(), web::window()) {
            _ = w.cancel_animation_frame(id);
        }
        slot.borrow_mut().take();
        log::debug!("[scope] frame loop stopped");
    });
}
