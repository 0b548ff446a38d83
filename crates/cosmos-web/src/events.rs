use crate::dom;
use crate::input;
use cosmos_core::lifecycle::ResourceScope;
use cosmos_core::queue::{HoverId, Input, UpdateQueue};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type SharedQueue = Rc<RefCell<UpdateQueue>>;

/// Attach `handler` to `target` for the life of `scope`.
///
/// The closure is guarded by the scope's liveness flag and owned by the
/// scope; release removes the listener first, then drops the closure.
pub fn listen<E>(
    scope: &mut ResourceScope,
    target: &web::EventTarget,
    kind: &'static str,
    passive: bool,
    handler: impl FnMut(E) + 'static,
) where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(scope.guard(handler)) as Box<dyn FnMut(E)>);
    let opts = web::AddEventListenerOptions::new();
    opts.set_passive(passive);
    if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &opts,
    ) {
        log::warn!("[scope] {kind} listener not attached: {e:?}");
        return;
    }
    let func: js_sys::Function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
    scope.hold(kind, closure);
    let target = target.clone();
    scope.defer(kind, move || {
        _ = target.remove_event_listener_with_callback(kind, &func);
    });
}

fn push(queue: &SharedQueue, input: Input) {
    // never re-enter a borrow held by the frame callback
    if let Ok(mut q) = queue.try_borrow_mut() {
        q.push(input);
    }
}

/// Window-level scroll, resize and pointer input, pushed into the queue.
pub fn wire_window_inputs(scope: &mut ResourceScope, window: &web::Window, queue: &SharedQueue) {
    let target: &web::EventTarget = window.as_ref();

    let q = queue.clone();
    listen(scope, target, "scroll", true, move |_: web::Event| {
        push(&q, Input::Scroll(dom::scroll_y()));
    });

    let q = queue.clone();
    listen(scope, target, "resize", true, move |_: web::Event| {
        push(&q, Input::Resize(dom::viewport()));
    });

    let q = queue.clone();
    listen(scope, target, "pointermove", true, move |ev: web::PointerEvent| {
        push(&q, Input::PointerMove(input::client_point(&ev)));
    });

    let q = queue.clone();
    listen(scope, target, "pointerdown", true, move |ev: web::PointerEvent| {
        push(&q, Input::PointerDown(input::client_point(&ev)));
    });

    let q = queue.clone();
    listen(scope, target, "pointerup", true, move |ev: web::PointerEvent| {
        push(&q, Input::PointerUp(input::client_point(&ev)));
    });

    let q = queue.clone();
    listen(scope, target, "click", true, move |ev: web::MouseEvent| {
        push(&q, Input::Click(input::client_point(&ev)));
    });

    // mouseleave/mouseenter on the document element fire when the pointer
    // crosses the window edge.
    if let Some(root) = window.document().and_then(|d| d.document_element()) {
        let root: &web::EventTarget = root.as_ref();
        let q = queue.clone();
        listen(scope, root, "mouseleave", true, move |_: web::MouseEvent| {
            push(&q, Input::PointerLeave);
        });
        let q = queue.clone();
        listen(scope, root, "mouseenter", true, move |_: web::MouseEvent| {
            push(&q, Input::PointerEnter);
        });
    }
}

/// Enter/leave listeners on every element matching `selector`.
pub fn wire_hover(
    scope: &mut ResourceScope,
    document: &web::Document,
    selector: &str,
    queue: &SharedQueue,
) -> usize {
    let elements = dom::query_all(document, selector);
    for (i, el) in elements.iter().enumerate() {
        let id = HoverId(i as u32);
        let target: &web::EventTarget = el.as_ref();
        let q = queue.clone();
        listen(scope, target, "mouseenter", true, move |_: web::MouseEvent| {
            push(&q, Input::HoverEnter(id));
        });
        let q = queue.clone();
        listen(scope, target, "mouseleave", true, move |_: web::MouseEvent| {
            push(&q, Input::HoverLeave(id));
        });
    }
    elements.len()
}

/// Run `on_hide` whenever the page is hidden for navigation. The event's
/// `persisted` flag tells an unload apart from a back/forward-cache freeze.
pub fn wire_pagehide(
    scope: &mut ResourceScope,
    window: &web::Window,
    on_hide: impl FnMut(web::PageTransitionEvent) + 'static,
) {
    listen(scope, window.as_ref(), "pagehide", false, on_hide);
}
