#![cfg(target_arch = "wasm32")]
mod constants;
mod cursor;
mod dom;
mod events;
mod frame;
mod input;
mod render;
mod sections;

use constants::HOVERABLE_SELECTOR;
use cosmos_core::lifecycle::{LifecycleManager, ResourceScope};
use cosmos_core::progress::Viewport;
use cosmos_core::queue::{Input, UpdateQueue};
use cursor::CursorView;
use events::SharedQueue;
use sections::Section;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

thread_local! {
    static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("cosmos-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

/// Everything mounted on the page.
struct App {
    manager: LifecycleManager,
    /// Listeners and the frame loop.
    scope: ResourceScope,
    queue: SharedQueue,
    sections: Vec<Section>,
    cursor: Option<CursorView>,
    viewport: Viewport,
}

impl App {
    fn frame(&mut self, dt: Duration) {
        let input = self.queue.borrow_mut().drain();
        if let Some(viewport) = input.resize {
            self.viewport = viewport;
        }
        for section in &mut self.sections {
            section.frame(&input, self.viewport, dt);
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.frame(&input, self.viewport, dt);
        }
    }

    fn release(&mut self) {
        self.scope.release();
        while let Some(mut section) = self.sections.pop() {
            section.release();
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.clear();
        }
        log::info!(
            "[scope] page released, {} scopes still held",
            self.manager.active_scopes()
        );
    }
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let manager = LifecycleManager::new();
    let mut scope = manager.acquire("app");
    let queue: SharedQueue = Rc::new(RefCell::new(UpdateQueue::new()));
    events::wire_window_inputs(&mut scope, &window, &queue);
    let hoverables = events::wire_hover(&mut scope, &document, HOVERABLE_SELECTOR, &queue);

    let mut mounted = Vec::new();
    mounted.extend(sections::mount_hero(&manager, &document).await);
    let viewport = dom::viewport();
    mounted.extend(sections::mount_space(&manager, &document));
    mounted.extend(sections::mount_black_hole(&manager, &document, viewport));
    mounted.extend(sections::mount_chroma(&manager, &document));
    mounted.extend(sections::mount_mission(&manager, &document));
    let cursor = CursorView::mount(&document);
    log::info!(
        "[app] sections [{}], {} hover targets, cursor {}",
        mounted.iter().map(Section::name).collect::<Vec<_>>().join(", "),
        hoverables,
        if cursor.is_some() { "on" } else { "off" }
    );

    {
        let mut q = queue.borrow_mut();
        q.push(Input::Resize(viewport));
        q.push(Input::Scroll(dom::scroll_y()));
    }

    let app = Rc::new(RefCell::new(App {
        manager,
        scope,
        queue,
        sections: mounted,
        cursor,
        viewport,
    }));

    {
        let mut a = app.borrow_mut();
        let weak = Rc::downgrade(&app);
        frame::start_loop(&mut a.scope, move |dt| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            if let Ok(mut app) = app.try_borrow_mut() {
                app.frame(dt);
            }
        });
        events::wire_pagehide(&mut a.scope, &window, |ev: web::PageTransitionEvent| {
            // A cached page comes back as it was left, listeners and all.
            if ev.persisted() {
                log::debug!("[app] entering back/forward cache, keeping sections");
                return;
            }
            // Release outside the listener so its closure is not dropped mid-call.
            spawn_local(async {
                let Some(app) = APP.with(|slot| slot.borrow_mut().take()) else {
                    return;
                };
                if let Ok(mut app) = app.try_borrow_mut() {
                    app.release();
                }
            });
        });
    }
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}
