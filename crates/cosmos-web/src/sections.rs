//! Page sections: DOM lookup, effect wiring and per-frame application.
//!
//! Each section owns one lifecycle scope, one effect set and the DOM nodes
//! its effects address. Sections are mounted once and released together on
//! `pagehide`.

use crate::constants::*;
use crate::dom::{self, TargetRegistry};
use crate::input;
use crate::render::GpuState;
use anyhow::anyhow;
use cosmos_core::constants::{BLACK_HOLE_FIELD_STARS, SPACE_FIELD_STARS};
use cosmos_core::effect::{
    Effect, EffectFrame, EffectId, EffectOutput, EffectSet, ParticleEffect, TimelineEffect,
};
use cosmos_core::error::CosmosError;
use cosmos_core::interaction::{InteractionController, Parallax, ParallaxConfig};
use cosmos_core::lifecycle::{LifecycleManager, ResourceScope};
use cosmos_core::particles::{
    Bounds, Emitter, EmitterConfig, EmitterTick, FieldConfig, Particle, ParticleField, ParticleId,
};
use cosmos_core::progress::Viewport;
use cosmos_core::queue::FrameInput;
use cosmos_core::recipes::{self, Recipe, HERO_INTRO_DELAY_SEC};
use cosmos_core::scene::{SceneConfig, SceneRenderer, SceneState};
use cosmos_core::scroll::TriggerId;
use cosmos_core::timeline::{Playback, TargetId, Timeline, TimelineEngine};
use fnv::FnvHashMap;
use std::time::Duration;
use wasm_bindgen::JsCast;
use web_sys as web;

type Effects = EffectSet<GpuState>;

/// The section element itself.
const ROOT_TRIGGER: TriggerId = TriggerId(0);

/// DOM nodes of in-flight emitter particles.
struct EmitterNodes {
    container: web::HtmlElement,
    nodes: FnvHashMap<ParticleId, web::HtmlElement>,
}

impl EmitterNodes {
    fn new(container: web::HtmlElement) -> Self {
        Self {
            container,
            nodes: FnvHashMap::default(),
        }
    }

    fn spawn(&mut self, id: ParticleId, p: &Particle) {
        let Some(document) = self.container.owner_document() else {
            return;
        };
        let Some(el) = dom::create_div(&document, SHOOTING_STAR_CLASS) else {
            return;
        };
        let style = el.style();
        _ = style.set_property("left", &format!("{:.2}%", p.position.x));
        _ = style.set_property("top", &format!("{:.2}%", p.position.y));
        _ = style.set_property("transform", &format!("rotate({:.1}deg)", p.rotation_deg));
        if self.container.append_child(&el).is_ok() {
            self.nodes.insert(id, el);
        }
    }

    fn remove(&mut self, id: ParticleId) {
        if let Some(el) = self.nodes.remove(&id) {
            el.remove();
        }
    }

    fn clear(&mut self) {
        for (_, el) in self.nodes.drain() {
            el.remove();
        }
    }
}

/// Inputs of the black-hole collapse, whose star travel is tied to the
/// viewport height.
struct Collapse {
    effect: EffectId,
    hole: TargetId,
    stars: Vec<TargetId>,
    container: TargetId,
    height: f32,
}

impl Collapse {
    fn recipe(&self, height: f32) -> cosmos_core::Result<Recipe> {
        recipes::black_hole_collapse(ROOT_TRIGGER, self.hole, &self.stars, self.container, height)
    }
}

pub struct Section {
    name: &'static str,
    scope: ResourceScope,
    effects: Effects,
    targets: TargetRegistry,
    triggers: Vec<(TriggerId, web::HtmlElement)>,
    controller: Option<InteractionController>,
    scene: Option<(EffectId, web::HtmlCanvasElement)>,
    emitter: Option<EmitterNodes>,
    /// Run-once intro and the loops that take over when it completes.
    after_intro: Option<(EffectId, Vec<Timeline>)>,
    collapse: Option<Collapse>,
    ticks: Vec<(EffectId, EmitterTick)>,
}

impl Section {
    fn new(manager: &LifecycleManager, name: &'static str, root: web::HtmlElement) -> Self {
        let scope = manager.acquire(name);
        let effects = EffectSet::new(scope.liveness(), rand::random());
        Self {
            name,
            scope,
            effects,
            targets: TargetRegistry::new(),
            triggers: vec![(ROOT_TRIGGER, root)],
            controller: None,
            scene: None,
            emitter: None,
            after_intro: None,
            collapse: None,
            ticks: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn register(&mut self, el: &web::HtmlElement) -> TargetId {
        self.targets.register(el)
    }

    fn register_all(&mut self, els: &[web::HtmlElement]) -> Vec<TargetId> {
        self.targets.register_all(els)
    }

    fn trigger(&mut self, el: &web::HtmlElement) -> TriggerId {
        let id = TriggerId(self.triggers.len() as u32);
        self.triggers.push((id, el.clone()));
        id
    }

    fn add_scroll(&mut self, recipe: cosmos_core::Result<Recipe>) -> Option<EffectId> {
        match recipe {
            Ok(recipe) => {
                let binding = recipe.bind(self.effects.liveness());
                Some(
                    self.effects
                        .add(Effect::Timeline(TimelineEffect::Scroll(binding))),
                )
            }
            Err(e) => {
                log::warn!("[scroll] {}: effect skipped: {e}", self.name);
                None
            }
        }
    }

    fn add_clock(
        &mut self,
        what: &str,
        timeline: cosmos_core::Result<Timeline>,
        engine: impl FnOnce(Timeline) -> TimelineEngine,
    ) -> Option<EffectId> {
        match timeline {
            Ok(tl) => Some(
                self.effects
                    .add(Effect::Timeline(TimelineEffect::clock(engine(tl)))),
            ),
            Err(e) => {
                log::warn!("[timeline] {}/{what}: skipped: {e}", self.name);
                None
            }
        }
    }

    /// Seed `count` star nodes into `container`; twinkle runs in CSS.
    fn add_star_field(
        &mut self,
        container: &web::HtmlElement,
        count: usize,
        config: &FieldConfig,
        with_opacity: bool,
    ) -> Vec<TargetId> {
        let field = match ParticleField::seed(count, Bounds::PERCENT, config, self.effects.rng()) {
            Ok(field) => field,
            Err(e) => {
                log::warn!("[particles] {}: stars skipped: {e}", self.name);
                return Vec::new();
            }
        };
        let Some(document) = container.owner_document() else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(field.len());
        for (_, p) in field.iter() {
            let Some(star) = dom::create_div(&document, STAR_CLASS) else {
                continue;
            };
            let style = star.style();
            _ = style.set_property("width", &format!("{:.2}px", p.size));
            _ = style.set_property("height", &format!("{:.2}px", p.size));
            _ = style.set_property("left", &format!("{:.2}%", p.position.x));
            _ = style.set_property("top", &format!("{:.2}%", p.position.y));
            if with_opacity {
                _ = style.set_property("opacity", &format!("{:.3}", p.base_opacity));
            }
            _ = style.set_property("--twinkle-duration", &format!("{:.2}s", p.twinkle_sec));
            if container.append_child(&star).is_ok() {
                nodes.push(star);
            }
        }
        self.effects
            .add(Effect::Particles(ParticleEffect::Field(field)));
        let ids = self.register_all(&nodes);
        self.scope.defer("star nodes", move || {
            for node in nodes {
                node.remove();
            }
        });
        ids
    }

    /// Replace a heading's text with one inline-block span per character.
    fn split_chars(&mut self, heading: &web::HtmlElement) -> Vec<web::HtmlElement> {
        let (Some(text), Some(document)) = (heading.text_content(), heading.owner_document())
        else {
            return Vec::new();
        };
        heading.set_text_content(None);
        let mut spans = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let Some(span) = document
                .create_element("span")
                .ok()
                .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
            else {
                continue;
            };
            let glyph = if ch == ' ' { '\u{a0}' } else { ch };
            span.set_text_content(Some(&glyph.to_string()));
            _ = span.style().set_property("display", "inline-block");
            if heading.append_child(&span).is_ok() {
                spans.push(span);
            }
        }
        let heading = heading.clone();
        self.scope.defer("heading text", move || {
            heading.set_text_content(Some(&text));
        });
        spans
    }

    async fn mount_scene(&mut self, container: &web::HtmlElement) -> anyhow::Result<()> {
        let document = container
            .owner_document()
            .ok_or_else(|| anyhow!("globe container is detached"))?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| anyhow!(format!("{:?}", e)))?
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| anyhow!(format!("{:?}", e)))?;
        let style = canvas.style();
        _ = style.set_property("display", "block");
        _ = style.set_property("width", "100%");
        _ = style.set_property("height", "100%");
        container
            .append_child(&canvas)
            .map_err(|e| anyhow!(format!("{:?}", e)))?;
        let node = canvas.clone();
        self.scope.defer("globe canvas", move || node.remove());

        let (width, height) = dom::sync_canvas_backing_size(&canvas);
        let config = SceneConfig::default();
        let state = SceneState::build(config, self.effects.rng())?;
        let backend = GpuState::new(&canvas, &config)
            .await
            .map_err(|e| CosmosError::BackendUnavailable(format!("{e:#}")));
        let mut renderer = SceneRenderer::new(state, backend);
        renderer.resize(width, height);
        renderer.start();
        let id = self.effects.add(Effect::Scene(renderer));
        self.scene = Some((id, canvas));
        Ok(())
    }

    /// Swap in a collapse binding built for the new viewport height.
    /// Returns whether the binding was replaced.
    fn rebuild_collapse(&mut self, viewport: Viewport) -> bool {
        let Some(collapse) = self.collapse.as_ref() else {
            return false;
        };
        if collapse.height == viewport.height {
            return false;
        }
        let (old, recipe) = (collapse.effect, collapse.recipe(viewport.height));
        self.effects.remove(old);
        let Some(effect) = self.add_scroll(recipe) else {
            self.collapse = None;
            return false;
        };
        if let Some(collapse) = self.collapse.as_mut() {
            collapse.effect = effect;
            collapse.height = viewport.height;
        }
        log::debug!("[scroll] {}: collapse rebuilt for {}px", self.name, viewport.height);
        true
    }

    /// Re-measure trigger elements and the scene surface. Returns whether a
    /// fresh binding needs the current scroll offset.
    fn layout(&mut self, viewport: Viewport) -> bool {
        let rebuilt = self.rebuild_collapse(viewport);
        let triggers = &self.triggers;
        self.effects.resize(viewport, |trigger| {
            triggers
                .iter()
                .find(|(id, _)| *id == trigger)
                .map(|(_, el)| dom::element_metrics(el))
        });
        if let Some((id, canvas)) = &self.scene {
            let (w, h) = dom::sync_canvas_backing_size(canvas);
            if let Some(renderer) = self.effects.scene_mut(*id) {
                renderer.resize(w, h);
            }
        }
        rebuilt
    }

    pub fn frame(&mut self, input: &FrameInput, viewport: Viewport, dt: Duration) {
        if self.scope.is_released() {
            return;
        }
        let mut scroll = input.scroll;
        if input.resize.is_some() && self.layout(viewport) {
            scroll = scroll.or_else(|| Some(dom::scroll_y()));
        }

        let targets = &mut self.targets;
        let ticks = &mut self.ticks;
        self.effects.frame(
            EffectFrame { scroll, dt },
            |id, out| match out {
                EffectOutput::Values(values) => targets.apply(values),
                EffectOutput::Particles(tick) => {
                    if !tick.spawned.is_empty() || !tick.expired.is_empty() {
                        ticks.push((id, tick.clone()));
                    }
                }
                EffectOutput::Rendered => {}
            },
        );
        self.sync_emitter();
        self.start_loops();
        self.interact(input, viewport, dt);
    }

    fn sync_emitter(&mut self) {
        let Some(nodes) = self.emitter.as_mut() else {
            self.ticks.clear();
            return;
        };
        for (id, tick) in self.ticks.drain(..) {
            for &gone in &tick.expired {
                nodes.remove(gone);
            }
            let Some(field) = self.effects.field(id) else {
                continue;
            };
            for &born in &tick.spawned {
                if let Some(p) = field.get(born) {
                    nodes.spawn(born, p);
                }
            }
        }
    }

    fn start_loops(&mut self) {
        let Some((intro, _)) = &self.after_intro else {
            return;
        };
        let done = matches!(
            self.effects.get(*intro),
            Some(Effect::Timeline(TimelineEffect::Clock { engine, .. })) if engine.complete()
        );
        if !done {
            return;
        }
        if let Some((intro, loops)) = self.after_intro.take() {
            self.effects.remove(intro);
            for tl in loops {
                self.effects.add(Effect::Timeline(TimelineEffect::clock(
                    TimelineEngine::looping(tl, true),
                )));
            }
            log::debug!("[timeline] {}: intro complete", self.name);
        }
    }

    fn interact(&mut self, input: &FrameInput, viewport: Viewport, dt: Duration) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let scene = match &self.scene {
            Some((id, canvas)) => self
                .effects
                .scene_mut(*id)
                .map(|renderer| (renderer, input::surface_rect(canvas))),
            None => None,
        };
        let outcome = controller.frame(input, viewport, scene, dt);
        if outcome.parallax_changed {
            if let Some(parallax) = controller.parallax() {
                self.targets.apply(parallax.values());
            }
        }
        if !outcome.hits.is_empty() {
            log::debug!("[pick] {}: {} glow(s)", self.name, outcome.hits.len());
        }
    }

    /// Stop every effect and undo what the section did to the page.
    /// Later calls do nothing.
    pub fn release(&mut self) {
        if self.scope.is_released() {
            return;
        }
        self.scope.release();
        let dropped = self.effects.teardown();
        if let Some(nodes) = self.emitter.as_mut() {
            nodes.clear();
        }
        self.ticks.clear();
        self.targets.clear();
        log::info!(
            "[scope] {} released, {} particles dropped",
            self.name,
            dropped.len()
        );
    }
}

impl Drop for Section {
    fn drop(&mut self) {
        self.release();
    }
}

/// Hero: staggered intro, breathing blobs, pointer and scroll parallax,
/// shooting stars and the interactive globe.
pub async fn mount_hero(manager: &LifecycleManager, document: &web::Document) -> Option<Section> {
    let root = dom::section(document, HERO)?;
    let mut s = Section::new(manager, HERO, root.clone());

    let blobs = s.register_all(&dom::part_children(&root, PART_BLOBS));
    let heading = s.register_all(&dom::part_children(&root, PART_HEADING));
    let text = dom::part(&root, PART_TEXT).map(|el| s.register(&el));
    let buttons = s.register_all(&dom::part_children(&root, PART_BUTTONS));
    let intro = s.add_clock(
        "intro",
        recipes::hero_intro(&blobs, &heading, text, &buttons),
        |tl| {
            let mut engine = TimelineEngine::new(tl, Playback::Once);
            engine.play_after(HERO_INTRO_DELAY_SEC);
            engine
        },
    );
    if let Some(intro) = intro {
        let mut loops = Vec::new();
        if !blobs.is_empty() {
            match recipes::blob_float(&blobs) {
                Ok(tl) => loops.push(tl),
                Err(e) => log::warn!("[timeline] hero/blob-float: skipped: {e}"),
            }
        }
        s.after_intro = Some((intro, loops));
    }

    if let Some(visual) = dom::part(&root, PART_VISUAL) {
        let visual = s.register(&visual);
        s.add_scroll(recipes::hero_scroll_parallax(ROOT_TRIGGER, visual));
    }
    if let Some(page) = dom::document_root(document) {
        let page = s.register(&page);
        s.add_scroll(recipes::hero_background(ROOT_TRIGGER, page));
    }

    let indicator = dom::part(&root, PART_INDICATOR).map(|el| s.register(&el));
    if let Some(indicator) = indicator {
        s.add_clock("indicator-pulse", recipes::indicator_pulse(indicator), |tl| {
            TimelineEngine::looping(tl, true)
        });
        s.add_scroll(recipes::hero_scroll_indicator(ROOT_TRIGGER, indicator));
    }

    if let Some(image) = dom::part(&root, PART_IMAGE) {
        let image = s.register(&image);
        let mut floating = s.register_all(&dom::part_children(&root, PART_FLOATING));
        floating.extend(indicator);
        s.controller = Some(
            InteractionController::new()
                .with_parallax(Parallax::new(ParallaxConfig::default(), image, &floating)),
        );
    }

    if let Some(container) = dom::part(&root, PART_SHOOTING_STARS) {
        match Emitter::new(EmitterConfig::default()) {
            Ok(emitter) => {
                s.effects
                    .add(Effect::Particles(ParticleEffect::Emitter(emitter)));
                s.emitter = Some(EmitterNodes::new(container));
            }
            Err(e) => log::warn!("[particles] hero: shooting stars skipped: {e}"),
        }
    }

    if let Some(globe) = dom::part(&root, PART_GLOBE) {
        if let Err(e) = s.mount_scene(&globe).await {
            log::warn!("[scene] globe not mounted: {e:#}");
        } else if s.controller.is_none() {
            // orbit drag and picking still need a controller
            s.controller = Some(InteractionController::new());
        }
    }
    Some(s)
}

/// Space transition: a drifting star field behind sinking content.
pub fn mount_space(manager: &LifecycleManager, document: &web::Document) -> Option<Section> {
    let root = dom::section(document, SPACE)?;
    let mut s = Section::new(manager, SPACE, root.clone());
    let stars = match dom::part(&root, PART_STARS) {
        Some(container) => {
            s.add_star_field(&container, SPACE_FIELD_STARS, &FieldConfig::default(), false)
        }
        None => Vec::new(),
    };
    let content = dom::part(&root, PART_CONTENT).map(|el| s.register(&el));
    let drift = recipes::space_drift(ROOT_TRIGGER, &stars, content, s.effects.rng());
    s.add_scroll(drift);
    Some(s)
}

/// Black hole: stars collapse into a growing hole, then copy rises out.
pub fn mount_black_hole(
    manager: &LifecycleManager,
    document: &web::Document,
    viewport: Viewport,
) -> Option<Section> {
    let root = dom::section(document, BLACK_HOLE)?;
    let mut s = Section::new(manager, BLACK_HOLE, root.clone());
    let stars = match dom::part(&root, PART_STARS) {
        Some(container) => s.add_star_field(
            &container,
            BLACK_HOLE_FIELD_STARS,
            &FieldConfig::black_hole(),
            true,
        ),
        None => Vec::new(),
    };
    if let Some(hole) = dom::part(&root, PART_HOLE) {
        let hole = s.register(&hole);
        let container = s.register(&root);
        let height = viewport.height;
        let recipe = recipes::black_hole_collapse(ROOT_TRIGGER, hole, &stars, container, height);
        if let Some(effect) = s.add_scroll(recipe) {
            s.collapse = Some(Collapse {
                effect,
                hole,
                stars,
                container,
                height,
            });
        }
    }
    let lines = s.register_all(&dom::part_children(&root, PART_LINES));
    if !lines.is_empty() {
        s.add_scroll(recipes::black_hole_text(ROOT_TRIGGER, &lines));
    }
    Some(s)
}

/// Chroma: list items light up in turn while the page hue rotates.
pub fn mount_chroma(manager: &LifecycleManager, document: &web::Document) -> Option<Section> {
    let root = dom::section(document, CHROMA)?;
    let mut s = Section::new(manager, CHROMA, root.clone());
    let items = s.register_all(&dom::part_children(&root, PART_ITEMS));
    if !items.is_empty() {
        s.add_scroll(recipes::chroma_dimmer(ROOT_TRIGGER, &items));
    }
    if let Some(page) = dom::document_root(document) {
        let page = s.register(&page);
        s.add_scroll(recipes::chroma_hue(ROOT_TRIGGER, page));
        s.add_scroll(recipes::chroma_aberration(ROOT_TRIGGER, page));
    }
    Some(s)
}

/// Mission: per-character heading reveal and staggered cards.
pub fn mount_mission(manager: &LifecycleManager, document: &web::Document) -> Option<Section> {
    let root = dom::section(document, MISSION)?;
    let mut s = Section::new(manager, MISSION, root.clone());
    if let Some(heading) = dom::part(&root, PART_HEADING) {
        let spans = s.split_chars(&heading);
        if !spans.is_empty() {
            let chars = s.register_all(&spans);
            let trigger = s.trigger(&heading);
            s.add_scroll(recipes::mission_heading(trigger, &chars));
        }
    }
    let cards = s.register_all(&dom::part_children(&root, PART_CARDS));
    if !cards.is_empty() {
        let trigger = match dom::part(&root, PART_CARDS) {
            Some(container) => s.trigger(&container),
            None => ROOT_TRIGGER,
        };
        s.add_scroll(recipes::mission_cards(trigger, &cards));
    }
    Some(s)
}
