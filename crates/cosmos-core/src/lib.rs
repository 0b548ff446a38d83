pub mod camera;
pub mod constants;
pub mod easing;
pub mod effect;
pub mod error;
pub mod interaction;
pub mod lifecycle;
pub mod particles;
pub mod progress;
pub mod queue;
pub mod recipes;
pub mod scene;
pub mod scroll;
pub mod timeline;

pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

pub use camera::{Camera, OrbitCamera, OrbitConfig};
pub use easing::Easing;
pub use effect::{
    Effect, EffectFrame, EffectId, EffectOutput, EffectSet, ParticleEffect, TimelineEffect,
};
pub use error::{CosmosError, Result};
pub use interaction::{CursorFollower, InteractionController, Parallax, SurfaceRect};
pub use lifecycle::{LifecycleManager, Liveness, ResourceScope};
pub use particles::{Bounds, Constellation, Emitter, ParticleField, ParticleId};
pub use progress::{progress, Anchor, ElementMetrics, Region, RegionBounds, Scrub, Viewport};
pub use queue::{FrameInput, HoverId, Input, UpdateQueue};
pub use scene::{RenderBackend, SceneConfig, SceneFrame, SceneRenderer, SceneState};
pub use scroll::{ScrollBinding, TriggerId};
pub use timeline::{Position, Property, TargetId, Timeline, TimelineEngine, Tween, Values};
