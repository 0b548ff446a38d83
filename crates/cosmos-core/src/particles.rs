//! Particle populations: fixed fields, periodic emitters and constellations.
//!
//! Particles live in a generational arena. Edges and DOM nodes refer to them
//! by [`ParticleId`], so removing a particle invalidates every stale handle
//! with a single generation check.

use crate::constants::*;
use crate::error::{CosmosError, Result};
use glam::{Vec2, Vec3};
use rand::Rng;
use smallvec::SmallVec;
use std::f32::consts::TAU;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleId {
    index: u32,
    generation: u32,
}

impl ParticleId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Percent of the container for 2D fields, world units for 3D ones.
    pub position: Vec3,
    pub size: f32,
    pub base_opacity: f32,
    /// Twinkle phase in 0..1; the oscillation itself runs in CSS or the shader.
    pub phase: f32,
    pub twinkle_sec: f32,
    pub rotation_deg: f32,
    /// Remaining lifetime; `None` lives as long as its field.
    pub ttl: Option<f32>,
}

/// Region particles are seeded into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    /// Axis-aligned rectangle, z = 0.
    Rect { min: Vec2, max: Vec2 },
    /// Spherical shell `radius ± variance`, uniform in direction.
    Shell { radius: f32, variance: f32 },
}

impl Bounds {
    /// The whole container in percent.
    pub const PERCENT: Bounds = Bounds::Rect {
        min: Vec2::ZERO,
        max: Vec2::new(100.0, 100.0),
    };

    pub fn validate(&self) -> Result<()> {
        match *self {
            Bounds::Rect { min, max } => {
                if !(min.is_finite() && max.is_finite()) || min.x > max.x || min.y > max.y {
                    return Err(CosmosError::InvalidBounds(format!("rect {min}..{max}")));
                }
            }
            Bounds::Shell { radius, variance } => {
                let finite = radius.is_finite() && variance.is_finite();
                if !finite || radius <= 0.0 || variance < 0.0 {
                    return Err(CosmosError::InvalidBounds(format!(
                        "shell r={radius} ±{variance}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        match *self {
            Bounds::Rect { min, max } => {
                let x = range(rng, (min.x, max.x));
                let y = range(rng, (min.y, max.y));
                Vec3::new(x, y, 0.0)
            }
            Bounds::Shell { radius, variance } => {
                let theta = rng.gen::<f32>() * TAU;
                let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
                let r = radius + (rng.gen::<f32>() * 2.0 - 1.0) * variance;
                Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            }
        }
    }
}

#[inline]
fn range(rng: &mut impl Rng, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Randomisation ranges for seeded particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    pub size: (f32, f32),
    pub opacity: (f32, f32),
    pub twinkle_sec: (f32, f32),
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            size: SPACE_STAR_SIZE_PX,
            opacity: (1.0, 1.0),
            twinkle_sec: SPACE_TWINKLE_SEC,
        }
    }
}

impl FieldConfig {
    pub fn black_hole() -> Self {
        Self {
            size: BLACK_HOLE_STAR_SIZE_PX,
            opacity: BLACK_HOLE_STAR_OPACITY,
            twinkle_sec: BLACK_HOLE_TWINKLE_SEC,
        }
    }

    pub fn constellation() -> Self {
        Self {
            size: (CONSTELLATION_STAR_RADIUS, CONSTELLATION_STAR_RADIUS),
            opacity: (1.0, 1.0),
            twinkle_sec: (0.0, 0.0),
        }
    }

    pub fn sample(&self, position: Vec3, rng: &mut impl Rng) -> Particle {
        Particle {
            position,
            size: range(rng, self.size),
            base_opacity: range(rng, self.opacity),
            phase: rng.gen(),
            twinkle_sec: range(rng, self.twinkle_sec),
            rotation_deg: 0.0,
            ttl: None,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    particle: Option<Particle>,
}

/// Arena of particles with an optional population cap.
#[derive(Clone, Debug, Default)]
pub struct ParticleField {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    limit: Option<usize>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed population of `count` particles; never replenished.
    pub fn seed(
        count: usize,
        bounds: Bounds,
        config: &FieldConfig,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        bounds.validate()?;
        let mut field = Self {
            slots: Vec::with_capacity(count),
            free: Vec::new(),
            live: 0,
            limit: Some(count),
        };
        for _ in 0..count {
            let p = config.sample(bounds.sample(rng), rng);
            field.spawn(p);
        }
        log::debug!("[particles] seeded {count} particles");
        Ok(field)
    }

    /// Insert a particle; fails only when a seeded field is full.
    pub fn spawn(&mut self, particle: Particle) -> Option<ParticleId> {
        if self.limit.is_some_and(|limit| self.live >= limit) {
            return None;
        }
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.particle = Some(particle);
            return Some(ParticleId {
                index,
                generation: slot.generation,
            });
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            particle: Some(particle),
        });
        Some(ParticleId {
            index,
            generation: 0,
        })
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let p = slot.particle.take()?;
        self.free.push(id.index);
        self.live -= 1;
        Some(p)
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.particle.as_ref()
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.particle.as_ref().map(|p| {
                (
                    ParticleId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    p,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<ParticleId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Age particles with a TTL and remove the expired ones.
    pub fn tick(&mut self, dt: Duration) -> SmallVec<[ParticleId; 4]> {
        let dt = dt.as_secs_f32();
        let mut expired = SmallVec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(p) = slot.particle.as_mut() else {
                continue;
            };
            if let Some(ttl) = p.ttl.as_mut() {
                *ttl -= dt;
                if *ttl <= 0.0 {
                    expired.push(ParticleId {
                        index: i as u32,
                        generation: slot.generation,
                    });
                }
            }
        }
        for id in &expired {
            self.remove(*id);
        }
        expired
    }

    pub fn clear(&mut self) -> Vec<ParticleId> {
        let ids = self.ids();
        for id in &ids {
            self.remove(*id);
        }
        ids
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterConfig {
    pub interval_sec: f32,
    pub ttl_sec: f32,
    pub bounds: Bounds,
    pub max_angle_deg: f32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            interval_sec: SHOOTING_STAR_INTERVAL_SEC,
            ttl_sec: SHOOTING_STAR_TTL_SEC,
            bounds: Bounds::PERCENT,
            max_angle_deg: SHOOTING_STAR_MAX_ANGLE_DEG,
        }
    }
}

/// Particles created and reaped by one [`Emitter::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmitterTick {
    pub spawned: SmallVec<[ParticleId; 2]>,
    pub expired: SmallVec<[ParticleId; 4]>,
}

/// Periodic spawner of short-lived particles (shooting stars).
///
/// Each particle gets its TTL at creation, so every spawned particle is
/// already scheduled for removal. Cancelling stops the interval and drops
/// all in-flight particles as a unit.
#[derive(Clone, Debug)]
pub struct Emitter {
    config: EmitterConfig,
    field: ParticleField,
    until_next: f32,
    cancelled: bool,
}

impl Emitter {
    pub fn new(config: EmitterConfig) -> Result<Self> {
        config.bounds.validate()?;
        if !(config.interval_sec > 0.0) || !(config.ttl_sec > 0.0) {
            return Err(CosmosError::InvalidBounds(format!(
                "emitter interval {}s ttl {}s",
                config.interval_sec, config.ttl_sec
            )));
        }
        Ok(Self {
            config,
            field: ParticleField::new(),
            until_next: config.interval_sec,
            cancelled: false,
        })
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Upper bound on simultaneously alive particles.
    pub fn max_alive(&self) -> usize {
        (self.config.ttl_sec / self.config.interval_sec).ceil() as usize + 1
    }

    fn emit(&mut self, rng: &mut impl Rng) -> Option<ParticleId> {
        let particle = Particle {
            position: self.config.bounds.sample(rng),
            size: 1.0,
            base_opacity: 1.0,
            phase: 0.0,
            twinkle_sec: 0.0,
            rotation_deg: range(rng, (0.0, self.config.max_angle_deg)),
            ttl: Some(self.config.ttl_sec),
        };
        self.field.spawn(particle)
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut impl Rng) -> EmitterTick {
        let mut out = EmitterTick::default();
        if self.cancelled {
            return out;
        }
        out.expired = self.field.tick(dt);
        self.until_next -= dt.as_secs_f32();
        // A long stall emits at most one particle rather than a burst.
        if self.until_next <= 0.0 {
            self.until_next += self.config.interval_sec;
            if self.until_next <= 0.0 {
                self.until_next = self.config.interval_sec;
            }
            if let Some(id) = self.emit(rng) {
                out.spawned.push(id);
            }
        }
        out
    }

    /// Stop emitting and drop every in-flight particle.
    pub fn cancel(&mut self) -> Vec<ParticleId> {
        self.cancelled = true;
        self.field.clear()
    }
}

/// Unordered pair of constellation stars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge(pub ParticleId, pub ParticleId);

impl Edge {
    pub fn touches(&self, id: ParticleId) -> bool {
        self.0 == id || self.1 == id
    }
}

/// Stars on a shell around the globe plus connecting edges.
#[derive(Clone, Debug, Default)]
pub struct Constellation {
    stars: ParticleField,
    edges: Vec<Edge>,
}

impl Constellation {
    /// `edge_attempts` random pairs are drawn; self-pairs are skipped.
    pub fn seed(
        star_count: usize,
        edge_attempts: usize,
        bounds: Bounds,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let stars = ParticleField::seed(star_count, bounds, &FieldConfig::constellation(), rng)?;
        let ids = stars.ids();
        let mut edges = Vec::with_capacity(edge_attempts);
        if !ids.is_empty() {
            for _ in 0..edge_attempts {
                let a = ids[rng.gen_range(0..ids.len())];
                let b = ids[rng.gen_range(0..ids.len())];
                if a != b {
                    edges.push(Edge(a, b));
                }
            }
        }
        Ok(Self { stars, edges })
    }

    pub fn stars(&self) -> &ParticleField {
        &self.stars
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Remove a star together with every edge that references it.
    pub fn remove_star(&mut self, id: ParticleId) -> Option<Particle> {
        let p = self.stars.remove(id)?;
        self.edges.retain(|e| !e.touches(id));
        Some(p)
    }

    /// Endpoint positions of every edge.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.edges.iter().filter_map(|e| {
            let a = self.stars.get(e.0)?;
            let b = self.stars.get(e.1)?;
            Some((a.position, b.position))
        })
    }
}
