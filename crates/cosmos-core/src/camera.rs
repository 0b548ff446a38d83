//! Perspective camera, damped orbit controls and pointer rays.
//!
//! Platform-free so picking can be tested on the host; the web front-end only
//! converts pointer events into normalized device coordinates.

use crate::constants::*;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::{PI, TAU};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.0,
            fovy_radians: CAMERA_FOVY_DEG.to_radians(),
            znear: CAMERA_ZNEAR,
            zfar: CAMERA_ZFAR,
        }
    }
}

impl Camera {
    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Keep the projection in step with the surface; degenerate sizes are ignored.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// World-space ray through a point in normalized device coordinates.
    ///
    /// Returns `(ray_origin, ray_direction)`.
    pub fn ray(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inv = self.view_proj().inverse();
        let p_far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let p1: Vec3 = p_far.truncate() / p_far.w;
        let ro = self.eye;
        let rd = (p1 - ro).normalize_or_zero();
        (ro, rd)
    }
}

/// Convert a pixel position on a `width × height` surface into NDC.
#[inline]
pub fn pixel_to_ndc(px: Vec2, width: f32, height: f32) -> Vec2 {
    let w = width.max(1.0);
    let h = height.max(1.0);
    Vec2::new((2.0 * px.x / w) - 1.0, 1.0 - (2.0 * px.y / h))
}

#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitConfig {
    /// Fraction of pending rotation applied per 60 Hz frame.
    pub damping: f32,
    pub rotate_speed: f32,
    pub min_polar: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping: ORBIT_DAMPING,
            rotate_speed: ORBIT_ROTATE_SPEED,
            min_polar: ORBIT_MIN_POLAR,
        }
    }
}

/// Drag-to-rotate orbit around a target with damped inertia; zoom disabled.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub camera: Camera,
    pub config: OrbitConfig,
    radius: f32,
    azimuth: f32,
    polar: f32,
    pending_azimuth: f32,
    pending_polar: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Camera::default(), OrbitConfig::default())
    }
}

impl OrbitCamera {
    pub fn new(camera: Camera, config: OrbitConfig) -> Self {
        let offset = camera.eye - camera.target;
        let radius = offset.length().max(f32::EPSILON);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        Self {
            camera,
            config,
            radius,
            azimuth,
            polar,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
        }
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    /// Queue rotation for a pointer drag of `delta_px` on a surface of
    /// `surface_height` pixels; a full-height drag turns by one revolution.
    pub fn drag(&mut self, delta_px: Vec2, surface_height: f32) {
        let h = surface_height.max(1.0);
        self.pending_azimuth -= TAU * delta_px.x / h * self.config.rotate_speed;
        self.pending_polar -= TAU * delta_px.y / h * self.config.rotate_speed;
    }

    /// Whether queued rotation is still being applied.
    pub fn is_settling(&self) -> bool {
        self.pending_azimuth.abs() > 1e-5 || self.pending_polar.abs() > 1e-5
    }

    /// Apply a share of the queued rotation and decay the rest.
    pub fn update(&mut self, dt_sec: f32) {
        let frames = (dt_sec * REFERENCE_FPS).max(0.0);
        let share = 1.0 - (1.0 - self.config.damping.clamp(0.0, 1.0)).powf(frames);
        let da = self.pending_azimuth * share;
        let dp = self.pending_polar * share;
        self.pending_azimuth -= da;
        self.pending_polar -= dp;
        self.azimuth = (self.azimuth + da).rem_euclid(TAU);
        let min = self.config.min_polar.clamp(0.0, PI / 2.0);
        self.polar = (self.polar + dp).clamp(min, PI - min);
        let offset = Vec3::new(
            self.radius * self.polar.sin() * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * self.polar.sin() * self.azimuth.cos(),
        );
        self.camera.eye = self.camera.target + offset;
    }
}
