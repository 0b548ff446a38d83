use glam::Vec3;

// Shared scene/animation tuning constants used by the core engine and the web frontend.

// Scene layout
pub const GLOBE_RADIUS: f32 = 5.0; // wireframe globe radius in world units
pub const GLOBE_SEGMENTS: u32 = 32; // width and height segments of the wireframe sphere
pub const GLOBE_OPACITY: f32 = 0.3;
pub const GLOBE_COLOR: [f32; 3] = [0.545, 0.361, 0.965]; // violet

pub const CONSTELLATION_STARS: usize = 200;
pub const CONSTELLATION_EDGES: usize = 30; // attempted edges; self-edges are skipped
pub const CONSTELLATION_SHELL_VARIANCE: f32 = 1.5; // star radius = globe radius ± this
pub const CONSTELLATION_STAR_RADIUS: f32 = 0.03;
pub const CONSTELLATION_EDGE_OPACITY: f32 = 0.2;

// Idle rotation, expressed per 60 Hz frame and converted to per-second rates
pub const GLOBE_SPIN_PER_FRAME: f32 = 0.001;
pub const CONSTELLATION_SPIN_PER_FRAME: f32 = 0.0005;
pub const REFERENCE_FPS: f32 = 60.0;

// Lights
pub const AMBIENT_INTENSITY: f32 = 0.5;
pub const POINT_LIGHT_INTENSITY: f32 = 1.0;
pub const POINT_LIGHT_POSITION: Vec3 = Vec3::new(10.0, 10.0, 10.0);

// Camera
pub const CAMERA_Z: f32 = 10.0;
pub const CAMERA_FOVY_DEG: f32 = 75.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 1000.0;

// Orbit controls
pub const ORBIT_DAMPING: f32 = 0.05; // fraction of pending rotation applied per frame
pub const ORBIT_ROTATE_SPEED: f32 = 0.5;
pub const ORBIT_MIN_POLAR: f32 = 0.01; // radians away from the poles

// Glow effect spawned on pick
pub const GLOW_RADIUS: f32 = 0.2;
pub const GLOW_DURATION_SEC: f32 = 1.0;
pub const GLOW_START_OPACITY: f32 = 0.5;
pub const GLOW_END_SCALE: f32 = 2.0;

// Emitters
pub const SHOOTING_STAR_INTERVAL_SEC: f32 = 2.0;
pub const SHOOTING_STAR_TTL_SEC: f32 = 1.0;
pub const SHOOTING_STAR_MAX_ANGLE_DEG: f32 = 45.0;

// Star fields (2D, percentages of the container)
pub const SPACE_FIELD_STARS: usize = 200;
pub const SPACE_STAR_SIZE_PX: (f32, f32) = (1.0, 3.5);
pub const SPACE_TWINKLE_SEC: (f32, f32) = (2.0, 5.0);

pub const BLACK_HOLE_FIELD_STARS: usize = 300;
pub const BLACK_HOLE_STAR_SIZE_PX: (f32, f32) = (0.5, 2.5);
pub const BLACK_HOLE_STAR_OPACITY: (f32, f32) = (0.2, 1.0);
pub const BLACK_HOLE_TWINKLE_SEC: (f32, f32) = (2.0, 6.0);

// Pointer parallax
pub const PARALLAX_STRENGTH_PX: f32 = 20.0; // offset at the viewport edge
pub const PARALLAX_DURATION_SEC: f32 = 1.0;
pub const PARALLAX_FLOATING_FACTOR: f32 = 1.5;
pub const PARALLAX_FLOATING_DURATION_SEC: f32 = 1.5;
pub const PARALLAX_FLOATING_STAGGER_SEC: f32 = 0.1;

// Cursor follower spring
pub const CURSOR_STIFFNESS: f32 = 500.0;
pub const CURSOR_DAMPING: f32 = 28.0;
pub const CURSOR_HOVER_SCALE: f32 = 2.0;
pub const CURSOR_CLICK_PULSE_SEC: f32 = 0.5;

// Frame pacing
pub const MAX_FRAME_DT_SEC: f32 = 0.1; // clamp long stalls (tab switches) to one step

#[inline]
pub fn per_second(per_frame: f32) -> f32 {
    per_frame * REFERENCE_FPS
}
