//! DOM hooks and front-end tuning.
//!
//! Sections are found by `data-cosmos` attributes so markup and styling stay
//! outside the engine; every lookup is optional and a missing node only
//! omits the effect that needed it.

pub const SECTION_ATTR: &str = "data-cosmos";
pub const PART_ATTR: &str = "data-cosmos-part";

// Section names (values of `data-cosmos`)
pub const HERO: &str = "hero";
pub const SPACE: &str = "space";
pub const BLACK_HOLE: &str = "black-hole";
pub const CHROMA: &str = "chroma";
pub const MISSION: &str = "mission";

// Parts inside a section (values of `data-cosmos-part`)
pub const PART_BLOBS: &str = "blobs";
pub const PART_HEADING: &str = "heading";
pub const PART_TEXT: &str = "text";
pub const PART_BUTTONS: &str = "buttons";
pub const PART_VISUAL: &str = "visual";
pub const PART_IMAGE: &str = "image";
pub const PART_INDICATOR: &str = "indicator";
pub const PART_FLOATING: &str = "floating";
pub const PART_SHOOTING_STARS: &str = "shooting-stars";
pub const PART_GLOBE: &str = "globe";
pub const PART_STARS: &str = "stars";
pub const PART_CONTENT: &str = "content";
pub const PART_HOLE: &str = "hole";
pub const PART_LINES: &str = "lines";
pub const PART_ITEMS: &str = "items";
pub const PART_CARDS: &str = "cards";

pub const CURSOR_ID: &str = "cosmos-cursor";
/// Elements that enlarge the cursor while hovered.
pub const HOVERABLE_SELECTOR: &str = "a, button, [role=\"button\"]";

// Classes the page stylesheet animates
pub const STAR_CLASS: &str = "star";
pub const SHOOTING_STAR_CLASS: &str = "shooting-star";
pub const CURSOR_VISIBLE_CLASS: &str = "visible";
pub const CURSOR_ENLARGED_CLASS: &str = "enlarged";

// Renderer
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::TRANSPARENT;
pub const SPRITE_VERTS: u32 = 6; // two triangles per camera-facing quad
pub const INITIAL_SPRITE_CAPACITY: usize = 256;
pub const INITIAL_EDGE_CAPACITY: usize = 64;
