//! Gesture Quest: gesture-driven interaction engine for the STEM mini-games
//!
//! Frames flow through the pipeline
//! `FrameSampler → GestureClient → GestureNormalizer → GameSession → FeedbackChannel`,
//! one frame at a time, on a single cooperative loop.

pub mod config;
pub mod core;
pub mod games;
pub mod types;

/// Session-relative milliseconds. Only advances while the session is active.
pub type Millis = u64;

// =============================================================================
// CANVAS - logical play area that normalized coordinates are scaled onto
// =============================================================================

/// Logical canvas width in pixels
pub const CANVAS_WIDTH: f64 = 800.0;

/// Logical canvas height in pixels
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Default source frame geometry (camera capture size)
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

// =============================================================================
// TIMING
// =============================================================================

/// Cool-down after a completed challenge before fresh content appears
pub const COOLDOWN_MS: Millis = 2000;

/// How long a transient result message stays on screen
pub const RESULT_DISPLAY_MS: Millis = 3000;

/// Target interval between frame captures
pub const FRAME_INTERVAL_MS: u64 = 100;

/// Recognizer round-trip budget before the cycle counts as "no hands"
pub const RECOGNITION_TIMEOUT_MS: u64 = 2000;

/// Extra wait on top of the request timeout for progress writes at exit
pub const PROGRESS_FLUSH_GRACE_MS: u64 = 500;

// =============================================================================
// PHYSICS
// =============================================================================

/// Palm must come this close (px) to an object to grab it
pub const GRAB_RADIUS: f64 = 50.0;

/// Dragged object closer than this (px) to the target scores
pub const TARGET_HIT_RADIUS: f64 = 30.0;

pub const PHYSICS_POINTS: u32 = 10;

// =============================================================================
// MATHEMATICS
// =============================================================================

/// Index tip must be above this normalized height to start a stroke
pub const DRAW_START_MAX_Y: f64 = 0.8;

pub const MATH_POINTS: u32 = 20;

// =============================================================================
// CHEMISTRY
// =============================================================================

/// Volume moved per pour event
pub const POUR_QUANTUM: u32 = 20;

/// Maximum beaker volume
pub const BEAKER_CAPACITY: u32 = 100;

/// Volume a beaker receives when a chemical is added to it
pub const INITIAL_FILL: u32 = 50;

pub const BEAKER_COUNT: usize = 3;

pub const CHEMISTRY_POINTS: u32 = 15;

// =============================================================================
// BIOLOGY
// =============================================================================

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;

/// Zoom change per zoom event is `(scale - 0.5) * ZOOM_STEP`
pub const ZOOM_STEP: f64 = 0.1;

/// Degrees of rotation for a palm at the frame edge (offset 0.5 from centre)
pub const ROTATION_RANGE_DEG: f64 = 180.0;

pub const BIOLOGY_POINTS: u32 = 5;

// =============================================================================
// CODING
// =============================================================================

/// Palette band: top-left region of the canvas
pub const PALETTE_MAX_Y: f64 = 200.0;

/// Program band starts below this height
pub const PROGRAM_MIN_Y: f64 = 300.0;

/// Both bands span the left half of the canvas
pub const BLOCK_AREA_WIDTH: f64 = 400.0;

pub const CODING_POINTS: u32 = 25;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
