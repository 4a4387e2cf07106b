//! Rally Reflex - a three-level timing and reaction driving game
//!
//! Core modules:
//! - `sim`: Gameplay engines, track generation, round/level orchestration
//! - `renderer`: Render parameters (pure) and browser drawing (wasm only)
//! - `platform`: Frame scheduling, prompts, navigation, browser glue
//! - `persistence`: Key-value storage with in-memory fallback
//! - `rating`: Persistent rating table and last game result

pub mod persistence;
pub mod platform;
pub mod rating;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use rating::{GameResult, RatingEntry, RatingTable};
pub use settings::Preferences;

use rand::Rng;

/// Game rule constants
pub mod consts {
    /// Rounds played per level
    pub const MAX_ROUNDS_PER_LEVEL: u32 = 3;
    /// Number of levels in a game
    pub const LEVEL_COUNT: u8 = 3;

    /// Countdown budget per level, in seconds (levels 1, 2, 3)
    pub const LEVEL_TIME_BUDGET: [u32; 3] = [60, 50, 40];

    /// Level finish penalties
    pub const NOT_COMPLETED_PENALTY: i32 = -20;
    pub const EARLY_EXIT_PENALTY: i32 = -15;

    // --- Level 1 ---
    pub const LEVEL1_MIN_DISTANCE: u32 = 50;
    pub const LEVEL1_MAX_DISTANCE: u32 = 150;
    pub const LEVEL1_MIN_TIME: f32 = 4.0;
    pub const LEVEL1_MAX_TIME: f32 = 12.0;
    /// Track width (px) for the shortest and longest distance
    pub const LEVEL1_MIN_TRACK_PX: f32 = 420.0;
    pub const LEVEL1_MAX_TRACK_PX: f32 = 860.0;
    /// Inset of the start/end marks from each track end
    pub const LEVEL1_TRACK_INSET: f32 = 20.0;
    pub const LEVEL1_OPTION_COUNT: usize = 5;
    /// Speed modifiers while the accelerate/brake keys are held
    pub const LEVEL1_ACCEL_BONUS: f32 = 0.35;
    pub const LEVEL1_BRAKE_PENALTY: f32 = 0.35;
    pub const LEVEL1_MIN_SPEED_FACTOR: f32 = 0.25;
    pub const LEVEL1_MAX_SPEED_FACTOR: f32 = 1.6;
    pub const LEVEL1_REVERSE_FACTOR: f32 = 0.65;

    // --- Level 2 ---
    pub const LEVEL2_MIN_TARGET: u32 = 4;
    pub const LEVEL2_MAX_TARGET: u32 = 9;
    pub const LEVEL2_MIN_OVERRUN: f32 = 2.4;
    pub const LEVEL2_MAX_OVERRUN: f32 = 3.2;
    pub const LEVEL2_MIN_DISTANCE: u32 = 380;
    pub const LEVEL2_MAX_DISTANCE: u32 = 560;

    // --- Level 3 ---
    pub const LEVEL3_MOVE_SPEED: f32 = 260.0;
    pub const LEVEL3_FAIL_PENALTY: i32 = -25;
    pub const LEVEL3_BASE_SCORE: f32 = 150.0;
    pub const LEVEL3_SCORE_PER_SECOND: f32 = 12.0;
    pub const LEVEL3_MIN_LAP_SCORE: i32 = 20;
    pub const LEVEL3_ROAD_WIDTH: f32 = 50.0;
    pub const LEVEL3_CAR_RADIUS: f32 = 9.0;
    pub const LEVEL3_WILDNESS: f32 = 1.15;
    pub const LEVEL3_CURVE_SAMPLES: usize = 240;
    /// Curve base radius, as a fraction of the smaller canvas side
    pub const LEVEL3_BASE_RADIUS_RATIO: f32 = 0.33;
    pub const LEVEL3_CANVAS_MIN_WIDTH: f32 = 760.0;
    pub const LEVEL3_CANVAS_MAX_WIDTH: f32 = 980.0;
    pub const LEVEL3_CANVAS_MIN_HEIGHT: f32 = 360.0;
    pub const LEVEL3_CANVAS_MAX_HEIGHT: f32 = 520.0;
    /// Horizontal padding around the canvas
    pub const LEVEL3_CANVAS_PADDING: f32 = 20.0;
    /// Vertical space taken by the page header, HUD and controls
    pub const LEVEL3_CANVAS_CHROME: f32 = 240.0;
    /// Off-road margin, as a fraction of the car radius
    pub const LEVEL3_ROAD_MARGIN: f32 = 0.15;
    /// Distance from start (x road width) that arms the finish line
    pub const LEVEL3_LEAVE_START: f32 = 1.7;
    /// Distance from start (x road width) that completes the lap
    pub const LEVEL3_FINISH_RADIUS: f32 = 0.45;

    pub const LEVEL3_OBSTACLE_MIN_TTL: f32 = 1.0;
    pub const LEVEL3_OBSTACLE_MAX_TTL: f32 = 5.0;
    pub const LEVEL3_OBSTACLE_THICKNESS: f32 = 18.0;
    /// Obstacle overhang beyond each road edge
    pub const LEVEL3_OBSTACLE_OVERHANG: f32 = 16.0;
    pub const LEVEL3_MAX_OBSTACLES: usize = 6;
    pub const LEVEL3_INITIAL_OBSTACLES: usize = 3;
    pub const LEVEL3_OBSTACLE_SPAWN_MIN: f32 = 0.5;
    pub const LEVEL3_OBSTACLE_SPAWN_MAX: f32 = 1.2;
    pub const LEVEL3_DOUBLE_SPAWN_CHANCE: f64 = 0.35;
    /// Samples at each end of the curve kept free of obstacles
    pub const LEVEL3_START_CLEARANCE: usize = 28;
    pub const LEVEL3_OBSTACLE_CAR_CLEARANCE: f32 = 130.0;
    pub const LEVEL3_OBSTACLE_SPACING: f32 = 110.0;
    pub const LEVEL3_SPAWN_ATTEMPTS: u32 = 50;
    /// Thickness pulse amplitude and angular rate
    pub const LEVEL3_PULSE_AMPLITUDE: f32 = 0.18;
    pub const LEVEL3_PULSE_RATE: f32 = 7.0;
    pub const LEVEL3_WOBBLE_RATE: f32 = 6.0;
}

/// Uniform integer in `[min, max]` (inclusive). Returns `min` for an empty range.
#[inline]
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

/// Uniform float in `[min, max)`
#[inline]
pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Unix time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Unix time in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_int_inclusive_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2000 {
            let v = random_int(&mut rng, 1, 4);
            assert!((1..=4).contains(&v));
            seen_min |= v == 1;
            seen_max |= v == 4;
        }
        assert!(seen_min && seen_max);
        assert_eq!(random_int(&mut rng, 5, 5), 5);
        assert_eq!(random_int(&mut rng, 9, 2), 9);
    }

    #[test]
    fn test_random_float_range() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..1000 {
            let v = random_float(&mut rng, 0.5, 1.2);
            assert!((0.5..1.2).contains(&v));
        }
        assert_eq!(random_float(&mut rng, 3.0, 3.0), 3.0);
    }
}
