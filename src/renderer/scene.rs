//! Render parameters derived from game state
//!
//! Pure functions only; the canvas and DOM backends turn these into draw
//! calls. Everything time-dependent takes the round clock, so a frame renders
//! against the same snapshot the collision checks used.

use glam::Vec2;

use crate::consts::MAX_ROUNDS_PER_LEVEL;
use crate::sim::level1::Level1Round;
use crate::sim::level3::{Level3Round, Obstacle};
use crate::sim::state::GameSession;

/// RGBA colour, components in 0..=1
pub type Color = [f32; 4];

pub const ROAD_COLOR: Color = [0.30, 0.69, 0.31, 0.45];
pub const ROAD_EDGE_COLOR: Color = [1.0, 1.0, 1.0, 0.20];
pub const CENTER_LINE_COLOR: Color = [1.0, 0.92, 0.23, 0.55];
pub const START_COLOR: Color = [1.0, 0.92, 0.23, 1.0];
pub const CAR_COLOR: Color = [0.30, 0.69, 0.31, 1.0];
pub const OBSTACLE_COLOR: Color = [1.0, 0.34, 0.13, 1.0];
pub const HUD_BACKGROUND: Color = [0.0, 0.0, 0.0, 0.55];

/// Extra width of the soft road edge beyond the road itself
pub const ROAD_EDGE_EXTRA: f32 = 10.0;
pub const CENTER_LINE_WIDTH: f32 = 4.0;
pub const START_MARK_RADIUS: f32 = 8.0;
/// Seconds over which an obstacle fades out
pub const OBSTACLE_FADE_TIME: f32 = 0.4;
/// Obstacle glow margin on each side
pub const OBSTACLE_GLOW: f32 = 6.0;
/// TTL bar size, drawn under the obstacle
pub const TTL_BAR_WIDTH: f32 = 40.0;
pub const TTL_BAR_HEIGHT: f32 = 6.0;

/// CSS `rgba()` string for a colour
pub fn css_color(color: Color) -> String {
    let [r, g, b, a] = color;
    format!(
        "rgba({}, {}, {}, {})",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        a
    )
}

/// One obstacle, ready to draw in its local frame
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleSprite {
    pub center: Vec2,
    /// Rotation including the cosmetic wobble
    pub angle: f32,
    pub length: f32,
    /// Pulsed thickness, identical to the collision thickness
    pub thickness: f32,
    /// Opacity multiplier, fading to 0 over the last moments of life
    pub fade: f32,
    /// Remaining life, 0..=1
    pub ttl_ratio: f32,
    /// Whole seconds left
    pub label: String,
}

impl ObstacleSprite {
    pub fn new(obstacle: &Obstacle, clock: f32) -> Self {
        let ttl_ratio = if obstacle.ttl_max > 0.0 {
            (obstacle.ttl / obstacle.ttl_max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            center: obstacle.center(),
            angle: obstacle.wobble_angle(clock),
            length: obstacle.length(),
            thickness: obstacle.pulsed_thickness(clock),
            fade: (obstacle.ttl / OBSTACLE_FADE_TIME).clamp(0.0, 1.0),
            ttl_ratio,
            label: format!("{}", obstacle.ttl.ceil().max(0.0) as u32),
        }
    }
}

/// Everything needed to draw one level 3 frame
#[derive(Debug, Clone)]
pub struct Level3Scene<'a> {
    pub width: f32,
    pub height: f32,
    pub road: &'a [Vec2],
    pub road_width: f32,
    pub start: Vec2,
    pub car: Vec2,
    pub car_radius: f32,
    pub obstacles: Vec<ObstacleSprite>,
    pub hud: String,
}

impl<'a> Level3Scene<'a> {
    pub fn new(round: &'a Level3Round) -> Self {
        let clock = round.time;
        Self {
            width: round.canvas.width,
            height: round.canvas.height,
            road: &round.points,
            road_width: round.road_width,
            start: round.start,
            car: round.car.pos,
            car_radius: round.car.radius,
            obstacles: round
                .obstacles
                .iter()
                .map(|ob| ObstacleSprite::new(ob, clock))
                .collect(),
            hud: lap_time_label(clock),
        }
    }
}

pub fn lap_time_label(seconds: f32) -> String {
    format!("Lap time: {:.2} s", seconds)
}

/// Left offset of the level 1 car, in track pixels
pub fn level1_car_left(round: &Level1Round) -> f32 {
    round.track.start + round.car.offset
}

pub fn level_label(session: &GameSession) -> String {
    format!("Level: {}/{}", session.level, crate::consts::LEVEL_COUNT)
}

pub fn round_label(session: &GameSession) -> String {
    format!("Round: {}/{}", session.round.min(MAX_ROUNDS_PER_LEVEL), MAX_ROUNDS_PER_LEVEL)
}
