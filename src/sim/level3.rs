//! Level 3 - Lap & Obstacles
//!
//! One car on a generated closed road. The player drags it with the pointer
//! or steers with the arrow keys and must complete a lap without leaving the
//! road or touching one of the short-lived obstacles laid across it.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::geometry::{curve_normal, dist_point_to_segment_squared, distance_to_closed_polyline};
use super::input::{DirectionKeys, EventKind, InputEvent};
use super::state::{FailReason, RoundOutcome, RoundReport};
use super::track::generate_closed_curve;
use crate::consts::*;
use crate::{random_float, random_int};

/// Drawing surface size for level 3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    /// Size the canvas to the viewport minus page chrome, within fixed bounds
    pub fn fit(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            width: (viewport_width - LEVEL3_CANVAS_PADDING)
                .clamp(LEVEL3_CANVAS_MIN_WIDTH, LEVEL3_CANVAS_MAX_WIDTH),
            height: (viewport_height - LEVEL3_CANVAS_CHROME)
                .clamp(LEVEL3_CANVAS_MIN_HEIGHT, LEVEL3_CANVAS_MAX_HEIGHT),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn base_radius(&self) -> f32 {
        self.width.min(self.height) * LEVEL3_BASE_RADIUS_RATIO
    }
}

/// A bar laid across the road for a few seconds
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub a: Vec2,
    pub b: Vec2,
    pub thickness: f32,
    /// Seconds left before it disappears
    pub ttl: f32,
    pub ttl_max: f32,
    /// Animation phase, radians
    pub phase: f32,
    /// Angular wobble amplitude, radians
    pub wobble: f32,
}

impl Obstacle {
    pub fn center(&self) -> Vec2 {
        (self.a + self.b) / 2.0
    }

    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    /// Thickness at round time `clock`; collision and drawing share this
    pub fn pulsed_thickness(&self, clock: f32) -> f32 {
        let pulse = 1.0 + LEVEL3_PULSE_AMPLITUDE * (clock * LEVEL3_PULSE_RATE + self.phase).sin();
        self.thickness * pulse
    }

    /// Drawn angle at round time `clock` (cosmetic only)
    pub fn wobble_angle(&self, clock: f32) -> f32 {
        let d = self.b - self.a;
        d.y.atan2(d.x) + self.wobble * (clock * LEVEL3_WOBBLE_RATE + self.phase).sin()
    }

    /// Whether a disc at `pos` overlaps the obstacle at round time `clock`
    ///
    /// A disc exactly `radius + thickness / 2` away is clear.
    pub fn touches(&self, pos: Vec2, radius: f32, clock: f32) -> bool {
        let reach = radius + self.pulsed_thickness(clock) / 2.0;
        dist_point_to_segment_squared(pos, self.a, self.b) < reach * reach
    }
}

/// Whether a car disc lies on the road band around the closed curve
pub fn is_car_on_road(pos: Vec2, radius: f32, points: &[Vec2], road_width: f32) -> bool {
    distance_to_closed_polyline(pos, points) <= road_width / 2.0 - radius * LEVEL3_ROAD_MARGIN
}

/// Points for a completed lap of `lap_time` seconds
pub fn lap_score(lap_time: f32) -> i32 {
    let raw = (LEVEL3_BASE_SCORE - lap_time * LEVEL3_SCORE_PER_SECOND).round() as i32;
    raw.max(LEVEL3_MIN_LAP_SCORE)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level3Car {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct Level3Round {
    pub canvas: CanvasSize,
    pub points: Vec<Vec2>,
    pub road_width: f32,
    pub start: Vec2,
    pub car: Level3Car,
    /// Lap clock, seconds; also the animation clock for obstacles
    pub time: f32,
    pub obstacles: Vec<Obstacle>,
    /// Seconds until the spawner next fires
    pub next_obstacle_in: f32,
    pub left_start: bool,
    pub finished: bool,
    pub dragging: bool,
    /// Latest pointer position, applied on the next tick
    drag_target: Option<Vec2>,
    keys: DirectionKeys,
}

impl Level3Round {
    pub const LISTENS: &'static [EventKind] = &[
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::PointerDown,
        EventKind::PointerMove,
        EventKind::PointerUp,
        EventKind::PointerLeave,
    ];

    /// Generate a track for `canvas` and place the opening obstacles
    pub fn new<R: Rng + ?Sized>(rng: &mut R, canvas: CanvasSize) -> Self {
        let points = generate_closed_curve(
            rng,
            canvas.center(),
            canvas.base_radius(),
            LEVEL3_WILDNESS,
            LEVEL3_CURVE_SAMPLES,
            canvas.width,
            canvas.height,
        );
        let mut round = Self::with_track(points, canvas);
        round.next_obstacle_in =
            random_float(rng, LEVEL3_OBSTACLE_SPAWN_MIN, LEVEL3_OBSTACLE_SPAWN_MAX);
        for _ in 0..LEVEL3_INITIAL_OBSTACLES {
            round.spawn_obstacle(rng);
        }
        round
    }

    /// Round on a given track, car on the first point, no obstacles yet
    pub fn with_track(points: Vec<Vec2>, canvas: CanvasSize) -> Self {
        let start = points.first().copied().unwrap_or_else(|| canvas.center());
        Self {
            canvas,
            points,
            road_width: LEVEL3_ROAD_WIDTH,
            start,
            car: Level3Car {
                pos: start,
                radius: LEVEL3_CAR_RADIUS,
            },
            time: 0.0,
            obstacles: Vec::new(),
            next_obstacle_in: LEVEL3_OBSTACLE_SPAWN_MAX,
            left_start: false,
            finished: false,
            dragging: false,
            drag_target: None,
            keys: DirectionKeys::default(),
        }
    }

    pub fn is_car_on_road(&self) -> bool {
        is_car_on_road(self.car.pos, self.car.radius, &self.points, self.road_width)
    }

    pub fn is_car_touching_obstacles(&self) -> bool {
        self.obstacles
            .iter()
            .any(|ob| ob.touches(self.car.pos, self.car.radius, self.time))
    }

    /// Try to place one obstacle across the road. Returns false if no
    /// candidate passed the clearance checks.
    pub fn spawn_obstacle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        for _ in 0..LEVEL3_SPAWN_ATTEMPTS {
            let idx = random_int(rng, 0, n as i32 - 1) as usize;
            if idx < LEVEL3_START_CLEARANCE || idx > n.saturating_sub(LEVEL3_START_CLEARANCE) {
                continue;
            }

            let p = self.points[idx];
            if p.distance(self.car.pos) < LEVEL3_OBSTACLE_CAR_CLEARANCE {
                continue;
            }
            if self
                .obstacles
                .iter()
                .any(|ob| ob.center().distance(p) < LEVEL3_OBSTACLE_SPACING)
            {
                continue;
            }

            let normal = curve_normal(&self.points, idx);
            let half_len = self.road_width / 2.0 + LEVEL3_OBSTACLE_OVERHANG;
            let ttl = random_float(rng, LEVEL3_OBSTACLE_MIN_TTL, LEVEL3_OBSTACLE_MAX_TTL);

            self.obstacles.push(Obstacle {
                a: p - normal * half_len,
                b: p + normal * half_len,
                thickness: LEVEL3_OBSTACLE_THICKNESS,
                ttl,
                ttl_max: ttl,
                phase: random_float(rng, 0.0, TAU),
                wobble: random_float(rng, 0.03, 0.08),
            });
            return true;
        }
        false
    }

    /// Age obstacles and run the spawn timer
    fn update_obstacles<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f32) {
        for ob in &mut self.obstacles {
            ob.ttl -= dt;
        }
        self.obstacles.retain(|ob| ob.ttl > 0.0);

        self.next_obstacle_in -= dt;
        if self.next_obstacle_in <= 0.0 && self.obstacles.len() < LEVEL3_MAX_OBSTACLES {
            let count = if rng.random_bool(LEVEL3_DOUBLE_SPAWN_CHANCE) { 2 } else { 1 };
            for _ in 0..count {
                if self.obstacles.len() >= LEVEL3_MAX_OBSTACLES {
                    break;
                }
                self.spawn_obstacle(rng);
            }
            self.next_obstacle_in =
                random_float(rng, LEVEL3_OBSTACLE_SPAWN_MIN, LEVEL3_OBSTACLE_SPAWN_MAX);
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        if self.finished {
            return;
        }
        match event {
            InputEvent::KeyDown(key) => {
                self.keys.apply(*key, true);
            }
            InputEvent::KeyUp(key) => {
                self.keys.apply(*key, false);
            }
            InputEvent::PointerDown(pos) => {
                self.dragging = true;
                self.drag_target = Some(*pos);
            }
            InputEvent::PointerMove(pos) if self.dragging => {
                self.drag_target = Some(*pos);
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                self.dragging = false;
            }
            _ => {}
        }
    }

    fn apply_movement(&mut self, dt: f32) {
        if let Some(target) = self.drag_target.take() {
            self.car.pos = target;
            return;
        }
        if self.dragging {
            return;
        }
        self.car.pos += self.keys.direction() * LEVEL3_MOVE_SPEED * dt;
    }

    /// Advance one frame; returns the report when the round ends
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f32) -> Option<RoundReport> {
        if self.finished {
            return None;
        }

        self.time += dt;
        self.update_obstacles(rng, dt);

        let prev = self.car.pos;
        self.apply_movement(dt);

        if self.is_car_touching_obstacles() {
            self.car.pos = prev;
            return self.fail(FailReason::Obstacle);
        }
        if !self.is_car_on_road() {
            return self.fail(FailReason::OffRoad);
        }

        let from_start = self.car.pos.distance(self.start);
        if !self.left_start && from_start > self.road_width * LEVEL3_LEAVE_START {
            self.left_start = true;
        }
        if self.left_start && from_start <= self.road_width * LEVEL3_FINISH_RADIUS {
            return self.finish(RoundReport {
                score: lap_score(self.time),
                outcome: RoundOutcome::LapCompleted { lap_time: self.time },
            });
        }
        None
    }

    fn fail(&mut self, reason: FailReason) -> Option<RoundReport> {
        log::info!("Level 3 round failed: {:?} at {:.2}s", reason, self.time);
        self.finish(RoundReport {
            score: LEVEL3_FAIL_PENALTY,
            outcome: RoundOutcome::Crashed(reason),
        })
    }

    fn finish(&mut self, report: RoundReport) -> Option<RoundReport> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.dragging = false;
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const CANVAS: CanvasSize = CanvasSize {
        width: 800.0,
        height: 520.0,
    };

    fn circle_track(radius: f32, samples: usize) -> Vec<Vec2> {
        (0..samples)
            .map(|i| {
                let a = i as f32 / samples as f32 * TAU;
                CANVAS.center() + Vec2::new(a.cos(), a.sin()) * radius
            })
            .collect()
    }

    fn quiet_round() -> Level3Round {
        let mut round = Level3Round::with_track(circle_track(150.0, 240), CANVAS);
        round.next_obstacle_in = f32::INFINITY;
        round
    }

    fn bar(y: f32) -> Obstacle {
        Obstacle {
            a: Vec2::new(-30.0, y),
            b: Vec2::new(30.0, y),
            thickness: 18.0,
            ttl: 3.0,
            ttl_max: 3.0,
            phase: 0.0,
            wobble: 0.05,
        }
    }

    #[test]
    fn test_canvas_fit_bounds() {
        assert_eq!(CanvasSize::fit(400.0, 300.0), CanvasSize { width: 760.0, height: 360.0 });
        assert_eq!(CanvasSize::fit(2000.0, 1200.0), CanvasSize { width: 980.0, height: 520.0 });
        let mid = CanvasSize::fit(900.0, 700.0);
        assert_eq!(mid.width, 880.0);
        assert_eq!(mid.height, 460.0);
    }

    #[test]
    fn test_obstacle_contact_boundary() {
        // At clock 0 with phase 0 the pulse is exactly 1
        let ob = bar(0.0);
        assert!(!ob.touches(Vec2::new(0.0, 18.0), 9.0, 0.0));
        assert!(ob.touches(Vec2::new(0.0, 17.99), 9.0, 0.0));
        assert!(!ob.touches(Vec2::new(48.0, 0.0), 9.0, 0.0));
    }

    #[test]
    fn test_pulse_changes_reach() {
        let ob = bar(0.0);
        let peak = (TAU / 4.0) / LEVEL3_PULSE_RATE;
        assert!((ob.pulsed_thickness(peak) - 18.0 * 1.18).abs() < 1e-3);
        // Clear at rest, hit at peak thickness
        let pos = Vec2::new(0.0, 18.5);
        assert!(!ob.touches(pos, 9.0, 0.0));
        assert!(ob.touches(pos, 9.0, peak));
    }

    #[test]
    fn test_lap_score() {
        assert_eq!(lap_score(0.0), 150);
        assert_eq!(lap_score(5.0), 90);
        assert_eq!(lap_score(20.0), LEVEL3_MIN_LAP_SCORE);
    }

    #[test]
    fn test_drag_around_lap() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut round = quiet_round();
        round.handle_input(&InputEvent::PointerDown(round.start));

        let mut report = None;
        for step in 1..=60 {
            let target = round.points[(step * 5) % round.points.len()];
            round.handle_input(&InputEvent::PointerMove(target));
            report = round.update(&mut rng, 0.05);
            if report.is_some() {
                break;
            }
        }
        let report = report.expect("lap should complete");
        assert!(round.left_start);
        assert!(round.finished);
        assert!(matches!(report.outcome, RoundOutcome::LapCompleted { .. }));
        assert_eq!(report.score, lap_score(round.time));
        assert!(round.update(&mut rng, 0.05).is_none());
    }

    #[test]
    fn test_return_without_leaving_is_not_a_lap() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut round = quiet_round();
        for _ in 0..10 {
            assert!(round.update(&mut rng, 0.1).is_none());
        }
        assert!(!round.left_start);
    }

    #[test]
    fn test_off_road_fails_once() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut round = quiet_round();
        round.handle_input(&InputEvent::PointerDown(CANVAS.center()));
        let report = round.update(&mut rng, 0.016).expect("off road");
        assert_eq!(report.score, LEVEL3_FAIL_PENALTY);
        assert_eq!(report.outcome, RoundOutcome::Crashed(FailReason::OffRoad));
        assert!(round.update(&mut rng, 0.016).is_none());
        assert!(!round.dragging);
    }

    #[test]
    fn test_collision_reverts_position() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut round = quiet_round();
        let start = round.start;
        round.obstacles.push(Obstacle {
            a: start + Vec2::new(-40.0, 30.0),
            b: start + Vec2::new(40.0, 30.0),
            ..bar(0.0)
        });
        round.handle_input(&InputEvent::PointerDown(start + Vec2::new(0.0, 30.0)));
        let report = round.update(&mut rng, 0.016).expect("collision");
        assert_eq!(report.outcome, RoundOutcome::Crashed(FailReason::Obstacle));
        assert_eq!(round.car.pos, start);
    }

    #[test]
    fn test_keys_ignored_while_dragging() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut round = quiet_round();
        let start = round.start;
        round.handle_input(&InputEvent::KeyDown(crate::sim::input::Key::ArrowDown));
        round.handle_input(&InputEvent::PointerDown(start));
        round.update(&mut rng, 0.05);
        round.update(&mut rng, 0.05);
        assert_eq!(round.car.pos, start);

        round.handle_input(&InputEvent::PointerUp);
        round.update(&mut rng, 0.05);
        assert!((round.car.pos.y - (start.y + LEVEL3_MOVE_SPEED * 0.05)).abs() < 1e-3);
    }

    #[test]
    fn test_obstacles_expire() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut round = quiet_round();
        round.obstacles.push(Obstacle {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(10.0, 0.0),
            ttl: 0.1,
            ..bar(0.0)
        });
        round.update(&mut rng, 0.2);
        assert!(round.obstacles.is_empty());
    }

    #[test]
    fn test_spawner_respects_limit() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut round = Level3Round::new(&mut rng, CANVAS);
        for _ in 0..200 {
            round.update_obstacles(&mut rng, 0.3);
            assert!(round.obstacles.len() <= LEVEL3_MAX_OBSTACLES);
        }
    }

    proptest! {
        #[test]
        fn start_point_on_road(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let round = Level3Round::new(&mut rng, CANVAS);
            prop_assert!(round.is_car_on_road());
            prop_assert!(!round.is_car_touching_obstacles());
        }

        #[test]
        fn spawned_obstacles_keep_clearance(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let round = Level3Round::new(&mut rng, CANVAS);
            prop_assert!(round.obstacles.len() <= LEVEL3_INITIAL_OBSTACLES);
            for (i, ob) in round.obstacles.iter().enumerate() {
                prop_assert!(ob.center().distance(round.start) >= LEVEL3_OBSTACLE_CAR_CLEARANCE - 1e-3);
                let expected = LEVEL3_ROAD_WIDTH + 2.0 * LEVEL3_OBSTACLE_OVERHANG;
                prop_assert!((ob.length() - expected).abs() < 1e-2);
                for other in &round.obstacles[i + 1..] {
                    prop_assert!(ob.center().distance(other.center()) >= LEVEL3_OBSTACLE_SPACING - 1e-3);
                }
            }
        }
    }
}
